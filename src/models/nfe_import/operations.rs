//! Database operations for import attempt records.

use chrono::Utc;
use diesel::prelude::*;

use crate::{
    config::db::Connection,
    error::ServiceError,
    models::nfe_import::{NewNfeImport, NfeImport, NfeImportOutcome},
    schema::importacoes_nfe::dsl::*,
};

/// Opens an import attempt record in `PROCESSANDO` state.
pub fn create_import_record(
    new_import: NewNfeImport,
    conn: &mut Connection,
) -> Result<NfeImport, ServiceError> {
    diesel::insert_into(importacoes_nfe)
        .values(&new_import)
        .get_result::<NfeImport>(conn)
        .map_err(|err| {
            log::error!("Failed to create import record: {}", err);
            ServiceError::internal_server_error("Failed to create import record".to_string())
                .with_context(|ctx| ctx.with_tag("importacao").with_detail(err.to_string()))
        })
}

/// Closes an import attempt with its terminal status and counters.
pub fn finish_import_record(
    import_id: i32,
    mut outcome: NfeImportOutcome,
    conn: &mut Connection,
) -> Result<NfeImport, ServiceError> {
    if outcome.data_fim.is_none() {
        outcome.data_fim = Some(Utc::now());
    }

    diesel::update(importacoes_nfe.filter(id.eq(import_id)))
        .set(outcome)
        .get_result::<NfeImport>(conn)
        .map_err(|err| {
            log::error!("Failed to finish import record: {}", err);
            ServiceError::internal_server_error("Failed to finish import record".to_string())
                .with_context(|ctx| ctx.with_tag("importacao").with_detail(err.to_string()))
        })
}
