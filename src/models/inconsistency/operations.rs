//! Database operations for detected inconsistencies.

use diesel::prelude::*;

use crate::{
    config::db::Connection,
    error::ServiceError,
    models::inconsistency::{Inconsistency, NewInconsistency},
    schema::inconsistencias::dsl::*,
};

/// Persists one batch of detected inconsistencies.
pub fn create_inconsistencies(
    new_inconsistencies: Vec<NewInconsistency>,
    conn: &mut Connection,
) -> Result<Vec<Inconsistency>, ServiceError> {
    if new_inconsistencies.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(inconsistencias)
        .values(&new_inconsistencies)
        .get_results::<Inconsistency>(conn)
        .map_err(|err| {
            log::error!("Failed to record inconsistencies: {}", err);
            ServiceError::internal_server_error("Failed to record inconsistencies".to_string())
                .with_context(|ctx| ctx.with_tag("inconsistencia").with_detail(err.to_string()))
        })
}

/// Lists inconsistencies, optionally filtered by fiscal document, newest first.
pub fn list_inconsistencies(
    document_id: Option<i32>,
    conn: &mut Connection,
) -> Result<Vec<Inconsistency>, ServiceError> {
    let mut query = inconsistencias.into_boxed();

    if let Some(document_id) = document_id {
        query = query.filter(nota_fiscal_id.eq(document_id));
    }

    query
        .order(data_deteccao.desc())
        .load::<Inconsistency>(conn)
        .map_err(|err| {
            log::error!("Failed to list inconsistencies: {}", err);
            ServiceError::internal_server_error("Failed to list inconsistencies".to_string())
                .with_context(|ctx| ctx.with_tag("inconsistencia").with_detail(err.to_string()))
        })
}
