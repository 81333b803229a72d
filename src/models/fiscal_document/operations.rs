//! Database operations for fiscal documents and their items.

use diesel::{dsl::exists, prelude::*, result::DatabaseErrorKind, select};
use rust_decimal::Decimal;

use crate::{
    config::db::Connection,
    constants,
    error::ServiceError,
    models::fiscal_document::{
        FiscalDocument, FiscalDocumentItem, NewFiscalDocument, NewFiscalDocumentItem,
    },
    schema::{notas_fiscais::dsl::*, notas_fiscais_itens},
};

/// Creates a fiscal document row.
///
/// # Returns
///
/// `Ok(FiscalDocument)` with the created document on success.
/// `Err(ServiceError::Conflict)` when the access key is already on record.
pub fn create_fiscal_document(
    new_document: NewFiscalDocument,
    conn: &mut Connection,
) -> Result<FiscalDocument, ServiceError> {
    diesel::insert_into(notas_fiscais)
        .values(&new_document)
        .get_result::<FiscalDocument>(conn)
        .map_err(|err| {
            log::error!("Failed to create fiscal document: {}", err);
            if let diesel::result::Error::DatabaseError(kind, info) = &err {
                let constraint = info.constraint_name().map(str::to_owned);
                let detail = info.details().map(str::to_owned);

                let mut service_error = match kind {
                    DatabaseErrorKind::UniqueViolation => {
                        ServiceError::conflict(constants::MESSAGE_NFE_DUPLICADA.to_string())
                    }
                    DatabaseErrorKind::ForeignKeyViolation
                    | DatabaseErrorKind::CheckViolation
                    | DatabaseErrorKind::NotNullViolation => {
                        ServiceError::bad_request(info.message().to_string())
                    }
                    _ => ServiceError::internal_server_error(
                        "Failed to create fiscal document".to_string(),
                    ),
                };

                if let Some(details) = detail {
                    service_error = service_error.with_context(|ctx| ctx.with_detail(details));
                }

                if let Some(constraint_name) = constraint {
                    service_error = service_error
                        .with_context(|ctx| ctx.with_metadata("constraint", constraint_name));
                }

                return service_error.with_context(|ctx| ctx.with_tag("nota_fiscal"));
            }

            ServiceError::internal_server_error("Failed to create fiscal document".to_string())
                .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
        })
}

/// Retrieves a fiscal document by its ID.
pub fn find_fiscal_document_by_id(
    document_id: i32,
    conn: &mut Connection,
) -> Result<FiscalDocument, ServiceError> {
    notas_fiscais
        .filter(id.eq(document_id))
        .get_result::<FiscalDocument>(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => ServiceError::not_found(format!(
                "Nota fiscal com id {} não encontrada",
                document_id
            ))
            .with_context(|ctx| ctx.with_tag("nota_fiscal")),
            _ => {
                log::error!("Failed to find fiscal document: {}", err);
                ServiceError::internal_server_error("Failed to find fiscal document".to_string())
                    .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
            }
        })
}

/// Tells whether an access key is already on record.
pub fn document_exists_by_chave_acesso(
    access_key: &str,
    conn: &mut Connection,
) -> Result<bool, ServiceError> {
    select(exists(notas_fiscais.filter(chave_acesso.eq(access_key))))
        .get_result::<bool>(conn)
        .map_err(|err| {
            log::error!("Failed to check access key: {}", err);
            ServiceError::internal_server_error("Failed to check access key".to_string())
                .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
        })
}

/// Inserts one line item of a fiscal document.
pub fn create_document_item(
    new_item: NewFiscalDocumentItem,
    conn: &mut Connection,
) -> Result<FiscalDocumentItem, ServiceError> {
    diesel::insert_into(notas_fiscais_itens::table)
        .values(&new_item)
        .get_result::<FiscalDocumentItem>(conn)
        .map_err(|err| {
            log::error!("Failed to create document item: {}", err);
            ServiceError::internal_server_error("Failed to create document item".to_string())
                .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
        })
}

/// Lists the items of a fiscal document in insertion order.
pub fn list_items_for_document(
    document_id: i32,
    conn: &mut Connection,
) -> Result<Vec<FiscalDocumentItem>, ServiceError> {
    notas_fiscais_itens::table
        .filter(notas_fiscais_itens::nota_fiscal_id.eq(document_id))
        .order(notas_fiscais_itens::id.asc())
        .load::<FiscalDocumentItem>(conn)
        .map_err(|err| {
            log::error!("Failed to list document items: {}", err);
            ServiceError::internal_server_error("Failed to list document items".to_string())
                .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
        })
}

/// Rewrites the document total after the items are persisted.
pub fn update_document_total(
    document_id: i32,
    total: Decimal,
    conn: &mut Connection,
) -> Result<FiscalDocument, ServiceError> {
    diesel::update(notas_fiscais.filter(id.eq(document_id)))
        .set(valor_total.eq(total))
        .get_result::<FiscalDocument>(conn)
        .map_err(|err| {
            log::error!("Failed to update document total: {}", err);
            ServiceError::internal_server_error("Failed to update document total".to_string())
                .with_context(|ctx| ctx.with_tag("nota_fiscal").with_detail(err.to_string()))
        })
}
