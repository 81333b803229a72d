//! Database operations for suppliers.

use diesel::prelude::*;

use crate::{
    config::db::Connection,
    error::ServiceError,
    models::supplier::{NewSupplier, Supplier},
    schema::fornecedores::dsl::*,
};

/// Retrieves a supplier by its ID.
///
/// # Returns
///
/// `Ok(Supplier)` with the found supplier on success.
/// `Err(ServiceError::NotFound)` if no supplier with the given ID exists.
pub fn find_supplier_by_id(
    supplier_id: i32,
    conn: &mut Connection,
) -> Result<Supplier, ServiceError> {
    fornecedores
        .filter(id.eq(supplier_id))
        .get_result::<Supplier>(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ServiceError::not_found(format!("Fornecedor com id {} não encontrado", supplier_id))
                    .with_context(|ctx| ctx.with_tag("fornecedor"))
            }
            _ => {
                log::error!("Failed to find supplier: {}", err);
                ServiceError::internal_server_error("Failed to find supplier".to_string())
                    .with_context(|ctx| ctx.with_tag("fornecedor").with_detail(err.to_string()))
            }
        })
}

/// Resolves a supplier by CNPJ, creating it when absent.
///
/// An existing supplier is returned as-is: registration data already on
/// record is never overwritten by values from a later invoice. The insert
/// races with concurrent imports of the same issuer, so it goes through
/// `ON CONFLICT DO NOTHING` followed by a re-read.
pub fn find_or_create_supplier(
    new_supplier: NewSupplier,
    conn: &mut Connection,
) -> Result<Supplier, ServiceError> {
    let supplier_cnpj = new_supplier.cnpj.clone();

    let existing = fornecedores
        .filter(cnpj.eq(&supplier_cnpj))
        .get_result::<Supplier>(conn)
        .optional()
        .map_err(|err| {
            log::error!("Failed to look up supplier by CNPJ: {}", err);
            ServiceError::internal_server_error("Failed to look up supplier".to_string())
                .with_context(|ctx| ctx.with_tag("fornecedor").with_detail(err.to_string()))
        })?;

    if let Some(supplier) = existing {
        return Ok(supplier);
    }

    diesel::insert_into(fornecedores)
        .values(&new_supplier)
        .on_conflict(cnpj)
        .do_nothing()
        .execute(conn)
        .map_err(|err| {
            log::error!("Failed to create supplier: {}", err);
            ServiceError::internal_server_error("Failed to create supplier".to_string())
                .with_context(|ctx| ctx.with_tag("fornecedor").with_detail(err.to_string()))
        })?;

    fornecedores
        .filter(cnpj.eq(&supplier_cnpj))
        .get_result::<Supplier>(conn)
        .map_err(|err| {
            log::error!("Failed to re-read supplier after upsert: {}", err);
            ServiceError::internal_server_error("Failed to resolve supplier".to_string())
                .with_context(|ctx| {
                    ctx.with_tag("fornecedor")
                        .with_metadata("cnpj", supplier_cnpj.clone())
                        .with_detail(err.to_string())
                })
        })
}
