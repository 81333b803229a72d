//! Database operations for the product reference catalog.

use diesel::{prelude::*, result::DatabaseErrorKind};

use crate::{
    config::db::Connection,
    error::ServiceError,
    models::product_reference::{NewProductReference, ProductReference},
    schema::produtos_referencia::dsl::*,
};

/// Lists the product catalog, newest first.
pub fn list_products(conn: &mut Connection) -> Result<Vec<ProductReference>, ServiceError> {
    produtos_referencia
        .order(id.desc())
        .load::<ProductReference>(conn)
        .map_err(|err| {
            log::error!("Failed to list products: {}", err);
            ServiceError::internal_server_error("Failed to list products".to_string())
                .with_context(|ctx| ctx.with_tag("produto").with_detail(err.to_string()))
        })
}

/// Looks up a product by EAN. Returns `Ok(None)` when no product carries it.
pub fn find_product_by_ean(
    product_ean: &str,
    conn: &mut Connection,
) -> Result<Option<ProductReference>, ServiceError> {
    produtos_referencia
        .filter(ean.eq(product_ean))
        .get_result::<ProductReference>(conn)
        .optional()
        .map_err(|err| {
            log::error!("Failed to look up product by EAN: {}", err);
            ServiceError::internal_server_error("Failed to look up product".to_string())
                .with_context(|ctx| ctx.with_tag("produto").with_detail(err.to_string()))
        })
}

/// Looks up a product by its internal code.
pub fn find_product_by_codigo(
    codigo: &str,
    conn: &mut Connection,
) -> Result<Option<ProductReference>, ServiceError> {
    produtos_referencia
        .filter(codigo_interno.eq(codigo))
        .get_result::<ProductReference>(conn)
        .optional()
        .map_err(|err| {
            log::error!("Failed to look up product by internal code: {}", err);
            ServiceError::internal_server_error("Failed to look up product".to_string())
                .with_context(|ctx| ctx.with_tag("produto").with_detail(err.to_string()))
        })
}

/// Creates a catalog entry for a product first seen on an invoice.
///
/// A unique violation means a concurrent import created the same product
/// between our lookup and the insert; the winner's row is re-read by its
/// natural key (EAN when the product carries one, the internal code
/// otherwise) and returned.
pub fn create_product_reference(
    new_product: NewProductReference,
    conn: &mut Connection,
) -> Result<ProductReference, ServiceError> {
    let product_ean = new_product.ean.clone();
    let product_codigo = new_product.codigo_interno.clone();

    match diesel::insert_into(produtos_referencia)
        .values(&new_product)
        .get_result::<ProductReference>(conn)
    {
        Ok(product) => Ok(product),
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            let reread = match &product_ean {
                Some(ean_value) => produtos_referencia
                    .filter(ean.eq(ean_value))
                    .get_result::<ProductReference>(conn),
                None => produtos_referencia
                    .filter(codigo_interno.eq(&product_codigo))
                    .get_result::<ProductReference>(conn),
            };

            reread.map_err(|err| {
                log::error!("Failed to re-read product after unique violation: {}", err);
                ServiceError::internal_server_error("Failed to resolve product".to_string())
                    .with_context(|ctx| {
                        ctx.with_tag("produto")
                            .with_metadata("codigo_interno", product_codigo.clone())
                            .with_detail(err.to_string())
                    })
            })
        }
        Err(err) => {
            log::error!("Failed to create product: {}", err);
            Err(
                ServiceError::internal_server_error("Failed to create product".to_string())
                    .with_context(|ctx| ctx.with_tag("produto").with_detail(err.to_string())),
            )
        }
    }
}
