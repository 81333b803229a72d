//! Read side of the fiscal surface: documents, suppliers and the product
//! catalog.

use serde::Serialize;

use crate::{
    config::db::Pool,
    error::ServiceResult,
    models::{
        fiscal_document::{operations as document_ops, FiscalDocument, FiscalDocumentItem},
        product_reference::{operations as product_ops, ProductReference},
        supplier::{operations as supplier_ops, Supplier},
    },
    services::functional_patterns::{run_query, QueryReader},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithItems {
    #[serde(flatten)]
    pub nota: FiscalDocument,
    pub itens: Vec<FiscalDocumentItem>,
}

/// Retrieves a fiscal document together with its line items.
pub fn find_document_with_items(document_id: i32, pool: &Pool) -> ServiceResult<DocumentWithItems> {
    run_query(
        QueryReader::new(move |conn| document_ops::find_fiscal_document_by_id(document_id, conn))
            .and_then(move |nota| {
                QueryReader::new(move |conn| {
                    let itens = document_ops::list_items_for_document(nota.id, conn)?;
                    Ok(DocumentWithItems {
                        nota: nota.clone(),
                        itens,
                    })
                })
            }),
        pool,
    )
}

/// Retrieves one supplier.
pub fn find_supplier(supplier_id: i32, pool: &Pool) -> ServiceResult<Supplier> {
    run_query(
        QueryReader::new(move |conn| supplier_ops::find_supplier_by_id(supplier_id, conn)),
        pool,
    )
}

/// Lists the product catalog.
pub fn list_products(pool: &Pool) -> ServiceResult<Vec<ProductReference>> {
    run_query(QueryReader::new(product_ops::list_products), pool)
}
