//! Fiscal document read endpoints.

use actix_web::{web, HttpResponse};

use crate::{
    config::db::Pool, constants, error::ServiceError, models::response::ResponseBody,
    services::fiscal_service,
};

/// GET api/notas-fiscais/{id}
pub async fn find_by_id(
    document_id: web::Path<i32>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse, ServiceError> {
    let document =
        fiscal_service::find_document_with_items(document_id.into_inner(), pool.get_ref())?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, document)))
}
