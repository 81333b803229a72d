//! Stock ledger endpoints.

use actix_web::{web, HttpResponse};

use crate::{
    config::db::Pool,
    constants,
    error::ServiceError,
    models::response::ResponseBody,
    services::stock_service::{self, StockAdjustmentRequest},
};

/// GET api/estoque
pub async fn list(pool: web::Data<Pool>) -> Result<HttpResponse, ServiceError> {
    let entries = stock_service::list_stock(pool.get_ref())?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, entries)))
}

/// GET api/estoque/{id}
pub async fn find_by_id(
    entry_id: web::Path<i32>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse, ServiceError> {
    let entry = stock_service::find_stock_entry(entry_id.into_inner(), pool.get_ref())?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, entry)))
}

/// POST api/estoque/{id}/ajuste
pub async fn adjust(
    entry_id: web::Path<i32>,
    request: web::Json<StockAdjustmentRequest>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse, ServiceError> {
    let result = stock_service::adjust_stock(
        entry_id.into_inner(),
        request.into_inner(),
        pool.get_ref(),
    )?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, result)))
}
