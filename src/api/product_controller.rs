//! Product catalog read endpoints.

use actix_web::{web, HttpResponse};

use crate::{
    config::db::Pool, constants, error::ServiceError, models::response::ResponseBody,
    services::fiscal_service,
};

/// GET api/produtos
pub async fn list(pool: web::Data<Pool>) -> Result<HttpResponse, ServiceError> {
    let products = fiscal_service::list_products(pool.get_ref())?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, products)))
}
