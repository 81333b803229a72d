//! Inconsistency read endpoints.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    config::db::Pool, constants, error::ServiceError, models::response::ResponseBody,
    services::inconsistency_service,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InconsistencyFilter {
    pub nota_fiscal_id: Option<i32>,
}

/// GET api/fiscal/inconsistencias?notaFiscalId={id}
pub async fn list(
    filter: web::Query<InconsistencyFilter>,
    pool: web::Data<Pool>,
) -> Result<HttpResponse, ServiceError> {
    let inconsistencies =
        inconsistency_service::list_inconsistencies(filter.nota_fiscal_id, pool.get_ref())?;
    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, inconsistencies)))
}
