//! Health probe.

use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;

use crate::config::db::Pool;
use crate::constants;
use crate::error::ServiceError;
use crate::models::response::ResponseBody;

#[derive(Serialize, Clone)]
enum Status {
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "unhealthy")]
    Unhealthy,
}

#[derive(Serialize)]
struct HealthResponse {
    status: Status,
    timestamp: String,
    database: Status,
}

fn check_database_health(pool: &Pool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    diesel::sql_query("SELECT 1").execute(&mut conn)?;
    Ok(())
}

/// GET /health
#[get("/health")]
pub async fn health(pool: web::Data<Pool>) -> Result<HttpResponse, ServiceError> {
    let database = match check_database_health(pool.get_ref()) {
        Ok(()) => Status::Healthy,
        Err(e) => {
            log::error!("Database health check failed: {}", e);
            Status::Unhealthy
        }
    };

    let response = HealthResponse {
        status: database.clone(),
        timestamp: Utc::now().to_rfc3339(),
        database,
    };

    Ok(HttpResponse::Ok().json(ResponseBody::new(constants::MESSAGE_OK, response)))
}
