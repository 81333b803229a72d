//! Product reference catalog, keyed by EAN when the invoice carries one.

use crate::schema::produtos_referencia;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = produtos_referencia)]
pub struct ProductReference {
    pub id: i32,
    pub codigo_interno: String,
    pub ean: Option<String>,
    pub nome: String,
    pub ncm: Option<String>,
    pub unidade_medida: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = produtos_referencia)]
pub struct NewProductReference {
    pub codigo_interno: String,
    pub ean: Option<String>,
    pub nome: String,
    pub ncm: Option<String>,
    pub unidade_medida: String,
    pub status: Option<String>,
}

pub mod operations;
