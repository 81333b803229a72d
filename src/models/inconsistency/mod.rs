//! Inconsistencies detected during import. Advisory only: they never block
//! the import that raised them.

use crate::schema::inconsistencias;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const SEVERIDADE_BAIXA: &str = "BAIXA";
pub const SEVERIDADE_MEDIA: &str = "MEDIA";
pub const SEVERIDADE_ALTA: &str = "ALTA";

pub const STATUS_PENDENTE: &str = "PENDENTE";

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = inconsistencias)]
pub struct Inconsistency {
    pub id: i32,
    pub nota_fiscal_id: i32,
    pub item_id: Option<i32>,
    pub tipo: String,
    pub descricao: String,
    pub severidade: String,
    pub status: String,
    pub data_deteccao: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = inconsistencias)]
pub struct NewInconsistency {
    pub nota_fiscal_id: i32,
    pub item_id: Option<i32>,
    pub tipo: String,
    pub descricao: String,
    pub severidade: String,
    pub status: String,
}

impl NewInconsistency {
    pub fn new(
        document_id: i32,
        item_id: Option<i32>,
        tipo: &str,
        descricao: String,
        severidade: &str,
    ) -> NewInconsistency {
        NewInconsistency {
            nota_fiscal_id: document_id,
            item_id,
            tipo: tipo.to_string(),
            descricao,
            severidade: severidade.to_string(),
            status: STATUS_PENDENTE.to_string(),
        }
    }
}

pub mod operations;
