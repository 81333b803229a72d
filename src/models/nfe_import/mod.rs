//! Import attempt audit record. One row per upload, kept whether the
//! pipeline succeeds or not.

use crate::schema::importacoes_nfe;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub const IMPORT_STATUS_PROCESSANDO: &str = "PROCESSANDO";
pub const IMPORT_STATUS_CONCLUIDA: &str = "CONCLUIDA";
pub const IMPORT_STATUS_ERRO: &str = "ERRO";

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = importacoes_nfe)]
pub struct NfeImport {
    pub id: i32,
    pub nome_arquivo: String,
    pub tamanho_arquivo: i64,
    pub status: String,
    pub observacoes: Option<String>,
    pub log_processamento: Option<String>,
    pub erros_processamento: Option<String>,
    pub quantidade_itens_processados: i32,
    pub quantidade_inconsistencias: i32,
    pub data_inicio: DateTime<Utc>,
    pub data_fim: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = importacoes_nfe)]
pub struct NewNfeImport {
    pub nome_arquivo: String,
    pub tamanho_arquivo: i64,
    pub status: String,
    pub observacoes: Option<String>,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = importacoes_nfe)]
pub struct NfeImportOutcome {
    pub status: Option<String>,
    pub log_processamento: Option<String>,
    pub erros_processamento: Option<String>,
    pub quantidade_itens_processados: Option<i32>,
    pub quantidade_inconsistencias: Option<i32>,
    pub data_fim: Option<DateTime<Utc>>,
}

pub mod operations;
