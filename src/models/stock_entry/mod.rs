//! Stock ledger rows, one per (product, lote) pair.

use crate::schema::{ajustes_estoque, estoque_produtos};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = estoque_produtos)]
pub struct StockEntry {
    pub id: i32,
    pub produto_referencia_id: i32,
    pub fornecedor_id: Option<i32>,
    pub lote: String,
    pub quantidade_atual: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub data_validade: Option<NaiveDate>,
    pub bloqueado: bool,
    pub ativo: bool,
    pub data_ultima_movimentacao: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = estoque_produtos)]
pub struct NewStockEntry {
    pub produto_referencia_id: i32,
    pub fornecedor_id: Option<i32>,
    pub lote: String,
    pub quantidade_atual: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub data_validade: Option<NaiveDate>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = ajustes_estoque)]
pub struct StockAdjustment {
    pub id: i32,
    pub estoque_produto_id: i32,
    pub tipo_ajuste: String,
    pub quantidade_anterior: Decimal,
    pub quantidade_nova: Decimal,
    pub quantidade_ajuste: Decimal,
    pub motivo: Option<String>,
    pub data_ajuste: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = ajustes_estoque)]
pub struct NewStockAdjustment {
    pub estoque_produto_id: i32,
    pub tipo_ajuste: String,
    pub quantidade_anterior: Decimal,
    pub quantidade_nova: Decimal,
    pub quantidade_ajuste: Decimal,
    pub motivo: Option<String>,
}

pub mod operations;
