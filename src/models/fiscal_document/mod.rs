//! Fiscal document (nota fiscal) and its line items.

use crate::schema::{notas_fiscais, notas_fiscais_itens};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const OPERACAO_COMPRA: &str = "COMPRA";
pub const OPERACAO_VENDA: &str = "VENDA";

pub const STATUS_PROCESSADA: &str = "PROCESSADA";

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = notas_fiscais)]
pub struct FiscalDocument {
    pub id: i32,
    pub chave_acesso: String,
    pub numero: String,
    pub serie: Option<String>,
    pub tipo_operacao: String,
    pub status: String,
    pub valor_total: Decimal,
    pub data_emissao: Option<DateTime<Utc>>,
    pub fornecedor_id: i32,
    pub importacao_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = notas_fiscais)]
pub struct NewFiscalDocument {
    pub chave_acesso: String,
    pub numero: String,
    pub serie: Option<String>,
    pub tipo_operacao: String,
    pub status: String,
    pub valor_total: Decimal,
    pub data_emissao: Option<DateTime<Utc>>,
    pub fornecedor_id: i32,
    pub importacao_id: Option<i32>,
}

#[derive(Queryable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = notas_fiscais_itens)]
pub struct FiscalDocumentItem {
    pub id: i32,
    pub nota_fiscal_id: i32,
    pub produto_referencia_id: i32,
    pub codigo_produto: String,
    pub ean: Option<String>,
    pub descricao: String,
    pub ncm: Option<String>,
    pub cfop: Option<String>,
    pub unidade_medida: Option<String>,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub lote: Option<String>,
    pub data_validade: Option<NaiveDate>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = notas_fiscais_itens)]
pub struct NewFiscalDocumentItem {
    pub nota_fiscal_id: i32,
    pub produto_referencia_id: i32,
    pub codigo_produto: String,
    pub ean: Option<String>,
    pub descricao: String,
    pub ncm: Option<String>,
    pub cfop: Option<String>,
    pub unidade_medida: Option<String>,
    pub quantidade: Decimal,
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub lote: Option<String>,
    pub data_validade: Option<NaiveDate>,
}

pub mod operations;
