//! Stock ledger movements.
//!
//! All movements funnel through this module so the non-negative invariant is
//! enforced in exactly one place, both for document-driven movements during
//! an import and for manual adjustments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    config::db::{Connection, Pool},
    constants,
    error::{ServiceError, ServiceResult},
    models::{
        fiscal_document::{OPERACAO_COMPRA, OPERACAO_VENDA},
        stock_entry::{operations, NewStockAdjustment, NewStockEntry, StockEntry},
    },
    services::functional_patterns::{run_query, QueryReader, Validator},
    services::nfe_parser::NfeItem,
};

pub const AJUSTE_ENTRADA: &str = "ENTRADA";
pub const AJUSTE_SAIDA: &str = "SAIDA";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentRequest {
    pub tipo_ajuste: String,
    pub quantidade: Decimal,
    pub motivo: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentResponse {
    pub estoque: StockEntry,
    pub quantidade_anterior: Decimal,
    pub quantidade_nova: Decimal,
}

/// Lists the stock ledger.
pub fn list_stock(pool: &Pool) -> ServiceResult<Vec<StockEntry>> {
    run_query(
        QueryReader::new(operations::list_stock_entries),
        pool,
    )
}

/// Retrieves one ledger row.
pub fn find_stock_entry(entry_id: i32, pool: &Pool) -> ServiceResult<StockEntry> {
    run_query(
        QueryReader::new(move |conn| operations::find_stock_entry_by_id(entry_id, conn)),
        pool,
    )
}

/// Applies the stock movement of one invoice item inside the import
/// transaction.
///
/// A purchase creates the (product, lote) row when it does not exist yet and
/// otherwise increments it, taking the invoice's unit value as the current
/// one. A sale requires an existing row with enough balance; draining it
/// below zero is refused before the database CHECK would fire.
pub fn apply_item_movement(
    operation: &str,
    product_id: i32,
    supplier_id: i32,
    item: &NfeItem,
    conn: &mut Connection,
) -> Result<StockEntry, ServiceError> {
    // Rows are keyed by (product, lote); items without a lote share the
    // empty-string row.
    let lote_value = item.lote.clone().unwrap_or_default();
    let current = operations::find_stock_row_for_update(product_id, &lote_value, conn)?;

    match operation {
        OPERACAO_COMPRA => match current {
            Some(entry) => {
                let new_quantity = entry.quantidade_atual + item.quantidade;
                operations::update_stock_balance(entry.id, new_quantity, item.valor_unitario, conn)
            }
            None => {
                let inserted = operations::insert_stock_entry(
                    NewStockEntry {
                        produto_referencia_id: product_id,
                        fornecedor_id: Some(supplier_id),
                        lote: lote_value.clone(),
                        quantidade_atual: item.quantidade,
                        valor_unitario: item.valor_unitario,
                        valor_total: item.quantidade * item.valor_unitario,
                        data_validade: item.data_validade,
                    },
                    conn,
                )?;

                match inserted {
                    Some(entry) => Ok(entry),
                    // a concurrent import created the row first; move against it
                    None => {
                        let entry = operations::find_stock_row_for_update(
                            product_id,
                            &lote_value,
                            conn,
                        )?
                        .ok_or_else(|| {
                            ServiceError::internal_server_error(
                                "Failed to resolve stock row after conflict".to_string(),
                            )
                            .with_context(|ctx| {
                                ctx.with_tag("estoque").with_metadata(
                                    "produto_referencia_id",
                                    product_id.to_string(),
                                )
                            })
                        })?;
                        let new_quantity = entry.quantidade_atual + item.quantidade;
                        operations::update_stock_balance(
                            entry.id,
                            new_quantity,
                            item.valor_unitario,
                            conn,
                        )
                    }
                }
            }
        },
        OPERACAO_VENDA => {
            let entry = current.ok_or_else(|| {
                ServiceError::unprocessable_entity(
                    constants::MESSAGE_ESTOQUE_INSUFICIENTE.to_string(),
                )
                .with_context(|ctx| {
                    ctx.with_tag("estoque")
                        .with_metadata("produto_referencia_id", product_id.to_string())
                        .with_detail("Nenhum saldo em estoque para o produto/lote".to_string())
                })
            })?;

            let new_quantity = entry.quantidade_atual - item.quantidade;
            if new_quantity < Decimal::ZERO {
                return Err(ServiceError::unprocessable_entity(
                    constants::MESSAGE_ESTOQUE_INSUFICIENTE.to_string(),
                )
                .with_context(|ctx| {
                    ctx.with_tag("estoque")
                        .with_metadata("produto_referencia_id", product_id.to_string())
                        .with_metadata("saldo_atual", entry.quantidade_atual.to_string())
                        .with_metadata("quantidade_solicitada", item.quantidade.to_string())
                }));
            }

            operations::update_stock_balance(entry.id, new_quantity, entry.valor_unitario, conn)
        }
        other => Err(
            ServiceError::internal_server_error(format!("Tipo de operação desconhecido: {}", other))
                .with_context(|ctx| ctx.with_tag("estoque")),
        ),
    }
}

/// Applies a manual adjustment to one ledger row and records it in the audit
/// trail. The whole movement runs in a single transaction.
pub fn adjust_stock(
    entry_id: i32,
    request: StockAdjustmentRequest,
    pool: &Pool,
) -> ServiceResult<StockAdjustmentResponse> {
    validate_adjustment(&request)?;

    let tipo_ajuste = request.tipo_ajuste.trim().to_uppercase();
    let quantidade = request.quantidade;
    let motivo = request.motivo.clone();

    run_query(
        QueryReader::new(move |conn| {
            let entry = operations::lock_stock_entry_by_id(entry_id, conn)?;
            let quantidade_anterior = entry.quantidade_atual;

            let quantidade_nova = if tipo_ajuste == AJUSTE_ENTRADA {
                quantidade_anterior + quantidade
            } else {
                quantidade_anterior - quantidade
            };

            if quantidade_nova < Decimal::ZERO {
                return Err(ServiceError::unprocessable_entity(
                    constants::MESSAGE_ESTOQUE_INSUFICIENTE.to_string(),
                )
                .with_context(|ctx| {
                    ctx.with_tag("estoque")
                        .with_metadata("saldo_atual", quantidade_anterior.to_string())
                        .with_metadata("quantidade_solicitada", quantidade.to_string())
                }));
            }

            let updated = operations::update_stock_balance(
                entry.id,
                quantidade_nova,
                entry.valor_unitario,
                conn,
            )?;

            operations::insert_stock_adjustment(
                NewStockAdjustment {
                    estoque_produto_id: entry.id,
                    tipo_ajuste: tipo_ajuste.clone(),
                    quantidade_anterior,
                    quantidade_nova,
                    quantidade_ajuste: quantidade,
                    motivo: motivo.clone(),
                },
                conn,
            )?;

            Ok(StockAdjustmentResponse {
                estoque: updated,
                quantidade_anterior,
                quantidade_nova,
            })
        })
        .transaction(),
        pool,
    )
}

fn validate_adjustment(request: &StockAdjustmentRequest) -> ServiceResult<()> {
    Validator::new()
        .rule(|req: &StockAdjustmentRequest| {
            let tipo = req.tipo_ajuste.trim().to_uppercase();
            if tipo == AJUSTE_ENTRADA || tipo == AJUSTE_SAIDA {
                Ok(())
            } else {
                Err(
                    ServiceError::bad_request(constants::MESSAGE_TIPO_AJUSTE_INVALIDO.to_string())
                        .with_context(|ctx| {
                            ctx.with_tag("estoque")
                                .with_metadata("tipo_ajuste", req.tipo_ajuste.clone())
                        }),
                )
            }
        })
        .rule(|req: &StockAdjustmentRequest| {
            if req.quantidade > Decimal::ZERO {
                Ok(())
            } else {
                Err(
                    ServiceError::bad_request("Quantidade do ajuste deve ser positiva".to_string())
                        .with_context(|ctx| ctx.with_tag("estoque")),
                )
            }
        })
        .validate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_unknown_adjustment_type() {
        let request = StockAdjustmentRequest {
            tipo_ajuste: "TRANSFERENCIA".to_string(),
            quantidade: dec!(5),
            motivo: None,
        };
        let err = validate_adjustment(&request).unwrap_err();
        assert_eq!(err.message(), constants::MESSAGE_TIPO_AJUSTE_INVALIDO);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let request = StockAdjustmentRequest {
            tipo_ajuste: AJUSTE_SAIDA.to_string(),
            quantidade: dec!(0),
            motivo: None,
        };
        assert!(validate_adjustment(&request).is_err());
    }

    #[test]
    fn accepts_entrada_case_insensitively() {
        let request = StockAdjustmentRequest {
            tipo_ajuste: "entrada".to_string(),
            quantidade: dec!(1.5),
            motivo: Some("contagem".to_string()),
        };
        assert!(validate_adjustment(&request).is_ok());
    }
}
