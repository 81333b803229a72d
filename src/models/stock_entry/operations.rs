//! Database operations for the stock ledger.
//!
//! Movement semantics (entrada/saída, the non-negative invariant) live in
//! `services::stock_service`; this module only moves rows.

use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;

use crate::{
    config::db::Connection,
    error::ServiceError,
    models::stock_entry::{NewStockAdjustment, NewStockEntry, StockAdjustment, StockEntry},
    schema::{ajustes_estoque, estoque_produtos::dsl::*},
};

/// Lists the stock ledger, most recently moved first.
pub fn list_stock_entries(conn: &mut Connection) -> Result<Vec<StockEntry>, ServiceError> {
    estoque_produtos
        .order(data_ultima_movimentacao.desc())
        .load::<StockEntry>(conn)
        .map_err(|err| {
            log::error!("Failed to list stock entries: {}", err);
            ServiceError::internal_server_error("Failed to list stock entries".to_string())
                .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
        })
}

/// Retrieves a stock entry by its ID.
pub fn find_stock_entry_by_id(
    entry_id: i32,
    conn: &mut Connection,
) -> Result<StockEntry, ServiceError> {
    estoque_produtos
        .filter(id.eq(entry_id))
        .get_result::<StockEntry>(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ServiceError::not_found(format!("Estoque com id {} não encontrado", entry_id))
                    .with_context(|ctx| ctx.with_tag("estoque"))
            }
            _ => {
                log::error!("Failed to find stock entry: {}", err);
                ServiceError::internal_server_error("Failed to find stock entry".to_string())
                    .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
            }
        })
}

/// Locks and returns the ledger row for a (product, lote) pair, if one exists.
///
/// `SELECT ... FOR UPDATE` serializes concurrent movements against the same
/// row for the remainder of the surrounding transaction.
pub fn find_stock_row_for_update(
    product_id: i32,
    lote_value: &str,
    conn: &mut Connection,
) -> Result<Option<StockEntry>, ServiceError> {
    estoque_produtos
        .filter(produto_referencia_id.eq(product_id))
        .filter(lote.eq(lote_value))
        .for_update()
        .get_result::<StockEntry>(conn)
        .optional()
        .map_err(|err| {
            log::error!("Failed to lock stock row: {}", err);
            ServiceError::internal_server_error("Failed to lock stock row".to_string())
                .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
        })
}

/// Locks and returns a ledger row by its ID for a manual adjustment.
pub fn lock_stock_entry_by_id(
    entry_id: i32,
    conn: &mut Connection,
) -> Result<StockEntry, ServiceError> {
    estoque_produtos
        .filter(id.eq(entry_id))
        .for_update()
        .get_result::<StockEntry>(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ServiceError::not_found(format!("Estoque com id {} não encontrado", entry_id))
                    .with_context(|ctx| ctx.with_tag("estoque"))
            }
            _ => {
                log::error!("Failed to lock stock entry: {}", err);
                ServiceError::internal_server_error("Failed to lock stock entry".to_string())
                    .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
            }
        })
}

/// Inserts a fresh ledger row for a (product, lote) pair.
///
/// The insert races with concurrent imports of the same pair, so it goes
/// through `ON CONFLICT DO NOTHING`. `Ok(None)` means a concurrent
/// transaction created the row first; the caller re-reads it under lock and
/// applies its movement there.
pub fn insert_stock_entry(
    new_entry: NewStockEntry,
    conn: &mut Connection,
) -> Result<Option<StockEntry>, ServiceError> {
    diesel::insert_into(estoque_produtos)
        .values(&new_entry)
        .on_conflict((produto_referencia_id, lote))
        .do_nothing()
        .get_result::<StockEntry>(conn)
        .optional()
        .map_err(|err| {
            log::error!("Failed to insert stock entry: {}", err);
            ServiceError::internal_server_error("Failed to insert stock entry".to_string())
                .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
        })
}

/// Writes the new balance of a ledger row after a movement.
///
/// Recomputes `valor_total` from the new quantity and unit value and stamps
/// the movement time. A violation of the non-negative CHECK maps to
/// `UnprocessableEntity`.
pub fn update_stock_balance(
    entry_id: i32,
    new_quantity: Decimal,
    new_unit_value: Decimal,
    conn: &mut Connection,
) -> Result<StockEntry, ServiceError> {
    diesel::update(estoque_produtos.filter(id.eq(entry_id)))
        .set((
            quantidade_atual.eq(new_quantity),
            valor_unitario.eq(new_unit_value),
            valor_total.eq(new_quantity * new_unit_value),
            data_ultima_movimentacao.eq(Utc::now()),
        ))
        .get_result::<StockEntry>(conn)
        .map_err(|err| match &err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::CheckViolation,
                _,
            ) => ServiceError::unprocessable_entity(
                crate::constants::MESSAGE_ESTOQUE_INSUFICIENTE.to_string(),
            )
            .with_context(|ctx| ctx.with_tag("estoque")),
            _ => {
                log::error!("Failed to update stock balance: {}", err);
                ServiceError::internal_server_error("Failed to update stock balance".to_string())
                    .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
            }
        })
}

/// Records a manual adjustment in the audit trail.
pub fn insert_stock_adjustment(
    new_adjustment: NewStockAdjustment,
    conn: &mut Connection,
) -> Result<StockAdjustment, ServiceError> {
    diesel::insert_into(ajustes_estoque::table)
        .values(&new_adjustment)
        .get_result::<StockAdjustment>(conn)
        .map_err(|err| {
            log::error!("Failed to record stock adjustment: {}", err);
            ServiceError::internal_server_error("Failed to record stock adjustment".to_string())
                .with_context(|ctx| ctx.with_tag("estoque").with_detail(err.to_string()))
        })
}
