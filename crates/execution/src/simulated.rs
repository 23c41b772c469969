// In crates/execution/src/simulated.rs

use crate::types::{Fill, Ledger, OrderRequest};
use crate::{Executor, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::Position;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A short position id: the first group of a v4 UUID.
pub fn short_id() -> String {
    format!("{:08x}", Uuid::new_v4().as_fields().0)
}

/// Fills every order instantly at the requested price against the ledger.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "SimulatedExecutor"
    }

    async fn open(&mut self, order: &OrderRequest, ledger: &mut Ledger) -> Result<Fill> {
        ledger.debit(order.margin_amount)?;

        let position = Position {
            id: short_id(),
            side: order.side,
            entry_price: order.price,
            take_profit: order.bracket.take_profit,
            stop_loss: order.bracket.stop_loss,
            margin_amount: order.margin_amount,
            leverage: order.leverage,
            opened_at: Utc::now(),
            trigger_reason: order.reason.clone(),
            trailing_active: false,
        };
        ledger.set_position(position.clone());

        tracing::info!(
            id = %position.id,
            side = %position.side,
            price = %position.entry_price,
            margin = %position.margin_amount,
            "Simulated position opened."
        );
        Ok(Fill::Opened(position))
    }

    async fn close(&mut self, position: &Position, price: Decimal, reason: &str) -> Result<()> {
        tracing::info!(id = %position.id, %price, reason, "Simulated position closed.");
        Ok(())
    }
}
