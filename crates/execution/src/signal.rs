// In crates/execution/src/signal.rs

use crate::types::{Fill, Ledger, OrderRequest};
use crate::{Executor, Result};
use async_trait::async_trait;
use core_types::{BotMode, Position};
use rust_decimal::Decimal;

/// An executor for the live modes that only announces what it would do.
///
/// No order ever leaves the process and the ledger is left untouched.
#[derive(Debug, Clone, Copy)]
pub struct SignalExecutor {
    mode: BotMode,
}

impl SignalExecutor {
    pub fn new(mode: BotMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Executor for SignalExecutor {
    fn name(&self) -> &'static str {
        "SignalExecutor"
    }

    async fn open(&mut self, order: &OrderRequest, _ledger: &mut Ledger) -> Result<Fill> {
        tracing::warn!(
            mode = %self.mode,
            side = %order.side,
            price = %order.price,
            leverage = order.leverage,
            "Open signal emitted; no order placed."
        );
        Ok(Fill::Signalled)
    }

    async fn close(&mut self, position: &Position, price: Decimal, reason: &str) -> Result<()> {
        tracing::warn!(
            mode = %self.mode,
            id = %position.id,
            side = %position.side,
            %price,
            reason,
            "Close signal emitted; no order placed."
        );
        Ok(())
    }
}
