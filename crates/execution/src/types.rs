// In crates/execution/src/types.rs

use core_types::{BotMode, ClosedTrade, Position, Side};
use chrono::Utc;
use risk::Bracket;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

/// A request to open a position, fully priced by the risk manager.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub price: Decimal,
    pub margin_amount: Decimal,
    pub leverage: u8,
    pub bracket: Bracket,
    pub reason: String,
}

/// What an executor did with an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// A position now exists in the ledger.
    Opened(Position),
    /// Only the intent was emitted; no position and no balance change.
    Signalled,
}

/// Represents the state of the simulated trading account.
///
/// Holds the balance, the single open position and the capped trade history
/// (newest first).
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_balance: Decimal,
    balance: Decimal,
    position: Option<Position>,
    history: VecDeque<ClosedTrade>,
    max_history: usize,
    last_close_bar: Option<i64>,
}

impl Ledger {
    /// Creates a new ledger with an initial cash balance.
    pub fn new(initial_balance: Decimal, max_history: usize) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            position: None,
            history: VecDeque::new(),
            max_history: max_history.max(1),
            last_close_bar: None,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &ClosedTrade> {
        self.history.iter()
    }

    pub fn last_close_bar(&self) -> Option<i64> {
        self.last_close_bar
    }

    /// Takes `margin` out of the balance, refusing to go below zero.
    pub(crate) fn debit(&mut self, margin: Decimal) -> crate::Result<()> {
        if self.balance < margin {
            return Err(crate::Error::InsufficientFunds {
                balance: self.balance,
                required: margin,
            });
        }
        self.balance -= margin;
        Ok(())
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub(crate) fn position_mut(&mut self) -> Option<&mut Position> {
        self.position.as_mut()
    }

    /// Realizes the open position at `price`.
    ///
    /// Credits margin plus PnL, records the trade and remembers `bar_time` as
    /// the closing bar. Returns `None` when nothing is open.
    pub(crate) fn settle(
        &mut self,
        price: Decimal,
        reason: &str,
        mode: BotMode,
        bar_time: Option<i64>,
    ) -> Option<ClosedTrade> {
        let position = self.position.take()?;
        let entry = position.entry_price;

        let price_move = match position.side {
            Side::Long => price - entry,
            Side::Short => entry - price,
        };
        let price_change = price_move.checked_div(entry).unwrap_or_else(|| {
            tracing::error!(id = %position.id, %entry, "Cannot price a move from this entry; settling flat.");
            Decimal::ZERO
        });
        let leverage = Decimal::from(position.leverage);
        let pnl = position.margin_amount * leverage * price_change;
        let pnl_percent = price_change * leverage * dec!(100);

        self.balance += position.margin_amount + pnl;
        if bar_time.is_some() {
            self.last_close_bar = bar_time;
        }

        let trade = ClosedTrade {
            position,
            exit_price: price,
            closed_at: Utc::now(),
            pnl,
            pnl_percent,
            close_reason: reason.to_string(),
            mode,
        };
        self.history.push_front(trade.clone());
        self.history.truncate(self.max_history);

        Some(trade)
    }

    /// Restores the initial balance and forgets the position and history.
    /// The re-entry cooldown survives a reset.
    pub fn reset(&mut self) {
        self.balance = self.initial_balance;
        self.position = None;
        self.history.clear();
    }
}
