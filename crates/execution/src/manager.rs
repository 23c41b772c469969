// In crates/execution/src/manager.rs

use crate::types::{Fill, Ledger, OrderRequest};
use crate::{Error, Executor, Result, SignalExecutor, SimulatedExecutor};
use core_types::{BotMode, ClosedTrade, Position, Side};
use risk::{ExitTrigger, RiskManager, RiskSettings};
use rust_decimal::Decimal;

/// Result of [`PositionManager::open`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened(Position),
    /// A live mode is selected: only the intent was emitted.
    Signalled {
        side: Side,
        price: Decimal,
        leverage: u8,
    },
}

/// What happened to the open position on one price tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub closed: Option<(ClosedTrade, ExitTrigger)>,
    /// The new break-even stop, when trailing activated on this tick.
    pub trailing_stop: Option<Decimal>,
}

fn executor_for(mode: BotMode) -> Box<dyn Executor> {
    if mode.is_simulated() {
        Box::new(SimulatedExecutor::new())
    } else {
        Box::new(SignalExecutor::new(mode))
    }
}

/// Owns the single active position, the simulated ledger and the risk rules.
pub struct PositionManager {
    risk: Box<dyn RiskManager>,
    executor: Box<dyn Executor>,
    ledger: Ledger,
    mode: BotMode,
}

impl PositionManager {
    pub fn new(risk: Box<dyn RiskManager>, ledger: Ledger, mode: BotMode) -> Self {
        Self {
            risk,
            executor: executor_for(mode),
            ledger,
            mode,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn position(&self) -> Option<&Position> {
        self.ledger.position()
    }

    pub fn mode(&self) -> BotMode {
        self.mode
    }

    /// Switches the executor. An open position is kept and can still be closed.
    pub fn set_mode(&mut self, mode: BotMode) {
        if mode != self.mode {
            self.executor = executor_for(mode);
            self.mode = mode;
            tracing::info!(%mode, executor = self.executor.name(), "Execution mode switched.");
        }
    }

    pub fn risk_settings(&self) -> &RiskSettings {
        self.risk.settings()
    }

    pub fn update_risk(&mut self, settings: RiskSettings) -> Result<()> {
        Ok(self.risk.update_settings(settings)?)
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
    }

    /// Opens a position, or emits an open intent in a live mode.
    ///
    /// Refused while a position is open. In simulation, refused when the
    /// balance cannot cover `margin`.
    pub async fn open(
        &mut self,
        side: Side,
        price: Decimal,
        margin: Decimal,
        leverage: u8,
        reason: &str,
    ) -> Result<OpenOutcome> {
        if let Some(existing) = self.ledger.position() {
            tracing::error!(id = %existing.id, "Refusing to open over an existing position.");
            return Err(Error::PositionAlreadyOpen {
                id: existing.id.clone(),
            });
        }

        if price <= Decimal::ZERO {
            return Err(Error::InvalidPrice(price));
        }

        let order = OrderRequest {
            side,
            price,
            margin_amount: margin,
            leverage,
            bracket: self.risk.bracket(side, price),
            reason: reason.to_string(),
        };

        match self.executor.open(&order, &mut self.ledger).await? {
            Fill::Opened(position) => Ok(OpenOutcome::Opened(position)),
            Fill::Signalled => Ok(OpenOutcome::Signalled {
                side,
                price,
                leverage,
            }),
        }
    }

    /// Closes the open position at `price` and settles it in the ledger.
    ///
    /// `bar_time` is the bar the close happened on; it blocks re-entry on that bar.
    pub async fn close(
        &mut self,
        price: Decimal,
        reason: &str,
        bar_time: Option<i64>,
    ) -> Result<ClosedTrade> {
        let position = self.ledger.position().cloned().ok_or(Error::NoOpenPosition)?;
        self.executor.close(&position, price, reason).await?;

        self.ledger
            .settle(price, reason, self.mode, bar_time)
            .ok_or(Error::NoOpenPosition)
    }

    pub async fn manual_close(
        &mut self,
        price: Decimal,
        bar_time: Option<i64>,
    ) -> Result<ClosedTrade> {
        self.close(price, "Manual Close", bar_time).await
    }

    /// Closes the position if `price` touched its take-profit or stop-loss.
    pub async fn check_tp_sl(
        &mut self,
        price: Decimal,
        bar_time: Option<i64>,
    ) -> Result<Option<(ClosedTrade, ExitTrigger)>> {
        let trigger = match self.ledger.position() {
            Some(position) => self.risk.check_exit(position, price),
            None => None,
        };

        match trigger {
            Some(trigger) => {
                let trade = self.close(price, trigger.reason(), bar_time).await?;
                Ok(Some((trade, trigger)))
            }
            None => Ok(None),
        }
    }

    /// Moves the stop to break-even once the price has run far enough.
    /// Returns the new stop when it moved.
    pub fn check_trailing(&mut self, price: Decimal) -> Option<Decimal> {
        let position = self.ledger.position_mut()?;
        let new_stop = self.risk.trailing_stop(position, price)?;

        position.stop_loss = new_stop;
        position.trailing_active = true;
        tracing::info!(id = %position.id, stop_loss = %new_stop, "Trailing stop activated.");
        Some(new_stop)
    }

    /// Per-tick risk pass: hard TP/SL first, then trailing if still open.
    pub async fn on_tick(&mut self, price: Decimal, bar_time: Option<i64>) -> Result<TickOutcome> {
        let closed = self.check_tp_sl(price, bar_time).await?;
        let trailing_stop = if closed.is_none() {
            self.check_trailing(price)
        } else {
            None
        };
        Ok(TickOutcome {
            closed,
            trailing_stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk::BracketRiskManager;
    use rust_decimal_macros::dec;

    fn manager(balance: Decimal, trailing: bool, mode: BotMode) -> PositionManager {
        let risk = BracketRiskManager::new(RiskSettings {
            take_profit_percent: dec!(0.5),
            stop_loss_percent: dec!(0.3),
            trailing_stop_enabled: trailing,
        })
        .unwrap();
        PositionManager::new(Box::new(risk), Ledger::new(balance, 100), mode)
    }

    #[tokio::test]
    async fn long_round_trip_pays_leveraged_pnl() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 10, "test")
            .await
            .unwrap();
        assert_eq!(pm.ledger().balance(), dec!(9900));

        let trade = pm.close(dec!(20100), "Take Profit", Some(60)).await.unwrap();

        assert_eq!(trade.pnl, dec!(5.00));
        assert_eq!(trade.pnl_percent, dec!(5));
        assert_eq!(pm.ledger().balance(), dec!(10005));
        assert_eq!(pm.ledger().last_close_bar(), Some(60));
        assert!(pm.position().is_none());
        assert_eq!(pm.ledger().history().len(), 1);
    }

    #[tokio::test]
    async fn short_profits_when_price_falls() {
        let mut pm = manager(dec!(1000), false, BotMode::Simulated);
        pm.open(Side::Short, dec!(20000), dec!(100), 2, "test")
            .await
            .unwrap();

        let trade = pm.close(dec!(19800), "Signal", None).await.unwrap();

        assert_eq!(trade.pnl, dec!(2));
        assert_eq!(trade.pnl_percent, dec!(2));
        assert_eq!(pm.ledger().balance(), dec!(1002));
    }

    #[tokio::test]
    async fn large_leveraged_loss_can_drive_balance_negative() {
        let mut pm = manager(dec!(100), false, BotMode::Simulated);
        pm.open(Side::Long, dec!(100), dec!(100), 125, "test")
            .await
            .unwrap();

        pm.close(dec!(98), "Stop Loss", None).await.unwrap();

        // 100 * 125 * -0.02 = -250, credit 100 - 250.
        assert_eq!(pm.ledger().balance(), dec!(-150));
    }

    #[tokio::test]
    async fn open_over_existing_position_is_refused() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 1, "first")
            .await
            .unwrap();
        let id = pm.position().unwrap().id.clone();

        let err = pm
            .open(Side::Short, dec!(20000), dec!(100), 1, "second")
            .await
            .unwrap_err();

        assert_eq!(err, Error::PositionAlreadyOpen { id: id.clone() });
        assert_eq!(pm.position().unwrap().id, id);
        assert_eq!(pm.ledger().balance(), dec!(9900));
    }

    #[tokio::test]
    async fn open_at_non_positive_price_is_refused() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);

        let err = pm
            .open(Side::Short, Decimal::ZERO, dec!(100), 10, "test")
            .await
            .unwrap_err();

        assert_eq!(err, Error::InvalidPrice(Decimal::ZERO));
        assert!(pm.position().is_none());
        assert_eq!(pm.ledger().balance(), dec!(10000));
    }

    #[tokio::test]
    async fn live_mode_open_only_signals() {
        let mut pm = manager(dec!(10000), false, BotMode::LiveA);
        let outcome = pm
            .open(Side::Long, dec!(20000), dec!(100), 3, "test")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            OpenOutcome::Signalled {
                side: Side::Long,
                price: dec!(20000),
                leverage: 3
            }
        );
        assert!(pm.position().is_none());
        assert_eq!(pm.ledger().balance(), dec!(10000));
    }

    #[tokio::test]
    async fn close_in_live_mode_settles_simulated_position() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 1, "test")
            .await
            .unwrap();
        pm.set_mode(BotMode::LiveB);

        let trade = pm.manual_close(dec!(20000), Some(120)).await.unwrap();

        assert_eq!(trade.mode, BotMode::LiveB);
        assert_eq!(trade.close_reason, "Manual Close");
        assert_eq!(pm.ledger().balance(), dec!(10000));
    }

    #[tokio::test]
    async fn close_without_position_is_an_error() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);
        assert_eq!(
            pm.manual_close(dec!(1), None).await.unwrap_err(),
            Error::NoOpenPosition
        );
    }

    #[tokio::test]
    async fn tick_closes_on_take_profit_before_trailing() {
        let mut pm = manager(dec!(10000), true, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 1, "test")
            .await
            .unwrap();

        let outcome = pm.on_tick(dec!(20100), Some(60)).await.unwrap();

        let (trade, trigger) = outcome.closed.unwrap();
        assert_eq!(trigger, ExitTrigger::TakeProfit);
        assert_eq!(trade.close_reason, "Take Profit");
        assert_eq!(outcome.trailing_stop, None);
    }

    #[tokio::test]
    async fn trailing_then_break_even_stop() {
        let mut pm = manager(dec!(10000), true, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 1, "test")
            .await
            .unwrap();

        let outcome = pm.on_tick(dec!(20060), Some(60)).await.unwrap();
        assert_eq!(outcome.trailing_stop, Some(dec!(20010)));
        assert!(pm.position().unwrap().trailing_active);

        // Falling back below the new stop closes as a stop loss in profit.
        let outcome = pm.on_tick(dec!(20005), Some(60)).await.unwrap();
        let (trade, trigger) = outcome.closed.unwrap();
        assert_eq!(trigger, ExitTrigger::StopLoss);
        assert!(trade.pnl > dec!(0));
    }

    #[tokio::test]
    async fn reset_restores_initial_balance() {
        let mut pm = manager(dec!(10000), false, BotMode::Simulated);
        pm.open(Side::Long, dec!(20000), dec!(100), 1, "test")
            .await
            .unwrap();
        pm.close(dec!(19000), "Stop Loss", Some(60)).await.unwrap();

        pm.reset();

        assert_eq!(pm.ledger().balance(), dec!(10000));
        assert_eq!(pm.ledger().history().len(), 0);
        assert!(pm.position().is_none());
    }
}
