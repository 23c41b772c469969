// In crates/engine/src/bot.rs

use crate::config::EngineConfig;
use crate::{Error, Result};
use analytics::AnalyticsEngine;
use core_types::{BarUpdate, BotParameters, Candle, ClosedTrade, Interval, Side, Signal};
use events::{Command, ConnectionStatus, EngineSnapshot, LogBook, snapshot::SmaSnapshot};
use execution::{Ledger, OpenOutcome, PositionManager};
use market_data::{CandleStore, IndicatorSet};
use risk::{BracketRiskManager, RiskSettings};
use rust_decimal::Decimal;
use strategies::{MarketContext, Strategy, StrategySettings};

/// What the caller must do after a command has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    None,
    /// The feed must be restarted for the new interval.
    IntervalChanged(Interval),
}

fn signed(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}

/// The single-writer trading state for one symbol.
///
/// Owns the candle store, the indicators, the strategy, the position manager
/// and the activity log. Every mutation goes through [`TradingBot::on_bar`],
/// [`TradingBot::bootstrap`] or [`TradingBot::apply_command`].
pub struct TradingBot {
    config: EngineConfig,
    params: BotParameters,
    is_active: bool,
    store: CandleStore,
    indicators: IndicatorSet,
    strategy: Box<dyn Strategy>,
    positions: PositionManager,
    log: LogBook,
    analytics: AnalyticsEngine,
    /// Bar on which an open intent was last emitted in a live mode.
    last_signal_bar: Option<i64>,
}

impl TradingBot {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let params = config.parameters.clone();
        params.validate()?;

        let strategy = strategies::create_strategy(&config.strategy)?;
        let risk = BracketRiskManager::new(RiskSettings::from(&params))?;
        let positions = PositionManager::new(
            Box::new(risk),
            Ledger::new(config.initial_balance, config.max_trade_history),
            params.mode,
        );

        let mut log = LogBook::new(config.max_log_entries, config.log_offset);
        log.info(format!(
            "{} ready on {} {} ({} strategy)",
            config.symbol,
            params.interval,
            params.mode,
            strategy.name()
        ));

        Ok(Self {
            store: CandleStore::new(config.max_candles),
            indicators: indicator_set(&config.strategy),
            is_active: config.auto_start,
            params,
            strategy,
            positions,
            log,
            analytics: AnalyticsEngine::new(),
            last_signal_bar: None,
            config,
        })
    }

    pub fn parameters(&self) -> &BotParameters {
        &self.params
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn candles(&self) -> &[Candle] {
        self.store.candles()
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    pub fn log(&self) -> &LogBook {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogBook {
        &mut self.log
    }

    /// Drops all market data, keeping the position and the account.
    pub fn reset_market(&mut self) {
        self.store = CandleStore::new(self.config.max_candles);
        self.indicators = indicator_set(&self.config.strategy);
        self.last_signal_bar = None;
    }

    /// Replaces the candle store with fetched history and rebuilds the indicators.
    pub fn bootstrap(&mut self, history: Vec<Candle>) {
        let fetched = history.len();
        let kept = self.store.bootstrap(history);
        self.indicators.rebuild(self.store.candles());
        tracing::info!(fetched, kept, "Candle store bootstrapped.");
        self.log.info(format!("Loaded {kept} historical candles"));
    }

    /// Runs the per-update pipeline: merge, indicators, strategy, risk.
    ///
    /// Returns `false` when the update was stale and nothing changed.
    pub async fn on_bar(&mut self, update: BarUpdate) -> bool {
        let candle = update.candle;
        let outcome = self.store.merge(candle);
        if !outcome.changed() {
            tracing::warn!(time = candle.time, ?outcome, "Dropping out-of-order bar update.");
            return false;
        }
        self.indicators.apply(self.store.candles(), outcome);

        if self.is_active {
            self.evaluate_strategy(candle.close, candle.time).await;
        }
        if self.positions.position().is_some() {
            self.run_risk(candle.close, candle.time).await;
        }
        true
    }

    async fn evaluate_strategy(&mut self, price: Decimal, bar_time: i64) {
        let signal = {
            let ctx = MarketContext {
                bar_time,
                price,
                fast: self.indicators.fast.points(),
                mid: self.indicators.mid.points(),
                slow: self.indicators.slow.points(),
                position: self.positions.position(),
                last_close_bar: self.positions.ledger().last_close_bar(),
                shorts_allowed: self.params.shorts_allowed(),
                signal_exit_enabled: self.params.signal_exit_enabled,
            };
            self.strategy.assess(&ctx)
        };

        match signal {
            Signal::Hold => {}
            Signal::GoLong { reason } => self.open(Side::Long, price, bar_time, &reason).await,
            Signal::GoShort { reason } => self.open(Side::Short, price, bar_time, &reason).await,
            Signal::Close { reason } => {
                if let Err(e) = self.close(price, &reason, Some(bar_time)).await {
                    tracing::error!(error = %e, "Signal exit failed.");
                }
            }
        }
    }

    async fn run_risk(&mut self, price: Decimal, bar_time: i64) {
        match self.positions.on_tick(price, Some(bar_time)).await {
            Ok(outcome) => {
                if let Some((trade, _)) = outcome.closed {
                    self.log_close(&trade);
                }
                if let Some(stop) = outcome.trailing_stop {
                    self.log.info(format!(
                        "Trailing Stop Activated: SL moved to Break Even ({stop:.2})"
                    ));
                }
            }
            Err(e) => self.log.error(format!("Risk check failed: {e}")),
        }
    }

    async fn open(&mut self, side: Side, price: Decimal, bar_time: i64, reason: &str) {
        if !self.params.mode.is_simulated() && self.last_signal_bar == Some(bar_time) {
            return;
        }

        let result = self
            .positions
            .open(side, price, self.params.margin_amount, self.params.leverage, reason)
            .await;

        match result {
            Ok(OpenOutcome::Opened(position)) => {
                self.log.success(format!(
                    "SIM {} OPENED @ {:.2} (x{}). TP: {}%, SL: {}%",
                    position.side,
                    position.entry_price,
                    position.leverage,
                    self.params.take_profit_percent,
                    self.params.stop_loss_percent
                ));
            }
            Ok(OpenOutcome::Signalled { side, price, leverage }) => {
                self.last_signal_bar = Some(bar_time);
                self.log
                    .warning(format!("SIGNAL: Open {side} @ {price:.2} (x{leverage})"));
            }
            Err(execution::Error::InsufficientFunds { .. }) => {
                self.log.error("SIM Error: Insufficient funds");
            }
            Err(e) => self.log.error(format!("Open {side} refused: {e}")),
        }
    }

    async fn close(
        &mut self,
        price: Decimal,
        reason: &str,
        bar_time: Option<i64>,
    ) -> Result<ClosedTrade> {
        let trade = self.positions.close(price, reason, bar_time).await?;
        self.log_close(&trade);
        Ok(trade)
    }

    fn log_close(&mut self, trade: &ClosedTrade) {
        if !trade.mode.is_simulated() {
            self.log.warning(format!(
                "SIGNAL: Close {} @ {:.2} ({})",
                trade.side(),
                trade.exit_price,
                trade.close_reason
            ));
        }

        let message = format!(
            "SIM {} CLOSED @ {:.2}. PnL: {} ({:.2}%)",
            trade.side(),
            trade.exit_price,
            signed(trade.pnl),
            trade.pnl_percent
        );
        if trade.pnl >= Decimal::ZERO {
            self.log.success(message);
        } else {
            self.log.error(message);
        }
    }

    /// Applies a user command. Rejected commands are logged and leave the
    /// state untouched.
    pub async fn apply_command(&mut self, command: Command) -> Result<CommandEffect> {
        let label = command.to_string();
        let result = self.try_apply(command).await;
        if let Err(e) = &result {
            self.log.error(format!("Command {label} rejected: {e}"));
        }
        result
    }

    async fn try_apply(&mut self, command: Command) -> Result<CommandEffect> {
        match command {
            Command::Start => {
                self.is_active = true;
                let context = if self.params.mode.is_simulated() {
                    "SIM Simulation".to_string()
                } else {
                    format!("{} ({})", self.params.mode, self.params.market_type)
                };
                self.log.success(format!("Bot STARTED on {context}"));
            }
            Command::Stop => {
                self.is_active = false;
                self.log.warning("Bot STOPPED");
            }
            Command::SetMode(mode) => {
                self.params.mode = mode;
                self.positions.set_mode(mode);
                self.is_active = false;
                self.last_signal_bar = None;
                self.log.info(format!("Switched to {mode} Mode"));
            }
            Command::SetMarketType(market_type) => {
                self.params.market_type = market_type;
                self.log.info(format!("Market set to {market_type}"));
            }
            Command::SetInterval(interval) => {
                if interval == self.params.interval {
                    return Ok(CommandEffect::None);
                }
                self.params.interval = interval;
                self.log.info(format!("Interval set to {interval}"));
                return Ok(CommandEffect::IntervalChanged(interval));
            }
            Command::SetMargin(margin) => {
                core_types::types::validate_margin(margin)?;
                self.params.margin_amount = margin;
                self.log.info(format!("Position size set to {margin}"));
            }
            Command::SetLeverage(leverage) => {
                core_types::types::validate_leverage(leverage)?;
                self.params.leverage = leverage;
                self.log.info(format!("Leverage set to x{leverage}"));
            }
            Command::SetTakeProfit(percent) => {
                self.update_risk(|p| p.take_profit_percent = percent)?;
                self.log.info(format!("Take profit set to {percent}%"));
            }
            Command::SetStopLoss(percent) => {
                self.update_risk(|p| p.stop_loss_percent = percent)?;
                self.log.info(format!("Stop loss set to {percent}%"));
            }
            Command::SetTrailing(enabled) => {
                self.update_risk(|p| p.trailing_stop_enabled = enabled)?;
                self.log.info(format!(
                    "Trailing stop {}",
                    if enabled { "enabled" } else { "disabled" }
                ));
            }
            Command::SetSignalExit(enabled) => {
                self.params.signal_exit_enabled = enabled;
                self.log.info(format!(
                    "Signal exit {}",
                    if enabled { "enabled" } else { "disabled" }
                ));
            }
            Command::ManualClose => {
                let last = self.store.last().ok_or(Error::NoMarketData)?;
                let (price, bar_time) = (last.close, last.time);
                if self.positions.position().is_none() {
                    return Err(execution::Error::NoOpenPosition.into());
                }
                self.close(price, "Manual Close", Some(bar_time)).await?;
            }
            Command::ResetSimulation => {
                self.positions.reset();
                self.log.info("SIM Balance & History reset");
            }
        }
        Ok(CommandEffect::None)
    }

    fn update_risk(&mut self, change: impl FnOnce(&mut BotParameters)) -> Result<()> {
        let mut next = self.params.clone();
        change(&mut next);
        next.validate()?;
        self.positions.update_risk(RiskSettings::from(&next))?;
        self.params = next;
        Ok(())
    }

    /// Builds the read-only view published to readers.
    pub fn snapshot(&self, version: u64, status: ConnectionStatus) -> EngineSnapshot {
        let ledger = self.positions.ledger();
        let history: Vec<ClosedTrade> = ledger.history().cloned().collect();

        EngineSnapshot {
            version,
            symbol: self.config.symbol.clone(),
            strategy: self.strategy.name().to_string(),
            status,
            is_active: self.is_active,
            parameters: self.params.clone(),
            balance: ledger.balance(),
            candles: self.store.candles().to_vec(),
            sma: SmaSnapshot {
                fast: self.indicators.fast.points().to_vec(),
                mid: self.indicators.mid.points().to_vec(),
                slow: self.indicators.slow.points().to_vec(),
            },
            position: ledger.position().cloned(),
            metrics: self.analytics.calculate(&history),
            history,
            logs: self.log.entries().cloned().collect(),
        }
    }
}

fn indicator_set(settings: &StrategySettings) -> IndicatorSet {
    IndicatorSet::new(settings.fast_period, settings.mid_period, settings.slow_period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use core_types::{BotMode, MarketType, Symbol};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn config() -> EngineConfig {
        EngineConfig {
            symbol: Symbol("BTCUSDT".to_string()),
            parameters: BotParameters {
                mode: BotMode::Simulated,
                market_type: MarketType::Futures,
                interval: Interval::OneMinute,
                margin_amount: dec!(100),
                leverage: 10,
                take_profit_percent: dec!(0.5),
                stop_loss_percent: dec!(0.3),
                trailing_stop_enabled: false,
                signal_exit_enabled: false,
            },
            strategy: StrategySettings::default(),
            initial_balance: dec!(10000),
            auto_start: true,
            max_candles: 1500,
            history_limit: 1000,
            reconnect_delay: Duration::from_secs(3),
            max_log_entries: 50,
            max_trade_history: 100,
            log_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn candle(time: i64, close: Decimal) -> Candle {
        Candle {
            time,
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    fn bar(time: i64, close: Decimal) -> BarUpdate {
        BarUpdate {
            candle: candle(time, close),
            is_closed: false,
        }
    }

    /// Twenty rising closes: every average stacks bullishly and the gap clears the filter.
    fn rising_history() -> Vec<Candle> {
        (0..20)
            .map(|i| candle(i * 60, dec!(20000) + Decimal::from(i * 10)))
            .collect()
    }

    fn last_log(bot: &TradingBot) -> String {
        bot.log().entries().next().unwrap().message.clone()
    }

    #[tokio::test]
    async fn zero_priced_bar_never_opens_a_position() {
        let mut bot = TradingBot::new(config()).unwrap();
        let falling = (0..20)
            .map(|i| candle(i * 60, dec!(20000) - Decimal::from(i * 10)))
            .collect();
        bot.bootstrap(falling);

        assert!(bot.on_bar(bar(1200, Decimal::ZERO)).await);

        assert!(bot.positions().position().is_none());
        assert_eq!(bot.positions().ledger().balance(), dec!(10000));
        assert!(last_log(&bot).starts_with("Open SHORT refused: Invalid price 0"));
    }

    #[tokio::test]
    async fn rising_market_opens_a_long() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());

        assert!(bot.on_bar(bar(1200, dec!(20300))).await);

        let position = bot.positions().position().unwrap();
        assert_eq!(position.side, Side::Long);
        assert_eq!(position.entry_price, dec!(20300));
        assert_eq!(bot.positions().ledger().balance(), dec!(9900));
        assert!(last_log(&bot).starts_with("SIM LONG OPENED @ 20300.00 (x10)"));
    }

    #[tokio::test]
    async fn inactive_bot_never_enters() {
        let mut cfg = config();
        cfg.auto_start = false;
        let mut bot = TradingBot::new(cfg).unwrap();
        bot.bootstrap(rising_history());

        bot.on_bar(bar(1200, dec!(20300))).await;

        assert!(bot.positions().position().is_none());
    }

    #[tokio::test]
    async fn take_profit_runs_even_when_stopped() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        bot.on_bar(bar(1200, dec!(20300))).await;
        bot.apply_command(Command::Stop).await.unwrap();

        // 20300 * 1.005 = 20401.5
        bot.on_bar(bar(1200, dec!(20402))).await;

        assert!(bot.positions().position().is_none());
        let trade = bot.positions().ledger().history().next().unwrap();
        assert_eq!(trade.close_reason, "Take Profit");
        assert!(last_log(&bot).starts_with("SIM LONG CLOSED @ 20402.00. PnL: +"));
    }

    #[tokio::test]
    async fn closing_bar_blocks_reentry_until_next_bar() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        bot.on_bar(bar(1200, dec!(20300))).await;
        bot.on_bar(bar(1200, dec!(20402))).await;
        assert!(bot.positions().position().is_none());

        // Still aligned on the same bar: cooldown holds.
        bot.on_bar(bar(1200, dec!(20410))).await;
        assert!(bot.positions().position().is_none());

        bot.on_bar(bar(1260, dec!(20420))).await;
        assert!(bot.positions().position().is_some());
    }

    #[tokio::test]
    async fn stale_update_changes_nothing() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        let before = bot.candles().to_vec();

        assert!(!bot.on_bar(bar(60, dec!(1))).await);
        assert_eq!(bot.candles(), before.as_slice());
    }

    #[tokio::test]
    async fn insufficient_funds_is_logged_without_position() {
        let mut cfg = config();
        cfg.initial_balance = dec!(50);
        let mut bot = TradingBot::new(cfg).unwrap();
        bot.bootstrap(rising_history());

        bot.on_bar(bar(1200, dec!(20300))).await;

        assert!(bot.positions().position().is_none());
        assert_eq!(last_log(&bot), "SIM Error: Insufficient funds");
        assert_eq!(bot.positions().ledger().balance(), dec!(50));
    }

    #[tokio::test]
    async fn live_mode_signals_once_per_bar() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.apply_command(Command::SetMode(BotMode::LiveA)).await.unwrap();
        assert!(!bot.is_active());
        bot.apply_command(Command::Start).await.unwrap();
        bot.bootstrap(rising_history());

        bot.on_bar(bar(1200, dec!(20300))).await;
        bot.on_bar(bar(1200, dec!(20310))).await;

        let signals = bot
            .log()
            .entries()
            .filter(|e| e.message.starts_with("SIGNAL: Open LONG"))
            .count();
        assert_eq!(signals, 1);
        assert!(bot.positions().position().is_none());
        assert_eq!(bot.positions().ledger().balance(), dec!(10000));
    }

    #[tokio::test]
    async fn invalid_leverage_is_rejected_and_logged() {
        let mut bot = TradingBot::new(config()).unwrap();

        let err = bot.apply_command(Command::SetLeverage(200)).await.unwrap_err();

        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(bot.parameters().leverage, 10);
        assert!(last_log(&bot).starts_with("Command setLeverage(200) rejected"));
    }

    #[tokio::test]
    async fn manual_close_uses_last_price() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        bot.on_bar(bar(1200, dec!(20300))).await;
        bot.on_bar(bar(1200, dec!(20290))).await;

        bot.apply_command(Command::ManualClose).await.unwrap();

        let trade = bot.positions().ledger().history().next().unwrap();
        assert_eq!(trade.close_reason, "Manual Close");
        assert_eq!(trade.exit_price, dec!(20290));
        // 100 * 10 * (-10 / 20300)
        assert!(trade.pnl < dec!(0));
        assert_eq!(
            bot.apply_command(Command::ManualClose).await.unwrap_err(),
            Error::Execution(execution::Error::NoOpenPosition)
        );
    }

    #[tokio::test]
    async fn reset_restores_balance_and_clears_history() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        bot.on_bar(bar(1200, dec!(20300))).await;
        bot.apply_command(Command::ManualClose).await.unwrap();

        bot.apply_command(Command::ResetSimulation).await.unwrap();

        let snapshot = bot.snapshot(7, ConnectionStatus::Live);
        assert_eq!(snapshot.balance, dec!(10000));
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.metrics.total_trades, 0);
        assert_eq!(snapshot.logs[0].message, "SIM Balance & History reset");
    }

    #[tokio::test]
    async fn interval_change_reports_effect_only_when_different() {
        let mut bot = TradingBot::new(config()).unwrap();
        assert_eq!(
            bot.apply_command(Command::SetInterval(Interval::OneMinute)).await.unwrap(),
            CommandEffect::None
        );
        assert_eq!(
            bot.apply_command(Command::SetInterval(Interval::FiveMinutes)).await.unwrap(),
            CommandEffect::IntervalChanged(Interval::FiveMinutes)
        );
        assert_eq!(bot.parameters().interval, Interval::FiveMinutes);
    }

    #[tokio::test]
    async fn snapshot_series_follow_the_store() {
        let mut bot = TradingBot::new(config()).unwrap();
        bot.bootstrap(rising_history());
        bot.on_bar(bar(1200, dec!(20300))).await;

        let snapshot = bot.snapshot(1, ConnectionStatus::Live);

        assert_eq!(snapshot.candles.len(), 21);
        assert_eq!(snapshot.sma.fast.len(), 17);
        assert_eq!(snapshot.sma.slow.len(), 2);
        assert_eq!(snapshot.sma.slow.last().unwrap().time, 1200);
        assert!(snapshot.position.is_some());
    }
}
