// In crates/risk/src/bracket_manager.rs

use crate::types::{Bracket, ExitTrigger, RiskSettings};
use crate::{Result, RiskManager};
use core_types::{Position, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Share of the entry-to-take-profit distance the price must cover before the
/// stop is moved to break-even.
const TRAILING_TRIGGER_RATIO: Decimal = dec!(0.5);

/// Break-even buffer applied to the entry price when trailing activates.
const BREAK_EVEN_BUFFER: Decimal = dec!(0.0005);

/// A fixed-percentage bracket with an optional one-shot break-even stop.
///
/// This manager implements three rules:
/// 1. Take-profit and stop-loss sit a configured percentage away from entry.
/// 2. Take-profit is checked before stop-loss on every price.
/// 3. Once the price covers half the take-profit distance, the stop moves to
///    entry plus a small buffer, exactly once per position.
#[derive(Debug, Clone)]
pub struct BracketRiskManager {
    /// The configuration for this risk manager instance.
    settings: RiskSettings,
}

impl BracketRiskManager {
    /// Creates a new `BracketRiskManager` instance from its settings.
    pub fn new(settings: RiskSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }
}

impl RiskManager for BracketRiskManager {
    fn name(&self) -> &'static str {
        "BracketRiskManager"
    }

    fn settings(&self) -> &RiskSettings {
        &self.settings
    }

    fn update_settings(&mut self, settings: RiskSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    fn bracket(&self, side: Side, entry_price: Decimal) -> Bracket {
        let tp = self.settings.take_profit_percent / dec!(100);
        let sl = self.settings.stop_loss_percent / dec!(100);

        match side {
            Side::Long => Bracket {
                take_profit: entry_price * (Decimal::ONE + tp),
                stop_loss: entry_price * (Decimal::ONE - sl),
            },
            Side::Short => Bracket {
                take_profit: entry_price * (Decimal::ONE - tp),
                stop_loss: entry_price * (Decimal::ONE + sl),
            },
        }
    }

    fn check_exit(&self, position: &Position, price: Decimal) -> Option<ExitTrigger> {
        let (tp_hit, sl_hit) = match position.side {
            Side::Long => (price >= position.take_profit, price <= position.stop_loss),
            Side::Short => (price <= position.take_profit, price >= position.stop_loss),
        };

        if tp_hit {
            Some(ExitTrigger::TakeProfit)
        } else if sl_hit {
            Some(ExitTrigger::StopLoss)
        } else {
            None
        }
    }

    fn trailing_stop(&self, position: &Position, price: Decimal) -> Option<Decimal> {
        if !self.settings.trailing_stop_enabled || position.trailing_active {
            return None;
        }

        let trigger_distance =
            (position.take_profit - position.entry_price).abs() * TRAILING_TRIGGER_RATIO;

        match position.side {
            Side::Long if price >= position.entry_price + trigger_distance => {
                Some(position.entry_price * (Decimal::ONE + BREAK_EVEN_BUFFER))
            }
            Side::Short if price <= position.entry_price - trigger_distance => {
                Some(position.entry_price * (Decimal::ONE - BREAK_EVEN_BUFFER))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::Utc;

    fn manager(trailing: bool) -> BracketRiskManager {
        BracketRiskManager::new(RiskSettings {
            take_profit_percent: dec!(0.5),
            stop_loss_percent: dec!(0.3),
            trailing_stop_enabled: trailing,
        })
        .unwrap()
    }

    fn position(side: Side, entry: Decimal, take_profit: Decimal, stop_loss: Decimal) -> Position {
        Position {
            id: "test".to_string(),
            side,
            entry_price: entry,
            take_profit,
            stop_loss,
            margin_amount: dec!(100),
            leverage: 1,
            opened_at: Utc::now(),
            trigger_reason: "test".to_string(),
            trailing_active: false,
        }
    }

    #[test]
    fn long_bracket_sits_around_entry() {
        let bracket = manager(false).bracket(Side::Long, dec!(20000));
        assert_eq!(bracket.take_profit, dec!(20100));
        assert_eq!(bracket.stop_loss, dec!(19940));
    }

    #[test]
    fn short_bracket_is_mirrored() {
        let bracket = manager(false).bracket(Side::Short, dec!(20000));
        assert_eq!(bracket.take_profit, dec!(19900));
        assert_eq!(bracket.stop_loss, dec!(20060));
    }

    #[test]
    fn exits_trigger_on_touch() {
        let rm = manager(false);
        let long = position(Side::Long, dec!(20000), dec!(20100), dec!(19940));

        assert_eq!(rm.check_exit(&long, dec!(20050)), None);
        assert_eq!(rm.check_exit(&long, dec!(20100)), Some(ExitTrigger::TakeProfit));
        assert_eq!(rm.check_exit(&long, dec!(19940)), Some(ExitTrigger::StopLoss));

        let short = position(Side::Short, dec!(20000), dec!(19900), dec!(20060));
        assert_eq!(rm.check_exit(&short, dec!(19899)), Some(ExitTrigger::TakeProfit));
        assert_eq!(rm.check_exit(&short, dec!(20061)), Some(ExitTrigger::StopLoss));
    }

    #[test]
    fn take_profit_wins_when_both_legs_are_satisfied() {
        // A stop above the target can only come from a misconfigured bracket.
        let broken = position(Side::Long, dec!(20000), dec!(20010), dec!(20050));
        assert_eq!(
            manager(false).check_exit(&broken, dec!(20020)),
            Some(ExitTrigger::TakeProfit)
        );
    }

    #[test]
    fn trailing_moves_stop_to_break_even_once() {
        let rm = manager(true);
        let mut long = position(Side::Long, dec!(20000), dec!(20100), dec!(19940));

        assert_eq!(rm.trailing_stop(&long, dec!(20049)), None);
        let new_sl = rm.trailing_stop(&long, dec!(20050)).unwrap();
        assert_eq!(new_sl, dec!(20010));

        long.stop_loss = new_sl;
        long.trailing_active = true;
        // Once active nothing moves it again, whatever the price does.
        assert_eq!(rm.trailing_stop(&long, dec!(19000)), None);
        assert_eq!(rm.trailing_stop(&long, dec!(21000)), None);
    }

    #[test]
    fn short_trailing_uses_buffer_below_entry() {
        let rm = manager(true);
        let short = position(Side::Short, dec!(20000), dec!(19900), dec!(20060));
        assert_eq!(rm.trailing_stop(&short, dec!(19951)), None);
        assert_eq!(rm.trailing_stop(&short, dec!(19950)), Some(dec!(19990)));
    }

    #[test]
    fn trailing_disabled_never_fires() {
        let long = position(Side::Long, dec!(20000), dec!(20100), dec!(19940));
        assert_eq!(manager(false).trailing_stop(&long, dec!(20099)), None);
    }

    #[test]
    fn rejects_non_positive_percentages() {
        let mut rm = manager(false);
        let err = rm
            .update_settings(RiskSettings {
                take_profit_percent: dec!(0),
                stop_loss_percent: dec!(0.3),
                trailing_stop_enabled: false,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameters(_)));
        assert_eq!(rm.settings().take_profit_percent, dec!(0.5));
    }
}
