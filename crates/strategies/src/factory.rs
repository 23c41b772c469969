use crate::types::{StrategySettings, StrategyVariant};
use crate::{Alignment, Crossover, Error, Result, Strategy};

/// Builds the strategy selected by `settings.variant`.
pub fn create_strategy(settings: &StrategySettings) -> Result<Box<dyn Strategy>> {
    let (fast, mid, slow) = (settings.fast_period, settings.mid_period, settings.slow_period);
    if fast == 0 || fast >= mid || mid >= slow {
        return Err(Error::InvalidPeriods { fast, mid, slow });
    }

    let strategy: Box<dyn Strategy> = match settings.variant {
        StrategyVariant::Alignment => Box::new(Alignment::new(settings.clone())),
        StrategyVariant::Crossover => Box::new(Crossover::new(settings.clone())),
    };
    tracing::info!(strategy = strategy.name(), fast, mid, slow, "Strategy created.");

    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_variant_from_settings() {
        let mut settings = StrategySettings::default();
        assert_eq!(create_strategy(&settings).unwrap().name(), "Alignment");

        settings.variant = StrategyVariant::Crossover;
        assert_eq!(create_strategy(&settings).unwrap().name(), "Crossover");
    }

    #[test]
    fn rejects_unordered_periods() {
        let settings = StrategySettings {
            fast_period: 10,
            mid_period: 5,
            ..StrategySettings::default()
        };
        assert!(matches!(
            create_strategy(&settings),
            Err(Error::InvalidPeriods { fast: 10, mid: 5, slow: 20 })
        ));
    }
}
