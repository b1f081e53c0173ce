//! Factory system: converts configured names into runtime trait objects.
//!
//! Two registries with distinct namespaces: indicators (`create_indicators`)
//! and strategies (`create_strategy`). Registration is explicit: every public
//! name appears once in the match tables below and once in the listing
//! functions, and a test keeps the two in sync.

use crate::indicators::{
    Donchian, Ema, Indicator, Lag, LogReturn, Macd, Named, PctReturn, Roc, RollingMax, RollingMin,
    RollingStd, RollingVar, Sma, ThreeEmaCrossover, ZScore,
};
use crate::strategies::{BuyOneSellOne, RandomBuySell, Strategy, ThreeEmaCrossoverStrategy};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur while resolving configured names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FactoryError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),
}

// ─── Indicator registry ──────────────────────────────────────────────

const INDICATOR_NAMES: &[&str] = &[
    "indicator_three_ema_crossover",
    "feature_pct_return",
    "feature_lag",
    "feature_sma",
    "feature_standard_deviation",
    "feature_variance",
    "feature_ema",
    "feature_log_return",
    "feature_zscore",
    "feature_roc",
    "feature_rolling_min",
    "feature_rolling_max",
    "feature_donchian",
    "feature_macd",
];

/// Public indicator names, in registration order.
pub fn available_indicators() -> &'static [&'static str] {
    INDICATOR_NAMES
}

/// Resolve an indicator name into the indicators that implement it.
///
/// Most names resolve to a single indicator whose output column carries the
/// registry name. `feature_donchian` resolves to three, one per band, named
/// `feature_donchian_upper`, `_middle` and `_lower`.
pub fn create_indicators(name: &str) -> Result<Vec<Box<dyn Indicator>>, FactoryError> {
    fn one(name: &str, ind: impl Indicator + 'static) -> Vec<Box<dyn Indicator>> {
        vec![Box::new(Named::new(name, ind))]
    }

    let resolved = match name {
        "indicator_three_ema_crossover" | "three_ema_crossover" => one(
            "indicator_three_ema_crossover",
            ThreeEmaCrossover::new(),
        ),
        "feature_pct_return" => one(name, PctReturn::new()),
        "feature_lag" => one(name, Lag::new(1)),
        "feature_sma" => one(name, Sma::new(10)),
        "feature_standard_deviation" => one(name, RollingStd::new(20)),
        "feature_variance" => one(name, RollingVar::new(20)),
        "feature_ema" => one(name, Ema::span(20.0)),
        "feature_log_return" => one(name, LogReturn::new()),
        "feature_zscore" => one(name, ZScore::new(20)),
        "feature_roc" => one(name, Roc::new(10)),
        "feature_rolling_min" => one(name, RollingMin::new(20)),
        "feature_rolling_max" => one(name, RollingMax::new(20)),
        "feature_macd" => one(name, Macd::new(20, 50)),
        "feature_donchian" => Donchian::channel(20)
            .into_iter()
            .map(|band| {
                let column = format!("{name}_{}", band.band().suffix());
                Box::new(Named::new(column, band)) as Box<dyn Indicator>
            })
            .collect(),
        other => return Err(FactoryError::UnknownIndicator(other.to_string())),
    };
    Ok(resolved)
}

/// Split a comma-separated precompute list, trimming blanks and dropping empties.
pub fn parse_precompute_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve every name in order; the first unknown name fails the whole list.
pub fn resolve_indicators<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<Box<dyn Indicator>>, FactoryError> {
    let mut out = Vec::new();
    for name in names {
        out.extend(create_indicators(name.as_ref())?);
    }
    Ok(out)
}

// ─── Strategy registry ───────────────────────────────────────────────

const STRATEGY_NAMES: &[&str] = &["buy_one_sell_one", "random_buy_sell", "three_ema_crossover"];

/// Public strategy names, in registration order.
pub fn available_strategies() -> &'static [&'static str] {
    STRATEGY_NAMES
}

/// Create a strategy by name.
pub fn create_strategy(name: &str) -> Result<Box<dyn Strategy>, FactoryError> {
    match name {
        "buy_one_sell_one" => Ok(Box::new(BuyOneSellOne::new())),
        "random_buy_sell" => Ok(Box::new(RandomBuySell::new())),
        "three_ema_crossover" | "strategy_three_ema_crossover" => {
            Ok(Box::new(ThreeEmaCrossoverStrategy::new()))
        }
        other => Err(FactoryError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_indicator_resolves() {
        for name in available_indicators() {
            let inds = create_indicators(name).unwrap();
            assert!(!inds.is_empty(), "{name}");
        }
    }

    #[test]
    fn every_listed_strategy_resolves() {
        for name in available_strategies() {
            assert_eq!(create_strategy(name).unwrap().name(), *name);
        }
    }

    #[test]
    fn indicator_columns_carry_registry_name() {
        let inds = create_indicators("feature_sma").unwrap();
        assert_eq!(inds[0].name(), "feature_sma");

        let alias = create_indicators("three_ema_crossover").unwrap();
        assert_eq!(alias[0].name(), "indicator_three_ema_crossover");
    }

    #[test]
    fn donchian_resolves_to_three_bands() {
        let names: Vec<String> = create_indicators("feature_donchian")
            .unwrap()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "feature_donchian_upper",
                "feature_donchian_middle",
                "feature_donchian_lower"
            ]
        );
    }

    #[test]
    fn unknown_names_fail() {
        assert_eq!(
            create_strategy("nope").err(),
            Some(FactoryError::UnknownStrategy("nope".into()))
        );
        assert!(matches!(
            create_indicators("feature_nope"),
            Err(FactoryError::UnknownIndicator(n)) if n == "feature_nope"
        ));
    }

    #[test]
    fn namespaces_are_distinct() {
        // An indicator name is not a strategy and vice versa.
        assert!(create_strategy("indicator_three_ema_crossover").is_err());
        assert!(create_indicators("buy_one_sell_one").is_err());
    }

    #[test]
    fn strategy_alias_resolves() {
        assert_eq!(
            create_strategy("strategy_three_ema_crossover").unwrap().name(),
            "three_ema_crossover"
        );
    }

    #[test]
    fn precompute_list_parsing() {
        assert_eq!(
            parse_precompute_list(" indicator_three_ema_crossover, feature_sma,, "),
            vec!["indicator_three_ema_crossover", "feature_sma"]
        );
        assert!(parse_precompute_list("").is_empty());
    }

    #[test]
    fn resolve_fails_on_first_unknown() {
        let err = resolve_indicators(&["feature_sma", "bogus", "feature_ema"]).err();
        assert_eq!(err, Some(FactoryError::UnknownIndicator("bogus".into())));
        assert_eq!(resolve_indicators(&["feature_donchian", "feature_sma"]).unwrap().len(), 4);
    }
}
