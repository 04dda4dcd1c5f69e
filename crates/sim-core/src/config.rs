//! Balance parameters for the simulation.
//!
//! Every number that earlier balancing passes tuned lives here as a named,
//! serializable value so it can be overridden from a config file and pinned
//! in tests.

use crate::{MarketModeKind, PriceTier, ValidationError};
use serde::{Deserialize, Serialize};

/// Relative weights for drawing a new market mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketWeights {
    pub all_neutral: u32,
    pub one_cheap: u32,
    pub two_cheap: u32,
    pub one_expensive: u32,
    pub cheap_and_expensive: u32,
}

impl Default for MarketWeights {
    fn default() -> Self {
        Self {
            all_neutral: 3,
            one_cheap: 2,
            two_cheap: 1,
            one_expensive: 2,
            cheap_and_expensive: 1,
        }
    }
}

impl MarketWeights {
    pub fn weight(&self, kind: MarketModeKind) -> u32 {
        match kind {
            MarketModeKind::AllNeutral => self.all_neutral,
            MarketModeKind::OneCheap => self.one_cheap,
            MarketModeKind::TwoCheap => self.two_cheap,
            MarketModeKind::OneExpensive => self.one_expensive,
            MarketModeKind::CheapAndExpensive => self.cheap_and_expensive,
        }
    }

    /// The table in [`MarketModeKind::ALL`] order.
    pub fn table(&self) -> [(MarketModeKind, u32); 5] {
        MarketModeKind::ALL.map(|k| (k, self.weight(k)))
    }

    pub fn total(&self) -> u64 {
        self.table().iter().map(|&(_, w)| u64::from(w)).sum()
    }
}

/// Integer price of each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceScale {
    pub cheap: u32,
    pub neutral: u32,
    pub expensive: u32,
}

impl Default for PriceScale {
    fn default() -> Self {
        Self {
            cheap: 1,
            neutral: 2,
            expensive: 3,
        }
    }
}

impl PriceScale {
    pub fn price(&self, tier: PriceTier) -> u32 {
        match tier {
            PriceTier::Cheap => self.cheap,
            PriceTier::Neutral => self.neutral,
            PriceTier::Expensive => self.expensive,
        }
    }
}

/// A non-negative rational applied with floor rounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    /// floor(value * numerator / denominator); zero when the denominator is zero.
    pub fn of_floor(&self, value: u64) -> u64 {
        if self.denominator == 0 {
            return 0;
        }
        let scaled = u128::from(value) * u128::from(self.numerator) / u128::from(self.denominator);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Most units of one good that a single trade may request.
    pub per_trade_cap: u32,
    /// Most units of one good bought (or sold) within one visit.
    pub visit_cap: u32,
    /// Weights for drawing market modes.
    pub market_weights: MarketWeights,
    /// Price of each tier.
    pub price_scale: PriceScale,
    /// Markets redrawn per tick (all of them if fewer cities exist).
    pub refreshed_cities_per_tick: usize,
    /// Probability in [0, 1] of an ambush on unguarded travel.
    pub robbery_chance: f64,
    /// Share of remaining inventory value robbers aim to take.
    pub stolen_fraction: Fraction,
    /// Guards charge floor(guard-takeable value / this).
    pub guard_fee_divisor: u32,
    /// Random non-survival units granted on top of one water and one food.
    pub starting_extra_units: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            per_trade_cap: 4,
            visit_cap: 4,
            market_weights: MarketWeights::default(),
            price_scale: PriceScale::default(),
            refreshed_cities_per_tick: 2,
            robbery_chance: 0.5,
            stolen_fraction: Fraction {
                numerator: 2,
                denominator: 3,
            },
            guard_fee_divisor: 4,
            starting_extra_units: 2,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.per_trade_cap == 0 || self.visit_cap == 0 {
            return Err(ValidationError::InvalidConfig("trade caps must be > 0"));
        }
        let total = self.market_weights.total();
        if total == 0 {
            return Err(ValidationError::InvalidConfig(
                "market weights must not all be zero",
            ));
        }
        if total > u64::from(u32::MAX) {
            return Err(ValidationError::InvalidConfig(
                "market weights must sum to at most u32::MAX",
            ));
        }
        let s = self.price_scale;
        if !(0 < s.cheap && s.cheap < s.neutral && s.neutral < s.expensive) {
            return Err(ValidationError::InvalidConfig(
                "price scale must satisfy 0 < cheap < neutral < expensive",
            ));
        }
        if !self.robbery_chance.is_finite() || !(0.0..=1.0).contains(&self.robbery_chance) {
            return Err(ValidationError::InvalidConfig(
                "robbery chance must be within [0, 1]",
            ));
        }
        let f = self.stolen_fraction;
        if f.denominator == 0 || f.numerator > f.denominator {
            return Err(ValidationError::InvalidConfig(
                "stolen fraction must be within [0, 1]",
            ));
        }
        if self.guard_fee_divisor == 0 {
            return Err(ValidationError::InvalidConfig(
                "guard fee divisor must be > 0",
            ));
        }
        Ok(())
    }
}
