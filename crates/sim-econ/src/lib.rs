#![deny(warnings)]

//! Economic models: pricing and market dynamics for Wasteland Traders.
//!
//! This crate provides:
//! - Price lookup from a city's market mode
//! - Weighted generation of market modes and the per-tick market refresh
//! - Robbery loot selection and the guard pricing policy

pub mod guards;
pub mod loot;

pub use guards::{guard_takeable_value, quote_guards, GuardQuote};
pub use loot::{select_loot, stolen_target};

use serde::Serialize;
use sim_core::{
    CityId, CityMarketState, Good, GoodCounts, MarketMode, MarketModeKind, MarketWeights,
    PriceScale, SeededRng, World,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Every market-mode weight is zero, so no mode can be drawn.
    #[error("market weights are all zero")]
    ZeroWeights,
    /// The weights sum past `u32::MAX`.
    #[error("market weights sum to {0}, above u32::MAX")]
    WeightOverflow(u64),
    /// A uniform pick was asked of an empty pool of goods.
    #[error("no goods to choose from")]
    EmptyPool,
}

/// Price of one unit of `good` under `mode`.
pub fn price_of(good: Good, mode: &MarketMode, scale: &PriceScale) -> u32 {
    scale.price(mode.tier_of(good))
}

/// Prices of all six goods in one market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prices(BTreeMap<Good, u32>);

impl Prices {
    pub fn get(&self, good: Good) -> u32 {
        self.0.get(&good).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Good, u32)> + '_ {
        self.0.iter().map(|(&g, &p)| (g, p))
    }

    /// Total value of `goods` at these prices.
    pub fn value_of(&self, goods: &GoodCounts) -> u64 {
        goods
            .iter()
            .map(|(g, n)| u64::from(n) * u64::from(self.get(g)))
            .sum()
    }
}

/// Price table covering every good; goods the mode does not mention are neutral.
pub fn all_prices(mode: &MarketMode, scale: &PriceScale) -> Prices {
    Prices(
        Good::ALL
            .into_iter()
            .map(|g| (g, price_of(g, mode, scale)))
            .collect(),
    )
}

/// Value of an inventory at the given prices.
pub fn inventory_value(inventory: &GoodCounts, prices: &Prices) -> u64 {
    prices.value_of(inventory)
}

fn pick_good(rng: &mut SeededRng, pool: &[Good]) -> Result<Good, EconError> {
    rng.choose(pool).copied().ok_or(EconError::EmptyPool)
}

/// Draw a market mode by weighted selection over its variants.
pub fn generate_mode(rng: &mut SeededRng, weights: &MarketWeights) -> Result<MarketMode, EconError> {
    let total = weights.total();
    if total > u64::from(u32::MAX) {
        return Err(EconError::WeightOverflow(total));
    }
    let table = weights.table();
    let ws: Vec<u32> = table.iter().map(|&(_, w)| w).collect();
    let idx = rng.weighted_index(&ws).ok_or(EconError::ZeroWeights)?;
    let mode = match table[idx].0 {
        MarketModeKind::AllNeutral => MarketMode::AllNeutral,
        MarketModeKind::OneCheap => MarketMode::OneCheap {
            cheap: pick_good(rng, &Good::ALL)?,
        },
        MarketModeKind::TwoCheap => {
            let first = pick_good(rng, &Good::ALL)?;
            let rest: Vec<Good> = Good::ALL.into_iter().filter(|&g| g != first).collect();
            let second = pick_good(rng, &rest)?;
            MarketMode::TwoCheap {
                cheap: [first, second],
            }
        }
        MarketModeKind::OneExpensive => MarketMode::OneExpensive {
            expensive: pick_good(rng, &Good::ALL)?,
        },
        MarketModeKind::CheapAndExpensive => {
            let cheap = pick_good(rng, &Good::ALL)?;
            let rest: Vec<Good> = Good::ALL.into_iter().filter(|&g| g != cheap).collect();
            MarketMode::CheapAndExpensive {
                cheap,
                expensive: pick_good(rng, &rest)?,
            }
        }
    };
    Ok(mode)
}

/// Initial market for every city, stamped at tick 0.
pub fn seed_markets(
    cities: &[CityId],
    rng: &mut SeededRng,
    weights: &MarketWeights,
) -> Result<BTreeMap<CityId, CityMarketState>, EconError> {
    let mut markets = BTreeMap::new();
    for id in cities {
        let mode = generate_mode(rng, weights)?;
        markets.insert(
            id.clone(),
            CityMarketState {
                city_id: id.clone(),
                mode,
                updated_at_tick: 0,
            },
        );
    }
    Ok(markets)
}

/// Plan the market refresh for the tick after `world.tick`.
///
/// Picks `count` distinct cities uniformly (all of them if fewer exist) and
/// draws a fresh mode for each, stamped `world.tick + 1`. The world is not
/// touched; apply the result with [`apply_refresh`].
pub fn refresh_markets(
    world: &World,
    rng: &mut SeededRng,
    weights: &MarketWeights,
    count: usize,
) -> Result<Vec<CityMarketState>, EconError> {
    let stamp = world.tick + 1;
    let chosen = rng.sample_distinct(&world.city_ids(), count);
    let mut updates = Vec::with_capacity(chosen.len());
    for city_id in chosen {
        let mode = generate_mode(rng, weights)?;
        updates.push(CityMarketState {
            city_id,
            mode,
            updated_at_tick: stamp,
        });
    }
    Ok(updates)
}

/// Replace the refreshed cities' market states wholesale. Returns their ids.
pub fn apply_refresh(world: &mut World, updates: Vec<CityMarketState>) -> Vec<CityId> {
    let mut ids = Vec::with_capacity(updates.len());
    for state in updates {
        debug!(city = %state.city_id, mode = ?state.mode, tick = state.updated_at_tick, "market refreshed");
        ids.push(state.city_id.clone());
        world.markets.insert(state.city_id.clone(), state);
    }
    ids
}
