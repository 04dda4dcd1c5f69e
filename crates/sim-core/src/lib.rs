#![deny(warnings)]

//! Core domain models and invariants for Wasteland Traders.
//!
//! This crate defines the serializable world/player snapshot shared by every
//! simulation crate, with validation helpers guaranteeing its invariants, the
//! fixed city graph, balance configuration and the scoped deterministic RNG.

pub mod config;
pub mod graph;
pub mod rng;

pub use config::{Fraction, MarketWeights, PriceScale, SimConfig};
pub use graph::world_graph;
pub use rng::{derive_seed, scope, SeededRng};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the six tradable commodities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Good {
    Water,
    Food,
    Fuel,
    Ammo,
    Scrap,
    Medicine,
}

impl Good {
    /// Every good, in canonical order.
    pub const ALL: [Good; 6] = [
        Good::Water,
        Good::Food,
        Good::Fuel,
        Good::Ammo,
        Good::Scrap,
        Good::Medicine,
    ];

    /// Goods consumed as daily upkeep.
    pub const SURVIVAL: [Good; 2] = [Good::Water, Good::Food];

    pub fn is_survival(self) -> bool {
        matches!(self, Good::Water | Good::Food)
    }

    /// Stable identifier used in saves and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Good::Water => "water",
            Good::Food => "food",
            Good::Fuel => "fuel",
            Good::Ammo => "ammo",
            Good::Scrap => "scrap",
            Good::Medicine => "medicine",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Good::Water => "Water",
            Good::Food => "Food",
            Good::Fuel => "Fuel",
            Good::Ammo => "Ammo",
            Good::Scrap => "Scrap",
            Good::Medicine => "Medicine",
        }
    }
}

impl fmt::Display for Good {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Good {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Good::ALL
            .into_iter()
            .find(|g| g.as_str() == needle)
            .ok_or_else(|| ValidationError::UnknownGood(s.to_string()))
    }
}

/// Unique identifier for a city, e.g. "rust_town".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CityId(pub String);

impl CityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CityId {
    fn from(s: &str) -> Self {
        CityId(s.to_string())
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A city on the world map. Immutable after world creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// City identifier.
    pub id: CityId,
    /// Display name, e.g. "Rust Town".
    pub name: String,
    /// Directly connected cities (symmetric).
    pub neighbors: BTreeSet<CityId>,
    /// Grid column on the mini-map.
    pub x: i32,
    /// Grid row on the mini-map.
    pub y: i32,
}

/// An undirected road between two adjacent cities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub from: CityId,
    pub to: CityId,
    /// Length in days, within [1, 5].
    pub length: u8,
    /// Ambush risk, within [0.2, 0.7].
    pub risk: f32,
}

impl Road {
    /// Whether this road joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &CityId, b: &CityId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }
}

/// Price tier of a good within a market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    Cheap,
    Neutral,
    Expensive,
}

/// Discriminant of [`MarketMode`], used to key the weight table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketModeKind {
    AllNeutral,
    OneCheap,
    TwoCheap,
    OneExpensive,
    CheapAndExpensive,
}

impl MarketModeKind {
    pub const ALL: [MarketModeKind; 5] = [
        MarketModeKind::AllNeutral,
        MarketModeKind::OneCheap,
        MarketModeKind::TwoCheap,
        MarketModeKind::OneExpensive,
        MarketModeKind::CheapAndExpensive,
    ];
}

/// Which goods a city currently sells cheap or buys dear.
///
/// A good is never both cheap and expensive within one mode; see
/// [`validate_market_mode`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketMode {
    AllNeutral,
    OneCheap { cheap: Good },
    TwoCheap { cheap: [Good; 2] },
    OneExpensive { expensive: Good },
    CheapAndExpensive { cheap: Good, expensive: Good },
}

impl MarketMode {
    pub fn kind(&self) -> MarketModeKind {
        match self {
            MarketMode::AllNeutral => MarketModeKind::AllNeutral,
            MarketMode::OneCheap { .. } => MarketModeKind::OneCheap,
            MarketMode::TwoCheap { .. } => MarketModeKind::TwoCheap,
            MarketMode::OneExpensive { .. } => MarketModeKind::OneExpensive,
            MarketMode::CheapAndExpensive { .. } => MarketModeKind::CheapAndExpensive,
        }
    }

    /// Goods priced at the cheap tier.
    pub fn cheap_goods(&self) -> &[Good] {
        match self {
            MarketMode::OneCheap { cheap } | MarketMode::CheapAndExpensive { cheap, .. } => {
                std::slice::from_ref(cheap)
            }
            MarketMode::TwoCheap { cheap } => cheap.as_slice(),
            MarketMode::AllNeutral | MarketMode::OneExpensive { .. } => &[],
        }
    }

    /// Goods priced at the expensive tier.
    pub fn expensive_goods(&self) -> &[Good] {
        match self {
            MarketMode::OneExpensive { expensive }
            | MarketMode::CheapAndExpensive { expensive, .. } => std::slice::from_ref(expensive),
            _ => &[],
        }
    }

    /// Tier of `good` under this mode; unmentioned goods are neutral.
    pub fn tier_of(&self, good: Good) -> PriceTier {
        if self.cheap_goods().contains(&good) {
            PriceTier::Cheap
        } else if self.expensive_goods().contains(&good) {
            PriceTier::Expensive
        } else {
            PriceTier::Neutral
        }
    }
}

/// Market state of one city. Replaced wholesale by a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityMarketState {
    pub city_id: CityId,
    pub mode: MarketMode,
    pub updated_at_tick: u64,
}

/// Mapping from good to a positive count.
///
/// Zero counts are never stored: every mutation drops entries that reach
/// zero, and deserialization canonicalizes the same way, so "absent" and
/// "zero" are indistinguishable to callers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Good, u32>", into = "BTreeMap<Good, u32>")]
pub struct GoodCounts(BTreeMap<Good, u32>);

/// The player's carried goods.
pub type Inventory = GoodCounts;

impl GoodCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count held of `good` (0 when absent).
    pub fn count(&self, good: Good) -> u32 {
        self.0.get(&good).copied().unwrap_or(0)
    }

    pub fn add(&mut self, good: Good, n: u32) {
        if n == 0 {
            return;
        }
        let slot = self.0.entry(good).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Remove `n` units of `good`, failing without mutation if fewer are held.
    pub fn remove(&mut self, good: Good, n: u32) -> Result<(), ValidationError> {
        let have = self.count(good);
        if have < n {
            return Err(ValidationError::InsufficientGoods {
                good,
                have,
                need: n,
            });
        }
        let left = have - n;
        if left == 0 {
            self.0.remove(&good);
        } else {
            self.0.insert(good, left);
        }
        Ok(())
    }

    pub fn add_all(&mut self, other: &GoodCounts) {
        for (good, n) in other.iter() {
            self.add(good, n);
        }
    }

    /// Remove every entry of `other`; all-or-nothing.
    pub fn remove_all(&mut self, other: &GoodCounts) -> Result<(), ValidationError> {
        if let Some((good, have, need)) = self.first_shortfall(other) {
            return Err(ValidationError::InsufficientGoods { good, have, need });
        }
        for (good, n) in other.iter() {
            self.remove(good, n)?;
        }
        Ok(())
    }

    /// First good in `needed` this bag cannot cover, as `(good, have, need)`.
    pub fn first_shortfall(&self, needed: &GoodCounts) -> Option<(Good, u32, u32)> {
        needed
            .iter()
            .find(|&(good, need)| self.count(good) < need)
            .map(|(good, need)| (good, self.count(good), need))
    }

    pub fn contains(&self, needed: &GoodCounts) -> bool {
        self.first_shortfall(needed).is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct goods with a positive count.
    pub fn distinct(&self) -> usize {
        self.0.len()
    }

    pub fn total_units(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Good, u32)> + '_ {
        self.0.iter().map(|(&g, &n)| (g, n))
    }
}

impl From<BTreeMap<Good, u32>> for GoodCounts {
    fn from(map: BTreeMap<Good, u32>) -> Self {
        map.into_iter().collect()
    }
}

impl From<GoodCounts> for BTreeMap<Good, u32> {
    fn from(counts: GoodCounts) -> Self {
        counts.0
    }
}

impl FromIterator<(Good, u32)> for GoodCounts {
    fn from_iter<I: IntoIterator<Item = (Good, u32)>>(iter: I) -> Self {
        let mut counts = GoodCounts::new();
        for (good, n) in iter {
            counts.add(good, n);
        }
        counts
    }
}

impl fmt::Display for GoodCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(nothing)");
        }
        let mut first = true;
        for (good, n) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{good}:{n}")?;
            first = false;
        }
        Ok(())
    }
}

/// Per-visit cumulative trade volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLimits {
    /// Units bought this visit, per good.
    pub bought: GoodCounts,
    /// Units sold this visit, per good.
    pub sold: GoodCounts,
    /// City the current window belongs to.
    pub last_city_id: CityId,
}

impl TradeLimits {
    /// Empty window for `city`.
    pub fn fresh(city: CityId) -> Self {
        Self {
            bought: GoodCounts::new(),
            sold: GoodCounts::new(),
            last_city_id: city,
        }
    }
}

/// The single player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub city_id: CityId,
    pub inventory: Inventory,
    pub trade_limits: TradeLimits,
}

/// Top-level world state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Game seed; every random draw derives from it.
    pub seed: u64,
    /// Market tick, starting at 0 and increasing by one per day.
    pub tick: u64,
    pub cities: Vec<City>,
    pub roads: Vec<Road>,
    /// One market state per city.
    pub markets: BTreeMap<CityId, CityMarketState>,
}

impl World {
    pub fn city(&self, id: &CityId) -> Option<&City> {
        self.cities.iter().find(|c| &c.id == id)
    }

    /// Road joining `a` and `b` in either direction.
    pub fn road_between(&self, a: &CityId, b: &CityId) -> Option<&Road> {
        self.roads.iter().find(|r| r.connects(a, b))
    }

    pub fn neighbors_of(&self, id: &CityId) -> Vec<&City> {
        match self.city(id) {
            Some(city) => self
                .cities
                .iter()
                .filter(|c| city.neighbors.contains(&c.id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn market(&self, id: &CityId) -> Option<&CityMarketState> {
        self.markets.get(id)
    }

    pub fn city_ids(&self) -> Vec<CityId> {
        self.cities.iter().map(|c| c.id.clone()).collect()
    }
}

/// Everything that is saved and reloaded: the world and the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub world: World,
    pub player: Player,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Road length outside [1, 5].
    #[error("road length {0} is out of range [1, 5]")]
    RoadLength(u8),
    /// Road risk outside [0.2, 0.7] or not finite.
    #[error("road risk {0} is out of range [0.2, 0.7]")]
    RoadRisk(f32),
    #[error("unknown city: {0}")]
    UnknownCity(String),
    #[error("duplicate city: {0}")]
    DuplicateCity(String),
    /// Neighbor sets must mirror each other.
    #[error("{0} lists {1} as neighbor but not vice versa")]
    AsymmetricNeighbors(String, String),
    /// Neighbors and roads must describe the same edges.
    #[error("no road matches adjacency {0} <-> {1}")]
    AdjacencyMismatch(String, String),
    #[error("city {0} has no market state")]
    MissingMarket(String),
    /// A mode lists a good twice, or as both cheap and expensive.
    #[error("market mode marks {0} more than once")]
    ConflictingMode(Good),
    #[error("unknown good: {0}")]
    UnknownGood(String),
    #[error("insufficient {good}: have {have}, need {need}")]
    InsufficientGoods { good: Good, have: u32, need: u32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Validate a market mode: no good marked twice.
pub fn validate_market_mode(mode: &MarketMode) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for &good in mode.cheap_goods().iter().chain(mode.expensive_goods()) {
        if !seen.insert(good) {
            return Err(ValidationError::ConflictingMode(good));
        }
    }
    Ok(())
}

/// Validate a road's physical ranges.
pub fn validate_road(road: &Road) -> Result<(), ValidationError> {
    if !(1..=5).contains(&road.length) {
        return Err(ValidationError::RoadLength(road.length));
    }
    if !road.risk.is_finite() || !(0.2..=0.7).contains(&road.risk) {
        return Err(ValidationError::RoadRisk(road.risk));
    }
    Ok(())
}

/// Validate the world, including cross-references between cities, roads and markets.
pub fn validate_world(world: &World) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&CityId> = BTreeSet::new();
    for c in &world.cities {
        if !ids.insert(&c.id) {
            return Err(ValidationError::DuplicateCity(c.id.0.clone()));
        }
    }
    for c in &world.cities {
        for n in &c.neighbors {
            let other = world
                .city(n)
                .ok_or_else(|| ValidationError::UnknownCity(n.0.clone()))?;
            if !other.neighbors.contains(&c.id) {
                return Err(ValidationError::AsymmetricNeighbors(
                    c.id.0.clone(),
                    n.0.clone(),
                ));
            }
            if world.road_between(&c.id, n).is_none() {
                return Err(ValidationError::AdjacencyMismatch(
                    c.id.0.clone(),
                    n.0.clone(),
                ));
            }
        }
    }
    for r in &world.roads {
        validate_road(r)?;
        let from = world
            .city(&r.from)
            .ok_or_else(|| ValidationError::UnknownCity(r.from.0.clone()))?;
        if world.city(&r.to).is_none() {
            return Err(ValidationError::UnknownCity(r.to.0.clone()));
        }
        if !from.neighbors.contains(&r.to) {
            return Err(ValidationError::AdjacencyMismatch(
                r.from.0.clone(),
                r.to.0.clone(),
            ));
        }
    }
    for c in &world.cities {
        let market = world
            .market(&c.id)
            .ok_or_else(|| ValidationError::MissingMarket(c.id.0.clone()))?;
        validate_market_mode(&market.mode)?;
    }
    for id in world.markets.keys() {
        if !ids.contains(id) {
            return Err(ValidationError::UnknownCity(id.0.clone()));
        }
    }
    Ok(())
}

/// Validate a full snapshot: the world plus the player's position.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ValidationError> {
    validate_world(&snapshot.world)?;
    if snapshot.world.city(&snapshot.player.city_id).is_none() {
        return Err(ValidationError::UnknownCity(
            snapshot.player.city_id.0.clone(),
        ));
    }
    Ok(())
}
