#![deny(warnings)]

//! Game-state engine for Wasteland Traders.
//!
//! [`GameEngine`] owns one world and one player and exposes every operation
//! that mutates them. Each operation validates first and commits last, so a
//! returned error always means nothing changed.

mod error;

pub use error::{EngineError, ErrorClass, TradeSide};

use serde::Serialize;
use sim_core::{
    scope, validate_snapshot, world_graph, CityId, Good, GoodCounts, Inventory, Player,
    SeededRng, SimConfig, Snapshot, TradeLimits, World,
};
use sim_econ::{GuardQuote, Prices};
use tracing::{debug, info, warn};

/// Goods the player could be handed on top of one water and one food.
const STARTING_EXTRAS: [Good; 4] = [Good::Fuel, Good::Ammo, Good::Scrap, Good::Medicine];

/// Result of a completed day without travel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick after the advance.
    pub tick: u64,
    /// Survival good consumed as upkeep.
    pub upkeep: Good,
    /// Cities whose market was redrawn.
    pub refreshed: Vec<CityId>,
}

/// Values of an acceptable trade at the current city's prices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TradeQuote {
    pub give_value: u64,
    pub take_value: u64,
}

/// Outcome of a finished journey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub destination: CityId,
    pub tick: u64,
    pub upkeep: Good,
    /// Goods lost to robbers; empty on a safe journey.
    pub stolen: GoodCounts,
    /// Goods paid to guards; empty when unguarded.
    pub paid: GoodCounts,
    pub bankrupt: bool,
}

/// Travel that was ambushed and awaits acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingTravel {
    pub destination: CityId,
    pub stolen: GoodCounts,
    /// Upkeep chosen when the journey began.
    pub upkeep: Good,
}

/// What happened when unguarded travel began.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TravelStart {
    /// No ambush; the player has already arrived.
    Arrived(Arrival),
    /// Robbers struck. Call [`GameEngine::complete_travel`] to resolve.
    Ambushed {
        destination: CityId,
        stolen: GoodCounts,
    },
}

/// Owner of one game session's world and player.
#[derive(Clone, Debug)]
pub struct GameEngine {
    world: World,
    player: Player,
    config: SimConfig,
    pending: Option<PendingTravel>,
}

impl GameEngine {
    /// Start a new game. Without a seed one is drawn from OS entropy.
    pub fn new_game(seed: Option<u64>, config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let seed = seed.unwrap_or_else(SeededRng::entropy_seed);
        let (cities, roads) = world_graph();
        let ids: Vec<CityId> = cities.iter().map(|c| c.id.clone()).collect();

        let mut market_rng = SeededRng::scoped(seed, 0, scope::MARKET_INIT);
        let markets = sim_econ::seed_markets(&ids, &mut market_rng, &config.market_weights)?;

        let mut inv_rng = SeededRng::scoped(seed, 0, scope::INVENTORY);
        let mut inventory = Inventory::new();
        inventory.add(Good::Water, 1);
        inventory.add(Good::Food, 1);
        for _ in 0..config.starting_extra_units {
            if let Some(&good) = inv_rng.choose(&STARTING_EXTRAS) {
                inventory.add(good, 1);
            }
        }

        let start = ids
            .first()
            .cloned()
            .ok_or_else(|| EngineError::UnknownCity(CityId::from("")))?;
        let world = World {
            seed,
            tick: 0,
            cities,
            roads,
            markets,
        };
        let player = Player {
            city_id: start.clone(),
            inventory,
            trade_limits: TradeLimits::fresh(start),
        };
        info!(seed, city = %player.city_id, inventory = %player.inventory, "new game");
        Ok(Self {
            world,
            player,
            config,
            pending: None,
        })
    }

    /// Resume from a saved snapshot.
    pub fn from_snapshot(snapshot: Snapshot, config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        validate_snapshot(&snapshot)?;
        let Snapshot { world, mut player } = snapshot;
        if player.trade_limits.last_city_id != player.city_id {
            player.trade_limits = TradeLimits::fresh(player.city_id.clone());
        }
        debug!(seed = world.seed, tick = world.tick, "resumed from snapshot");
        Ok(Self {
            world,
            player,
            config,
            pending: None,
        })
    }

    /// Copy of the persistent state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            world: self.world.clone(),
            player: self.player.clone(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn pending_travel(&self) -> Option<&PendingTravel> {
        self.pending.as_ref()
    }

    /// Price table of `city`.
    pub fn prices_in(&self, city: &CityId) -> Result<Prices, EngineError> {
        let market = self
            .world
            .market(city)
            .ok_or_else(|| EngineError::MissingMarket(city.clone()))?;
        Ok(sim_econ::all_prices(&market.mode, &self.config.price_scale))
    }

    /// Price table of the city the player is in.
    pub fn current_prices(&self) -> Result<Prices, EngineError> {
        self.prices_in(&self.player.city_id)
    }

    fn ensure_idle(&self) -> Result<(), EngineError> {
        match &self.pending {
            Some(p) => Err(EngineError::TravelPending(p.destination.clone())),
            None => Ok(()),
        }
    }

    /// Which survival good today's upkeep takes from `inventory`.
    ///
    /// With both on hand a coin flip on the resource stream of the current
    /// tick decides.
    fn plan_upkeep(&self, inventory: &Inventory) -> Result<Good, EngineError> {
        let water = inventory.count(Good::Water) > 0;
        let food = inventory.count(Good::Food) > 0;
        match (water, food) {
            (true, true) => {
                let mut rng = SeededRng::scoped(self.world.seed, self.world.tick, scope::RESOURCE);
                Ok(if rng.chance(0.5) { Good::Water } else { Good::Food })
            }
            (true, false) => Ok(Good::Water),
            (false, true) => Ok(Good::Food),
            (false, false) => Err(EngineError::ResourceExhausted),
        }
    }

    /// Consume one water or food without advancing time.
    pub fn spend_resource(&mut self) -> Result<Good, EngineError> {
        self.ensure_idle()?;
        let good = self.plan_upkeep(&self.player.inventory)?;
        self.player.inventory.remove(good, 1)?;
        debug!(%good, "resource spent");
        Ok(good)
    }

    /// Advance the tick, refresh markets and install `inventory`.
    ///
    /// Fallible work happens before the first write.
    fn advance_day(&mut self, inventory: Inventory) -> Result<Vec<CityId>, EngineError> {
        let next = self.world.tick + 1;
        let mut rng = SeededRng::scoped(self.world.seed, next, scope::MARKET_REFRESH);
        let updates = sim_econ::refresh_markets(
            &self.world,
            &mut rng,
            &self.config.market_weights,
            self.config.refreshed_cities_per_tick,
        )?;
        self.player.inventory = inventory;
        self.world.tick = next;
        Ok(sim_econ::apply_refresh(&mut self.world, updates))
    }

    /// Spend a day in the current city.
    pub fn do_tick(&mut self) -> Result<TickReport, EngineError> {
        self.ensure_idle()?;
        let upkeep = self.plan_upkeep(&self.player.inventory)?;
        let mut inventory = self.player.inventory.clone();
        inventory.remove(upkeep, 1)?;
        let refreshed = self.advance_day(inventory)?;
        self.player.trade_limits = TradeLimits::fresh(self.player.city_id.clone());
        info!(tick = self.world.tick, %upkeep, "day passed");
        Ok(TickReport {
            tick: self.world.tick,
            upkeep,
            refreshed,
        })
    }

    /// Check a trade against the current city's prices without executing it.
    pub fn propose_trade(&self, give: &GoodCounts, take: &GoodCounts) -> Result<TradeQuote, EngineError> {
        let cap = self.config.per_trade_cap;
        if let Some((good, requested)) = take.iter().find(|&(_, n)| n > cap) {
            return Err(EngineError::TradeCapExceeded {
                good,
                requested,
                cap,
            });
        }
        let prices = self.current_prices()?;
        let give_value = prices.value_of(give);
        let take_value = prices.value_of(take);
        if take_value > give_value {
            return Err(EngineError::InsufficientValue {
                offered: give_value,
                requested: take_value,
            });
        }
        if let Some((good, have, need)) = self.player.inventory.first_shortfall(give) {
            return Err(EngineError::InsufficientGoods { good, have, need });
        }
        Ok(TradeQuote {
            give_value,
            take_value,
        })
    }

    fn check_visit_limit(
        used: &GoodCounts,
        wanted: &GoodCounts,
        side: TradeSide,
        cap: u32,
    ) -> Result<(), EngineError> {
        for (good, requested) in wanted.iter() {
            let already = used.count(good);
            if already.saturating_add(requested) > cap {
                return Err(EngineError::VisitLimitExceeded {
                    good,
                    side,
                    used: already,
                    requested,
                    cap,
                });
            }
        }
        Ok(())
    }

    /// Validate and execute a trade, all or nothing.
    pub fn execute_trade(&mut self, give: &GoodCounts, take: &GoodCounts) -> Result<TradeQuote, EngineError> {
        self.ensure_idle()?;
        let quote = self.propose_trade(give, take)?;

        let mut limits = if self.player.trade_limits.last_city_id == self.player.city_id {
            self.player.trade_limits.clone()
        } else {
            TradeLimits::fresh(self.player.city_id.clone())
        };
        let cap = self.config.visit_cap;
        Self::check_visit_limit(&limits.bought, take, TradeSide::Buy, cap)?;
        Self::check_visit_limit(&limits.sold, give, TradeSide::Sell, cap)?;

        let mut inventory = self.player.inventory.clone();
        inventory.remove_all(give)?;
        inventory.add_all(take);
        limits.bought.add_all(take);
        limits.sold.add_all(give);

        self.player.inventory = inventory;
        self.player.trade_limits = limits;
        info!(
            city = %self.player.city_id,
            give = %give,
            take = %take,
            give_value = quote.give_value,
            take_value = quote.take_value,
            "trade executed"
        );
        Ok(quote)
    }

    fn require_road(&self, to: &CityId) -> Result<(), EngineError> {
        if self.world.city(to).is_none() {
            return Err(EngineError::UnknownCity(to.clone()));
        }
        if self.world.road_between(&self.player.city_id, to).is_none() {
            return Err(EngineError::NoRoad {
                from: self.player.city_id.clone(),
                to: to.clone(),
            });
        }
        Ok(())
    }

    /// Spend the day on the road and arrive at `to` with `inventory`.
    fn arrive(
        &mut self,
        to: &CityId,
        inventory: Inventory,
        upkeep: Good,
        stolen: GoodCounts,
        paid: GoodCounts,
    ) -> Result<Arrival, EngineError> {
        self.advance_day(inventory)?;
        self.player.city_id = to.clone();
        self.player.trade_limits = TradeLimits::fresh(to.clone());
        let bankrupt = self.is_bankrupt();
        info!(
            city = %to,
            tick = self.world.tick,
            %upkeep,
            stolen = %stolen,
            paid = %paid,
            bankrupt,
            "arrived"
        );
        if bankrupt {
            warn!(inventory = %self.player.inventory, "player is bankrupt");
        }
        Ok(Arrival {
            destination: to.clone(),
            tick: self.world.tick,
            upkeep,
            stolen,
            paid,
            bankrupt,
        })
    }

    /// Travel to a neighboring city with no ambush roll.
    pub fn travel(&mut self, to: &CityId) -> Result<Arrival, EngineError> {
        self.ensure_idle()?;
        self.require_road(to)?;
        let upkeep = self.plan_upkeep(&self.player.inventory)?;
        let mut inventory = self.player.inventory.clone();
        inventory.remove(upkeep, 1)?;
        self.arrive(to, inventory, upkeep, GoodCounts::new(), GoodCounts::new())
    }

    /// Current guard price for the road to `to`.
    pub fn guard_quote(&self, to: &CityId) -> Result<GuardQuote, EngineError> {
        self.require_road(to)?;
        let prices = self.current_prices()?;
        sim_econ::quote_guards(&self.player.inventory, &prices, self.config.guard_fee_divisor)
            .ok_or(EngineError::GuardsUnaffordable)
    }

    /// Pay `payment` to guards and travel to `to` safely.
    ///
    /// The payment is not valued here; it only has to be held. Upkeep is
    /// drawn from what remains after paying.
    pub fn travel_with_guards(&mut self, to: &CityId, payment: &GoodCounts) -> Result<Arrival, EngineError> {
        self.ensure_idle()?;
        self.require_road(to)?;
        if let Some((good, have, need)) = self.player.inventory.first_shortfall(payment) {
            return Err(EngineError::InsufficientGoods { good, have, need });
        }
        let mut inventory = self.player.inventory.clone();
        inventory.remove_all(payment)?;
        let upkeep = self.plan_upkeep(&inventory)?;
        inventory.remove(upkeep, 1)?;
        self.arrive(to, inventory, upkeep, GoodCounts::new(), payment.clone())
    }

    /// Set out for `to` unguarded.
    ///
    /// The ambush roll uses the robbery stream of the tick before departure,
    /// so a given seed and tick always produce the same outcome. When robbed,
    /// the loot is fixed now and the journey stays pending until
    /// [`complete_travel`](Self::complete_travel); it cannot be cancelled.
    pub fn begin_travel(&mut self, to: &CityId) -> Result<TravelStart, EngineError> {
        self.ensure_idle()?;
        self.require_road(to)?;
        let upkeep = self.plan_upkeep(&self.player.inventory)?;

        let mut roll = SeededRng::scoped(self.world.seed, self.world.tick, scope::ROBBERY);
        let robbed = roll.chance(self.config.robbery_chance);
        let mut remaining = self.player.inventory.clone();
        remaining.remove(upkeep, 1)?;

        if !robbed {
            let arrival = self.arrive(to, remaining, upkeep, GoodCounts::new(), GoodCounts::new())?;
            return Ok(TravelStart::Arrived(arrival));
        }

        let prices = self.current_prices()?;
        let value = sim_econ::inventory_value(&remaining, &prices);
        let target = sim_econ::stolen_target(value, self.config.stolen_fraction);
        let stolen = sim_econ::select_loot(&remaining, &prices, target, self.config.price_scale.neutral);
        info!(
            destination = %to,
            value,
            target,
            stolen = %stolen,
            "ambushed on the road"
        );
        self.pending = Some(PendingTravel {
            destination: to.clone(),
            stolen: stolen.clone(),
            upkeep,
        });
        Ok(TravelStart::Ambushed {
            destination: to.clone(),
            stolen,
        })
    }

    /// Resolve an ambushed journey: hand over the loot, spend the day, arrive.
    pub fn complete_travel(&mut self) -> Result<Arrival, EngineError> {
        let pending = self.pending.clone().ok_or(EngineError::NoPendingTravel)?;
        let mut inventory = self.player.inventory.clone();
        inventory.remove_all(&pending.stolen)?;
        inventory.remove(pending.upkeep, 1)?;
        let arrival = self.arrive(
            &pending.destination,
            inventory,
            pending.upkeep,
            pending.stolen,
            GoodCounts::new(),
        )?;
        self.pending = None;
        Ok(arrival)
    }

    /// Whether the player's holdings can no longer sustain play.
    ///
    /// Bankrupt when nothing is left, or when the only thing left is a single
    /// unit priced cheap here while water and food are both above cheap.
    pub fn is_bankrupt(&self) -> bool {
        let inventory = &self.player.inventory;
        if inventory.is_empty() {
            return true;
        }
        let mut held = inventory.iter();
        let (Some((good, 1)), None) = (held.next(), held.next()) else {
            return false;
        };
        let Ok(prices) = self.current_prices() else {
            return false;
        };
        let cheap = self.config.price_scale.cheap;
        prices.get(good) == cheap && prices.get(Good::Water) > cheap && prices.get(Good::Food) > cheap
    }
}
