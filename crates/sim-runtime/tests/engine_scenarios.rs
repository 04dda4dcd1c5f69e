use proptest::prelude::*;
use sim_core::graph::{BOTTLE_CAP_CANYON, RUST_TOWN};
use sim_core::{CityId, CityMarketState, Good, GoodCounts, MarketMode, SimConfig};
use sim_runtime::{EngineError, GameEngine, TravelStart};

fn bag(items: &[(Good, u32)]) -> GoodCounts {
    items.iter().copied().collect()
}

fn staged(seed: u64, mode: MarketMode, inventory: GoodCounts) -> GameEngine {
    let engine = GameEngine::new_game(Some(seed), SimConfig::default()).unwrap();
    let mut snap = engine.snapshot();
    let here = snap.player.city_id.clone();
    snap.world.markets.insert(
        here.clone(),
        CityMarketState {
            city_id: here,
            mode,
            updated_at_tick: 0,
        },
    );
    snap.player.inventory = inventory;
    GameEngine::from_snapshot(snap, SimConfig::default()).unwrap()
}

fn survival(engine: &GameEngine) -> u32 {
    let inv = &engine.player().inventory;
    inv.count(Good::Water) + inv.count(Good::Food)
}

#[test]
fn first_tick_of_seed_42() {
    let mut engine = GameEngine::new_game(Some(42), SimConfig::default()).unwrap();
    assert!(engine.player().inventory.count(Good::Water) >= 1);
    assert!(engine.player().inventory.count(Good::Food) >= 1);
    let before = survival(&engine);

    let report = engine.do_tick().unwrap();
    assert_eq!(report.tick, 1);
    assert_eq!(engine.world().tick, 1);
    let fresh: Vec<_> = engine
        .world()
        .markets
        .values()
        .filter(|m| m.updated_at_tick == 1)
        .map(|m| m.city_id.clone())
        .collect();
    assert_eq!(fresh.len(), 2);
    assert_ne!(fresh[0], fresh[1]);
    assert_eq!(survival(&engine), before - 1);
}

#[test]
fn scrap_for_cheap_water_is_accepted() {
    let mut engine = staged(
        7,
        MarketMode::OneCheap { cheap: Good::Water },
        bag(&[(Good::Scrap, 3), (Good::Food, 1)]),
    );
    let give = bag(&[(Good::Scrap, 3)]);
    let take = bag(&[(Good::Water, 4)]);
    let quote = engine.propose_trade(&give, &take).unwrap();
    assert_eq!(quote.give_value, 6);
    assert_eq!(quote.take_value, 4);
    engine.execute_trade(&give, &take).unwrap();
    let inv = &engine.player().inventory;
    assert_eq!(inv.count(Good::Scrap), 0);
    assert_eq!(inv.count(Good::Water), 4);
    assert_eq!(engine.player().trade_limits.bought.count(Good::Water), 4);
    assert_eq!(engine.player().trade_limits.sold.count(Good::Scrap), 3);
}

#[test]
fn five_units_exceed_the_per_trade_cap() {
    let engine = staged(
        7,
        MarketMode::OneCheap { cheap: Good::Water },
        bag(&[(Good::Medicine, 4), (Good::Food, 1)]),
    );
    let err = engine
        .propose_trade(&bag(&[(Good::Medicine, 4)]), &bag(&[(Good::Water, 5)]))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::TradeCapExceeded {
            good: Good::Water,
            requested: 5,
            cap: 4
        }
    );
}

#[test]
fn last_cheap_scrap_is_bankrupt() {
    let engine = staged(
        3,
        MarketMode::CheapAndExpensive {
            cheap: Good::Scrap,
            expensive: Good::Water,
        },
        bag(&[(Good::Scrap, 1)]),
    );
    assert!(engine.is_bankrupt());
}

#[test]
fn robbery_takes_two_thirds_priciest_first() {
    let mode = MarketMode::CheapAndExpensive {
        cheap: Good::Fuel,
        expensive: Good::Medicine,
    };
    // water is the only upkeep; 30 worth remains after spending it
    let inventory = bag(&[
        (Good::Water, 1),
        (Good::Medicine, 5),
        (Good::Scrap, 5),
        (Good::Fuel, 5),
    ]);
    for seed in 0..64 {
        let mut engine = staged(seed, mode.clone(), inventory.clone());
        let prices = engine.current_prices().unwrap();
        let to = engine.world().neighbors_of(&engine.player().city_id)[0]
            .id
            .clone();
        match engine.begin_travel(&to).unwrap() {
            TravelStart::Arrived(_) => continue,
            TravelStart::Ambushed { destination, stolen } => {
                assert_eq!(destination, to);
                assert_eq!(prices.value_of(&stolen), 20);
                assert_eq!(stolen.count(Good::Medicine), 5);
                // nothing moves until the ambush is acknowledged
                assert_eq!(engine.player().inventory, inventory);
                assert_eq!(engine.world().tick, 0);

                let arrival = engine.complete_travel().unwrap();
                assert_eq!(arrival.stolen, stolen);
                assert_eq!(arrival.upkeep, Good::Water);
                assert_eq!(engine.player().city_id, to);
                assert_eq!(engine.world().tick, 1);
                assert_eq!(
                    engine.player().inventory,
                    bag(&[(Good::Scrap, 3), (Good::Fuel, 4)])
                );
                assert!(engine.player().trade_limits.bought.is_empty());
                return;
            }
        }
    }
    panic!("no ambush in 64 seeds");
}

#[test]
fn robbery_outcome_is_fixed_by_seed_and_tick() {
    let inventory = bag(&[(Good::Water, 2), (Good::Food, 2), (Good::Ammo, 3)]);
    for seed in 0..16 {
        let mut a = staged(seed, MarketMode::AllNeutral, inventory.clone());
        let mut b = staged(seed, MarketMode::AllNeutral, inventory.clone());
        let to = a.world().neighbors_of(&a.player().city_id)[0].id.clone();
        assert_eq!(a.begin_travel(&to).unwrap(), b.begin_travel(&to).unwrap());
    }
}

#[test]
fn visit_cap_blocks_fifth_unit() {
    let mut engine = staged(
        9,
        MarketMode::AllNeutral,
        bag(&[(Good::Water, 1), (Good::Ammo, 8)]),
    );
    engine
        .execute_trade(&bag(&[(Good::Ammo, 4)]), &bag(&[(Good::Fuel, 4)]))
        .unwrap();
    let before = engine.snapshot();
    let err = engine
        .execute_trade(&bag(&[(Good::Ammo, 1)]), &bag(&[(Good::Scrap, 1)]))
        .unwrap_err();
    assert!(matches!(err, EngineError::VisitLimitExceeded { good: Good::Ammo, .. }));
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn failed_value_check_leaves_state_untouched() {
    let mut engine = staged(
        9,
        MarketMode::OneExpensive {
            expensive: Good::Medicine,
        },
        bag(&[(Good::Water, 1), (Good::Scrap, 1)]),
    );
    let before = engine.snapshot();
    let err = engine
        .execute_trade(&bag(&[(Good::Scrap, 1)]), &bag(&[(Good::Medicine, 1)]))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientValue {
            offered: 2,
            requested: 3
        }
    );
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn diagonal_city_has_no_road() {
    let mut engine = staged(
        5,
        MarketMode::AllNeutral,
        bag(&[(Good::Water, 2), (Good::Food, 2), (Good::Medicine, 4)]),
    );
    assert_eq!(engine.player().city_id, CityId::from(RUST_TOWN));
    let to = CityId::from(BOTTLE_CAP_CANYON);
    let expected = EngineError::NoRoad {
        from: CityId::from(RUST_TOWN),
        to: to.clone(),
    };
    let before = engine.snapshot();

    assert_eq!(engine.travel(&to).unwrap_err(), expected);
    assert_eq!(engine.begin_travel(&to).unwrap_err(), expected);
    assert_eq!(engine.guard_quote(&to).unwrap_err(), expected);
    assert_eq!(
        engine
            .travel_with_guards(&to, &bag(&[(Good::Medicine, 1)]))
            .unwrap_err(),
        expected
    );
    assert_eq!(engine.snapshot(), before);
    assert!(engine.pending_travel().is_none());
}

#[test]
fn travel_without_upkeep_changes_nothing() {
    let mut engine = staged(6, MarketMode::AllNeutral, bag(&[(Good::Ammo, 3)]));
    let to = engine.world().neighbors_of(&engine.player().city_id)[0]
        .id
        .clone();
    let before = engine.snapshot();

    assert_eq!(engine.travel(&to).unwrap_err(), EngineError::ResourceExhausted);
    assert_eq!(
        engine.begin_travel(&to).unwrap_err(),
        EngineError::ResourceExhausted
    );
    assert_eq!(engine.snapshot(), before);
    assert!(engine.pending_travel().is_none());
}

#[test]
fn robbery_of_last_cheap_unit_bankrupts() {
    let mode = MarketMode::OneCheap { cheap: Good::Scrap };
    let inventory = bag(&[(Good::Water, 1), (Good::Scrap, 1)]);
    for seed in 0..64 {
        let mut engine = staged(seed, mode.clone(), inventory.clone());
        let to = engine.world().neighbors_of(&engine.player().city_id)[0]
            .id
            .clone();
        if let TravelStart::Ambushed { stolen, .. } = engine.begin_travel(&to).unwrap() {
            assert_eq!(stolen, bag(&[(Good::Scrap, 1)]));
            let arrival = engine.complete_travel().unwrap();
            assert!(arrival.bankrupt);
            assert!(engine.is_bankrupt());
            assert!(engine.player().inventory.is_empty());
            return;
        }
    }
    panic!("no ambush in 64 seeds");
}

#[test]
fn arrival_clears_visit_counters() {
    let mut engine = staged(
        4,
        MarketMode::AllNeutral,
        bag(&[(Good::Water, 2), (Good::Food, 2), (Good::Scrap, 4)]),
    );
    engine
        .execute_trade(&bag(&[(Good::Scrap, 2)]), &bag(&[(Good::Ammo, 2)]))
        .unwrap();
    let limits = &engine.player().trade_limits;
    assert_eq!(limits.bought.count(Good::Ammo), 2);
    assert_eq!(limits.sold.count(Good::Scrap), 2);

    let to = engine.world().neighbors_of(&engine.player().city_id)[0]
        .id
        .clone();
    engine.travel(&to).unwrap();
    let limits = &engine.player().trade_limits;
    assert!(limits.bought.is_empty());
    assert!(limits.sold.is_empty());
    assert_eq!(limits.last_city_id, to);
}

#[test]
fn overflowing_weights_are_refused_up_front() {
    let mut cfg = SimConfig::default();
    cfg.market_weights.all_neutral = u32::MAX;
    cfg.market_weights.one_cheap = u32::MAX;
    assert!(matches!(
        GameEngine::new_game(Some(1), cfg),
        Err(EngineError::Invalid(_))
    ));
}

#[derive(Clone, Debug)]
enum Intent {
    Tick,
    Trade(usize, usize, u32),
    Travel(usize),
    Guarded(usize),
}

fn intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        Just(Intent::Tick),
        (0usize..6, 0usize..6, 1u32..4).prop_map(|(g, t, n)| Intent::Trade(g, t, n)),
        (0usize..2).prop_map(Intent::Travel),
        (0usize..2).prop_map(Intent::Guarded),
    ]
}

fn apply(engine: &mut GameEngine, intent: &Intent) {
    let neighbors: Vec<_> = engine
        .world()
        .neighbors_of(&engine.player().city_id)
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    match *intent {
        Intent::Tick => {
            let _ = engine.do_tick();
        }
        Intent::Trade(g, t, n) => {
            let give = bag(&[(Good::ALL[g], n)]);
            let take = bag(&[(Good::ALL[t], n)]);
            let _ = engine.execute_trade(&give, &take);
        }
        Intent::Travel(i) => {
            if let Ok(TravelStart::Ambushed { .. }) = engine.begin_travel(&neighbors[i]) {
                engine.complete_travel().unwrap();
            }
        }
        Intent::Guarded(i) => {
            if let Ok(quote) = engine.guard_quote(&neighbors[i]) {
                let _ = engine.travel_with_guards(&neighbors[i], &quote.payment);
            }
        }
    }
}

proptest! {
    #[test]
    fn identical_intents_give_identical_state(seed in any::<u64>(), intents in proptest::collection::vec(intent(), 0..24)) {
        let mut a = GameEngine::new_game(Some(seed), SimConfig::default()).unwrap();
        let mut b = GameEngine::new_game(Some(seed), SimConfig::default()).unwrap();
        for i in &intents {
            apply(&mut a, i);
            apply(&mut b, i);
        }
        prop_assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn accepted_trades_conserve_value_and_respect_caps(
        seed in any::<u64>(),
        trades in proptest::collection::vec((0usize..6, 0u32..5, 0usize..6, 0u32..6), 1..12),
    ) {
        let mut engine = staged(
            seed,
            MarketMode::CheapAndExpensive { cheap: Good::Fuel, expensive: Good::Ammo },
            bag(&[(Good::Water, 5), (Good::Food, 5), (Good::Ammo, 5), (Good::Scrap, 5)]),
        );
        let cap = engine.config().visit_cap;
        for (g, gn, t, tn) in trades {
            let give = bag(&[(Good::ALL[g], gn)]);
            let take = bag(&[(Good::ALL[t], tn)]);
            let verdict = engine.propose_trade(&give, &take);
            prop_assert_eq!(&verdict, &engine.propose_trade(&give, &take));
            if let Ok(quote) = engine.execute_trade(&give, &take) {
                prop_assert!(quote.give_value >= quote.take_value);
            }
            let limits = &engine.player().trade_limits;
            prop_assert!(limits.bought.iter().all(|(_, n)| n <= cap));
            prop_assert!(limits.sold.iter().all(|(_, n)| n <= cap));
            prop_assert!(engine.player().inventory.iter().all(|(_, n)| n > 0));
        }
    }
}
