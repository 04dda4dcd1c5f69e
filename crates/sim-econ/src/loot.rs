//! What robbers take from an ambushed caravan.

use crate::Prices;
use sim_core::{Fraction, Good, GoodCounts};

/// Value robbers aim to take from a caravan worth `remaining_value`.
pub fn stolen_target(remaining_value: u64, fraction: Fraction) -> u64 {
    fraction.of_floor(remaining_value)
}

/// Choose the goods stolen within `budget`.
///
/// Goods are visited from the highest price down, taking as many whole
/// units of each as still fit in the budget. A caravan reduced to a single
/// unit priced below `neutral_price` loses that unit outright, since no
/// budget derived from it could ever cover it.
pub fn select_loot(inventory: &GoodCounts, prices: &Prices, budget: u64, neutral_price: u32) -> GoodCounts {
    let mut held: Vec<(Good, u32, u32)> = inventory
        .iter()
        .map(|(g, n)| (g, n, prices.get(g)))
        .collect();
    held.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    let mut loot = GoodCounts::new();
    if let [(good, 1, price)] = held.as_slice() {
        if *price < neutral_price {
            loot.add(*good, 1);
            return loot;
        }
    }

    let mut left = budget;
    for (good, count, price) in held {
        if left == 0 {
            break;
        }
        if price == 0 {
            continue;
        }
        let fit = (left / u64::from(price)).min(u64::from(count));
        let take = u32::try_from(fit).unwrap_or(count);
        if take > 0 {
            loot.add(good, take);
            left -= u64::from(take) * u64::from(price);
        }
    }
    loot
}
