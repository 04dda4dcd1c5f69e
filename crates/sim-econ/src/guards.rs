//! Guard hiring policy.
//!
//! Guards never accept the caravan's last water or last food, and charge a
//! fixed share of whatever else they could take.

use crate::Prices;
use serde::Serialize;
use sim_core::{Good, GoodCounts};

/// Price of protection for one journey.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardQuote {
    /// Value of everything guards are allowed to take.
    pub takeable_value: u64,
    /// Fee the guards ask for.
    pub fee: u64,
    /// Goods handed over.
    pub payment: GoodCounts,
    /// Value of `payment`; may exceed `fee` when no exact combination exists.
    pub payment_value: u64,
}

fn spare_units(good: Good, count: u32) -> u32 {
    if good.is_survival() {
        count.saturating_sub(1)
    } else {
        count
    }
}

/// Value of goods guards may take: all of it except one water and one food.
pub fn guard_takeable_value(inventory: &GoodCounts, prices: &Prices) -> u64 {
    inventory
        .iter()
        .map(|(g, n)| u64::from(spare_units(g, n)) * u64::from(prices.get(g)))
        .sum()
}

/// Quote guards for the caravan, or `None` when it cannot pay at least 1.
pub fn quote_guards(inventory: &GoodCounts, prices: &Prices, fee_divisor: u32) -> Option<GuardQuote> {
    let takeable_value = guard_takeable_value(inventory, prices);
    let fee = takeable_value / u64::from(fee_divisor.max(1));
    if takeable_value < 1 || fee < 1 {
        return None;
    }

    let mut candidates: Vec<(Good, u32, u32)> = inventory
        .iter()
        .map(|(g, n)| (g, spare_units(g, n), prices.get(g)))
        .filter(|&(_, spare, price)| spare > 0 && price > 0)
        .collect();
    candidates.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

    let mut payment = GoodCounts::new();
    let mut paid: u64 = 0;
    for (good, spare, price) in candidates {
        if paid >= fee {
            break;
        }
        let fit = ((fee - paid) / u64::from(price)).min(u64::from(spare));
        let mut take = u32::try_from(fit).unwrap_or(spare);
        // Nothing fits exactly and nothing is paid yet: hand over one unit.
        if take == 0 && paid == 0 {
            take = 1;
        }
        if take > 0 {
            payment.add(good, take);
            paid += u64::from(take) * u64::from(price);
        }
    }

    Some(GuardQuote {
        takeable_value,
        fee,
        payment,
        payment_value: paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::all_prices;
    use proptest::prelude::*;
    use sim_core::{MarketMode, PriceScale};

    fn bag(items: &[(Good, u32)]) -> GoodCounts {
        items.iter().copied().collect()
    }

    fn neutral() -> Prices {
        all_prices(&MarketMode::AllNeutral, &PriceScale::default())
    }

    #[test]
    fn lone_survival_units_are_untouchable() {
        let inv = bag(&[(Good::Water, 1), (Good::Food, 1)]);
        assert_eq!(guard_takeable_value(&inv, &neutral()), 0);
        assert!(quote_guards(&inv, &neutral(), 4).is_none());
    }

    #[test]
    fn fee_is_a_quarter_of_takeable() {
        let inv = bag(&[(Good::Water, 1), (Good::Food, 3), (Good::Ammo, 3)]);
        // takeable: 2 food + 3 ammo = 10 -> fee 2
        let quote = quote_guards(&inv, &neutral(), 4).unwrap();
        assert_eq!(quote.takeable_value, 10);
        assert_eq!(quote.fee, 2);
        assert_eq!(quote.payment_value, 2);
        assert_eq!(quote.payment.total_units(), 1);
    }

    #[test]
    fn pays_one_unit_when_nothing_fits() {
        let prices = all_prices(
            &MarketMode::OneExpensive {
                expensive: Good::Medicine,
            },
            &PriceScale::default(),
        );
        let inv = bag(&[(Good::Water, 1), (Good::Medicine, 2)]);
        // takeable 6 -> fee 1; medicine costs 3, so one unit is handed over
        let quote = quote_guards(&inv, &prices, 4).unwrap();
        assert_eq!(quote.fee, 1);
        assert_eq!(quote.payment, bag(&[(Good::Medicine, 1)]));
        assert_eq!(quote.payment_value, 3);
    }

    proptest! {
        #[test]
        fn never_takes_last_water_or_food(counts in proptest::collection::vec(0u32..6, 6), divisor in 1u32..6) {
            let inv: GoodCounts = Good::ALL.into_iter().zip(counts).collect();
            if let Some(quote) = quote_guards(&inv, &neutral(), divisor) {
                prop_assert!(inv.contains(&quote.payment));
                for g in Good::SURVIVAL {
                    if inv.count(g) > 0 {
                        prop_assert!(quote.payment.count(g) < inv.count(g));
                    }
                }
            }
        }
    }
}
