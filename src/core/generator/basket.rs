use crate::core::dimensions::{BrandActivation, DimensionStore, Item};
use crate::core::types::LocationId;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One basket entry; serialises as the item's fields plus `qty`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketLine {
    #[serde(flatten)]
    pub item: Item,
    pub qty: u8,
}

/// Popularity weight of a brand `day` days into the dataset.
///
/// Monthly growth compounds daily from the brand's launch at the location,
/// floored at 0.1 so shrinking brands keep selling a little.
pub fn brand_weight(activation: &BrandActivation, day: u32) -> f64 {
    let daily_rate = (1.0 + activation.growth_rate_monthly).powf(1.0 / 30.0) - 1.0;
    let days_since_start = day as i32 - activation.start_day as i32;
    (1.0 + daily_rate).powi(days_since_start).max(0.1)
}

/// Picks brands and items for an order
pub struct BasketSelector<'a> {
    store: &'a DimensionStore,
    single_brand_probability: f64,
}

impl<'a> BasketSelector<'a> {
    pub fn new(store: &'a DimensionStore, single_brand_probability: f64) -> Self {
        Self {
            store,
            single_brand_probability,
        }
    }

    /// Basket for an order at `location_id` on `day`; empty when no brand is
    /// active or the chosen brands have no items
    pub fn select<R: Rng + ?Sized>(&self, location_id: LocationId, day: u32, rng: &mut R) -> Vec<BasketLine> {
        let active = self.store.active_brands(location_id, day);
        if active.is_empty() {
            return Vec::new();
        }

        let brand_count = if rng.gen_bool(self.single_brand_probability) {
            1
        } else {
            rng.gen_range(2..=3usize).min(active.len())
        };

        let chosen: Vec<&BrandActivation> = match active.choose_multiple_weighted(rng, brand_count, |a| brand_weight(a, day)) {
            Ok(picked) => picked.copied().collect(),
            Err(_) => return Vec::new(),
        };

        let mut basket = Vec::new();
        for activation in chosen {
            let menu = self.store.items_for_brand(activation.brand_id);
            if menu.is_empty() {
                continue;
            }
            let item_count = rng.gen_range(1..=menu.len().min(3));
            let picked: Vec<&Item> = menu.choose_multiple(rng, item_count).collect();
            for item in picked {
                basket.push(BasketLine {
                    item: item.clone(),
                    qty: rng.gen_range(1..=2),
                });
            }
        }
        basket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dimensions::{Brand, Location};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn activation(growth_rate_monthly: f64, start_day: u32) -> BrandActivation {
        BrandActivation {
            brand_id: 1,
            location_id: 1,
            start_day,
            end_day: None,
            growth_rate_monthly,
        }
    }

    #[test]
    fn test_brand_weight_compounds_monthly_growth() {
        assert!((brand_weight(&activation(0.5, 0), 0) - 1.0).abs() < 1e-12);
        // Thirty days at 50% monthly growth is 1.5x
        assert!((brand_weight(&activation(0.5, 10), 40) - 1.5).abs() < 1e-9);
        assert!((brand_weight(&activation(0.0, 0), 89) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_brand_weight_is_floored() {
        assert_eq!(brand_weight(&activation(-0.9, 0), 89), 0.1);
    }

    #[test]
    fn test_basket_lines_are_valid() {
        let store = DimensionStore::builtin();
        let selector = BasketSelector::new(&store, 0.7);
        let mut rng = StdRng::seed_from_u64(17);

        for day in [0, 30, 60, 89] {
            let active: HashSet<u32> = store.active_brands(3, day).iter().map(|a| a.brand_id).collect();
            for _ in 0..200 {
                let basket = selector.select(3, day, &mut rng);
                assert!(!basket.is_empty());

                let brands: HashSet<u32> = basket.iter().map(|l| l.item.brand_id).collect();
                assert!((1..=3).contains(&brands.len()));
                assert!(brands.is_subset(&active));

                for brand in &brands {
                    let lines: Vec<_> = basket.iter().filter(|l| l.item.brand_id == *brand).collect();
                    assert!((1..=3).contains(&lines.len()));
                    let distinct: HashSet<u32> = lines.iter().map(|l| l.item.item_id).collect();
                    assert_eq!(distinct.len(), lines.len());
                }
                assert!(basket.iter().all(|l| (1..=2).contains(&l.qty)));
            }
        }
    }

    #[test]
    fn test_single_brand_share_is_about_seventy_percent() {
        let store = DimensionStore::builtin();
        let selector = BasketSelector::new(&store, 0.7);
        let mut rng = StdRng::seed_from_u64(5);
        let single = (0..2000)
            .filter(|_| {
                let basket = selector.select(1, 30, &mut rng);
                basket.iter().map(|l| l.item.brand_id).collect::<HashSet<_>>().len() == 1
            })
            .count();
        assert!((1250..=1550).contains(&single), "single-brand orders {}", single);
    }

    #[test]
    fn test_no_active_brand_gives_empty_basket() {
        let base = DimensionStore::builtin();
        let location: Location = base.locations()[0].clone();
        let store = DimensionStore::new(
            vec![location],
            vec![Brand {
                brand_id: 1,
                name: "Late Opener".to_string(),
                cuisine: "test".to_string(),
            }],
            vec![activation(0.0, 50)],
            vec![],
            base.items_for_brand(1).to_vec(),
        )
        .unwrap();
        let selector = BasketSelector::new(&store, 0.7);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(selector.select(1, 10, &mut rng).is_empty());
        assert!(!selector.select(1, 50, &mut rng).is_empty());
    }

    #[test]
    fn test_basket_line_serialises_flat() {
        let store = DimensionStore::builtin();
        let line = BasketLine {
            item: store.items_for_brand(2)[0].clone(),
            qty: 2,
        };
        let value = serde_json::to_value(&line).unwrap();
        assert_eq!(value["qty"], 2);
        assert_eq!(value["brand_id"], 2);
        assert!(value.get("item").is_none());
    }
}
