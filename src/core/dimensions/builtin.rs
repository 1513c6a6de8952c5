use super::{Brand, BrandActivation, Category, DimensionStore, Item, Location};
use crate::core::types::{BrandId, LocationId};

fn location(
    location_id: LocationId,
    code: &str,
    name: &str,
    (lat, lon): (f64, f64),
    base_orders_day: f64,
    growth_rate_daily: f64,
) -> Location {
    Location {
        location_id,
        location_code: code.to_string(),
        name: name.to_string(),
        lat,
        lon,
        base_orders_day,
        growth_rate_daily,
        weekly_pattern: true,
        late_night_curve: false,
    }
}

const BRANDS: &[(BrandId, &str, &str)] = &[
    (1, "Bowl Theory", "poke"),
    (2, "Crust Collective", "pizza"),
    (3, "Seoul Street", "korean"),
    (4, "Taqueria Norte", "mexican"),
    (5, "Green Ledger", "salads"),
    (6, "Smash Signal", "burgers"),
    (7, "Curry Circuit", "indian"),
    (8, "Night Noodle", "ramen"),
];

// (brand, location, start_day, end_day, monthly growth)
const ACTIVATIONS: &[(BrandId, LocationId, u32, Option<u32>, f64)] = &[
    (1, 1, 0, None, 0.05),
    (2, 1, 0, None, 0.02),
    (3, 1, 0, None, 0.08),
    (5, 1, 20, None, 0.25),
    (6, 1, 0, Some(75), -0.10),
    (1, 2, 0, None, 0.04),
    (4, 2, 0, None, 0.06),
    (6, 2, 0, None, 0.03),
    (8, 2, 0, None, 0.15),
    (7, 2, 45, None, 0.30),
    (2, 3, 0, None, 0.03),
    (5, 3, 0, None, 0.05),
    (7, 3, 0, None, 0.07),
    (3, 3, 60, None, 0.40),
    (4, 4, 0, None, 0.02),
    (6, 4, 0, None, 0.04),
    (2, 4, 0, None, 0.01),
    (8, 4, 30, None, 0.20),
];

// (brand, category, item name, price, calories, protein, fat, carbs)
const MENU: &[(BrandId, &str, &str, f64, u32, f64, f64, f64)] = &[
    (1, "bowls", "Classic Ahi Bowl", 15.50, 610, 38.0, 14.0, 78.0),
    (1, "bowls", "Spicy Salmon Bowl", 16.25, 680, 34.0, 22.0, 80.0),
    (1, "bowls", "Tofu Crunch Bowl", 13.75, 540, 21.0, 16.0, 74.0),
    (1, "sides", "Seaweed Salad", 5.50, 110, 2.0, 6.0, 12.0),
    (2, "pizzas", "Margherita", 14.00, 980, 42.0, 36.0, 118.0),
    (2, "pizzas", "Hot Honey Pepperoni", 17.50, 1180, 50.0, 52.0, 120.0),
    (2, "pizzas", "Wild Mushroom", 16.00, 1020, 40.0, 40.0, 122.0),
    (2, "sides", "Garlic Knots", 6.50, 420, 11.0, 18.0, 54.0),
    (3, "mains", "Bulgogi Rice Plate", 15.00, 820, 41.0, 24.0, 102.0),
    (3, "mains", "Spicy Pork Bibimbap", 14.50, 760, 33.0, 26.0, 96.0),
    (3, "sides", "Korean Fried Wings", 11.00, 690, 44.0, 42.0, 30.0),
    (3, "sides", "Kimchi Pancake", 8.00, 380, 9.0, 16.0, 48.0),
    (4, "tacos", "Carne Asada Tacos", 12.50, 640, 36.0, 28.0, 58.0),
    (4, "tacos", "Al Pastor Tacos", 12.00, 610, 31.0, 26.0, 60.0),
    (4, "burritos", "Chicken Burrito", 13.50, 980, 52.0, 34.0, 112.0),
    (4, "sides", "Chips and Guacamole", 6.00, 520, 6.0, 32.0, 54.0),
    (5, "salads", "Harvest Cobb", 14.00, 590, 36.0, 38.0, 24.0),
    (5, "salads", "Kale Caesar", 12.50, 470, 18.0, 30.0, 32.0),
    (5, "grains", "Quinoa Power Bowl", 13.00, 560, 22.0, 20.0, 72.0),
    (6, "burgers", "Double Smash", 13.00, 1050, 58.0, 64.0, 48.0),
    (6, "burgers", "Mushroom Swiss", 13.50, 980, 50.0, 58.0, 50.0),
    (6, "sides", "Crinkle Fries", 4.50, 430, 5.0, 22.0, 54.0),
    (6, "drinks", "Vanilla Shake", 6.00, 720, 14.0, 32.0, 94.0),
    (7, "curries", "Butter Chicken", 16.00, 880, 46.0, 48.0, 62.0),
    (7, "curries", "Chana Masala", 13.00, 640, 22.0, 20.0, 90.0),
    (7, "breads", "Garlic Naan", 4.00, 310, 9.0, 8.0, 50.0),
    (8, "ramen", "Tonkotsu Ramen", 15.50, 920, 38.0, 44.0, 92.0),
    (8, "ramen", "Spicy Miso Ramen", 15.00, 880, 34.0, 40.0, 94.0),
    (8, "sides", "Pork Gyoza", 7.50, 360, 16.0, 16.0, 36.0),
    (8, "sides", "Karaage", 9.00, 540, 32.0, 30.0, 28.0),
];

pub(super) fn canonical_store() -> DimensionStore {
    let mut silicon_valley = location(2, "sv", "Silicon Valley", (37.4419, -122.1430), 140.0, 0.004);
    silicon_valley.weekly_pattern = false;
    silicon_valley.late_night_curve = true;

    let locations = vec![
        location(1, "sf", "San Francisco", (37.7749, -122.4194), 180.0, 0.003),
        silicon_valley,
        location(3, "bellevue", "Bellevue", (47.6101, -122.2015), 110.0, 0.005),
        location(4, "chicago", "Chicago", (41.8781, -87.6298), 160.0, 0.002),
    ];

    let brands = BRANDS
        .iter()
        .map(|&(brand_id, name, cuisine)| Brand {
            brand_id,
            name: name.to_string(),
            cuisine: cuisine.to_string(),
        })
        .collect();

    let activations = ACTIVATIONS
        .iter()
        .map(|&(brand_id, location_id, start_day, end_day, growth_rate_monthly)| BrandActivation {
            brand_id,
            location_id,
            start_day,
            end_day,
            growth_rate_monthly,
        })
        .collect();

    let mut categories: Vec<Category> = Vec::new();
    let mut items = Vec::new();
    for (idx, &(brand_id, category, name, price, calories, protein_g, fat_g, carbs_g)) in MENU.iter().enumerate() {
        let category_id = match categories.iter().find(|c| c.brand_id == brand_id && c.name == category) {
            Some(existing) => existing.category_id,
            None => {
                let category_id = categories.len() as u32 + 1;
                categories.push(Category {
                    category_id,
                    brand_id,
                    name: category.to_string(),
                });
                category_id
            }
        };
        items.push(Item {
            item_id: idx as u32 + 1,
            brand_id,
            category_id,
            name: name.to_string(),
            price,
            calories,
            protein_g,
            fat_g,
            carbs_g,
        });
    }

    DimensionStore::new(locations, brands, activations, categories, items)
        .unwrap_or_else(|e| unreachable!("builtin dimension tables are inconsistent: {e}"))
}
