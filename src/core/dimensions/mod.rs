//! Static reference data: locations, brands, brand activations and menus.
//!
//! Pure lookup. Nothing here samples or mutates once loaded.

mod builtin;

use crate::core::errors::DimensionError;
use crate::core::types::{BrandId, Coord, ItemId, LocationId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const LOCATIONS_FILE: &str = "locations.json";
pub const BRANDS_FILE: &str = "brands.json";
pub const BRAND_LOCATIONS_FILE: &str = "brand_locations.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const ITEMS_FILE: &str = "items.json";

/// One ghost kitchen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: LocationId,
    pub location_code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub base_orders_day: f64,
    pub growth_rate_daily: f64,
    /// Apply the weekday multiplier table
    #[serde(default = "default_true")]
    pub weekly_pattern: bool,
    /// Use the late-night intensity curve instead of the standard one
    #[serde(default)]
    pub late_night_curve: bool,
}

fn default_true() -> bool {
    true
}

impl Location {
    pub fn coord(&self) -> Coord {
        Coord::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub brand_id: BrandId,
    pub name: String,
    pub cuisine: String,
}

/// A brand's activation window at one location, `[start_day, end_day)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandActivation {
    pub brand_id: BrandId,
    pub location_id: LocationId,
    pub start_day: u32,
    pub end_day: Option<u32>,
    pub growth_rate_monthly: f64,
}

impl BrandActivation {
    pub fn is_active_on(&self, day: u32) -> bool {
        self.start_day <= day && self.end_day.map_or(true, |end| day < end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: u32,
    pub brand_id: BrandId,
    pub name: String,
}

/// A menu item. Price and nutrition only travel downstream inside the basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub brand_id: BrandId,
    pub category_id: u32,
    pub name: String,
    pub price: f64,
    pub calories: u32,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

/// Indexed reference data
#[derive(Debug, Clone, Default)]
pub struct DimensionStore {
    locations: Vec<Location>,
    brands: HashMap<BrandId, Brand>,
    activations: Vec<BrandActivation>,
    categories: Vec<Category>,
    items_by_brand: HashMap<BrandId, Vec<Item>>,
}

impl DimensionStore {
    /// Build and validate a store from raw tables
    pub fn new(
        mut locations: Vec<Location>,
        brands: Vec<Brand>,
        activations: Vec<BrandActivation>,
        categories: Vec<Category>,
        items: Vec<Item>,
    ) -> Result<Self, DimensionError> {
        locations.sort_by_key(|l| l.location_id);
        if let Some(w) = locations.windows(2).find(|w| w[0].location_id == w[1].location_id) {
            return Err(DimensionError::Invalid(format!("duplicate location id {}", w[0].location_id)));
        }

        let brands: HashMap<BrandId, Brand> = brands.into_iter().map(|b| (b.brand_id, b)).collect();

        for activation in &activations {
            if !brands.contains_key(&activation.brand_id) {
                return Err(DimensionError::Invalid(format!(
                    "activation references unknown brand {}",
                    activation.brand_id
                )));
            }
            if !locations.iter().any(|l| l.location_id == activation.location_id) {
                return Err(DimensionError::Invalid(format!(
                    "activation references unknown location {}",
                    activation.location_id
                )));
            }
            if activation.end_day.map_or(false, |end| end <= activation.start_day) {
                return Err(DimensionError::Invalid(format!(
                    "brand {} at location {} has an empty activation window",
                    activation.brand_id, activation.location_id
                )));
            }
        }

        let mut items_by_brand: HashMap<BrandId, Vec<Item>> = HashMap::new();
        for item in items {
            items_by_brand.entry(item.brand_id).or_default().push(item);
        }
        for menu in items_by_brand.values_mut() {
            menu.sort_by_key(|i| i.item_id);
        }

        Ok(Self {
            locations,
            brands,
            activations,
            categories,
            items_by_brand,
        })
    }

    /// The four-city canonical reference set
    pub fn builtin() -> Self {
        builtin::canonical_store()
    }

    /// Load all dimension tables from JSON files in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self, DimensionError> {
        Self::new(
            read_table(&dir.join(LOCATIONS_FILE))?,
            read_table(&dir.join(BRANDS_FILE))?,
            read_table(&dir.join(BRAND_LOCATIONS_FILE))?,
            read_table(&dir.join(CATEGORIES_FILE))?,
            read_table(&dir.join(ITEMS_FILE))?,
        )
    }

    /// Write all dimension tables as JSON files into `dir`
    pub fn save_dir(&self, dir: &Path) -> Result<(), DimensionError> {
        std::fs::create_dir_all(dir).map_err(|source| DimensionError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut brands: Vec<&Brand> = self.brands.values().collect();
        brands.sort_by_key(|b| b.brand_id);
        let mut items: Vec<&Item> = self.items_by_brand.values().flatten().collect();
        items.sort_by_key(|i| i.item_id);

        write_table(&dir.join(LOCATIONS_FILE), &self.locations)?;
        write_table(&dir.join(BRANDS_FILE), &brands)?;
        write_table(&dir.join(BRAND_LOCATIONS_FILE), &self.activations)?;
        write_table(&dir.join(CATEGORIES_FILE), &self.categories)?;
        write_table(&dir.join(ITEMS_FILE), &items)
    }

    /// Locations ordered by id
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.location_id == location_id)
    }

    pub fn brand(&self, brand_id: BrandId) -> Option<&Brand> {
        self.brands.get(&brand_id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Activations of brands live at `location_id` on `day`, in declaration order
    pub fn active_brands(&self, location_id: LocationId, day: u32) -> Vec<&BrandActivation> {
        self.activations
            .iter()
            .filter(|a| a.location_id == location_id && a.is_active_on(day))
            .collect()
    }

    pub fn items_for_brand(&self, brand_id: BrandId) -> &[Item] {
        self.items_by_brand.get(&brand_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DimensionError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DimensionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DimensionError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn write_table<T: Serialize>(path: &Path, rows: &T) -> Result<(), DimensionError> {
    let raw = serde_json::to_string_pretty(rows).map_err(|source| DimensionError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, raw).map_err(|source| DimensionError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activation(brand_id: BrandId, start_day: u32, end_day: Option<u32>) -> BrandActivation {
        BrandActivation {
            brand_id,
            location_id: 1,
            start_day,
            end_day,
            growth_rate_monthly: 0.1,
        }
    }

    #[test]
    fn test_activation_window_is_half_open() {
        let window = activation(1, 10, Some(20));
        assert!(!window.is_active_on(9));
        assert!(window.is_active_on(10));
        assert!(window.is_active_on(19));
        assert!(!window.is_active_on(20));

        let open = activation(1, 5, None);
        assert!(open.is_active_on(89));
    }

    #[test]
    fn test_builtin_store_is_consistent() {
        let store = DimensionStore::builtin();
        assert_eq!(store.locations().len(), 4);
        assert_eq!(store.locations().iter().filter(|l| l.late_night_curve).count(), 1);
        assert_eq!(store.locations().iter().filter(|l| !l.weekly_pattern).count(), 1);
        for location in store.locations() {
            let active = store.active_brands(location.location_id, 0);
            assert!(!active.is_empty(), "location {} has no brand on day 0", location.location_code);
            for a in active {
                assert!(store.brand(a.brand_id).is_some());
                assert!(!store.items_for_brand(a.brand_id).is_empty());
            }
        }
    }

    #[test]
    fn test_rejects_unknown_brand() {
        let store = DimensionStore::builtin();
        let result = DimensionStore::new(
            store.locations().to_vec(),
            vec![],
            vec![activation(99, 0, None)],
            vec![],
            vec![],
        );
        assert!(matches!(result, Err(DimensionError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_dir() {
        let dir = std::env::temp_dir().join(format!("gksim_dims_{}", uuid::Uuid::new_v4()));
        let store = DimensionStore::builtin();
        store.save_dir(&dir).unwrap();

        let loaded = DimensionStore::load_dir(&dir).unwrap();
        assert_eq!(loaded.locations(), store.locations());
        assert_eq!(loaded.active_brands(1, 30).len(), store.active_brands(1, 30).len());
        assert_eq!(loaded.items_for_brand(1), store.items_for_brand(1));

        std::fs::remove_dir_all(&dir).ok();
    }
}
