use serde::{Deserialize, Serialize};

/// Location identifier (one ghost kitchen per location)
pub type LocationId = u8;

/// Brand identifier
pub type BrandId = u32;

/// Menu item identifier
pub type ItemId = u32;

/// Six-character alphanumeric order identifier
pub type OrderId = String;

/// Simulated time in whole milliseconds since the Unix epoch
pub type SimMillis = i64;

pub const SECONDS_PER_DAY: i64 = 86_400;

pub const MINUTES_PER_DAY: usize = 1440;

/// Number of simulated days in the canonical dataset
pub const DATASET_DAYS: u32 = 90;

/// 2024-01-01T00:00:00Z, a Monday
pub const DATASET_EPOCH_SECONDS: i64 = 1_704_067_200;

pub const METERS_PER_MILE: f64 = 1609.34;

/// Last simulated second (exclusive) of the canonical dataset
pub fn dataset_horizon_seconds() -> i64 {
    DATASET_EPOCH_SECONDS + DATASET_DAYS as i64 * SECONDS_PER_DAY
}

/// Absolute second at which a simulated day begins
pub fn day_start_seconds(day: u32) -> i64 {
    DATASET_EPOCH_SECONDS + day as i64 * SECONDS_PER_DAY
}

/// A WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in meters
    pub fn haversine_m(&self, other: &Coord) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_008.8;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }

    /// Point displaced by the given meters north and east
    pub fn offset_m(&self, north_m: f64, east_m: f64) -> Coord {
        const METERS_PER_DEG_LAT: f64 = 111_320.0;
        let lat = self.lat + north_m / METERS_PER_DEG_LAT;
        let lon = self.lon + east_m / (METERS_PER_DEG_LAT * self.lat.to_radians().cos());
        Coord { lat, lon }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
