//! GeoIndex: geohash bucketing and great-circle distance.
//!
//! Buckets are a query pre-filter only. Every "is this within the radius"
//! decision goes through [`distance_km`], because two points a metre apart
//! can sit in different buckets.

use serde::{Deserialize, Serialize};

/// Standard geohash base-32 alphabet.
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Longest geohash this module will produce or accept.
pub const MAX_PRECISION: usize = 12;

/// A latitude/longitude sample in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that the sample is finite and on the globe.
    pub fn validate(&self) -> Result<(), String> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err("coordinates must be finite numbers".into());
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude must be within [-90, 90], got {}", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!(
                "longitude must be within [-180, 180], got {}",
                self.lng
            ));
        }
        Ok(())
    }

    /// Great-circle distance to another sample.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Rejected geohash input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("Geohash must not be empty")]
    Empty,

    #[error("Geohash longer than {MAX_PRECISION} characters")]
    TooLong,

    #[error("Invalid geohash character '{0}'")]
    InvalidChar(char),
}

/// The cell a geohash covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }
}

// ---------------------------------------------------------------------------
// Geohash
// ---------------------------------------------------------------------------

/// Encode a point as a geohash of `precision` characters.
///
/// Deterministic; shorter precision means a larger bucket. Precision is
/// clamped to `1..=MAX_PRECISION`.
pub fn encode(lat: f64, lng: f64, precision: usize) -> String {
    let precision = precision.clamp(1, MAX_PRECISION);
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);

    let mut hash = String::with_capacity(precision);
    let mut bits = 0;
    let mut index = 0usize;
    let mut even = true;

    while hash.len() < precision {
        let (range, value) = if even {
            (&mut lng_range, lng)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value > mid {
            index = (index << 1) | 1;
            range.0 = mid;
        } else {
            index <<= 1;
            range.1 = mid;
        }

        even = !even;
        bits += 1;
        if bits == 5 {
            hash.push(BASE32[index] as char);
            bits = 0;
            index = 0;
        }
    }

    hash
}

/// Decode a geohash into the cell it covers.
pub fn decode_bbox(hash: &str) -> Result<BoundingBox, GeoError> {
    if hash.is_empty() {
        return Err(GeoError::Empty);
    }
    if hash.len() > MAX_PRECISION {
        return Err(GeoError::TooLong);
    }

    let mut bbox = BoundingBox {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lng: -180.0,
        max_lng: 180.0,
    };
    let mut even = true;

    for ch in hash.chars() {
        let lower = ch.to_ascii_lowercase();
        let index = BASE32
            .iter()
            .position(|&b| b as char == lower)
            .ok_or(GeoError::InvalidChar(ch))?;

        for shift in (0..5).rev() {
            let bit = (index >> shift) & 1;
            if even {
                let mid = (bbox.min_lng + bbox.max_lng) / 2.0;
                if bit == 1 {
                    bbox.min_lng = mid;
                } else {
                    bbox.max_lng = mid;
                }
            } else {
                let mid = (bbox.min_lat + bbox.max_lat) / 2.0;
                if bit == 1 {
                    bbox.min_lat = mid;
                } else {
                    bbox.max_lat = mid;
                }
            }
            even = !even;
        }
    }

    Ok(bbox)
}

/// The 8 cells adjacent to `hash`, at the same precision.
///
/// Order: N, NE, E, SE, S, SW, W, NW. Longitude wraps at the antimeridian;
/// near the poles the northern/southern row repeats the current row.
pub fn neighbors(hash: &str) -> Result<Vec<String>, GeoError> {
    const OFFSETS: [(f64, f64); 8] = [
        (1.0, 0.0),
        (1.0, 1.0),
        (0.0, 1.0),
        (-1.0, 1.0),
        (-1.0, 0.0),
        (-1.0, -1.0),
        (0.0, -1.0),
        (1.0, -1.0),
    ];

    let bbox = decode_bbox(hash)?;
    let center = bbox.center();
    let height = bbox.max_lat - bbox.min_lat;
    let width = bbox.max_lng - bbox.min_lng;
    let precision = hash.len();

    Ok(OFFSETS
        .iter()
        .map(|(dlat, dlng)| {
            let mut lat = center.lat + dlat * height;
            if !(-90.0..=90.0).contains(&lat) {
                lat = center.lat;
            }
            let lng = wrap_longitude(center.lng + dlng * width);
            encode(lat, lng, precision)
        })
        .collect())
}

/// The bucket containing `point` followed by its neighbours, deduplicated.
///
/// This is the set of buckets a proximity query must scan so that it is not
/// blind to candidates just across a bucket boundary.
pub fn search_buckets(point: &Coordinates, precision: usize) -> Vec<String> {
    let center = encode(point.lat, point.lng, precision);
    let mut buckets = vec![center.clone()];
    if let Ok(adjacent) = neighbors(&center) {
        for bucket in adjacent {
            if !buckets.contains(&bucket) {
                buckets.push(bucket);
            }
        }
    }
    buckets
}

fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Great-circle distance in kilometres (haversine).
///
/// Symmetric, and monotonic in angular separation.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Human-readable distance, e.g. `"440m away"` or `"1.2km away"`.
pub fn distance_label(km: f64) -> String {
    if km < 1.0 {
        format!("{}m away", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.1}km away")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
