use crate::core::{
    availability::is_open_now,
    distance::haversine_distance,
    normalize::{discount_to_bit, rate_to_number, yesno_to_bit},
};
use crate::models::{FacilityRecord, UserLocation};

/// Number of inputs the scoring model was trained on
pub const FEATURE_COUNT: usize = 7;

/// Feature names, in the order the model expects them
///
/// Changing this order requires retraining the model.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "distance_km",
    "open_now",
    "cctvs",
    "guards",
    "initial_rate",
    "pwd_discount",
    "street_parking",
];

/// Fixed-order numeric input to the scoring model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

/// Normalized, request-dependent signals for one facility
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilitySignals {
    pub distance_km: f64,
    pub open_now: bool,
    pub cctvs: u8,
    pub guards: u8,
    pub initial_rate: f64,
    pub pwd_discount: u8,
    pub street_parking: u8,
}

impl FacilitySignals {
    /// Lay the signals out in model order
    pub fn to_vector(&self) -> FeatureVector {
        FeatureVector([
            self.distance_km,
            if self.open_now { 1.0 } else { 0.0 },
            f64::from(self.cctvs),
            f64::from(self.guards),
            self.initial_rate,
            f64::from(self.pwd_discount),
            f64::from(self.street_parking),
        ])
    }
}

/// Compute the signals for `record` relative to the requesting user
///
/// Returns `None` when the record's coordinates are not finite, which keeps
/// it out of scoring altogether.
pub fn build_signals(record: &FacilityRecord, user: &UserLocation) -> Option<FacilitySignals> {
    if !record.has_valid_coordinates() {
        return None;
    }

    let distance_km = haversine_distance(user.lat, user.lng, record.latitude, record.longitude);
    let open_now = is_open_now(&record.opening, &record.closing, user.time_of_day);

    Some(FacilitySignals {
        distance_km,
        open_now,
        cctvs: yesno_to_bit(&record.cctvs),
        guards: yesno_to_bit(&record.guards),
        initial_rate: rate_to_number(&record.initial_rate),
        pwd_discount: discount_to_bit(&record.pwd_discount),
        street_parking: yesno_to_bit(&record.street_parking),
    })
}
