use serde::{Deserialize, Serialize};

/// A single raw cell as produced by the workbook decoder
///
/// Serializes untagged so raw values echo back to clients exactly as they
/// appeared in the sheet (`"7:00 AM"`, `20`, `null`).
///
/// `Empty` means the column was not in the sheet at all; `Blank` is a cell
/// that exists but holds nothing. The two normalize differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    #[default]
    Empty,
    Blank,
}

impl CellValue {
    /// Classify a raw decoded string the way a spreadsheet would type it
    ///
    /// Blank cells become `Blank`, finite numerals become `Number`, anything
    /// else stays `Text`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interpret the cell as a finite coordinate
    pub fn as_coordinate(&self) -> Option<f64> {
        let value = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Render the cell for display fields; blank cells are absent
    pub fn to_display(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Empty | CellValue::Blank => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty | CellValue::Blank)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// One parking facility as loaded from the workbook
///
/// Display fields are kept verbatim; amenity, pricing and schedule fields stay
/// raw and are normalized per request by the feature builder.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FacilityRecord {
    pub name: Option<String>,
    pub details: Option<String>,
    pub address: Option<String>,
    pub link: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    pub opening: CellValue,
    pub closing: CellValue,
    #[serde(rename = "guards_raw")]
    pub guards: CellValue,
    #[serde(rename = "cctvs_raw")]
    pub cctvs: CellValue,
    #[serde(rename = "street_raw")]
    pub street_parking: CellValue,
    #[serde(rename = "initial_rate_raw")]
    pub initial_rate: CellValue,
    #[serde(rename = "discount_raw")]
    pub pwd_discount: CellValue,
}

impl FacilityRecord {
    /// Create a record at the given coordinates with every other field blank
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// The request-side inputs that every feature vector depends on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub lat: f64,
    pub lng: f64,
    pub time_of_day: u8,
}

/// Ranked facility returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub name: Option<String>,
    pub details: Option<String>,
    pub address: Option<String>,
    pub link: Option<String>,
    pub city: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub distance_km: f64,
    pub open_now: bool,
    pub opening: CellValue,
    pub closing: CellValue,
    pub guards: u8,
    pub cctvs: u8,
    pub initial_rate: f64,
    pub pwd_discount: u8,
    pub street_parking: u8,
    pub score: f64,
}

/// A latitude/longitude pair as sent by routing clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A stop in visiting order, as returned by `/optimize`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedStop {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LatLon> for OrderedStop {
    fn from(point: LatLon) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lon,
        }
    }
}
