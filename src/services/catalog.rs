use crate::models::{CellValue, FacilityRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading workbook exports
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

/// One logical grouping of rows, typically a workbook sheet per city/area
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// Column headers as they appear in the sheet
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a row built from `(column, value)` pairs, registering new columns
    pub fn with_row<K, V>(mut self, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
    {
        let row: HashMap<String, CellValue> =
            cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        for column in row.keys() {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
        self
    }

    fn has_column(&self, wanted: &str) -> bool {
        self.columns.iter().any(|c| normalize_column(c) == wanted)
    }
}

/// Source of workbook sheets
pub trait SheetSource {
    /// Names of every sheet, in workbook order
    fn sheet_names(&self) -> Result<Vec<String>, CatalogError>;

    /// Decode a single sheet
    fn read_sheet(&self, name: &str) -> Result<Sheet, CatalogError>;
}

/// Workbook exported as one CSV file per sheet
///
/// The file stem is the sheet name (`Makati.csv` → `Makati`); the first row
/// holds the column headers.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl SheetSource for CsvDirectorySource {
    fn sheet_names(&self) -> Result<Vec<String>, CatalogError> {
        if !self.dir.is_dir() {
            return Err(CatalogError::NotADirectory(self.dir.display().to_string()));
        }

        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
            })
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();

        // Directory order is platform dependent
        names.sort();
        Ok(names)
    }

    fn read_sheet(&self, name: &str) -> Result<Sheet, CatalogError> {
        let path = self.sheet_path(name);
        let csv_error = |source: csv::Error| CatalogError::Csv {
            path: path.display().to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::None)
            .from_path(&path)
            .map_err(csv_error)?;

        // Byte records so a stray non-UTF-8 byte only mangles its own cell
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        let mut sheet = Sheet::new(name);
        sheet.columns = headers.clone();

        for record in reader.byte_records() {
            let record = record.map_err(csv_error)?;
            let row = headers
                .iter()
                .zip(record.iter())
                .map(|(header, raw)| {
                    (header.clone(), CellValue::from_raw(&String::from_utf8_lossy(raw)))
                })
                .collect();
            sheet.rows.push(row);
        }

        Ok(sheet)
    }
}

/// Workbook column headers, after trimming and upper-casing
mod columns {
    pub const NAME: &str = "PARKING NAME";
    pub const DETAILS: &str = "DETAILS";
    pub const ADDRESS: &str = "ADDRESS";
    pub const OPENING: &str = "OPENING";
    pub const CLOSING: &str = "CLOSING";
    pub const LINK: &str = "LINK";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const GUARDS: &str = "GUARDS";
    pub const CCTVS: &str = "CCTVS";
    pub const INITIAL_RATE: &str = "INITIAL RATE";
    pub const DISCOUNT: &str = "PWD/SC DISCOUNT";
    pub const STREET_PARKING: &str = "STREET PARKING";
}

/// Read-only collection of facilities, built once at startup
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<FacilityRecord>,
}

impl Catalog {
    /// Wrap already-normalized records as-is
    ///
    /// No coordinate filtering happens here; use [`Catalog::from_sheets`] for
    /// decoder output.
    pub fn from_records(records: Vec<FacilityRecord>) -> Self {
        Self { records }
    }

    /// Build a catalog from decoded sheets
    ///
    /// Sheets without both coordinate columns are skipped; rows with a
    /// missing or unparsable coordinate are dropped. The sheet name becomes
    /// each record's city.
    pub fn from_sheets(sheets: impl IntoIterator<Item = Sheet>) -> Self {
        let mut records = Vec::new();

        for sheet in sheets {
            let loaded = load_sheet(&sheet);
            match loaded {
                Some(rows) => {
                    tracing::info!("Loaded {} rows from sheet '{}'", rows.len(), sheet.name);
                    records.extend(rows);
                }
                None => {
                    tracing::warn!(
                        "Sheet '{}' has no LATITUDE/LONGITUDE columns, skipping",
                        sheet.name
                    );
                }
            }
        }

        tracing::info!("Total parking rows loaded: {}", records.len());
        Self { records }
    }

    /// Read every sheet from `source` into a catalog
    ///
    /// A source that cannot be listed yields an empty catalog; a sheet that
    /// fails to decode is skipped. Either way the service keeps running.
    pub fn load(source: &dyn SheetSource) -> Self {
        let names = match source.sheet_names() {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("Failed to open parking workbook: {}", e);
                return Self::default();
            }
        };

        let sheets = names.into_iter().filter_map(|name| match source.read_sheet(&name) {
            Ok(sheet) => Some(sheet),
            Err(e) => {
                tracing::warn!("Error reading sheet '{}': {}", name, e);
                None
            }
        });

        Self::from_sheets(sheets)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacilityRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }
}

/// Normalize one sheet; `None` when it lacks coordinate columns entirely
fn load_sheet(sheet: &Sheet) -> Option<Vec<FacilityRecord>> {
    if !(sheet.has_column(columns::LATITUDE) && sheet.has_column(columns::LONGITUDE)) {
        return None;
    }

    let records = sheet
        .rows
        .iter()
        .filter_map(|row| record_from_row(row, &sheet.name))
        .collect();
    Some(records)
}

fn normalize_column(name: &str) -> String {
    name.trim().to_uppercase()
}

fn record_from_row(row: &HashMap<String, CellValue>, city: &str) -> Option<FacilityRecord> {
    let cells: HashMap<String, &CellValue> = row
        .iter()
        .map(|(k, v)| (normalize_column(k), v))
        .collect();
    let cell = |column: &str| cells.get(column).map(|v| (*v).clone()).unwrap_or_default();
    let text = |column: &str| cells.get(column).and_then(|v| v.to_display());

    let latitude = cells.get(columns::LATITUDE)?.as_coordinate()?;
    let longitude = cells.get(columns::LONGITUDE)?.as_coordinate()?;

    Some(FacilityRecord {
        name: text(columns::NAME),
        details: text(columns::DETAILS),
        address: text(columns::ADDRESS),
        link: text(columns::LINK),
        city: Some(city.to_string()),
        latitude,
        longitude,
        opening: cell(columns::OPENING),
        closing: cell(columns::CLOSING),
        guards: cell(columns::GUARDS),
        cctvs: cell(columns::CCTVS),
        street_parking: cell(columns::STREET_PARKING),
        initial_rate: cell(columns::INITIAL_RATE),
        pwd_discount: cell(columns::DISCOUNT),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::build_signals;
    use crate::models::UserLocation;

    fn makati() -> Sheet {
        Sheet::new("Makati")
            .with_row([
                (" Parking Name ", CellValue::from("Glorietta Carpark")),
                ("LATITUDE", CellValue::Number(14.5509)),
                ("longitude", CellValue::from("121.0260")),
                ("CCTVs", CellValue::from("YES")),
                ("Initial Rate", CellValue::from("PHP 60")),
                ("Opening", CellValue::from("24/7")),
                ("Remarks", CellValue::from("ignored")),
            ])
            .with_row([
                ("PARKING NAME", CellValue::from("No coords")),
                ("LATITUDE", CellValue::Empty),
                ("LONGITUDE", CellValue::Number(121.0)),
            ])
            .with_row([
                ("PARKING NAME", CellValue::from("Bad coords")),
                ("LATITUDE", CellValue::from("N/A")),
                ("LONGITUDE", CellValue::Number(121.0)),
            ])
    }

    #[test]
    fn test_normalizes_columns_and_drops_bad_rows() {
        let catalog = Catalog::from_sheets(vec![makati()]);

        assert_eq!(catalog.len(), 1);
        let record = &catalog.records()[0];
        assert_eq!(record.name.as_deref(), Some("Glorietta Carpark"));
        assert_eq!(record.city.as_deref(), Some("Makati"));
        assert_eq!(record.latitude, 14.5509);
        assert_eq!(record.longitude, 121.026);
        assert_eq!(record.cctvs, CellValue::from("YES"));
        assert_eq!(record.initial_rate, CellValue::from("PHP 60"));
        assert_eq!(record.opening, CellValue::from("24/7"));
        assert!(record.closing.is_empty());
    }

    #[test]
    fn test_skips_sheet_without_coordinate_columns() {
        let summary = Sheet::new("Summary").with_row([("TOTAL", CellValue::Number(12.0))]);
        let catalog = Catalog::from_sheets(vec![summary, makati()]);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.iter().all(|r| r.city.as_deref() == Some("Makati")));
    }

    #[test]
    fn test_header_only_sheet_contributes_nothing() {
        let mut sheet = Sheet::new("Quezon City");
        sheet.columns = vec!["LATITUDE".to_string(), "LONGITUDE".to_string()];

        assert_eq!(load_sheet(&sheet).map(|rows| rows.len()), Some(0));
    }

    #[test]
    fn test_empty_source_gives_empty_catalog() {
        let catalog = Catalog::from_sheets(Vec::<Sheet>::new());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_csv_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Taguig.csv"),
            "PARKING NAME,LATITUDE,LONGITUDE,OPENING,CLOSING,GUARDS\n\
             Market Market,14.5497,121.0557,10:00 AM,9:00 PM,Yes\n\
             Broken,,121.05,,,\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("Pasig.csv"), "NOTES\nnothing here\n").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a sheet").unwrap();

        let source = CsvDirectorySource::new(dir.path());
        assert_eq!(source.sheet_names().unwrap(), vec!["Pasig", "Taguig"]);

        let catalog = Catalog::load(&source);
        assert_eq!(catalog.len(), 1);
        let record = &catalog.records()[0];
        assert_eq!(record.city.as_deref(), Some("Taguig"));
        assert_eq!(record.opening, CellValue::from("10:00 AM"));
        assert_eq!(record.guards, CellValue::from("Yes"));
    }

    #[test]
    fn test_blank_amenity_cell_differs_from_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Manila.csv"),
            "PARKING NAME,LATITUDE,LONGITUDE,GUARDS,CCTVS,STREET PARKING\n\
             Blank Lot,14.5,121.0,,,\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Pasay.csv"),
            "PARKING NAME,LATITUDE,LONGITUDE\n\
             Bare Lot,14.5,121.0\n",
        )
        .unwrap();

        let catalog = Catalog::load(&CsvDirectorySource::new(dir.path()));
        assert_eq!(catalog.len(), 2);

        let user = UserLocation {
            lat: 14.5,
            lng: 121.0,
            time_of_day: 12,
        };
        let signals: Vec<_> = catalog
            .iter()
            .map(|r| build_signals(r, &user).unwrap())
            .collect();

        // Manila sorts first: blank cells in present columns
        assert_eq!(catalog.records()[0].guards, CellValue::Blank);
        assert_eq!(
            (signals[0].guards, signals[0].cctvs, signals[0].street_parking),
            (1, 1, 1)
        );

        // Pasay has no amenity columns at all
        assert_eq!(catalog.records()[1].guards, CellValue::Empty);
        assert_eq!(
            (signals[1].guards, signals[1].cctvs, signals[1].street_parking),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_invalid_utf8_only_affects_its_cell() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = b"PARKING NAME,LATITUDE,LONGITUDE,DETAILS\n".to_vec();
        bytes.extend_from_slice(b"Caf\xe9 Lot,14.55,121.02,Basement\n");
        bytes.extend_from_slice(b"Plain Lot,14.56,121.03,Open air\n");
        std::fs::write(dir.path().join("Makati.csv"), bytes).unwrap();

        let catalog = Catalog::load(&CsvDirectorySource::new(dir.path()));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].name.as_deref(), Some("Caf\u{FFFD} Lot"));
        assert_eq!(catalog.records()[0].details.as_deref(), Some("Basement"));
        assert_eq!(catalog.records()[1].name.as_deref(), Some("Plain Lot"));
    }

    #[test]
    fn test_missing_directory_gives_empty_catalog() {
        let source = CsvDirectorySource::new("/definitely/not/here");
        assert!(source.sheet_names().is_err());
        assert!(Catalog::load(&source).is_empty());
    }
}
