// Service exports
pub mod catalog;
pub mod osrm;
pub mod routing;

pub use catalog::{Catalog, CatalogError, CsvDirectorySource, Sheet, SheetSource};
pub use osrm::OsrmClient;
pub use routing::{
    HttpRoutingBackend, RouteSummary, RoutingBackend, RoutingClientConfig, RoutingError,
    RoutingService, TripSummary,
};
