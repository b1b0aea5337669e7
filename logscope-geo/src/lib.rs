pub mod cache;
pub mod enricher;
pub mod ipinfo;
pub mod lookup;

pub use cache::GeoCache;
pub use enricher::{EnrichStats, GeoEnricher, LOOKUP_ERROR, UNKNOWN_COUNTRY};
pub use ipinfo::IpInfoClient;
pub use lookup::{CountryLookup, GeoError, OfflineLookup};
