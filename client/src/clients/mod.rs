mod backend;
mod error;
mod geoip;
mod http;

// Re-export public types
pub use backend::{AnalysisRoute, Backend, Profile};
pub use error::ClientError;
pub use geoip::{GeoIpClient, Location, GEOIP_URL};
pub use http::{Auth, BackendClient};
