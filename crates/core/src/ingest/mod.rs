pub mod error;
pub mod provider;

pub use error::FetchError;
pub use provider::{HttpTrendsClient, TrendsSource};
