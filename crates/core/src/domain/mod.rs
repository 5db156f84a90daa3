pub mod signal;
pub mod trend;
