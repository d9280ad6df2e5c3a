//! Interfaces between the domain and the outside world.

pub mod config_port;
pub mod quote_source;
pub mod report_port;
pub mod series_store;

pub use config_port::ConfigPort;
pub use quote_source::{QuotePage, QuoteSource};
pub use report_port::ReportPort;
pub use series_store::SeriesStore;
