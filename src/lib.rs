pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod query;

pub use client::{Endpoint, NvdApi, RequestObserver, Transport};
pub use config::Config;
pub use error::{AbsentOnFailure, NvdError};
pub use query::{DateFilters, DateInput, Pagination};
