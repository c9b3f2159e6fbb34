pub mod error;
pub mod time_series_store;
pub mod validator;

pub use error::StoreError;
pub use time_series_store::{TimeSeriesStore, UpsertSummary, VersionedBars};
pub use validator::{BarValidationError, BarValidator, DataValidator};
