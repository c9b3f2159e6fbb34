use chrono::NaiveDate;
use thiserror::Error;

use super::validator::BarValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{symbol} 在 {date} 的 K 線無效: {reason}")]
    MalformedBar {
        symbol: String,
        date: NaiveDate,
        #[source]
        reason: BarValidationError,
    },
}
