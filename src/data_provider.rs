//! 上游行情數據來源接口

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain_types::PriceBar;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("數據源不可用 ({symbol}): {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error("數據源沒有返回 {symbol} 的數據")]
    Empty { symbol: String },
}

/// 數據提供者特性
///
/// 按標的與日期範圍（含兩端）返回日 K 線。實現可以是網絡接口、本地文件或回放數據，
/// 返回的 K 線在寫入存儲前會再經過驗證。
#[cfg_attr(test, mockall::automock)]
pub trait DataProvider: Send + Sync {
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockDataProvider::new();
        provider
            .expect_fetch()
            .returning(|symbol, _, _| {
                Err(ProviderError::Empty {
                    symbol: symbol.to_string(),
                })
            });

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = provider.fetch("000001", start, start).unwrap_err();
        assert_eq!(err.to_string(), "數據源沒有返回 000001 的數據");
    }
}
