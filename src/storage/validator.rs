//! K 線寫入前的數據驗證

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain_types::PriceBar;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BarValidationError {
    #[error("無效的數值: {field} = {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("數值不能為負數: {field} = {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("數據不一致: {description}")]
    InconsistentValue { description: String },

    #[error("日期未嚴格遞增: {previous} -> {current}")]
    OutOfOrder {
        previous: NaiveDate,
        current: NaiveDate,
    },
}

pub type ValidationResult<T> = Result<T, BarValidationError>;

/// 數據驗證器特徵
pub trait DataValidator<T> {
    /// 驗證單個數據項
    fn validate_item(&self, item: &T) -> ValidationResult<()>;

    /// 批量驗證多個數據項
    fn validate_batch(&self, items: &[T]) -> ValidationResult<()> {
        for item in items {
            self.validate_item(item)?;
        }
        Ok(())
    }

    /// 驗證並返回有效數據（過濾無效數據）
    fn validate_and_filter(&self, items: Vec<T>) -> (Vec<T>, Vec<(T, BarValidationError)>) {
        let mut valid_items = Vec::new();
        let mut invalid_items = Vec::new();

        for item in items {
            match self.validate_item(&item) {
                Ok(_) => valid_items.push(item),
                Err(e) => invalid_items.push((item, e)),
            }
        }

        (valid_items, invalid_items)
    }
}

/// 日 K 線驗證器
#[derive(Debug, Clone, Copy, Default)]
pub struct BarValidator;

impl BarValidator {
    pub fn new() -> Self {
        Self
    }

    /// 驗證數值皆為有限非負數
    fn validate_values(&self, bar: &PriceBar) -> ValidationResult<()> {
        for (field, value) in bar.numeric_fields() {
            if !value.is_finite() {
                return Err(BarValidationError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(BarValidationError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// 驗證價格一致性
    fn validate_price_consistency(&self, bar: &PriceBar) -> ValidationResult<()> {
        // 檢查 high >= low
        if bar.high < bar.low {
            return Err(BarValidationError::InconsistentValue {
                description: format!("最高價 ({}) 低於最低價 ({})", bar.high, bar.low),
            });
        }

        if bar.high < bar.open || bar.high < bar.close {
            return Err(BarValidationError::InconsistentValue {
                description: format!(
                    "最高價 ({}) 必須大於等於開盤價 ({}) 和收盤價 ({})",
                    bar.high, bar.open, bar.close
                ),
            });
        }

        if bar.low > bar.open || bar.low > bar.close {
            return Err(BarValidationError::InconsistentValue {
                description: format!(
                    "最低價 ({}) 必須小於等於開盤價 ({}) 和收盤價 ({})",
                    bar.low, bar.open, bar.close
                ),
            });
        }

        Ok(())
    }

    /// 驗證日期嚴格遞增且無重複
    pub fn validate_sequence(&self, bars: &[PriceBar]) -> ValidationResult<()> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BarValidationError::OutOfOrder {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(())
    }
}

impl DataValidator<PriceBar> for BarValidator {
    fn validate_item(&self, item: &PriceBar) -> ValidationResult<()> {
        self.validate_values(item)?;
        self.validate_price_consistency(item)
    }
}
