use thiserror::Error;

/// 指標計算錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("數據不足: 需要至少 {required} 筆，實際 {provided} 筆")]
    InsufficientData { required: usize, provided: usize },

    #[error("無效的指標參數: {0}")]
    InvalidParameter(String),
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;
