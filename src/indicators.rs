//! 技術指標計算引擎
//!
//! 所有函數都是純函數：輸入與 K 線日期對齊的序列，輸出等長序列，
//! 回溯窗口內的點為未定義（`None`）。

pub mod bollinger;
pub mod engine;
pub mod error;
pub mod kdj;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod smoothing;
pub mod volume_ratio;

pub use bollinger::{bollinger, BollingerBands};
pub use engine::{IndicatorEngine, StandardEngine};
pub use error::{IndicatorError, IndicatorResult};
pub use kdj::{kdj, rsv, KdjSeries};
pub use macd::{macd, MacdSeries};
pub use moving_average::{ema, ma};
pub use rsi::rsi;
pub use smoothing::{scan_smooth, Seed, Smoothing};
pub use volume_ratio::volume_ratio;

/// 任何指標計算所需的最少數據筆數
pub const MIN_INPUT_LEN: usize = 2;

/// 檢查輸入長度
pub(crate) fn ensure_min_len(len: usize) -> IndicatorResult<()> {
    if len < MIN_INPUT_LEN {
        return Err(IndicatorError::InsufficientData {
            required: MIN_INPUT_LEN,
            provided: len,
        });
    }
    Ok(())
}

/// 檢查週期參數
pub(crate) fn ensure_period(period: usize, name: &str) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "{} 週期必須大於 0",
            name
        )));
    }
    Ok(())
}
