//! 移動平均線：MA 與 EMA

use super::smoothing::{mean, rolling, scan_smooth, Smoothing};
use super::{ensure_min_len, ensure_period, IndicatorResult};
use crate::domain_types::Series;

/// 簡單移動平均線 MA(n)
///
/// 前 `n - 1` 個點未定義，其餘為最近 n 期收盤價的算術平均。
pub fn ma(closes: &Series<f64>, period: usize) -> IndicatorResult<Series<f64>> {
    ensure_period(period, "MA")?;
    ensure_min_len(closes.len())?;

    let values = sma_values(&closes.values(), period);
    Ok(Series::from_parts(&closes.dates(), values))
}

/// 指數移動平均線 EMA(n)
///
/// 種子為第一個完整窗口的 MA(n)，之後
/// `EMA[t] = EMA[t-1] + 2/(n+1) * (close[t] - EMA[t-1])`。
pub fn ema(closes: &Series<f64>, period: usize) -> IndicatorResult<Series<f64>> {
    ensure_period(period, "EMA")?;
    ensure_min_len(closes.len())?;

    let values = ema_values(&closes.values(), period);
    Ok(Series::from_parts(&closes.dates(), values))
}

pub(crate) fn sma_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, mean)
}

pub(crate) fn ema_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    scan_smooth(values, Smoothing::ema(period))
}
