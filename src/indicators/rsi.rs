//! RSI 相對強弱指標（Wilder 平滑）

use super::smoothing::{scan_smooth, Smoothing};
use super::{ensure_min_len, ensure_period, IndicatorResult};
use crate::domain_types::Series;

/// 計算 RSI(n)
///
/// 平均漲幅與平均跌幅以 Wilder 平滑遞迴：
/// `avg[t] = (avg[t-1] * (n - 1) + x[t]) / n`，種子為前 n 期變化的平均，
/// 因此第一個有效值位於索引 n。
pub fn rsi(closes: &Series<f64>, period: usize) -> IndicatorResult<Series<f64>> {
    ensure_period(period, "RSI")?;
    ensure_min_len(closes.len())?;

    let values = closes.values();
    let (gains, losses) = price_changes(&values);

    let smoothing = Smoothing::wilder(period);
    let avg_gains = scan_smooth(&gains, smoothing);
    let avg_losses = scan_smooth(&losses, smoothing);

    let rsi_values = avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(g, l)| Some(rsi_value((*g)?, (*l)?)))
        .collect();

    Ok(Series::from_parts(&closes.dates(), rsi_values))
}

/// 由平均漲跌幅計算 RSI
///
/// 平均跌幅為 0 時：有漲幅則為 100，完全無波動則為 50。
pub fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            return 100.0;
        }
        return 50.0;
    }
    (100.0 * avg_gain / (avg_gain + avg_loss)).clamp(0.0, 100.0)
}

/// 拆分每期的漲幅與跌幅，第一期沒有前值因此未定義
fn price_changes(values: &[Option<f64>]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut gains = Vec::with_capacity(values.len());
    let mut losses = Vec::with_capacity(values.len());
    gains.push(None);
    losses.push(None);

    for pair in values.windows(2) {
        match (pair[0], pair[1]) {
            (Some(prev), Some(curr)) => {
                let delta = curr - prev;
                gains.push(Some(delta.max(0.0)));
                losses.push(Some((-delta).max(0.0)));
            }
            _ => {
                gains.push(None);
                losses.push(None);
            }
        }
    }

    gains.truncate(values.len());
    losses.truncate(values.len());
    (gains, losses)
}
