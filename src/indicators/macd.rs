//! MACD 指數平滑異同移動平均線

use serde::{Deserialize, Serialize};

use super::moving_average::ema_values;
use super::{ensure_min_len, ensure_period, IndicatorError, IndicatorResult};
use crate::domain_types::{IndicatorOutput, Series};

/// MACD 三條線
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    /// 快慢線差 DIF = EMA(fast) - EMA(slow)
    pub dif: Series<f64>,
    /// 信號線 DEA = EMA(DIF, signal)
    pub dea: Series<f64>,
    /// 柱狀值 MACD = 2 * (DIF - DEA)
    pub histogram: Series<f64>,
}

impl From<MacdSeries> for IndicatorOutput {
    fn from(value: MacdSeries) -> Self {
        IndicatorOutput::Macd {
            dif: value.dif,
            dea: value.dea,
            histogram: value.histogram,
        }
    }
}

/// 計算 MACD(fast, slow, signal)
///
/// DIF 從慢線 EMA 有值起定義；DEA 以前 `signal` 個 DIF 的平均為種子，
/// 因此 DEA 與柱狀值的第一個有效點在 `slow - 1 + signal - 1`。
pub fn macd(
    closes: &Series<f64>,
    fast: usize,
    slow: usize,
    signal: usize,
) -> IndicatorResult<MacdSeries> {
    ensure_period(fast, "MACD fast")?;
    ensure_period(slow, "MACD slow")?;
    ensure_period(signal, "MACD signal")?;
    if fast >= slow {
        return Err(IndicatorError::InvalidParameter(format!(
            "MACD 快線週期 ({}) 必須小於慢線週期 ({})",
            fast, slow
        )));
    }
    ensure_min_len(closes.len())?;

    let values = closes.values();
    let fast_ema = ema_values(&values, fast);
    let slow_ema = ema_values(&values, slow);

    let dif: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let dea = ema_values(&dif, signal);
    let histogram: Vec<Option<f64>> = dif
        .iter()
        .zip(&dea)
        .map(|(d, e)| Some(2.0 * ((*d)? - (*e)?)))
        .collect();

    let dates = closes.dates();
    Ok(MacdSeries {
        dif: Series::from_parts(&dates, dif),
        dea: Series::from_parts(&dates, dea),
        histogram: Series::from_parts(&dates, histogram),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn closes(values: impl IntoIterator<Item = f64>) -> Series<f64> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let values: Vec<Option<f64>> = values.into_iter().map(Some).collect();
        let dates: Vec<_> = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Series::from_parts(&dates, values)
    }

    #[test]
    fn test_macd_definition_windows() {
        let series = closes((0..60).map(|i| 10.0 + (i as f64 * 0.3).sin()));
        let out = macd(&series, 12, 26, 9).unwrap();

        assert_eq!(out.dif.leading_undefined(), 25);
        assert_eq!(out.dea.leading_undefined(), 33);
        assert_eq!(out.histogram.leading_undefined(), 33);
        assert_eq!(out.dif.len(), 60);
    }

    #[test]
    fn test_macd_histogram_relation() {
        let series = closes((0..50).map(|i| 20.0 + i as f64 * 0.5));
        let out = macd(&series, 3, 6, 4).unwrap();

        for i in 0..50 {
            if let (Some(d), Some(e), Some(h)) = (
                out.dif.value_at(i),
                out.dea.value_at(i),
                out.histogram.value_at(i),
            ) {
                assert!((h - 2.0 * (d - e)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_macd_constant_prices() {
        let series = closes(std::iter::repeat(15.0).take(40));
        let out = macd(&series, 12, 26, 9).unwrap();

        let (_, dif) = out.dif.last_defined().unwrap();
        let (_, hist) = out.histogram.last_defined().unwrap();
        assert!(dif.abs() < 1e-9);
        assert!(hist.abs() < 1e-9);
    }

    #[test]
    fn test_macd_rejects_inverted_periods() {
        let series = closes((0..40).map(f64::from));
        assert!(macd(&series, 26, 12, 9).is_err());
    }
}
