//! 布林帶

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::moving_average::sma_values;
use super::smoothing::rolling;
use super::{ensure_min_len, ensure_period, IndicatorError, IndicatorResult};
use crate::domain_types::{IndicatorOutput, Series};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Series<f64>,
    pub middle: Series<f64>,
    pub lower: Series<f64>,
}

impl From<BollingerBands> for IndicatorOutput {
    fn from(value: BollingerBands) -> Self {
        IndicatorOutput::Bands {
            upper: value.upper,
            middle: value.middle,
            lower: value.lower,
        }
    }
}

/// 計算 BOLL(n, k)
///
/// 中軌為 MA(n)，上下軌為中軌 ± k 倍最近 n 期收盤價的總體標準差。
pub fn bollinger(closes: &Series<f64>, period: usize, k: f64) -> IndicatorResult<BollingerBands> {
    ensure_period(period, "BOLL")?;
    if !k.is_finite() || k < 0.0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "BOLL 標準差倍數無效: {}",
            k
        )));
    }
    ensure_min_len(closes.len())?;

    let values = closes.values();
    let middle = sma_values(&values, period);
    let deviation = rolling(&values, period, |window| {
        Some(window.iter().population_std_dev())
    });

    let (upper, lower): (Vec<_>, Vec<_>) = middle
        .iter()
        .zip(&deviation)
        .map(|(m, sd)| match (m, sd) {
            (Some(m), Some(sd)) => (Some(m + k * sd), Some(m - k * sd)),
            _ => (None, None),
        })
        .unzip();

    let dates = closes.dates();
    Ok(BollingerBands {
        upper: Series::from_parts(&dates, upper),
        middle: Series::from_parts(&dates, middle),
        lower: Series::from_parts(&dates, lower),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn closes(values: &[f64]) -> Series<f64> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<_> = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Series::from_parts(&dates, values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_bands_use_population_deviation() {
        let series = closes(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let bands = bollinger(&series, 8, 2.0).unwrap();

        // 平均 5，總體標準差 2
        let middle = bands.middle.value_at(7).unwrap();
        let upper = bands.upper.value_at(7).unwrap();
        let lower = bands.lower.value_at(7).unwrap();
        assert!((middle - 5.0).abs() < 1e-12);
        assert!((upper - 9.0).abs() < 1e-9);
        assert!((lower - 1.0).abs() < 1e-9);
        assert_eq!(bands.upper.leading_undefined(), 7);
    }

    #[test]
    fn test_bands_collapse_on_constant_prices() {
        let series = closes(&[3.0; 5]);
        let bands = bollinger(&series, 3, 2.0).unwrap();

        assert_eq!(bands.upper.value_at(4), Some(3.0));
        assert_eq!(bands.lower.value_at(4), Some(3.0));
    }

    #[test]
    fn test_bands_reject_negative_width() {
        let series = closes(&[1.0, 2.0, 3.0]);
        assert!(bollinger(&series, 2, -1.0).is_err());
    }
}
