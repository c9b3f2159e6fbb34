//! 量比：當日成交量相對最近 n 期平均成交量的倍數

use super::moving_average::sma_values;
use super::{ensure_min_len, ensure_period, IndicatorResult};
use crate::domain_types::Series;

/// 計算量比 `volume[t] / MA(volume, n)[t]`
///
/// 平均成交量為 0（停牌等）時未定義。
pub fn volume_ratio(volumes: &Series<f64>, period: usize) -> IndicatorResult<Series<f64>> {
    ensure_period(period, "量比")?;
    ensure_min_len(volumes.len())?;

    let values = volumes.values();
    let averages = sma_values(&values, period);
    let ratios = values
        .iter()
        .zip(&averages)
        .map(|(v, avg)| {
            let avg = (*avg)?;
            if avg > 0.0 {
                Some((*v)? / avg)
            } else {
                None
            }
        })
        .collect();

    Ok(Series::from_parts(&volumes.dates(), ratios))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn volumes(values: &[f64]) -> Series<f64> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<_> = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Series::from_parts(&dates, values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_volume_ratio() {
        let out = volume_ratio(&volumes(&[100.0, 100.0, 100.0, 400.0]), 4).unwrap();

        assert_eq!(out.leading_undefined(), 3);
        // 400 / ((100 * 3 + 400) / 4)
        let expected = 400.0 / 175.0;
        assert!((out.value_at(3).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_volume_ratio_suspended() {
        let out = volume_ratio(&volumes(&[0.0, 0.0, 0.0]), 2).unwrap();
        assert_eq!(out.defined_count(), 0);
    }
}
