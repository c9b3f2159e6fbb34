//! KDJ 隨機指標

use serde::{Deserialize, Serialize};

use super::smoothing::{scan_smooth, Smoothing};
use super::{ensure_min_len, ensure_period, IndicatorError, IndicatorResult};
use crate::domain_types::{IndicatorOutput, Series};

/// K、D 線的初始值
pub const KDJ_SEED: f64 = 50.0;

/// 區間振幅為零時的 RSV
pub const FLAT_RANGE_RSV: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdjSeries {
    pub k: Series<f64>,
    pub d: Series<f64>,
    pub j: Series<f64>,
}

impl From<KdjSeries> for IndicatorOutput {
    fn from(value: KdjSeries) -> Self {
        IndicatorOutput::Kdj {
            k: value.k,
            d: value.d,
            j: value.j,
        }
    }
}

/// 未成熟隨機值 RSV(n)
///
/// `RSV = 100 * (C - LLV(n)) / (HHV(n) - LLV(n))`，n 期最高最低相同時為 50。
pub fn rsv(
    highs: &Series<f64>,
    lows: &Series<f64>,
    closes: &Series<f64>,
    n: usize,
) -> IndicatorResult<Series<f64>> {
    ensure_period(n, "KDJ")?;
    ensure_aligned(highs, lows, closes)?;
    ensure_min_len(closes.len())?;

    let highs = highs.values();
    let lows = lows.values();
    let close_values = closes.values();

    let values = (0..close_values.len())
        .map(|i| {
            if i + 1 < n {
                return None;
            }
            let window = i + 1 - n..=i;
            let mut highest = f64::NEG_INFINITY;
            let mut lowest = f64::INFINITY;
            for t in window {
                highest = highest.max(highs[t]?);
                lowest = lowest.min(lows[t]?);
            }
            let close = close_values[i]?;
            let range = highest - lowest;
            if range == 0.0 {
                Some(FLAT_RANGE_RSV)
            } else {
                Some(100.0 * (close - lowest) / range)
            }
        })
        .collect();

    Ok(Series::from_parts(&closes.dates(), values))
}

/// 計算 KDJ(n, m1, m2)
///
/// K 為 RSV 的 m1 期遞迴平滑，D 為 K 的 m2 期遞迴平滑，兩者初值均為 50；
/// `J = 3K - 2D`。
pub fn kdj(
    highs: &Series<f64>,
    lows: &Series<f64>,
    closes: &Series<f64>,
    n: usize,
    m1: usize,
    m2: usize,
) -> IndicatorResult<KdjSeries> {
    ensure_period(m1, "KDJ m1")?;
    ensure_period(m2, "KDJ m2")?;
    let rsv = rsv(highs, lows, closes, n)?;

    let k = scan_smooth(&rsv.values(), Smoothing::anchored(KDJ_SEED, m1));
    let d = scan_smooth(&k, Smoothing::anchored(KDJ_SEED, m2));
    let j: Vec<Option<f64>> = k
        .iter()
        .zip(&d)
        .map(|(k, d)| Some(3.0 * (*k)? - 2.0 * (*d)?))
        .collect();

    let dates = closes.dates();
    Ok(KdjSeries {
        k: Series::from_parts(&dates, k),
        d: Series::from_parts(&dates, d),
        j: Series::from_parts(&dates, j),
    })
}

fn ensure_aligned(
    highs: &Series<f64>,
    lows: &Series<f64>,
    closes: &Series<f64>,
) -> IndicatorResult<()> {
    if !highs.same_dates_as(closes) || !lows.same_dates_as(closes) {
        return Err(IndicatorError::InvalidParameter(
            "最高價、最低價與收盤價序列的日期未對齊".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> Series<f64> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<_> = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Series::from_parts(&dates, values.iter().copied().map(Some).collect())
    }

    #[test]
    fn test_rsv_zero_range() {
        let flat = series(&[8.0; 6]);
        let out = rsv(&flat, &flat, &flat, 3).unwrap();

        assert_eq!(out.leading_undefined(), 2);
        for i in 2..6 {
            assert_eq!(out.value_at(i), Some(FLAT_RANGE_RSV));
        }
    }

    #[test]
    fn test_rsv_position_in_range() {
        let highs = series(&[12.0, 14.0, 13.0]);
        let lows = series(&[10.0, 11.0, 9.0]);
        let closes = series(&[11.0, 13.0, 11.5]);
        let out = rsv(&highs, &lows, &closes, 3).unwrap();

        // 區間 [9, 14]，收盤 11.5
        assert_eq!(out.value_at(2), Some(50.0));
    }

    #[test]
    fn test_kdj_seeded_at_fifty() {
        let highs = series(&[10.0, 11.0, 12.0, 13.0]);
        let lows = series(&[9.0, 10.0, 11.0, 12.0]);
        let closes = series(&[10.0, 11.0, 12.0, 13.0]);
        let out = kdj(&highs, &lows, &closes, 2, 3, 3).unwrap();

        assert_eq!(out.k.value_at(0), None);
        // RSV[1] = 100 * (11 - 9) / (11 - 9) = 100
        let k1 = out.k.value_at(1).unwrap();
        assert!((k1 - (50.0 + 50.0 / 3.0)).abs() < 1e-9);
        let d1 = out.d.value_at(1).unwrap();
        assert!((d1 - (50.0 + (k1 - 50.0) / 3.0)).abs() < 1e-9);
        let j1 = out.j.value_at(1).unwrap();
        assert!((j1 - (3.0 * k1 - 2.0 * d1)).abs() < 1e-9);
    }

    #[test]
    fn test_kdj_rejects_misaligned_input() {
        let highs = series(&[10.0, 11.0, 12.0]);
        let lows = series(&[9.0, 10.0]);
        let closes = series(&[10.0, 11.0, 12.0]);

        assert!(matches!(
            kdj(&highs, &lows, &closes, 2, 3, 3),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }
}
