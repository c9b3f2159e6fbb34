use tracing::trace;

use super::{bollinger, ema, kdj, ma, macd, rsi, volume_ratio, IndicatorResult};
use crate::domain_types::{IndicatorOutput, IndicatorSpec, PriceBar, Series};

/// 指標計算引擎特徵
///
/// 依指標參數把 K 線序列轉換為指標輸出。實現必須是無狀態的，
/// 可在多個執行緒間共享。
pub trait IndicatorEngine: Send + Sync {
    /// 計算單一指標
    ///
    /// # Arguments
    /// * `spec` - 指標種類與參數
    /// * `bars` - 按日期遞增排列的 K 線
    fn compute(&self, spec: &IndicatorSpec, bars: &[PriceBar]) -> IndicatorResult<IndicatorOutput>;
}

/// 標準指標引擎，直接分派到 `indicators` 模組的純函數
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEngine;

impl StandardEngine {
    pub fn new() -> Self {
        Self
    }
}

impl IndicatorEngine for StandardEngine {
    fn compute(&self, spec: &IndicatorSpec, bars: &[PriceBar]) -> IndicatorResult<IndicatorOutput> {
        spec.validate()?;
        trace!(indicator = %spec, bars = bars.len(), "計算指標");

        let closes = Series::from_bars(bars, |b| b.close);
        let output = match *spec {
            IndicatorSpec::Ma { period } => IndicatorOutput::Line(ma(&closes, period)?),
            IndicatorSpec::Ema { period } => IndicatorOutput::Line(ema(&closes, period)?),
            IndicatorSpec::Macd { fast, slow, signal } => {
                macd(&closes, fast, slow, signal)?.into()
            }
            IndicatorSpec::Rsi { period } => IndicatorOutput::Line(rsi(&closes, period)?),
            IndicatorSpec::Kdj { n, m1, m2 } => {
                let highs = Series::from_bars(bars, |b| b.high);
                let lows = Series::from_bars(bars, |b| b.low);
                kdj(&highs, &lows, &closes, n, m1, m2)?.into()
            }
            IndicatorSpec::Boll { period, k } => bollinger(&closes, period, k)?.into(),
            IndicatorSpec::VolumeRatio { period } => {
                let volumes = Series::from_bars(bars, |b| b.volume);
                IndicatorOutput::Line(volume_ratio(&volumes, period)?)
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;

    fn rising_bars(count: usize) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                let close = 10.0 + i as f64;
                PriceBar::new(
                    start + Duration::days(i as i64),
                    close - 0.5,
                    close + 0.5,
                    close - 1.0,
                    close,
                    1_000.0,
                    close * 1_000.0,
                )
            })
            .collect()
    }

    #[rstest]
    #[case(IndicatorSpec::Ma { period: 5 })]
    #[case(IndicatorSpec::Ema { period: 12 })]
    #[case(IndicatorSpec::Macd { fast: 12, slow: 26, signal: 9 })]
    #[case(IndicatorSpec::Rsi { period: 6 })]
    #[case(IndicatorSpec::Kdj { n: 9, m1: 3, m2: 3 })]
    #[case(IndicatorSpec::Boll { period: 20, k: 2.0 })]
    #[case(IndicatorSpec::VolumeRatio { period: 5 })]
    fn test_output_aligned_with_bars(#[case] spec: IndicatorSpec) {
        let bars = rising_bars(40);
        let output = StandardEngine.compute(&spec, &bars).unwrap();

        assert_eq!(output.len(), bars.len());
        assert!(output.check_structure().is_ok());
        let slowest = output
            .components()
            .iter()
            .map(|(_, series)| series.leading_undefined())
            .max();
        assert_eq!(slowest, Some(spec.lookback()));
    }

    #[test]
    fn test_single_bar_is_insufficient() {
        let bars = rising_bars(1);
        let result = StandardEngine.compute(&IndicatorSpec::Ma { period: 5 }, &bars);

        assert_eq!(
            result,
            Err(IndicatorError::InsufficientData {
                required: 2,
                provided: 1
            })
        );
    }

    #[test]
    fn test_invalid_spec_rejected() {
        let bars = rising_bars(10);
        let result = StandardEngine.compute(&IndicatorSpec::Rsi { period: 0 }, &bars);

        assert!(matches!(result, Err(IndicatorError::InvalidParameter(_))));
    }
}
