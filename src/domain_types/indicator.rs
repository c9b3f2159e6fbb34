//! 技術指標的請求、參數與輸出類型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::series::Series;
use crate::indicators::{IndicatorError, IndicatorResult};
use crate::utils::calendar_range_ending;

/// 技術指標種類與參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    /// 簡單移動平均線
    Ma { period: usize },
    /// 指數移動平均線
    Ema { period: usize },
    /// 指數平滑異同移動平均線
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    /// 相對強弱指標（Wilder 平滑）
    Rsi { period: usize },
    /// 隨機指標
    Kdj { n: usize, m1: usize, m2: usize },
    /// 布林帶
    Boll { period: usize, k: f64 },
    /// 量比
    VolumeRatio { period: usize },
}

impl IndicatorSpec {
    /// 指標簡稱，用於快取鍵和日誌
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorSpec::Ma { .. } => "ma",
            IndicatorSpec::Ema { .. } => "ema",
            IndicatorSpec::Macd { .. } => "macd",
            IndicatorSpec::Rsi { .. } => "rsi",
            IndicatorSpec::Kdj { .. } => "kdj",
            IndicatorSpec::Boll { .. } => "boll",
            IndicatorSpec::VolumeRatio { .. } => "volume_ratio",
        }
    }

    /// 顯示標籤，與報表欄位名稱一致（如 `MA5`、`RSI6`）
    pub fn label(&self) -> String {
        match self {
            IndicatorSpec::Ma { period } => format!("MA{}", period),
            IndicatorSpec::Ema { period } => format!("EMA{}", period),
            IndicatorSpec::Macd { .. } => "MACD".to_string(),
            IndicatorSpec::Rsi { period } => format!("RSI{}", period),
            IndicatorSpec::Kdj { .. } => "KDJ".to_string(),
            IndicatorSpec::Boll { .. } => "BOLL".to_string(),
            IndicatorSpec::VolumeRatio { period } => format!("VOL_RATIO{}", period),
        }
    }

    /// 產生第一個有效值之前需要的 K 線數量
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorSpec::Ma { period }
            | IndicatorSpec::Ema { period }
            | IndicatorSpec::Boll { period, .. }
            | IndicatorSpec::VolumeRatio { period } => period.saturating_sub(1),
            IndicatorSpec::Macd { slow, signal, .. } => {
                slow.saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorSpec::Rsi { period } => period,
            IndicatorSpec::Kdj { n, .. } => n.saturating_sub(1),
        }
    }

    /// 快取鍵中的參數片段，例如 `macd:12:26:9`
    pub fn key_fragment(&self) -> String {
        match self {
            IndicatorSpec::Ma { period }
            | IndicatorSpec::Ema { period }
            | IndicatorSpec::Rsi { period }
            | IndicatorSpec::VolumeRatio { period } => format!("{}:{}", self.name(), period),
            IndicatorSpec::Macd { fast, slow, signal } => {
                format!("macd:{}:{}:{}", fast, slow, signal)
            }
            IndicatorSpec::Kdj { n, m1, m2 } => format!("kdj:{}:{}:{}", n, m1, m2),
            IndicatorSpec::Boll { period, k } => format!("boll:{}:{}", period, k),
        }
    }

    /// 檢查參數是否合法
    pub fn validate(&self) -> IndicatorResult<()> {
        let require_positive = |value: usize, field: &str| {
            if value == 0 {
                Err(IndicatorError::InvalidParameter(format!(
                    "{} 的 {} 必須大於 0",
                    self.label(),
                    field
                )))
            } else {
                Ok(())
            }
        };

        match *self {
            IndicatorSpec::Ma { period }
            | IndicatorSpec::Ema { period }
            | IndicatorSpec::Rsi { period }
            | IndicatorSpec::VolumeRatio { period } => require_positive(period, "period"),
            IndicatorSpec::Macd { fast, slow, signal } => {
                require_positive(fast, "fast")?;
                require_positive(slow, "slow")?;
                require_positive(signal, "signal")?;
                if fast >= slow {
                    return Err(IndicatorError::InvalidParameter(format!(
                        "MACD 快線週期 ({}) 必須小於慢線週期 ({})",
                        fast, slow
                    )));
                }
                Ok(())
            }
            IndicatorSpec::Kdj { n, m1, m2 } => {
                require_positive(n, "n")?;
                require_positive(m1, "m1")?;
                require_positive(m2, "m2")
            }
            IndicatorSpec::Boll { period, k } => {
                require_positive(period, "period")?;
                if !k.is_finite() || k < 0.0 {
                    return Err(IndicatorError::InvalidParameter(format!(
                        "BOLL 標準差倍數無效: {}",
                        k
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_fragment())
    }
}

/// 單一標的、單一指標的計算請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRequest {
    pub symbol: String,
    pub spec: IndicatorSpec,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl IndicatorRequest {
    pub fn new(symbol: impl Into<String>, spec: IndicatorSpec, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            spec,
            start,
            end,
        }
    }

    /// 以 `end` 為止、回推 `days` 個自然日的請求
    pub fn trailing(symbol: impl Into<String>, spec: IndicatorSpec, end: NaiveDate, days: i64) -> Self {
        let (start, end) = calendar_range_ending(end, days);
        Self::new(symbol, spec, start, end)
    }
}

/// 指標計算輸出
///
/// 多條線的指標（MACD、KDJ、BOLL）各分量共用同一組日期。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorOutput {
    Line(Series<f64>),
    Macd {
        dif: Series<f64>,
        dea: Series<f64>,
        histogram: Series<f64>,
    },
    Kdj {
        k: Series<f64>,
        d: Series<f64>,
        j: Series<f64>,
    },
    Bands {
        upper: Series<f64>,
        middle: Series<f64>,
        lower: Series<f64>,
    },
}

impl IndicatorOutput {
    /// 依指標種類創建全部未定義的輸出
    pub fn undefined_for(spec: &IndicatorSpec, dates: &[NaiveDate]) -> Self {
        let blank = || Series::undefined(dates);
        match spec {
            IndicatorSpec::Macd { .. } => IndicatorOutput::Macd {
                dif: blank(),
                dea: blank(),
                histogram: blank(),
            },
            IndicatorSpec::Kdj { .. } => IndicatorOutput::Kdj {
                k: blank(),
                d: blank(),
                j: blank(),
            },
            IndicatorSpec::Boll { .. } => IndicatorOutput::Bands {
                upper: blank(),
                middle: blank(),
                lower: blank(),
            },
            _ => IndicatorOutput::Line(blank()),
        }
    }

    /// 各分量序列，依 (名稱, 序列) 排列
    pub fn components(&self) -> Vec<(&'static str, &Series<f64>)> {
        match self {
            IndicatorOutput::Line(series) => vec![("value", series)],
            IndicatorOutput::Macd {
                dif,
                dea,
                histogram,
            } => vec![("dif", dif), ("dea", dea), ("histogram", histogram)],
            IndicatorOutput::Kdj { k, d, j } => vec![("k", k), ("d", d), ("j", j)],
            IndicatorOutput::Bands {
                upper,
                middle,
                lower,
            } => vec![("upper", upper), ("middle", middle), ("lower", lower)],
        }
    }

    /// 主序列（單線指標本身，或多線指標的第一條線）
    pub fn primary(&self) -> &Series<f64> {
        match self {
            IndicatorOutput::Line(series) => series,
            IndicatorOutput::Macd { dif, .. } => dif,
            IndicatorOutput::Kdj { k, .. } => k,
            IndicatorOutput::Bands { middle, .. } => middle,
        }
    }

    pub fn len(&self) -> usize {
        self.primary().len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary().is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.primary().dates()
    }

    /// 截取 `[start, end]` 範圍
    pub fn restrict(&self, start: NaiveDate, end: NaiveDate) -> Self {
        match self {
            IndicatorOutput::Line(series) => IndicatorOutput::Line(series.restrict(start, end)),
            IndicatorOutput::Macd {
                dif,
                dea,
                histogram,
            } => IndicatorOutput::Macd {
                dif: dif.restrict(start, end),
                dea: dea.restrict(start, end),
                histogram: histogram.restrict(start, end),
            },
            IndicatorOutput::Kdj { k, d, j } => IndicatorOutput::Kdj {
                k: k.restrict(start, end),
                d: d.restrict(start, end),
                j: j.restrict(start, end),
            },
            IndicatorOutput::Bands {
                upper,
                middle,
                lower,
            } => IndicatorOutput::Bands {
                upper: upper.restrict(start, end),
                middle: middle.restrict(start, end),
                lower: lower.restrict(start, end),
            },
        }
    }

    /// 結構檢查：各分量日期遞增且彼此一致
    pub fn check_structure(&self) -> Result<(), String> {
        let components = self.components();
        let (_, first) = components[0];
        for (name, series) in &components {
            if !series.has_ascending_dates() {
                return Err(format!("分量 {} 的日期未嚴格遞增", name));
            }
            if !series.same_dates_as(first) {
                return Err(format!("分量 {} 與主序列的日期不一致", name));
            }
        }
        Ok(())
    }

    /// 各線最新的已定義值，標籤與報表欄位一致
    pub fn latest_values(&self, spec: &IndicatorSpec) -> Vec<(String, f64)> {
        let labelled: Vec<(String, &Series<f64>)> = match self {
            IndicatorOutput::Line(series) => vec![(spec.label(), series)],
            IndicatorOutput::Macd {
                dif,
                dea,
                histogram,
            } => vec![
                ("DIF".to_string(), dif),
                ("DEA".to_string(), dea),
                ("MACD".to_string(), histogram),
            ],
            IndicatorOutput::Kdj { k, d, j } => vec![
                ("K".to_string(), k),
                ("D".to_string(), d),
                ("J".to_string(), j),
            ],
            IndicatorOutput::Bands {
                upper,
                middle,
                lower,
            } => vec![
                ("BOLL_UP".to_string(), upper),
                ("BOLL_MID".to_string(), middle),
                ("BOLL_DOWN".to_string(), lower),
            ],
        };

        labelled
            .into_iter()
            .filter_map(|(label, series)| series.last_defined().map(|(_, v)| (label, v)))
            .collect()
    }
}

/// 指標快照：某一日各指標線的最新數值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    /// 快照對應的最後交易日，無任何數據時為 None
    pub date: Option<NaiveDate>,
    pub values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            date: None,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }

    /// 序列化為 JSON，供報表輸出使用
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn test_spec_lookback() {
        assert_eq!(IndicatorSpec::Ma { period: 5 }.lookback(), 4);
        assert_eq!(IndicatorSpec::Rsi { period: 6 }.lookback(), 6);
        assert_eq!(
            IndicatorSpec::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }
            .lookback(),
            33
        );
        assert_eq!(IndicatorSpec::Kdj { n: 9, m1: 3, m2: 3 }.lookback(), 8);
    }

    #[test]
    fn test_spec_key_fragment() {
        assert_eq!(IndicatorSpec::Ma { period: 20 }.key_fragment(), "ma:20");
        assert_eq!(
            IndicatorSpec::Boll { period: 20, k: 2.0 }.key_fragment(),
            "boll:20:2"
        );
        assert_eq!(
            IndicatorSpec::VolumeRatio { period: 5 }.key_fragment(),
            "volume_ratio:5"
        );
    }

    #[test]
    fn test_spec_validation() {
        assert!(IndicatorSpec::Ma { period: 5 }.validate().is_ok());
        assert!(IndicatorSpec::Ma { period: 0 }.validate().is_err());
        assert!(IndicatorSpec::Macd {
            fast: 26,
            slow: 12,
            signal: 9
        }
        .validate()
        .is_err());
        assert!(IndicatorSpec::Boll {
            period: 20,
            k: f64::NAN
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_trailing_request() {
        let request = IndicatorRequest::trailing("000001", IndicatorSpec::Rsi { period: 6 }, day(29), 28);
        assert_eq!(request.start, day(1));
        assert_eq!(request.end, day(29));
    }

    #[test]
    fn test_output_structure_check() {
        let dates = vec![day(1), day(2), day(3)];
        let good = IndicatorOutput::undefined_for(&IndicatorSpec::Kdj { n: 9, m1: 3, m2: 3 }, &dates);
        assert!(good.check_structure().is_ok());

        let bad = IndicatorOutput::Macd {
            dif: Series::undefined(&dates),
            dea: Series::undefined(&dates[..2]),
            histogram: Series::undefined(&dates),
        };
        assert!(bad.check_structure().is_err());
    }

    #[test]
    fn test_latest_values_labels() {
        let dates = vec![day(1), day(2)];
        let output = IndicatorOutput::Bands {
            upper: Series::from_parts(&dates, vec![None, Some(12.0)]),
            middle: Series::from_parts(&dates, vec![None, Some(10.0)]),
            lower: Series::from_parts(&dates, vec![None, Some(8.0)]),
        };
        let values = output.latest_values(&IndicatorSpec::Boll { period: 20, k: 2.0 });
        assert_eq!(
            values,
            vec![
                ("BOLL_UP".to_string(), 12.0),
                ("BOLL_MID".to_string(), 10.0),
                ("BOLL_DOWN".to_string(), 8.0),
            ]
        );
    }

    #[test]
    fn test_snapshot_json() {
        let mut snapshot = IndicatorSnapshot::new("000001");
        snapshot.date = Some(day(5));
        snapshot.values.insert("MA5".to_string(), 10.5);
        snapshot.values.insert("K".to_string(), 80.0);

        let json = snapshot.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"symbol":"000001","date":"2024-02-05","values":{"K":80.0,"MA5":10.5}}"#
        );

        let spec: IndicatorSpec = serde_json::from_str(r#"{"kind":"rsi","period":6}"#).unwrap();
        assert_eq!(spec, IndicatorSpec::Rsi { period: 6 });
    }
}
