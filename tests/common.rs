#![allow(dead_code)]

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use indicator_core::cache::ManualClock;
use indicator_core::PriceBar;
use std::sync::Arc;

pub const SYMBOL: &str = "000001";

/// 第 `offset` 個自然日，從 2024-01-01 起算
pub fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset as i64)
}

/// 以給定收盤價生成連續日期的 K 線，最高最低價上下各 0.5
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            PriceBar::new(
                day(i),
                *close,
                close + 0.5,
                (close - 0.5).max(0.0),
                *close,
                10_000.0,
                close * 10_000.0,
            )
        })
        .collect()
}

/// 收盤價從 `first` 起每日加 1 的 K 線
pub fn rising_bars(count: usize, first: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| first + i as f64).collect();
    bars_from_closes(&closes)
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 1, 30, 0).unwrap(),
    ))
}
