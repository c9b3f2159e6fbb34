//! 與 K 線日期對齊的時間序列

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::price_bar::PriceBar;

/// 序列中的單個點
///
/// `value` 為 `None` 表示尚未可計算（例如回溯窗口內）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint<T> {
    pub date: NaiveDate,
    pub value: Option<T>,
}

/// 按日期遞增排列的序列，與其來源的 K 線一一對齊
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    points: Vec<SeriesPoint<T>>,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T> Series<T> {
    /// 創建空序列
    pub fn new() -> Self {
        Self::default()
    }

    /// 從已排序的點創建序列
    pub fn from_points(points: Vec<SeriesPoint<T>>) -> Self {
        Self { points }
    }

    /// 獲取數據點數量
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 檢查是否為空
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint<T>] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint<T>> {
        self.points.iter()
    }

    /// 獲取日期數組
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// 日期是否嚴格遞增
    pub fn has_ascending_dates(&self) -> bool {
        self.points.windows(2).all(|w| w[0].date < w[1].date)
    }

    /// 兩個序列的日期是否完全一致
    pub fn same_dates_as<U>(&self, other: &Series<U>) -> bool {
        self.len() == other.len()
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|(a, b)| a.date == b.date)
    }

    /// 開頭連續未定義的點數
    pub fn leading_undefined(&self) -> usize {
        self.points
            .iter()
            .take_while(|p| p.value.is_none())
            .count()
    }

    /// 已定義的點數
    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    /// 以二分搜尋定位日期
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by(|p| p.date.cmp(&date)).ok()
    }
}

impl<T: Clone> Series<T> {
    /// 截取 `[start, end]` 範圍內（含兩端）的子序列
    pub fn restrict(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        if lo >= hi {
            return Self::new();
        }
        Self {
            points: self.points[lo..hi].to_vec(),
        }
    }
}

impl<T: Copy> Series<T> {
    /// 將日期與數值逐一配對創建序列
    ///
    /// 兩者長度必須相同，多出的部分會被截斷。
    pub fn from_parts(dates: &[NaiveDate], values: Vec<Option<T>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, value)| SeriesPoint { date, value })
            .collect();
        Self { points }
    }

    /// 創建全部未定義的序列
    pub fn undefined(dates: &[NaiveDate]) -> Self {
        Self::from_parts(dates, vec![None; dates.len()])
    }

    /// 獲取數值數組
    pub fn values(&self) -> Vec<Option<T>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn value_at(&self, index: usize) -> Option<T> {
        self.points.get(index).and_then(|p| p.value)
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<T> {
        self.position(date).and_then(|i| self.value_at(i))
    }

    /// 最後一個已定義的點
    pub fn last_defined(&self) -> Option<(NaiveDate, T)> {
        self.points
            .iter()
            .rev()
            .find_map(|p| p.value.map(|v| (p.date, v)))
    }
}

impl Series<f64> {
    /// 從 K 線抽取某個欄位，例如 `Series::from_bars(&bars, |b| b.close)`
    pub fn from_bars<F>(bars: &[PriceBar], field: F) -> Self
    where
        F: Fn(&PriceBar) -> f64,
    {
        let points = bars
            .iter()
            .map(|bar| SeriesPoint {
                date: bar.date,
                value: Some(field(bar)),
            })
            .collect();
        Self { points }
    }
}
