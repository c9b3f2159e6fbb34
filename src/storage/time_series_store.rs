use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::StoreError;
use super::validator::{BarValidator, DataValidator};
use crate::domain_types::PriceBar;

type BarMap = BTreeMap<NaiveDate, PriceBar>;

/// 一次寫入的變更摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    /// 新增的日期數
    pub inserted: usize,
    /// 內容被覆蓋的日期數
    pub replaced: usize,
    /// 內容相同而未變更的日期數
    pub unchanged: usize,
}

impl UpsertSummary {
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced > 0
    }
}

/// 附帶序列版本號的讀取結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionedBars {
    pub bars: Vec<PriceBar>,
    /// 讀取時該標的的版本號，未知標的為 0
    pub generation: u64,
}

/// 單一標的的序列快照，版本號在每次有變更的寫入時加一
#[derive(Debug, Clone, Default)]
struct SymbolSeries {
    bars: Arc<BarMap>,
    generation: u64,
}

/// 按標的保存日 K 線的時間序列存儲
///
/// 每個標的的序列以 `Arc` 快照保存，寫入時複製後整體替換，
/// 讀取者看到的永遠是完整的寫入前或寫入後序列。
#[derive(Debug, Default)]
pub struct TimeSeriesStore {
    series: DashMap<String, SymbolSeries>,
    validator: BarValidator,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 寫入一批 K 線
    ///
    /// 先驗證整批數據，任何一筆無效則整批拒絕且存儲不變。
    /// 相同日期以後寫入者為準（包括同一批內的重複日期）。
    pub fn upsert(&self, symbol: &str, bars: &[PriceBar]) -> Result<UpsertSummary, StoreError> {
        for bar in bars {
            if let Err(reason) = self.validator.validate_item(bar) {
                warn!(symbol, date = %bar.date, error = %reason, "拒絕無效的 K 線批次");
                return Err(StoreError::MalformedBar {
                    symbol: symbol.to_string(),
                    date: bar.date,
                    reason,
                });
            }
        }

        if bars.is_empty() {
            return Ok(UpsertSummary::default());
        }

        let incoming: BarMap = bars.iter().map(|bar| (bar.date, *bar)).collect();

        // 持有分片寫鎖完成合併，同一標的的寫入互斥
        let mut slot = self.series.entry(symbol.to_string()).or_default();
        let mut merged = BarMap::clone(&slot.bars);
        let mut summary = UpsertSummary::default();

        for (date, bar) in incoming {
            match merged.insert(date, bar) {
                None => summary.inserted += 1,
                Some(previous) if previous == bar => summary.unchanged += 1,
                Some(_) => summary.replaced += 1,
            }
        }

        if summary.changed() {
            slot.bars = Arc::new(merged);
            slot.generation += 1;
        }
        debug!(
            symbol,
            inserted = summary.inserted,
            replaced = summary.replaced,
            unchanged = summary.unchanged,
            generation = slot.generation,
            "寫入 K 線"
        );
        Ok(summary)
    }

    /// 讀取 `[start, end]` 內的 K 線，未知標的或 `start > end` 返回空
    pub fn read(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        self.read_with_lookback(symbol, start, end, 0)
    }

    /// 讀取 `start` 之前的 `lookback` 筆 K 線加上 `[start, end]` 內的 K 線
    pub fn read_with_lookback(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        lookback: usize,
    ) -> Vec<PriceBar> {
        self.read_versioned(symbol, start, end, lookback).bars
    }

    /// 與 `read_with_lookback` 相同，另外返回同一快照的版本號
    ///
    /// 計算結果寫入快取後，可比對 `generation` 判斷期間是否有新的寫入。
    pub fn read_versioned(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        lookback: usize,
    ) -> VersionedBars {
        let Some(series) = self.snapshot(symbol) else {
            return VersionedBars::default();
        };
        if start > end {
            return VersionedBars {
                bars: Vec::new(),
                generation: series.generation,
            };
        }

        let mut bars: Vec<PriceBar> = series
            .bars
            .range(..start)
            .rev()
            .take(lookback)
            .map(|(_, bar)| *bar)
            .collect();
        bars.reverse();
        bars.extend(series.bars.range(start..=end).map(|(_, bar)| *bar));
        VersionedBars {
            bars,
            generation: series.generation,
        }
    }

    /// 標的當前的版本號，未知標的為 0
    pub fn generation(&self, symbol: &str) -> u64 {
        self.series.get(symbol).map_or(0, |entry| entry.generation)
    }

    /// `[start, end]` 內是否有任何 K 線
    pub fn has_bars_in(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> bool {
        if start > end {
            return false;
        }
        self.snapshot(symbol)
            .is_some_and(|series| series.bars.range(start..=end).next().is_some())
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.snapshot(symbol).map_or(0, |series| series.bars.len())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.len(symbol) > 0
    }

    /// 所有已存儲的標的，按代碼排序
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .series
            .iter()
            .filter(|entry| !entry.value().bars.is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        symbols.sort();
        symbols
    }

    /// 標的的首末交易日
    pub fn date_range(&self, symbol: &str) -> Option<(NaiveDate, NaiveDate)> {
        let series = self.snapshot(symbol)?;
        let first = *series.bars.keys().next()?;
        let last = *series.bars.keys().next_back()?;
        Some((first, last))
    }

    fn snapshot(&self, symbol: &str) -> Option<SymbolSeries> {
        self.series.get(symbol).map(|entry| entry.value().clone())
    }
}
