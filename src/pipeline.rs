//! 指標請求處理流程：快取查詢 → 讀取（或刷新）存儲 → 計算 → 寫入快取

use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, FreshnessCache};
use crate::data_provider::{DataProvider, ProviderError};
use crate::domain_types::{IndicatorOutput, IndicatorRequest, IndicatorSnapshot, IndicatorSpec, PriceBar};
use crate::indicators::{IndicatorEngine, IndicatorError, StandardEngine};
use crate::storage::{StoreError, TimeSeriesStore, UpsertSummary, VersionedBars};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("無效的請求: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("未配置數據提供者，無法刷新 {symbol}")]
    NoProvider { symbol: String },
}

/// 單次指標請求的結果
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub output: Arc<IndicatorOutput>,
    /// 是否直接來自快取
    pub cache_hit: bool,
}

/// 單一指標在報表中的結果
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub spec: IndicatorSpec,
    pub result: Result<Evaluation, PipelineError>,
}

/// 一個標的多個指標的計算結果
#[derive(Debug, Clone)]
pub struct IndicatorReport {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub entries: Vec<ReportEntry>,
}

impl IndicatorReport {
    /// 成功計算的指標
    pub fn successes(&self) -> impl Iterator<Item = (&IndicatorSpec, &IndicatorOutput)> {
        self.entries.iter().filter_map(|entry| match &entry.result {
            Ok(evaluation) => Some((&entry.spec, evaluation.output.as_ref())),
            Err(_) => None,
        })
    }

    /// 計算失敗的指標
    pub fn failures(&self) -> impl Iterator<Item = (&IndicatorSpec, &PipelineError)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|err| (&entry.spec, err)))
    }

    /// 彙總各指標線最新的已定義值
    pub fn snapshot(&self) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new(self.symbol.as_str());
        for (spec, output) in self.successes() {
            let last_date = output.primary().points().last().map(|point| point.date);
            snapshot.date = snapshot.date.max(last_date);
            snapshot.values.extend(output.latest_values(spec));
        }
        snapshot
    }
}

/// 指標計算流程
///
/// 存儲與快取以 `Arc` 顯式注入，多個流程實例可以共享同一份快取。
pub struct Pipeline<E: IndicatorEngine = StandardEngine> {
    store: Arc<TimeSeriesStore>,
    cache: Arc<FreshnessCache<IndicatorOutput>>,
    engine: E,
    provider: Option<Arc<dyn DataProvider>>,
}

impl Pipeline<StandardEngine> {
    pub fn new(store: Arc<TimeSeriesStore>, cache: Arc<FreshnessCache<IndicatorOutput>>) -> Self {
        Self::with_engine(store, cache, StandardEngine)
    }
}

impl<E: IndicatorEngine> Pipeline<E> {
    pub fn with_engine(
        store: Arc<TimeSeriesStore>,
        cache: Arc<FreshnessCache<IndicatorOutput>>,
        engine: E,
    ) -> Self {
        Self {
            store,
            cache,
            engine,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn store(&self) -> &Arc<TimeSeriesStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<FreshnessCache<IndicatorOutput>> {
        &self.cache
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// 計算單一指標請求
    ///
    /// 快取命中時返回同一個 `Arc`。數據不足時返回與區間內 K 線對齊的全未定義輸出，
    /// 該結果不寫入快取。
    pub fn evaluate(&self, request: &IndicatorRequest) -> Result<Evaluation, PipelineError> {
        validate_request(request)?;
        let IndicatorRequest {
            symbol,
            spec,
            start,
            end,
        } = request;

        let key = CacheKey::for_indicator(request);
        if let Some(output) = self.cache.get(&key) {
            return Ok(Evaluation {
                output,
                cache_hit: true,
            });
        }

        if self.provider.is_some() && !self.store.has_bars_in(symbol, *start, *end) {
            if let Err(err) = self.refresh(symbol, *start, *end) {
                warn!(symbol = %symbol, error = %err, "刷新數據失敗，使用已存儲的數據");
            }
        }

        let VersionedBars { bars, generation } =
            self.store.read_versioned(symbol, *start, *end, spec.lookback());

        let output = match self.engine.compute(spec, &bars) {
            Ok(output) => output.restrict(*start, *end),
            Err(IndicatorError::InsufficientData { required, provided }) => {
                debug!(symbol = %symbol, indicator = %spec, required, provided, "數據不足，返回未定義序列");
                let dates: Vec<NaiveDate> = bars
                    .iter()
                    .map(|bar| bar.date)
                    .filter(|date| date >= start && date <= end)
                    .collect();
                return Ok(Evaluation {
                    output: Arc::new(IndicatorOutput::undefined_for(spec, &dates)),
                    cache_hit: false,
                });
            }
            Err(err) => return Err(err.into()),
        };

        debug!(symbol = %symbol, indicator = %spec, points = output.len(), "計算完成，寫入快取");
        let output = self.cache.put_with_policy(key.clone(), output);

        // 計算期間有新的寫入時，其清除可能早於本次寫入快取，需撤回舊結果
        if self.store.generation(symbol) != generation {
            self.cache.invalidate_payload(&key, &output);
            debug!(symbol = %symbol, indicator = %spec, "計算期間數據已更新，撤回快取結果");
        }
        Ok(Evaluation {
            output,
            cache_hit: false,
        })
    }

    /// 並行計算多個獨立請求，結果順序與請求一致
    pub fn evaluate_batch(
        &self,
        requests: &[IndicatorRequest],
    ) -> Vec<Result<Evaluation, PipelineError>> {
        requests
            .par_iter()
            .map(|request| self.evaluate(request))
            .collect()
    }

    /// 計算同一標的的多個指標
    pub fn evaluate_report(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        specs: &[IndicatorSpec],
    ) -> IndicatorReport {
        let requests: Vec<IndicatorRequest> = specs
            .iter()
            .map(|spec| IndicatorRequest::new(symbol, *spec, start, end))
            .collect();
        let entries = specs
            .iter()
            .zip(self.evaluate_batch(&requests))
            .map(|(spec, result)| ReportEntry {
                spec: *spec,
                result,
            })
            .collect();

        IndicatorReport {
            symbol: symbol.to_string(),
            start,
            end,
            entries,
        }
    }

    /// 寫入 K 線，有變更時清除該標的的快取
    pub fn ingest(&self, symbol: &str, bars: &[PriceBar]) -> Result<UpsertSummary, PipelineError> {
        let summary = self.store.upsert(symbol, bars)?;
        if summary.changed() {
            let invalidated = self.cache.invalidate_symbol(symbol);
            debug!(symbol, invalidated, "數據已更新，清除標的快取");
        }
        Ok(summary)
    }

    /// 從數據提供者拉取 `[start, end]` 的 K 線並寫入
    ///
    /// 拉取失敗或數據無效時存儲與快取都不變。
    pub fn refresh(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UpsertSummary, PipelineError> {
        let provider = self.provider.as_ref().ok_or_else(|| PipelineError::NoProvider {
            symbol: symbol.to_string(),
        })?;

        let bars = provider.fetch(symbol, start, end)?;
        if bars.is_empty() {
            return Err(ProviderError::Empty {
                symbol: symbol.to_string(),
            }
            .into());
        }

        let summary = self.ingest(symbol, &bars)?;
        info!(
            symbol,
            %start,
            %end,
            inserted = summary.inserted,
            replaced = summary.replaced,
            "刷新數據完成"
        );
        Ok(summary)
    }
}

fn validate_request(request: &IndicatorRequest) -> Result<(), PipelineError> {
    if request.symbol.trim().is_empty() {
        return Err(PipelineError::InvalidRequest("股票代碼不能為空".to_string()));
    }
    if request.start > request.end {
        return Err(PipelineError::InvalidRequest(format!(
            "開始日期 {} 晚於結束日期 {}",
            request.start, request.end
        )));
    }
    request.spec.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlPolicy;
    use assert_matches::assert_matches;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Arc::new(TimeSeriesStore::new()),
            Arc::new(FreshnessCache::new(TtlPolicy::default())),
        )
    }

    #[test]
    fn test_request_validation() {
        let pipeline = pipeline();
        let spec = IndicatorSpec::Ma { period: 5 };

        assert_matches!(
            pipeline.evaluate(&IndicatorRequest::new(" ", spec, date(1), date(2))),
            Err(PipelineError::InvalidRequest(_))
        );
        assert_matches!(
            pipeline.evaluate(&IndicatorRequest::new("000001", spec, date(3), date(2))),
            Err(PipelineError::InvalidRequest(_))
        );
        assert_matches!(
            pipeline.evaluate(&IndicatorRequest::new(
                "000001",
                IndicatorSpec::Ma { period: 0 },
                date(1),
                date(2)
            )),
            Err(PipelineError::Indicator(IndicatorError::InvalidParameter(_)))
        );
    }

    #[test]
    fn test_refresh_without_provider() {
        assert_matches!(
            pipeline().refresh("000001", date(1), date(2)),
            Err(PipelineError::NoProvider { symbol }) if symbol == "000001"
        );
    }

    #[test]
    fn test_unknown_symbol_yields_empty_output() {
        let pipeline = pipeline();
        let request = IndicatorRequest::new("000001", IndicatorSpec::Rsi { period: 6 }, date(1), date(9));
        let evaluation = pipeline.evaluate(&request).unwrap();

        assert!(evaluation.output.is_empty());
        assert!(!evaluation.cache_hit);
        assert!(pipeline.cache().is_empty());
    }

    #[test]
    fn test_report_snapshot() {
        let pipeline = pipeline();
        let bars: Vec<PriceBar> = (1..=10)
            .map(|d| PriceBar::flat(date(d), d as f64, 100.0))
            .collect();
        pipeline.ingest("000001", &bars).unwrap();

        let report = pipeline.evaluate_report(
            "000001",
            date(1),
            date(10),
            &[IndicatorSpec::Ma { period: 5 }, IndicatorSpec::Ma { period: 0 }],
        );
        assert_eq!(report.successes().count(), 1);
        assert_eq!(report.failures().count(), 1);

        let snapshot = report.snapshot();
        assert_eq!(snapshot.date, Some(date(10)));
        assert_eq!(snapshot.get("MA5"), Some(8.0));
    }
}
