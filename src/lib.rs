// 模組定義
pub mod cache;
pub mod config;
pub mod data_provider;
pub mod domain_types;
pub mod indicators;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod utils;

pub use cache::{CacheKey, FreshnessCache, SubjectType, TtlPolicy};
pub use domain_types::{IndicatorOutput, IndicatorRequest, IndicatorSpec, PriceBar, Series};
pub use indicators::{IndicatorEngine, IndicatorError, StandardEngine};
pub use pipeline::{Evaluation, Pipeline, PipelineError};
pub use storage::{StoreError, TimeSeriesStore};
