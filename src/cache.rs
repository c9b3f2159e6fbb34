pub mod clock;
pub mod error;
pub mod freshness;
pub mod keys;
pub mod metrics;
pub mod stats;
pub mod subject;
pub mod traits;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CacheError;
pub use freshness::{CacheEntry, CacheLookup, FreshnessCache};
pub use keys::{CacheKey, CacheKeyHash, OptimizedKeyBuilder};
pub use metrics::{CacheMetrics, MetricType, METRIC_NAMESPACE};
pub use stats::CacheStats;
pub use subject::{SubjectType, TtlPolicy, DEFAULT_FALLBACK_TTL_SECS};
pub use traits::CacheableData;
