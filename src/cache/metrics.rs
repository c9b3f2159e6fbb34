use metrics::{counter, histogram};
use std::time::Duration;

/// 監控指標命名空間
pub const METRIC_NAMESPACE: &str = "indicator_cache";

/// 監控指標類型
#[derive(Debug, Clone, Copy)]
pub enum MetricType {
    Hit,
    Miss,
    Expired,
    Corrupted,
    Latency { operation: &'static str },
}

/// 快取監控指標記錄器
pub struct CacheMetrics;

impl CacheMetrics {
    /// 記錄快取指標
    ///
    /// # Arguments
    /// * `data_type` - 資料類型名稱 (如 "indicator_series")
    /// * `metric_type` - 指標類型
    /// * `duration` - 可選的持續時間，用於延遲指標
    pub fn record(data_type: &'static str, metric_type: MetricType, duration: Option<Duration>) {
        match metric_type {
            MetricType::Hit => {
                counter!(format!("{}.hit", METRIC_NAMESPACE), "type" => data_type).increment(1);
            }
            MetricType::Miss => {
                counter!(format!("{}.miss", METRIC_NAMESPACE), "type" => data_type).increment(1);
            }
            MetricType::Expired => {
                counter!(format!("{}.expired", METRIC_NAMESPACE), "type" => data_type)
                    .increment(1);
            }
            MetricType::Corrupted => {
                counter!(format!("{}.corrupted", METRIC_NAMESPACE), "type" => data_type)
                    .increment(1);
            }
            MetricType::Latency { operation } => {
                if let Some(dur) = duration {
                    histogram!(
                        format!("{}.latency_ns", METRIC_NAMESPACE),
                        "operation" => operation,
                        "type" => data_type
                    )
                    .record(dur.as_nanos() as f64);
                }
            }
        }
    }

    /// 記錄快取設定操作
    pub fn record_set(data_type: &'static str) {
        counter!(format!("{}.set", METRIC_NAMESPACE), "type" => data_type).increment(1);
    }

    /// 記錄驅逐操作
    pub fn record_eviction(data_type: &'static str, reason: &'static str, count: usize) {
        counter!(
            format!("{}.eviction", METRIC_NAMESPACE),
            "type" => data_type,
            "reason" => reason
        )
        .increment(count as u64);
    }

    /// 記錄快取大小
    pub fn record_cache_size(data_type: &'static str, size: usize) {
        histogram!(format!("{}.entries", METRIC_NAMESPACE), "type" => data_type)
            .record(size as f64);
    }
}
