//! 依主題 TTL 判斷新鮮度的記憶體快取

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::error::CacheError;
use super::keys::CacheKey;
use super::metrics::{CacheMetrics, MetricType};
use super::stats::CacheStats;
use super::subject::{SubjectType, TtlPolicy};
use super::traits::CacheableData;
use crate::utils::{add_std_duration, elapsed_between};

/// 快取項目，寫入後不可變
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub key: CacheKey,
    pub payload: Arc<V>,
    pub computed_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// `computed_at <= now` 且 `now - computed_at < ttl` 時有效
    ///
    /// 時鐘倒退到 `computed_at` 之前時視為過期，避免項目存活超過 TTL。
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.computed_at && elapsed_between(self.computed_at, now) < self.ttl
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        add_std_duration(self.computed_at, self.ttl)
    }
}

/// 查詢結果，附帶未命中的原因
#[derive(Debug)]
pub enum CacheLookup<V> {
    Fresh(Arc<V>),
    Missing,
    Expired,
    Corrupted,
}

impl<V> CacheLookup<V> {
    pub fn into_fresh(self) -> Option<Arc<V>> {
        match self {
            CacheLookup::Fresh(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheLookup::Fresh(_))
    }
}

/// 新鮮度快取
///
/// 使用 FxHasher 計算的 u64 雜湊作為分片表的鍵，項目中保存原始鍵以偵測雜湊碰撞。
/// 過期項目在讀取時惰性驅逐。
pub struct FreshnessCache<V: CacheableData> {
    entries: DashMap<u64, Arc<CacheEntry<V>>, FxBuildHasher>,
    policy: TtlPolicy,
    clock: Arc<dyn Clock>,
}

impl<V: CacheableData> FreshnessCache<V> {
    pub fn new(policy: TtlPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: TtlPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    pub fn ttl_for(&self, subject: SubjectType) -> Duration {
        self.policy.ttl_for(subject)
    }

    /// 取得有效期內的值
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        self.lookup(key).into_fresh()
    }

    /// 查詢並回報未命中原因
    pub fn lookup(&self, key: &CacheKey) -> CacheLookup<V> {
        let start = Instant::now();
        let data_type = V::data_type_name();
        let hash = key.key_hash().0;

        // 先複製 Arc 再釋放分片鎖，之後的驅逐才不會死鎖
        let entry = match self.entries.get(&hash).map(|e| Arc::clone(e.value())) {
            Some(entry) => entry,
            None => {
                CacheMetrics::record(data_type, MetricType::Miss, None);
                debug!(key = %key, "快取未命中");
                return CacheLookup::Missing;
            }
        };

        if let Err(err) = Self::verify(key, &entry) {
            warn!(error = %err, "驅逐損壞的快取項目");
            CacheMetrics::record(data_type, MetricType::Corrupted, None);
            if self.evict_if_current(hash, &entry) {
                CacheMetrics::record_eviction(data_type, "corrupted", 1);
            }
            return CacheLookup::Corrupted;
        }

        let now = self.clock.now();
        if !entry.is_fresh_at(now) {
            debug!(key = %key, computed_at = %entry.computed_at, "快取項目已過期");
            CacheMetrics::record(data_type, MetricType::Expired, None);
            if self.evict_if_current(hash, &entry) {
                CacheMetrics::record_eviction(data_type, "expired", 1);
            }
            return CacheLookup::Expired;
        }

        CacheMetrics::record(data_type, MetricType::Hit, None);
        CacheMetrics::record(
            data_type,
            MetricType::Latency { operation: "get" },
            Some(start.elapsed()),
        );
        debug!(key = %key, "快取命中");
        CacheLookup::Fresh(Arc::clone(&entry.payload))
    }

    /// 寫入（或覆蓋）一個值，以當前時間為計算時間
    pub fn put(&self, key: CacheKey, payload: V, ttl: Duration) -> Arc<V> {
        self.put_shared(key, Arc::new(payload), ttl)
    }

    /// 寫入已共享的值
    pub fn put_shared(&self, key: CacheKey, payload: Arc<V>, ttl: Duration) -> Arc<V> {
        let data_type = V::data_type_name();
        let hash = key.key_hash().0;
        let entry = Arc::new(CacheEntry {
            key,
            payload: Arc::clone(&payload),
            computed_at: self.clock.now(),
            ttl,
        });

        debug!(key = %entry.key, ttl_secs = ttl.as_secs(), "寫入快取");
        if let Some(previous) = self.entries.insert(hash, Arc::clone(&entry)) {
            if previous.key != entry.key {
                warn!(
                    existing_key = %previous.key,
                    new_key = %entry.key,
                    hash,
                    "偵測到雜湊碰撞，覆蓋原有項目"
                );
                CacheMetrics::record_eviction(data_type, "collision", 1);
            }
        }
        CacheMetrics::record_set(data_type);
        payload
    }

    /// 依主題類型的策略 TTL 寫入
    pub fn put_with_policy(&self, key: CacheKey, payload: V) -> Arc<V> {
        let ttl = self.policy.ttl_for(key.subject);
        self.put(key, payload, ttl)
    }

    /// 刪除指定鍵，返回是否有項目被刪除
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self
            .entries
            .remove_if(&key.key_hash().0, |_, entry| entry.key == *key)
            .is_some();
        if removed {
            CacheMetrics::record_eviction(V::data_type_name(), "invalidated", 1);
        }
        removed
    }

    /// 只有當鍵下仍是 `payload` 這個值時才刪除
    ///
    /// 用於撤回基於舊數據寫入的結果，不影響其他寫入者之後放入的新值。
    pub fn invalidate_payload(&self, key: &CacheKey, payload: &Arc<V>) -> bool {
        let removed = self
            .entries
            .remove_if(&key.key_hash().0, |_, entry| {
                entry.key == *key && Arc::ptr_eq(&entry.payload, payload)
            })
            .is_some();
        if removed {
            CacheMetrics::record_eviction(V::data_type_name(), "stale", 1);
        }
        removed
    }

    /// 刪除某標的的全部項目，返回刪除數量
    pub fn invalidate_symbol(&self, symbol: &str) -> usize {
        let removed = self.remove_where(|entry| entry.key.symbol == symbol);
        if removed > 0 {
            debug!(symbol, removed, "清除標的快取");
            CacheMetrics::record_eviction(V::data_type_name(), "invalidated", removed);
        }
        removed
    }

    /// 清理所有已過期項目，返回清理數量
    pub fn clear_expired(&self) -> usize {
        let now = self.clock.now();
        let removed = self.remove_where(|entry| !entry.is_fresh_at(now));
        if removed > 0 {
            debug!(removed, "清理過期快取");
            CacheMetrics::record_eviction(V::data_type_name(), "expired", removed);
        }
        removed
    }

    /// 清空快取，返回清除數量
    pub fn clear_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        CacheMetrics::record_eviction(V::data_type_name(), "cleared", removed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.total += 1;
            if entry.value().is_fresh_at(now) {
                stats.fresh += 1;
            } else {
                stats.expired += 1;
            }
        }
        CacheMetrics::record_cache_size(V::data_type_name(), stats.total);
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn verify(key: &CacheKey, entry: &CacheEntry<V>) -> Result<(), CacheError> {
        if entry.key != *key {
            return Err(CacheError::Corruption {
                key: key.canonical(),
                reason: format!("雜湊碰撞，現有鍵為 {}", entry.key),
            });
        }
        entry
            .payload
            .check_structure()
            .map_err(|reason| CacheError::Corruption {
                key: key.canonical(),
                reason,
            })
    }

    /// 只有當前項目仍是檢查過的那一個時才刪除
    fn evict_if_current(&self, hash: u64, examined: &Arc<CacheEntry<V>>) -> bool {
        self.entries
            .remove_if(&hash, |_, current| Arc::ptr_eq(current, examined))
            .is_some()
    }

    fn remove_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CacheEntry<V>) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if predicate(entry) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

impl<V: CacheableData> Default for FreshnessCache<V> {
    fn default() -> Self {
        Self::new(TtlPolicy::default())
    }
}

impl<V: CacheableData> fmt::Debug for FreshnessCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreshnessCache")
            .field("entries", &self.entries.len())
            .field("policy", &self.policy)
            .field("clock", &self.clock)
            .finish()
    }
}
