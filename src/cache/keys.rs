use chrono::NaiveDate;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::subject::SubjectType;
use crate::domain_types::IndicatorRequest;
use crate::utils::date_to_yyyymmdd;

/// 預計算的快取鍵雜湊值，用於加速查找
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKeyHash(pub u64);

impl CacheKeyHash {
    /// 使用 FxHasher 計算鍵的雜湊值
    pub fn new(key: &str) -> Self {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// 快取鍵：主題類型 + 股票代碼 + 參數 + 可選日期範圍
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub subject: SubjectType,
    pub symbol: String,
    pub params: String,
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl CacheKey {
    pub fn new(subject: SubjectType, symbol: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            subject,
            symbol: symbol.into(),
            params: params.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.range = Some((start, end));
        self
    }

    /// 指標請求對應的快取鍵，指標結果隨日 K 線更新
    pub fn for_indicator(request: &IndicatorRequest) -> Self {
        Self::new(
            SubjectType::DailyKline,
            request.symbol.as_str(),
            request.spec.key_fragment(),
        )
        .with_range(request.start, request.end)
    }

    /// 標準字串形式 `subject:symbol:params[:YYYYMMDD:YYYYMMDD]`
    pub fn canonical(&self) -> String {
        KEY_BUILDER.with(|builder| builder.borrow_mut().render(self).to_owned())
    }

    /// 標準字串形式的雜湊值
    pub fn key_hash(&self) -> CacheKeyHash {
        KEY_BUILDER.with(|builder| CacheKeyHash::new(builder.borrow_mut().render(self)))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// 快取鍵構建器，重用內部緩衝區以提升性能
pub struct OptimizedKeyBuilder {
    buffer: String,
    itoa_buffer: itoa::Buffer,
}

impl OptimizedKeyBuilder {
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(128),
            itoa_buffer: itoa::Buffer::new(),
        }
    }

    pub fn render(&mut self, key: &CacheKey) -> &str {
        self.buffer.clear();

        self.buffer.push_str(key.subject.as_str());
        self.buffer.push(':');
        self.buffer.push_str(&key.symbol);
        self.buffer.push(':');
        self.buffer.push_str(&key.params);

        if let Some((start, end)) = key.range {
            self.buffer.push(':');
            self.buffer
                .push_str(self.itoa_buffer.format(date_to_yyyymmdd(start)));
            self.buffer.push(':');
            self.buffer
                .push_str(self.itoa_buffer.format(date_to_yyyymmdd(end)));
        }

        &self.buffer
    }
}

impl Default for OptimizedKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static KEY_BUILDER: RefCell<OptimizedKeyBuilder> = RefCell::new(OptimizedKeyBuilder::new());
}
