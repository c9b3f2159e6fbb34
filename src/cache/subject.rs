//! 快取主題類型與 TTL 策略

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::CacheError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// 未列入策略表的主題使用的 TTL（秒）
pub const DEFAULT_FALLBACK_TTL_SECS: u64 = HOUR;

/// 快取數據的主題類型，決定其有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// 實時行情
    Realtime,
    /// 日 K 線及其衍生指標
    DailyKline,
    /// 財務報表
    Financial,
    /// 股東數據
    Shareholders,
    /// 分紅送配
    Dividend,
    /// 估值
    Valuation,
    /// 資金流向
    FundFlow,
    /// 板塊
    Board,
}

impl SubjectType {
    pub const ALL: [SubjectType; 8] = [
        SubjectType::Realtime,
        SubjectType::DailyKline,
        SubjectType::Financial,
        SubjectType::Shareholders,
        SubjectType::Dividend,
        SubjectType::Valuation,
        SubjectType::FundFlow,
        SubjectType::Board,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Realtime => "realtime",
            SubjectType::DailyKline => "daily_kline",
            SubjectType::Financial => "financial",
            SubjectType::Shareholders => "shareholders",
            SubjectType::Dividend => "dividend",
            SubjectType::Valuation => "valuation",
            SubjectType::FundFlow => "fund_flow",
            SubjectType::Board => "board",
        }
    }

    /// 預設有效期
    pub fn default_ttl(&self) -> Duration {
        let secs = match self {
            SubjectType::Realtime => MINUTE,
            SubjectType::DailyKline => HOUR,
            SubjectType::Financial => 7 * DAY,
            SubjectType::Shareholders => 30 * DAY,
            SubjectType::Dividend => 30 * DAY,
            SubjectType::Valuation => HOUR,
            SubjectType::FundFlow => HOUR,
            SubjectType::Board => DAY,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubjectType::ALL
            .iter()
            .copied()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| CacheError::UnknownSubject(s.to_string()))
    }
}

/// 按主題類型查找 TTL 的策略表
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    ttls: HashMap<SubjectType, Duration>,
    fallback: Duration,
}

impl TtlPolicy {
    /// 空策略表，所有主題都使用 `fallback`
    pub fn empty(fallback: Duration) -> Self {
        Self {
            ttls: HashMap::new(),
            fallback,
        }
    }

    pub fn with_ttl(mut self, subject: SubjectType, ttl: Duration) -> Self {
        self.ttls.insert(subject, ttl);
        self
    }

    pub fn with_fallback(mut self, fallback: Duration) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn set_ttl(&mut self, subject: SubjectType, ttl: Duration) {
        self.ttls.insert(subject, ttl);
    }

    pub fn ttl_for(&self, subject: SubjectType) -> Duration {
        self.ttls.get(&subject).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Duration {
        self.fallback
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        SubjectType::ALL.iter().fold(
            TtlPolicy::empty(Duration::from_secs(DEFAULT_FALLBACK_TTL_SECS)),
            |policy, subject| policy.with_ttl(*subject, subject.default_ttl()),
        )
    }
}
