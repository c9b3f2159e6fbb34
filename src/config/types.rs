use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::cache::{SubjectType, TtlPolicy, DEFAULT_FALLBACK_TTL_SECS};
use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use crate::domain_types::IndicatorSpec;

/// 最長允許的快取有效期（一年）
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// 應用程序配置結構
///
/// 所有區段都有預設值，缺少的欄位使用預設值，未知的欄位被忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub log: LogConfig,
    pub cache: CacheConfig,
    pub indicators: IndicatorDefaults,
}

impl ApplicationConfig {
    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// 從已載入的配置反序列化
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.log.validate()?;
        self.cache.validate()?;
        self.indicators.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::one_of(
            &self.level.to_lowercase().as_str(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        ValidationUtils::one_of(
            &self.format.to_lowercase().as_str(),
            &["pretty", "compact"],
            "log.format",
        )?;

        Ok(())
    }
}

/// 快取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 主題名稱到有效期（秒）的覆蓋表
    pub ttl_seconds: HashMap<String, u64>,
    /// 未列入策略表的主題使用的有效期（秒）
    pub fallback_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: HashMap::new(),
            fallback_ttl_secs: DEFAULT_FALLBACK_TTL_SECS,
        }
    }
}

impl CacheConfig {
    /// 在預設策略上套用覆蓋值，未知的主題名稱被忽略
    pub fn ttl_policy(&self) -> TtlPolicy {
        let mut policy =
            TtlPolicy::default().with_fallback(Duration::from_secs(self.fallback_ttl_secs));
        for (name, secs) in &self.ttl_seconds {
            match name.parse::<SubjectType>() {
                Ok(subject) => policy.set_ttl(subject, Duration::from_secs(*secs)),
                Err(_) => debug!(subject = %name, "忽略未知的快取主題"),
            }
        }
        policy
    }
}

impl Validator for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::in_range(
            self.fallback_ttl_secs,
            1,
            MAX_TTL_SECS,
            "cache.fallback_ttl_secs",
        )?;
        for (name, secs) in &self.ttl_seconds {
            ValidationUtils::in_range(*secs, 0, MAX_TTL_SECS, &format!("cache.ttl_seconds.{}", name))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdjParams {
    pub n: usize,
    pub m1: usize,
    pub m2: usize,
}

impl Default for KdjParams {
    fn default() -> Self {
        Self { n: 9, m1: 3, m2: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollParams {
    pub period: usize,
    pub k: f64,
}

impl Default for BollParams {
    fn default() -> Self {
        Self { period: 20, k: 2.0 }
    }
}

/// 報表使用的預設指標參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorDefaults {
    pub ma_periods: Vec<usize>,
    pub macd: MacdParams,
    pub rsi_periods: Vec<usize>,
    pub kdj: KdjParams,
    pub boll: BollParams,
    pub volume_ratio_period: usize,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        Self {
            ma_periods: vec![5, 10, 20, 60],
            macd: MacdParams::default(),
            rsi_periods: vec![6, 12, 24],
            kdj: KdjParams::default(),
            boll: BollParams::default(),
            volume_ratio_period: 5,
        }
    }
}

impl IndicatorDefaults {
    /// 展開為完整的指標列表
    pub fn specs(&self) -> Vec<IndicatorSpec> {
        let mut specs: Vec<IndicatorSpec> = self
            .ma_periods
            .iter()
            .map(|period| IndicatorSpec::Ma { period: *period })
            .collect();
        specs.push(IndicatorSpec::Macd {
            fast: self.macd.fast,
            slow: self.macd.slow,
            signal: self.macd.signal,
        });
        specs.extend(
            self.rsi_periods
                .iter()
                .map(|period| IndicatorSpec::Rsi { period: *period }),
        );
        specs.push(IndicatorSpec::Kdj {
            n: self.kdj.n,
            m1: self.kdj.m1,
            m2: self.kdj.m2,
        });
        specs.push(IndicatorSpec::Boll {
            period: self.boll.period,
            k: self.boll.k,
        });
        specs.push(IndicatorSpec::VolumeRatio {
            period: self.volume_ratio_period,
        });
        specs
    }
}

impl Validator for IndicatorDefaults {
    fn validate(&self) -> Result<(), ValidationError> {
        for spec in self.specs() {
            spec.validate()
                .map_err(|err| ValidationError::InvalidValue(format!("indicators.{}: {}", spec.name(), err)))?;
        }
        Ok(())
    }
}
