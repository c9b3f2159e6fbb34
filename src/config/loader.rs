use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use super::types::{ApplicationConfig, LogConfig};
use super::validation::{validate_config, ValidationError};
use crate::cache::TtlPolicy;
use crate::domain_types::IndicatorSpec;

/// 環境變數前綴，`INDICATOR__CACHE__FALLBACK_TTL_SECS` 對應 `cache.fallback_ttl_secs`
pub const ENV_PREFIX: &str = "INDICATOR";

const DEFAULT_CONFIG_DIR: &str = "config";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("讀取配置失敗: {0}")]
    Source(#[from] ConfigError),

    #[error("配置驗證失敗: {0}")]
    Invalid(#[from] ValidationError),
}

/// 部署環境，決定讀取哪一個配置文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 讀取 `INDICATOR_ENV`，未設定或無法識別時為開發環境
    pub fn from_env() -> Self {
        match env::var("INDICATOR_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 由配置組裝好的執行期設定
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub log: LogConfig,
    /// 套用覆蓋值後的快取有效期策略
    pub ttl_policy: TtlPolicy,
    /// 報表預設計算的指標
    pub report_specs: Vec<IndicatorSpec>,
}

impl From<&ApplicationConfig> for RuntimeSettings {
    fn from(config: &ApplicationConfig) -> Self {
        Self {
            log: config.log.clone(),
            ttl_policy: config.cache.ttl_policy(),
            report_specs: config.indicators.specs(),
        }
    }
}

/// 配置加載器
///
/// 依序疊加 `{config_dir}/{environment}.toml`（可不存在）與 `INDICATOR__*`
/// 環境變數，後者優先。載入結果一律經過驗證。
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    environment: Environment,
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// 以 `CONFIG_DIR` 環境變數（預設 `config`）為配置目錄
    pub fn new(environment: Environment) -> Self {
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into());
        Self {
            environment,
            config_dir: PathBuf::from(config_dir),
        }
    }

    /// 環境與配置目錄都從環境變數決定
    pub fn from_env() -> Self {
        Self::new(Environment::from_env())
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(self.environment.as_filename())
    }

    /// 載入、反序列化並驗證配置
    pub fn load(&self) -> Result<ApplicationConfig, ConfigLoadError> {
        let path = self.config_path();
        debug!(path = %path.display(), environment = ?self.environment, "載入配置");

        let raw = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                ConfigEnvironment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = ApplicationConfig::from_config(raw)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// 載入配置並組裝執行期設定
    pub fn load_settings(&self) -> Result<RuntimeSettings, ConfigLoadError> {
        self.load().map(|config| RuntimeSettings::from(&config))
    }
}
