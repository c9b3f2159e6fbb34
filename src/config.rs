/// 配置管理模組
///
/// 本模組負責加載與驗證配置。
/// 支持從開發和生產兩種環境中加載不同的配置。
// 宣告子模組
pub mod loader;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigLoadError, ConfigLoader, Environment, RuntimeSettings, ENV_PREFIX};
pub use types::*;
pub use validation::{validate_config, ValidationError, ValidationUtils, Validator};
