use serde::{Deserialize, Serialize};

use crate::domain_types::{IndicatorOutput, IndicatorSnapshot};

/// 可快取資料類型的 trait
///
/// 實現此 trait 的類型可以被存儲在 [`FreshnessCache`](super::FreshnessCache) 中。
/// 要求類型支持克隆、序列化、反序列化，並且是線程安全的。
pub trait CacheableData: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static {
    /// 返回資料類型名稱，用於監控指標
    ///
    /// 此名稱將用於生成監控指標的標籤，應該是：
    /// - 簡短且描述性的
    /// - 使用小寫字母和下劃線
    /// - 在整個應用中保持一致
    fn data_type_name() -> &'static str;

    /// 讀取時的結構檢查，失敗的項目視為損壞並被驅逐
    fn check_structure(&self) -> Result<(), String> {
        Ok(())
    }
}

impl CacheableData for IndicatorOutput {
    fn data_type_name() -> &'static str {
        "indicator_series"
    }

    fn check_structure(&self) -> Result<(), String> {
        IndicatorOutput::check_structure(self)
    }
}

impl CacheableData for IndicatorSnapshot {
    fn data_type_name() -> &'static str {
        "indicator_snapshot"
    }

    fn check_structure(&self) -> Result<(), String> {
        if self.values.values().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(format!("{} 的快照包含非有限數值", self.symbol))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_names() {
        assert_eq!(IndicatorOutput::data_type_name(), "indicator_series");
        assert_eq!(IndicatorSnapshot::data_type_name(), "indicator_snapshot");
    }

    #[test]
    fn test_snapshot_structure() {
        let mut snapshot = IndicatorSnapshot::new("000001");
        snapshot.values.insert("MA5".to_string(), 10.0);
        assert!(CacheableData::check_structure(&snapshot).is_ok());

        snapshot.values.insert("RSI6".to_string(), f64::NAN);
        assert!(CacheableData::check_structure(&snapshot).is_err());
    }
}
