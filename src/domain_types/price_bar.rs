use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 日 K 線數據點結構
///
/// 每個交易日一筆，同一標的內日期唯一且嚴格遞增。
/// 一致性檢查由 `storage::validator::BarValidator` 在寫入時執行。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// 成交額
    pub amount: f64,
}

impl PriceBar {
    /// 創建新的 K 線
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        amount: f64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            amount,
        }
    }

    /// 創建開高低收相同的 K 線，成交額以收盤價估算
    pub fn flat(date: NaiveDate, price: f64, volume: f64) -> Self {
        Self::new(date, price, price, price, price, volume, price * volume)
    }

    /// 當日振幅（最高價減最低價）
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// 所有數值欄位，依 (名稱, 值) 排列
    pub fn numeric_fields(&self) -> [(&'static str, f64); 6] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
            ("amount", self.amount),
        ]
    }
}
