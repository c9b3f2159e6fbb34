// time_utils.rs
//
// 提供日期與時間轉換相關的工具函數。
// 主要功能：
// 1. 交易日期轉為 YYYYMMDD 整數（用於快取鍵）與日曆區間計算
// 2. 快取條目年齡的計算

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use std::time::Duration;

//
// 交易日期轉換函數
//

/// 將交易日期轉換為 YYYYMMDD 整數，例如 2024-03-15 -> 20240315
pub fn date_to_yyyymmdd(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// 回推指定天數的日曆日期範圍 `[end - days, end]`
pub fn calendar_range_ending(end: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    let start = end
        .checked_sub_signed(ChronoDuration::days(days.max(0)))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}

//
// 快取時間計算函數
//

/// 計算從 `since` 到 `now` 經過的時間
///
/// 若時鐘倒退（`now` 早於 `since`），視為零。
pub fn elapsed_between(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    now.signed_duration_since(since)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// 將標準庫 Duration 加到時間點上，溢出時飽和到最大時間
pub fn add_std_duration(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    ChronoDuration::from_std(duration)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_yyyymmdd_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(date_to_yyyymmdd(date), 20240315);
        let date = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
        assert_eq!(date_to_yyyymmdd(date), 20231105);
    }

    #[test]
    fn test_calendar_range_ending() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, range_end) = calendar_range_ending(end, 120);
        assert_eq!(range_end, end);
        assert_eq!((end - start).num_days(), 120);
    }

    #[test]
    fn test_elapsed_between_clock_skew() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = earlier + ChronoDuration::seconds(90);

        assert_eq!(elapsed_between(earlier, later), Duration::from_secs(90));
        // 時鐘倒退時不應產生負值
        assert_eq!(elapsed_between(later, earlier), Duration::ZERO);
    }

    #[test]
    fn test_add_std_duration_saturates() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            add_std_duration(at, Duration::from_secs(60)),
            at + ChronoDuration::seconds(60)
        );
        assert_eq!(add_std_duration(at, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
