use serde::Serialize;

/// 快取統計信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// 當前快取項目數
    pub total: usize,
    /// 仍在有效期內的項目數
    pub fresh: usize,
    /// 已過期但尚未清理的項目數
    pub expired: usize,
}
