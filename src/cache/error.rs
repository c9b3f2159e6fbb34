use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("快取項目損壞 ({key}): {reason}")]
    Corruption { key: String, reason: String },

    #[error("未知的快取主題類型: {0}")]
    UnknownSubject(String),
}
