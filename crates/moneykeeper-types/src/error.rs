use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in moneykeeper-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// A monetary string that does not normalize to a whole number of đồng.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount format: '{0}'")]
    InvalidAmountFormat(String),
}

/// Errors from executing a parsed command against the ledger.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command is missing a field or carries an unusable value.
    /// The message is shown to the user as is.
    #[error("{0}")]
    Validation(String),

    #[error("user has no wallet")]
    NoWalletAvailable,

    #[error("wallet {0} not found for user")]
    WalletNotFound(Uuid),

    #[error("ledger error: {0}")]
    Ledger(#[from] RepositoryError),
}

impl CommandError {
    /// Reply text for the user. Storage details never leak into it.
    pub fn user_message(&self) -> String {
        match self {
            CommandError::Validation(msg) => {
                format!("Xin lỗi, tôi không thể thực hiện lệnh đó: {msg}. Vui lòng thử lại.")
            }
            CommandError::NoWalletAvailable => {
                "Xin lỗi, bạn chưa có ví nào. Hãy tạo một ví trước khi ghi chi tiêu nhé."
                    .to_string()
            }
            CommandError::WalletNotFound(_) => {
                "Xin lỗi, tôi không tìm thấy ví bạn chọn. Vui lòng thử lại.".to_string()
            }
            CommandError::Ledger(_) => {
                "Xin lỗi, tôi không thể lưu giao dịch đó. Vui lòng thử lại.".to_string()
            }
        }
    }
}

/// Recoverable failures of the intent parser. The pipeline falls back to
/// the free-text extractor on every one of them.
#[derive(Debug, Error)]
pub enum IntentParseError {
    #[error("intent backend failed: {0}")]
    Backend(#[source] LlmError),

    #[error("intent response blocked by safety filter")]
    SafetyBlocked,

    #[error("intent response was empty")]
    Empty,

    #[error("intent response contained no JSON object")]
    NoJsonObject,

    #[error("intent response was malformed: {0}")]
    Malformed(String),
}
