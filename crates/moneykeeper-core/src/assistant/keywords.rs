//! Keyword triggers for the context assembler and the direct answer.
//!
//! Plain substring checks on the lower-cased message. Everything that
//! decides "which topic is this message about" goes through [`classify`],
//! so the matcher can be replaced without touching the pipeline.

const DIRECT_BALANCE: &[&str] = &["tổng số dư", "số dư", "balance", "bao nhiêu tiền", " ví"];
const BALANCE: &[&str] = &["số dư", "ví", "balance", "tổng quan", "tiền còn lại"];
const SPENDING: &[&str] = &["chi tiêu", "thống kê", "phân tích", "report"];
const BUDGETS: &[&str] = &["ngân sách", "hạn mức", "budget", "vượt"];

/// Which data the message is asking about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topics {
    /// Answer straight from wallet balances, no generation.
    pub direct_balance: bool,
    pub balance: bool,
    pub spending: bool,
    pub budgets: bool,
}

pub fn classify(message: &str) -> Topics {
    let msg = message.to_lowercase();
    let hits = |keywords: &[&str]| keywords.iter().any(|k| msg.contains(k));
    Topics {
        direct_balance: hits(DIRECT_BALANCE),
        balance: hits(BALANCE),
        spending: hits(SPENDING),
        budgets: hits(BUDGETS),
    }
}
