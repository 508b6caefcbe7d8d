//! Direct answers computed straight from ledger data, no generation.

use tracing::{debug, warn};
use uuid::Uuid;

use super::format::format_vnd;
use super::keywords::Topics;
use crate::ledger::repository::LedgerRepository;

/// Balance reply for a balance/wallet query. `None` when the message is not
/// such a query or the ledger could not be read, in which case the caller
/// continues with generation.
pub async fn balance_answer<L: LedgerRepository>(
    ledger: &L,
    user_id: Uuid,
    topics: Topics,
) -> Option<String> {
    if !topics.direct_balance {
        return None;
    }

    let wallets = match ledger.list_wallets(&user_id).await {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "direct answer skipped, wallets unavailable");
            return None;
        }
    };
    debug!(wallets = wallets.len(), "answering balance query from ledger");

    if wallets.is_empty() {
        return Some("**Hiện bạn chưa có ví nào.**".to_string());
    }

    let total: i64 = wallets.iter().map(|w| w.balance).sum();
    let mut lines: Vec<String> = wallets
        .iter()
        .map(|w| format!("-   **{}:** {}", w.name, format_vnd(w.balance)))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "**Tổng số dư hiện tại của bạn là {}.**",
        format_vnd(total)
    ));
    Some(lines.join("\n"))
}
