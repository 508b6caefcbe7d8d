//! Deterministic expense extractor.
//!
//! Regex fallback used when the intent model is unreachable or finds no
//! command. Templates are tried in order against the lower-cased message;
//! the first one that captures an amount wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::amount::{UNIT_ALTERNATION, normalize_amount};

/// Label used when nothing is left of the description after cleaning.
pub const DEFAULT_DESCRIPTION: &str = "Chi tiêu";

const STOP_WORDS: &[&str] = &["chi", "tiêu", "trả", "mua", "cho", "về"];
const STOP_PHRASES: &[(&str, &str)] = &[("thanh", "toán"), ("về", "việc")];

/// One template: capture 1 is the number, 2 the optional unit, 3 the remainder.
struct Template {
    name: &'static str,
    pattern: Regex,
}

static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    let number = r"(\d(?:[\d\s.,]*\d)?)";
    let unit = format!(r"(?:({UNIT_ALTERNATION})\b)?");
    let tail = r"[\s.!?]*$";
    vec![
        // "tôi vừa chi 20k ăn sáng", "chi 2 triệu"
        Template {
            name: "verb_first",
            pattern: Regex::new(&format!(
                r"(?:tôi\s+)?(?:vừa\s+)?(?:chi|tiêu|trả|mua|thanh\s+toán)\s+{number}\s*{unit}(?:\s+(.*?))?{tail}"
            ))
            .expect("verb-first template is valid"),
        },
        // "20k cà phê hết"
        Template {
            name: "amount_first_trailing_verb",
            pattern: Regex::new(&format!(
                r"^\s*{number}\s*{unit}\s*(.+?)\s+(?:với\s+giá|hết|mất|tốn|là|giá|chi\s+phí|tổng\s+cộng|khoảng){tail}"
            ))
            .expect("trailing-verb template is valid"),
        },
        // "20k cho ăn sáng"
        Template {
            name: "amount_first",
            pattern: Regex::new(&format!(
                r"^\s*{number}\s*{unit}(?:\s*(?:cho|về\s+việc|về|mua|trả|thanh\s+toán)\b)?(?:\s+(.*?))?{tail}"
            ))
            .expect("amount-first template is valid"),
        },
    ]
});

/// An expense pulled out of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedExpense {
    pub description: String,
    pub amount: i64,
}

/// Extract `(description, amount)` from a chat message.
///
/// `None` when no template matches or the amount does not normalize; that is
/// an ordinary outcome for messages that are not expenses. The amount may be
/// zero, callers decide whether it is worth recording.
pub fn extract_expense(message: &str) -> Option<ExtractedExpense> {
    let lowered = message.trim().to_lowercase();

    for template in TEMPLATES.iter() {
        let Some(caps) = template.pattern.captures(&lowered) else {
            continue;
        };
        let numeric = caps.get(1).map_or("", |m| m.as_str()).trim();
        if numeric.is_empty() {
            continue;
        }

        let unit = caps.get(2).map(|m| m.as_str());
        let remainder = caps.get(3).map_or("", |m| m.as_str());

        return match normalize_amount(numeric, unit) {
            Ok(amount) => {
                let description = clean_description(remainder);
                debug!(template = template.name, amount, %description, "extracted expense from text");
                Some(ExtractedExpense {
                    description,
                    amount,
                })
            }
            Err(e) => {
                debug!(template = template.name, error = %e, "matched template but amount did not normalize");
                None
            }
        };
    }

    None
}

/// Drop stop-words (and the two-word stop phrases) from a remainder.
pub fn clean_description(remainder: &str) -> String {
    let words: Vec<&str> = remainder.split_whitespace().collect();
    let mut kept = Vec::with_capacity(words.len());
    let mut i = 0;

    while i < words.len() {
        if let Some(next) = words.get(i + 1) {
            if STOP_PHRASES
                .iter()
                .any(|(a, b)| *a == words[i] && b == next)
            {
                i += 2;
                continue;
            }
        }
        if !STOP_WORDS.contains(&words[i]) {
            kept.push(words[i]);
        }
        i += 1;
    }

    let cleaned = kept.join(" ");
    if cleaned.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        cleaned
    }
}
