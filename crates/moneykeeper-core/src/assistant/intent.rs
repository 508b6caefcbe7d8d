//! Intent parser.
//!
//! Asks the generation backend to classify a message into a ledger command
//! under a strict JSON contract. Every failure here is recoverable: the
//! pipeline falls back to the deterministic extractor.

use chrono::{Datelike, NaiveDate};
use moneykeeper_types::command::{BudgetCommand, ExpenseCommand, ParsedCommand};
use moneykeeper_types::error::IntentParseError;
use moneykeeper_types::ledger::EntryKind;
use moneykeeper_types::llm::{CompletionRequest, LlmError, SamplingConfig};
use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use super::amount::parse_amount_phrase;
use crate::llm::box_provider::BoxLlmProvider;

/// Intent model call settings.
pub struct IntentParser<'a> {
    provider: &'a BoxLlmProvider,
    model: &'a str,
    sampling: SamplingConfig,
}

impl<'a> IntentParser<'a> {
    pub fn new(provider: &'a BoxLlmProvider, model: &'a str, sampling: SamplingConfig) -> Self {
        Self {
            provider,
            model,
            sampling,
        }
    }

    /// Classify `message`. `Ok(None)` means the model found no command.
    pub async fn parse(
        &self,
        message: &str,
        today: NaiveDate,
    ) -> Result<Option<ParsedCommand>, IntentParseError> {
        let request = CompletionRequest::from_prompt(
            self.model,
            intent_prompt(message, today),
            &self.sampling,
            false,
        );

        let span = info_span!(
            "gen_ai.intent",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
        );

        let response = self
            .provider
            .complete(&request)
            .instrument(span)
            .await
            .map_err(|e| match e {
                LlmError::SafetyBlocked { .. } => IntentParseError::SafetyBlocked,
                other => IntentParseError::Backend(other),
            })?;

        let command = decode_intent(&response.content)?;
        debug!(action = command.as_ref().map(ParsedCommand::action_name), "intent parsed");
        Ok(command)
    }
}

/// Decode a raw model reply into a command.
pub fn decode_intent(text: &str) -> Result<Option<ParsedCommand>, IntentParseError> {
    if text.trim().is_empty() {
        return Err(IntentParseError::Empty);
    }

    let stripped = strip_code_fences(text);
    let json = first_json_object(&stripped).ok_or(IntentParseError::NoJsonObject)?;
    let raw: RawIntent =
        serde_json::from_str(json).map_err(|e| IntentParseError::Malformed(e.to_string()))?;

    raw.into_command()
}

/// Remove markdown code fence markers (```json / ```).
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```JSON", "").replace("```", "")
}

/// The first balanced `{...}` block, ignoring braces inside JSON strings.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// JSON contract of the intent prompt. Numbers may arrive as JSON numbers
/// or as strings like "20k", so they stay untyped until conversion.
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    month: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    budget_limit: Option<Value>,
    #[serde(default, rename = "type")]
    entry_type: Option<String>,
    #[serde(default)]
    wallet_id: Option<String>,
}

impl RawIntent {
    fn into_command(self) -> Result<Option<ParsedCommand>, IntentParseError> {
        let action = match self.action.as_deref().map(str::trim) {
            None | Some("") | Some("null") => return Ok(None),
            Some(a) => a.to_lowercase(),
        };

        match action.as_str() {
            "create_expense" | "create_income" => {
                let kind = if action == "create_income"
                    || self
                        .entry_type
                        .as_deref()
                        .is_some_and(|t| t.eq_ignore_ascii_case("income"))
                {
                    EntryKind::Income
                } else {
                    EntryKind::Expense
                };
                Ok(Some(ParsedCommand::CreateExpense(ExpenseCommand {
                    amount: self.amount.as_ref().and_then(money_value),
                    description: non_blank(self.description),
                    category: non_blank(self.category),
                    wallet_id: self
                        .wallet_id
                        .as_deref()
                        .and_then(|id| Uuid::parse_str(id.trim()).ok()),
                    kind,
                })))
            }
            "create_budget" => Ok(Some(ParsedCommand::CreateBudget(BudgetCommand {
                category: non_blank(self.category),
                budget_limit: self
                    .budget_limit
                    .as_ref()
                    .or(self.amount.as_ref())
                    .and_then(money_value),
                month: self.month.as_ref().and_then(int_value).and_then(|m| u32::try_from(m).ok()),
                year: self.year.as_ref().and_then(int_value).and_then(|y| i32::try_from(y).ok()),
            }))),
            "query" => Ok(Some(ParsedCommand::Query)),
            other => Err(IntentParseError::Malformed(format!("unknown action '{other}'"))),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn money_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => parse_amount_phrase(s).ok(),
        _ => None,
    }
}

fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Instruction sent to the intent model.
pub fn intent_prompt(message: &str, today: NaiveDate) -> String {
    let month = today.month();
    let year = today.year();
    format!(
        r#"Bạn là một trợ lý AI phân tích tin nhắn của người dùng để xác định các lệnh và hành động cần thực hiện.

Tin nhắn của người dùng: "{message}"

Hãy phân tích và trả về JSON với format sau nếu bạn tìm thấy một lệnh rõ ràng:

{{
  "action": "create_expense" | "create_budget" | "query" | null,
  "type": "expense" | "income" (chỉ dùng cho create_expense, mặc định "expense"),
  "amount": số_tiền (số, null nếu không có),
  "description": "mô tả" (string, null nếu không có),
  "category": "danh mục" (string, null nếu không có),
  "month": số_tháng (int, 1-12, null nếu không có),
  "year": số_năm (int, null nếu không có),
  "budget_limit": số_tiền (số, null nếu không có)
}}

Các lệnh có thể nhận diện:
- create_expense: Khi người dùng báo cáo chi tiêu hoặc khoản thu (ví dụ: "tôi vừa chi 20k ăn sáng", "chi 50k mua đồ", "vừa nhận lương 10 triệu")
- create_budget: Khi người dùng muốn tạo ngân sách (ví dụ: "tạo ngân sách 3 triệu cho ăn uống tháng này")
- query: Khi người dùng chỉ hỏi thông tin, không có lệnh thực thi

QUAN TRỌNG:
- Chỉ trả về JSON, không có text giải thích, không có markdown code block
- Nếu không có lệnh rõ ràng, trả về {{"action": null}}
- Số tiền phải là số thuần túy (ví dụ: 20000, không phải "20k" hoặc "20.000")
- Nếu người dùng nói "20k", "50 nghìn", "3 triệu", hãy convert sang số (20000, 50000, 3000000)
- Nếu không có thông tin, dùng null

Ví dụ:
- "tôi vừa chi 20k ăn sáng" -> {{"action": "create_expense", "type": "expense", "amount": 20000, "description": "ăn sáng", "category": null, "month": null, "year": null, "budget_limit": null}}
- "vừa nhận lương 10 triệu" -> {{"action": "create_expense", "type": "income", "amount": 10000000, "description": "lương", "category": null, "month": null, "year": null, "budget_limit": null}}
- "tạo ngân sách 3 triệu cho ăn uống tháng này" -> {{"action": "create_budget", "amount": null, "description": null, "category": "Ăn uống", "month": {month}, "year": {year}, "budget_limit": 3000000}}
- "tôi có bao nhiêu tiền?" -> {{"action": "query", "amount": null, "description": null, "category": null, "month": null, "year": null, "budget_limit": null}}
- "xin chào" -> {{"action": null}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::{MockProvider, Scripted};

    #[test]
    fn test_decode_expense() {
        let cmd = decode_intent(
            r#"{"action": "create_expense", "amount": 20000, "description": "ăn sáng", "category": null}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            cmd,
            ParsedCommand::CreateExpense(ExpenseCommand {
                amount: Some(20_000),
                description: Some("ăn sáng".to_string()),
                category: None,
                wallet_id: None,
                kind: EntryKind::Expense,
            })
        );
    }

    #[test]
    fn test_decode_strips_fences_and_prose() {
        let text = "Đây là kết quả:\n```json\n{\"action\": \"query\"}\n```";
        assert_eq!(decode_intent(text).unwrap(), Some(ParsedCommand::Query));
    }

    #[test]
    fn test_decode_income_and_string_amount() {
        let cmd = decode_intent(r#"{"action":"create_expense","type":"income","amount":"10 triệu","description":"lương"}"#)
            .unwrap()
            .unwrap();
        match cmd {
            ParsedCommand::CreateExpense(e) => {
                assert_eq!(e.kind, EntryKind::Income);
                assert_eq!(e.amount, Some(10_000_000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_decode_budget() {
        let cmd = decode_intent(
            r#"{"action":"create_budget","category":"Ăn uống","month":11,"year":2026,"budget_limit":3000000.0}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            cmd,
            ParsedCommand::CreateBudget(BudgetCommand {
                category: Some("Ăn uống".to_string()),
                budget_limit: Some(3_000_000),
                month: Some(11),
                year: Some(2026),
            })
        );
    }

    #[test]
    fn test_null_action_is_no_command() {
        assert_eq!(decode_intent(r#"{"action": null}"#).unwrap(), None);
        assert_eq!(decode_intent(r#"{}"#).unwrap(), None);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(decode_intent("   "), Err(IntentParseError::Empty)));
        assert!(matches!(
            decode_intent("không có lệnh"),
            Err(IntentParseError::NoJsonObject)
        ));
        assert!(matches!(
            decode_intent("{\"action\": }"),
            Err(IntentParseError::Malformed(_))
        ));
        assert!(matches!(
            decode_intent(r#"{"action": "delete_wallet"}"#),
            Err(IntentParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_first_json_object_is_balanced() {
        let text = r#"x {"a": {"b": "}"}, "c": 1} y {"d": 2}"#;
        assert_eq!(
            first_json_object(text),
            Some(r#"{"a": {"b": "}"}, "c": 1}"#)
        );
        assert_eq!(first_json_object("{ unclosed"), None);
    }

    #[test]
    fn test_intent_prompt_mentions_current_period() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let prompt = intent_prompt("chi 20k", today);
        assert!(prompt.contains("Tin nhắn của người dùng: \"chi 20k\""));
        assert!(prompt.contains("\"month\": 10, \"year\": 2026"));
    }

    #[tokio::test]
    async fn test_parse_maps_safety_block() {
        let provider = MockProvider::boxed(vec![Scripted::CompleteErr(LlmError::SafetyBlocked {
            reason: "SAFETY".to_string(),
        })]);
        let parser = IntentParser::new(
            &provider,
            "test-model",
            SamplingConfig {
                temperature: 0.1,
                max_output_tokens: 512,
            },
        );
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let err = parser.parse("chi 20k ăn sáng", today).await.unwrap_err();
        assert!(matches!(err, IntentParseError::SafetyBlocked));
    }

    #[tokio::test]
    async fn test_parse_uses_low_temperature() {
        let mock = MockProvider::new(vec![Scripted::Complete(
            r#"{"action":"query"}"#.to_string(),
        )]);
        let requests = mock.requests();
        let provider = BoxLlmProvider::new(mock);
        let parser = IntentParser::new(
            &provider,
            "test-model",
            SamplingConfig {
                temperature: 0.1,
                max_output_tokens: 512,
            },
        );
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let cmd = parser.parse("số dư?", today).await.unwrap();
        assert_eq!(cmd, Some(ParsedCommand::Query));

        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, Some(0.1));
        assert_eq!(seen[0].max_tokens, 512);
        assert!(!seen[0].stream);
    }
}
