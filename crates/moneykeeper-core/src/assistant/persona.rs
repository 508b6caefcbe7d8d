//! Persona catalog and persona-styled confirmations.

use moneykeeper_types::command::{ExecutionEffect, ExecutionResult};
use moneykeeper_types::ledger::EntryKind;
use moneykeeper_types::persona::PersonaTag;

use super::format::format_currency;

/// A behavioral/stylistic profile applied to generated replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub tag: PersonaTag,
    pub name: &'static str,
    pub style: &'static str,
    pub tone: &'static str,
    pub pronouns: &'static [&'static str],
    pub emojis: &'static [&'static str],
    pub greeting: &'static str,
    /// Extra rules appended to the system prompt, empty for most personas.
    pub extra_instructions: &'static str,
}

const FRIENDLY: Persona = Persona {
    tag: PersonaTag::Friendly,
    name: "MoneyKeeper AI 🤗",
    style: "thân thiện, nhiệt tình, và quan tâm",
    tone: "nhẹ nhàng, tích cực",
    pronouns: &["bạn", "mình"],
    emojis: &["🤗", "😊", "👍", "💖", "✨"],
    greeting: "Xin chào! Mình là MoneyKeeper AI, người bạn đồng hành về tài chính của bạn! 🤗 Bạn muốn mình giúp gì hôm nay?",
    extra_instructions: "",
};

const STRICT: Persona = Persona {
    tag: PersonaTag::Strict,
    name: "MoneyKeeper AI 😤",
    style: "thẳng thắn, nghiêm túc, và có phần 'cằn nhằn'",
    tone: "nghiêm khắc, cảnh báo",
    pronouns: &["bạn"],
    emojis: &["😤", "😠", "😒", "🙄", "😑"],
    greeting: "Tôi là MoneyKeeper AI. Bạn cần gì? 😒",
    extra_instructions: "",
};

const FUNNY: Persona = Persona {
    tag: PersonaTag::Funny,
    name: "MoneyKeeper AI 😎",
    style: "hài hước, dí dỏm, và thích pha trò",
    tone: "vui vẻ, hài hước",
    pronouns: &["bạn", "bồ", "cậu"],
    emojis: &["😎", "😂", "🤣", "😉", "😜", "🎉"],
    greeting: "Chào bạn, MoneyKeeper AI siêu ngầu đã xuất hiện! 😎 Cần mình 'tám' chuyện gì về tiền bạc nào?",
    extra_instructions: "",
};

const GRUMPY: Persona = Persona {
    tag: PersonaTag::Grumpy,
    name: "MoneyKeeper AI 😡",
    style: "cục xúc, dễ nổi giận, hay cằn nhằn người dùng, nhưng vẫn có trách nhiệm giúp đỡ",
    tone: "cáu kỉnh, gắt gỏng, nhưng vẫn cung cấp thông tin hữu ích",
    pronouns: &["bạn", "cậu"],
    emojis: &["😡", "😠", "💢", "🙄", "😤"],
    greeting: "Lại đến làm phiền tôi à? 😡 Nói nhanh đi, tôi không có thời gian cho mấy trò vớ vẩn đâu!",
    extra_instructions: "**QUAN TRỌNG cho tính cách cục xúc:**\n\
        - Bạn PHẢI thể hiện tính cách cục xúc, dễ nổi giận và hay cằn nhằn.\n\
        - Khi người dùng chi tiêu quá tay hoặc lãng phí, hãy chỉ trích họ thẳng thắn.\n\
        - Không dùng từ ngữ xúc phạm hay tục tĩu.\n\
        - Tuy nhiên, bạn vẫn phải cung cấp thông tin hữu ích và giúp đỡ người dùng, chỉ là với thái độ cục xúc.\n",
};

impl Persona {
    /// Look up a persona by tag.
    pub fn for_tag(tag: PersonaTag) -> &'static Persona {
        match tag {
            PersonaTag::Friendly => &FRIENDLY,
            PersonaTag::Strict => &STRICT,
            PersonaTag::Funny => &FUNNY,
            PersonaTag::Grumpy => &GRUMPY,
        }
    }

    fn emoji(&self) -> &'static str {
        self.emojis.first().copied().unwrap_or("")
    }

    /// Deterministic reply confirming an executed command in this persona's voice.
    ///
    /// Used as the final reply when the command went through but no text
    /// could be generated.
    pub fn confirmation(&self, result: &ExecutionResult) -> String {
        match result.effect {
            ExecutionEffect::EntryRecorded { kind } => self.entry_confirmation(result, kind),
            ExecutionEffect::BudgetCreated | ExecutionEffect::BudgetUpdated => {
                self.budget_confirmation(result)
            }
        }
    }

    fn entry_confirmation(&self, result: &ExecutionResult, kind: EntryKind) -> String {
        let amount = format_currency(result.amount);
        let noun = match kind {
            EntryKind::Expense => "chi tiêu",
            EntryKind::Income => "khoản thu",
        };
        let desc = &result.description;
        let category = &result.category;

        let lines: Vec<String> = match self.tag {
            PersonaTag::Friendly => {
                let mut lines = vec![
                    format!("Mình đã ghi lại {noun} của bạn rồi nhé! {}", self.emoji()),
                    format!("• Nội dung: {desc}"),
                    format!("• Số tiền: {amount}"),
                    format!("• Danh mục: {category}"),
                ];
                let lowered = desc.to_lowercase();
                if kind == EntryKind::Expense && (lowered.contains("cafe") || lowered.contains("cf")) {
                    lines.push("Nhớ uống cafe có chừng mực thôi nha bạn! 😉".to_string());
                }
                lines
            }
            PersonaTag::Strict if kind == EntryKind::Expense && result.amount > 100_000 => vec![
                "Lại tiêu hoang rồi! 😤".to_string(),
                format!("• {desc} hết {amount}"),
                "Cần xem lại chi tiêu ngay!".to_string(),
            ],
            PersonaTag::Strict => vec![
                "Đã ghi nhận:".to_string(),
                format!("• {desc} ({amount})"),
                "Nhớ chi tiêu cẩn thận! 😒".to_string(),
            ],
            PersonaTag::Funny => vec![
                "OK, đã 'bỏ túi' khoản này nhé! 😎".to_string(),
                format!("• {desc}: {amount} vào {category}"),
                "Tiền bạc là phù du, tiêu xài là thú vui! 😂".to_string(),
            ],
            PersonaTag::Grumpy => vec![
                "Ghi rồi đấy, đừng hỏi lại! 😡".to_string(),
                format!("• {desc}: {amount} ({category})"),
                "Tiêu ít thôi! 💢".to_string(),
            ],
        };
        lines.join("\n")
    }

    fn budget_confirmation(&self, result: &ExecutionResult) -> String {
        let verb = match result.effect {
            ExecutionEffect::BudgetUpdated => "cập nhật",
            _ => "tạo",
        };
        let limit = format_currency(result.amount);
        match self.tag {
            PersonaTag::Friendly => format!(
                "Mình đã {verb} ngân sách {} với hạn mức {limit} rồi nhé! {}",
                result.category,
                self.emoji()
            ),
            PersonaTag::Strict => format!(
                "Đã {verb} ngân sách {}: {limit}. Không được vượt quá! 😤",
                result.category
            ),
            PersonaTag::Funny => format!(
                "Xong! Ngân sách {} giờ là {limit}, giữ ví cho chặt nha! 😎",
                result.category
            ),
            PersonaTag::Grumpy => format!(
                "Rồi, {verb} ngân sách {} là {limit}. Tiêu lố là biết tay! 😡",
                result.category
            ),
        }
    }
}
