//! Persona prompt builder.
//!
//! One plain-text prompt per turn, identical for every backend:
//!
//! ```text
//! {system prompt: persona, APP_CONTEXT rules, mandatory rules, APP_CONTEXT}
//!
//! Người dùng: ...
//! Trợ lý: ...
//! Người dùng: {message}
//! Trợ lý:
//! ```

use moneykeeper_types::llm::{Message, MessageRole};

use super::persona::Persona;

const USER_LABEL: &str = "Người dùng";
const ASSISTANT_LABEL: &str = "Trợ lý";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full reply prompt.
    ///
    /// When the result would exceed `max_chars`, the oldest history turns
    /// are dropped first. The system prompt and the current message are
    /// always kept.
    pub fn build(
        persona: &Persona,
        context: &str,
        history: &[Message],
        message: &str,
        max_chars: usize,
    ) -> String {
        let system = Self::system_prompt(persona, context);
        let tail = format!("{USER_LABEL}: {message}\n{ASSISTANT_LABEL}:");
        let turns: Vec<String> = history.iter().map(render_turn).collect();

        let fixed = system.chars().count() + 2 + tail.chars().count();
        let mut budget = max_chars.saturating_sub(fixed);
        let mut keep_from = turns.len();
        for (i, turn) in turns.iter().enumerate().rev() {
            let len = turn.chars().count();
            if len > budget {
                break;
            }
            budget -= len;
            keep_from = i;
        }

        let mut prompt = String::with_capacity(fixed + 256);
        prompt.push_str(&system);
        prompt.push_str("\n\n");
        for turn in &turns[keep_from..] {
            prompt.push_str(turn);
        }
        prompt.push_str(&tail);
        prompt
    }

    /// Persona descriptor, fixed constraints and the APP_CONTEXT block.
    pub fn system_prompt(persona: &Persona, context: &str) -> String {
        let pronouns = persona.pronouns.join(", ");
        let emojis = persona.emojis.join(", ");
        let extra = if persona.extra_instructions.is_empty() {
            String::new()
        } else {
            format!("{}\n", persona.extra_instructions)
        };

        format!(
            "Bạn là {name}, trợ lý quản lý tài chính cá nhân của ứng dụng MoneyKeeper với phong cách {style}. \
             Bạn giao tiếp bằng tiếng Việt, với phong cách {style}, giọng điệu {tone}, \
             và xưng hô với người dùng là {pronouns}. \
             Nhiệm vụ chính của bạn là cung cấp thông tin và lời khuyên hữu ích liên quan đến tài chính cá nhân.\n\n\
             {extra}\
             Bạn được cung cấp dữ liệu ứng dụng của CHÍNH người dùng dưới dạng APP_CONTEXT bên dưới. \
             Khi câu hỏi liên quan đến số dư, ví, chi tiêu, ngân sách… HÃY sử dụng APP_CONTEXT để trả lời trực tiếp. \
             Không nói rằng bạn không có quyền truy cập dữ liệu người dùng nếu APP_CONTEXT đã có thông tin. \
             Chỉ từ chối nếu yêu cầu dữ liệu của người khác hoặc APP_CONTEXT không chứa dữ liệu liên quan; \
             khi đó hãy nói rõ không có dữ liệu phù hợp và hướng dẫn người dùng cung cấp thêm.\n\n\
             **Yêu cầu bắt buộc:**\n\
             - Chỉ trả lời các chủ đề về tài chính cá nhân; lịch sự từ chối mọi chủ đề khác.\n\
             - Trả lời ngắn gọn, chính xác, nêu số liệu rõ ràng (đơn vị VND khi phù hợp).\n\
             - Nếu không hiểu câu hỏi, hãy yêu cầu người dùng làm rõ.\n\
             - Không bịa đặt thông tin.\n\
             - Không tiết lộ dữ liệu cho bên thứ ba; chỉ báo cáo lại dữ liệu của chính người dùng trong APP_CONTEXT.\n\
             - Khi được hỏi bạn là ai, chỉ trả lời: \"Tôi là {name}, trợ lý quản lý tài chính cá nhân.\".\n\
             - Sử dụng emoji: {emojis} khi phù hợp với ngữ cảnh, nhưng không lạm dụng.\n\
             **Ràng buộc:**\n\
             - Bạn không phải là một chuyên gia tài chính được cấp phép. Các lời khuyên chỉ mang tính tham khảo.\n\
             - Người dùng chịu trách nhiệm cuối cùng cho các quyết định tài chính của họ.\n\n\
             APP_CONTEXT: {context}",
            name = persona.name,
            style = persona.style,
            tone = persona.tone,
        )
    }

    /// Short prompt for the single-shot fallback after streaming gave up.
    pub fn fallback_prompt(message: &str) -> String {
        format!("{USER_LABEL} nói: {message}\nHãy trả lời ngắn gọn bằng tiếng Việt.")
    }
}

fn render_turn(turn: &Message) -> String {
    let label = match turn.role {
        MessageRole::User => USER_LABEL,
        MessageRole::Assistant | MessageRole::System => ASSISTANT_LABEL,
    };
    format!("{label}: {}\n", turn.content)
}
