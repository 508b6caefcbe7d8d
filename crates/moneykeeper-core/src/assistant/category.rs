//! Category suggester.
//!
//! Deterministic keyword rules over the lower-cased description. First
//! matching rule wins; anything unrecognized lands in `Khác`.

/// Category labels as stored on entries and budgets.
pub const FOOD: &str = "Ăn uống";
pub const TRANSPORT: &str = "Di chuyển";
pub const UTILITIES: &str = "Hóa đơn & Tiện ích";
pub const ENTERTAINMENT: &str = "Giải trí";
pub const SHOPPING: &str = "Mua sắm";
pub const HEALTH: &str = "Sức khỏe";
pub const EDUCATION: &str = "Giáo dục";
pub const INVESTMENT: &str = "Đầu tư";
pub const OTHER: &str = "Khác";

pub const ALL_CATEGORIES: [&str; 9] = [
    FOOD,
    TRANSPORT,
    UTILITIES,
    ENTERTAINMENT,
    SHOPPING,
    HEALTH,
    EDUCATION,
    INVESTMENT,
    OTHER,
];

const RULES: &[(&str, &[&str])] = &[
    (
        UTILITIES,
        &[
            "tiền điện", "tiền nước", "hóa đơn", "hoá đơn", "internet", "wifi", "mạng",
            "điện thoại", "nạp thẻ", "gas", "tiền nhà", "thuê nhà", "chung cư",
        ],
    ),
    (
        FOOD,
        &[
            "ăn", "uống", "cafe", "cà phê", "cf", "trà sữa", "phở", "bún", "cơm", "bánh",
            "nhà hàng", "đồ ăn", "thức ăn", "nước ngọt", "bia", "đi chợ", "siêu thị",
        ],
    ),
    (
        TRANSPORT,
        &[
            "xăng", "grab", "taxi", "xe buýt", "xe bus", "vé xe", "gửi xe", "đổ xăng",
            "sửa xe", "be ", "gojek", "tàu", "máy bay", "vé máy bay", "di chuyển",
        ],
    ),
    (
        HEALTH,
        &[
            "thuốc", "bệnh viện", "khám", "bác sĩ", "nha khoa", "bảo hiểm y tế", "gym",
            "tập thể dục", "vitamin",
        ],
    ),
    (
        EDUCATION,
        &["học phí", "sách", "khóa học", "khoá học", "học", "lớp", "giáo trình", "trường"],
    ),
    (
        ENTERTAINMENT,
        &[
            "xem phim", "phim", "rạp", "karaoke", "game", "du lịch", "netflix", "spotify",
            "concert", "giải trí", "chơi",
        ],
    ),
    (
        INVESTMENT,
        &["cổ phiếu", "chứng khoán", "đầu tư", "vàng", "crypto", "tiết kiệm", "gửi tiết kiệm"],
    ),
    (
        SHOPPING,
        &[
            "quần", "áo", "giày", "dép", "túi", "mỹ phẩm", "shopee", "lazada", "tiki",
            "mua sắm", "đồ dùng", "điện máy",
        ],
    ),
];

/// Map a free-text description to one of [`ALL_CATEGORIES`].
pub fn suggest_category(description: &str) -> &'static str {
    let text = format!(" {} ", description.to_lowercase());
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&text, k)))
        .map(|(category, _)| *category)
        .unwrap_or(OTHER)
}

/// Keyword match on word boundaries, so "ăn" does not fire inside "bán".
fn contains_word(padded: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    padded.match_indices(keyword).any(|(idx, _)| {
        let before = padded[..idx].chars().next_back();
        let after = padded[idx + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Canonical label for a category supplied by the intent model, matched
/// case-insensitively. Unknown labels are kept as given.
pub fn canonical_category(label: &str) -> String {
    let trimmed = label.trim();
    ALL_CATEGORIES
        .iter()
        .find(|c| c.to_lowercase() == trimmed.to_lowercase())
        .map(|c| c.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food() {
        assert_eq!(suggest_category("ăn sáng"), FOOD);
        assert_eq!(suggest_category("Cà phê với bạn"), FOOD);
        assert_eq!(suggest_category("trà sữa"), FOOD);
    }

    #[test]
    fn test_utilities_before_food() {
        assert_eq!(suggest_category("tiền điện tháng 10"), UTILITIES);
        assert_eq!(suggest_category("tiền nhà"), UTILITIES);
    }

    #[test]
    fn test_transport_and_others() {
        assert_eq!(suggest_category("đổ xăng"), TRANSPORT);
        assert_eq!(suggest_category("grab đi làm"), TRANSPORT);
        assert_eq!(suggest_category("mua thuốc cảm"), HEALTH);
        assert_eq!(suggest_category("học phí"), EDUCATION);
        assert_eq!(suggest_category("xem phim"), ENTERTAINMENT);
        assert_eq!(suggest_category("mua áo khoác"), SHOPPING);
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(suggest_category("bán đồ cũ"), OTHER);
    }

    #[test]
    fn test_unknown_defaults_to_other() {
        assert_eq!(suggest_category("Chi tiêu"), OTHER);
        assert_eq!(suggest_category(""), OTHER);
    }

    #[test]
    fn test_canonical_category() {
        assert_eq!(canonical_category("ăn uống"), FOOD);
        assert_eq!(canonical_category(" Giải Trí "), ENTERTAINMENT);
        assert_eq!(canonical_category("Thú cưng"), "Thú cưng");
    }
}
