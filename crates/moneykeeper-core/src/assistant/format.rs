//! Money formatting shared by replies, context sentences and the CLI.

/// `150000` -> `"150,000"`.
pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `150000` -> `"150,000 VND"`. Used in direct answers and confirmations.
pub fn format_vnd(amount: i64) -> String {
    format!("{} VND", group_thousands(amount))
}

/// `150000` -> `"150,000đ"`. Used in the compact context sentences.
pub fn format_currency(amount: i64) -> String {
    format!("{}đ", group_thousands(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(150_000), "150,000");
        assert_eq!(group_thousands(1_234_567_890), "1,234,567,890");
        assert_eq!(group_thousands(-20_000), "-20,000");
    }

    #[test]
    fn test_format_vnd_and_currency() {
        assert_eq!(format_vnd(150_000), "150,000 VND");
        assert_eq!(format_currency(20_000), "20,000đ");
    }
}
