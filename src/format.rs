//! Display formatting for money, percentages and large counts.

pub fn format_currency(value: f64, currency: &str) -> String {
    if !value.is_finite() {
        return "NaN".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let formatted_number = match currency {
        "JPY" => group_thousands(&format!("{magnitude:.0}")),
        _ => format_with_commas(magnitude),
    };

    match currency {
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("{sign}${formatted_number}"),
        "EUR" => format!("{sign}{formatted_number} €"),
        "GBP" => format!("{sign}£{formatted_number}"),
        "JPY" => format!("{sign}¥{formatted_number}"),
        _ => format!("{sign}{formatted_number} {currency}"),
    }
}

/// `1234.5` → `"1,234.50"`
pub fn format_with_commas(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    format!("{}.{decimal_part}", group_thousands(integer_part))
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    format!("{sign}{grouped}")
}

/// Signed percentage with two decimals, e.g. `+1.30%`.
pub fn format_percent(percent: f64) -> String {
    if percent >= 0.0 {
        format!("+{percent:.2}%")
    } else {
        format!("{percent:.2}%")
    }
}

/// Compact form for volumes and market caps: `28.56M`, `2860.00B`.
pub fn format_number(num: f64) -> String {
    if num >= 1_000_000_000.0 {
        format!("{:.2}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.2}M", num / 1_000_000.0)
    } else {
        group_thousands(&format!("{num:.0}"))
    }
}

pub fn format_shares(shares: f64) -> String {
    if shares.fract() == 0.0 {
        format!("{shares:.0}")
    } else if shares >= 1.0 {
        format!("{shares:.2}")
    } else if shares >= 0.01 {
        format!("{shares:.4}")
    } else {
        format!("{shares:.8}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_usd() {
        assert_eq!(format_currency(12500.75, "USD"), "$12,500.75");
        assert_eq!(format_currency(182.63, "USD"), "$182.63");
        assert_eq!(format_currency(-1.25, "USD"), "-$1.25");
        assert_eq!(format_currency(0.0, "USD"), "$0.00");
    }

    #[test]
    fn test_format_currency_other() {
        assert_eq!(format_currency(1234.5, "EUR"), "1,234.50 €");
        assert_eq!(format_currency(1234567.0, "JPY"), "¥1,234,567");
        assert_eq!(format_currency(10.0, "CHF"), "10.00 CHF");
        assert_eq!(format_currency(f64::NAN, "USD"), "NaN");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(1000.0), "1,000.00");
        assert_eq!(format_with_commas(999.999), "1,000.00");
        assert_eq!(format_with_commas(61542.78), "61,542.78");
        assert_eq!(format_with_commas(12.0), "12.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(1.3), "+1.30%");
        assert_eq!(format_percent(-0.3), "-0.30%");
        assert_eq!(format_percent(0.0), "+0.00%");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(28_563_920.0), "28.56M");
        assert_eq!(format_number(2_860_000_000_000.0), "2860.00B");
        assert_eq!(format_number(164_000.0), "164,000");
    }

    #[test]
    fn test_format_shares() {
        assert_eq!(format_shares(10.0), "10");
        assert_eq!(format_shares(2.5), "2.50");
        assert_eq!(format_shares(0.05), "0.0500");
    }
}
