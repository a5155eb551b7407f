use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// 账本中的日期格式
pub const LEDGER_DATE_FORMAT: &str = "%d/%m/%Y";

// 数据源可能出现的日期格式
const SOURCE_DATE_FORMATS: [&str; 7] = [
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%Y%m%d",
    "%b %d, %Y",
];

const DEFAULT_PRICE: &str = "0.000";
const DEFAULT_INTEGER: &str = "0";

// 价格与数量中可以忽略的字符
const NUMBER_ESCAPE_CHARS: &[char] = &[',', ' ', '\u{a0}'];

fn clean_number(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !NUMBER_ESCAPE_CHARS.contains(c))
        .collect()
}

/// 价格格式化为三位小数，括号表示负数，无法解析时返回 `0.000`
pub fn clean_price(value: &str) -> String {
    let cleaned = clean_number(value).replace('(', "-").replace(')', "");
    let cleaned = cleaned.trim_start_matches('+');
    if cleaned.is_empty() {
        return DEFAULT_PRICE.to_string();
    }

    match Decimal::from_str(cleaned) {
        Ok(d) => {
            let mut rounded = d.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
            if rounded.is_zero() {
                rounded = Decimal::ZERO;
            }
            format!("{:.3}", rounded)
        }
        Err(_) => DEFAULT_PRICE.to_string(),
    }
}

/// 成交量等整数字段，无法解析时返回 `0`
pub fn clean_integer(value: &str) -> String {
    clean_number(value)
        .parse::<i64>()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| DEFAULT_INTEGER.to_string())
}

/// Collapses runs of whitespace (including non-breaking spaces) into single spaces.
pub fn squash_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 解析数据源中的日期文本
pub fn parse_source_date(text: &str) -> Option<NaiveDate> {
    let text = squash_whitespace(text);
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_with_known_formats(&text) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    // 形如 "03 Jun 2024 17:00" 的单元格，只取前三段
    let head = text.split(' ').take(3).collect::<Vec<_>>().join(" ");
    if head != text {
        return parse_with_known_formats(&head);
    }

    None
}

fn parse_with_known_formats(text: &str) -> Option<NaiveDate> {
    SOURCE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

pub fn format_ledger_date(date: &NaiveDate) -> String {
    date.format(LEDGER_DATE_FORMAT).to_string()
}

pub fn parse_ledger_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), LEDGER_DATE_FORMAT).ok()
}

pub fn is_weekend(date: &NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// 指定时区的当前日期
pub fn today_in(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_price_defaults() {
        assert_eq!(clean_price(""), "0.000");
        assert_eq!(clean_price("-"), "0.000");
        assert_eq!(clean_price("n/a"), "0.000");
        assert_eq!(clean_price("   "), "0.000");
    }

    #[test]
    fn test_clean_price_formats() {
        assert_eq!(clean_price("(1,234.5)"), "-1234.500");
        assert_eq!(clean_price("1.23"), "1.230");
        assert_eq!(clean_price(" 12,000 "), "12000.000");
        assert_eq!(clean_price("+0.015"), "0.015");
        assert_eq!(clean_price("0.12345"), "0.123");
        assert_eq!(clean_price("0.0005"), "0.001");
        assert_eq!(clean_price("(0.0001)"), "0.000");
    }

    #[test]
    fn test_clean_integer() {
        assert_eq!(clean_integer("1,234,500"), "1234500");
        assert_eq!(clean_integer(""), "0");
        assert_eq!(clean_integer("-"), "0");
        assert_eq!(clean_integer("12.5"), "0");
    }

    #[test]
    fn test_parse_source_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 3);
        assert_eq!(parse_source_date("03 Jun 2024"), expected);
        assert_eq!(parse_source_date("  03   Jun\n2024 "), expected);
        assert_eq!(parse_source_date("3 June 2024"), expected);
        assert_eq!(parse_source_date("03-Jun-2024"), expected);
        assert_eq!(parse_source_date("2024-06-03"), expected);
        assert_eq!(parse_source_date("03/06/2024"), expected);
        assert_eq!(parse_source_date("2024-06-03T17:00:00+08:00"), expected);
        assert_eq!(parse_source_date("03 Jun 2024 17:00"), expected);
        assert_eq!(parse_source_date("yesterday"), None);
        assert_eq!(parse_source_date(""), None);
    }

    #[test]
    fn test_ledger_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(format_ledger_date(&date), "01/06/2024");
        assert_eq!(parse_ledger_date("01/06/2024"), Some(date));
    }

    #[test]
    fn test_is_weekend() {
        // 2024-06-01 是星期六
        assert!(is_weekend(&NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(is_weekend(&NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()));
        assert!(!is_weekend(&NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }
}
