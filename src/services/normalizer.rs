use crate::models::record::{Field, FieldKind, RawQuote, Record};
use crate::util;

const MISSING_TEXT: &str = "-";

/// 把抽取到的原始字段转换为账本格式，永不失败
pub fn normalize(raw: &RawQuote) -> Record {
    let date = util::format_ledger_date(&raw.date);
    let values: Vec<(Field, String)> = Field::ALL
        .iter()
        .map(|f| (*f, normalize_value(*f, raw.get(*f))))
        .collect();

    Record::from_values(&date, values.iter().map(|(f, v)| (*f, v.as_str())))
}

/// 单个字段的规范化，缺失或无法解析时使用默认值
pub fn normalize_value(field: Field, raw: Option<&str>) -> String {
    let raw = raw.unwrap_or_default();
    match field.kind() {
        FieldKind::Price => util::clean_price(raw),
        FieldKind::Integer => util::clean_integer(raw),
        // "+1.64 %" -> "+1.64%"
        FieldKind::Percentage => or_missing(raw.split_whitespace().collect()),
        FieldKind::Text => or_missing(util::squash_whitespace(raw)),
    }
}

fn or_missing(value: String) -> String {
    if value.is_empty() {
        MISSING_TEXT.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_full_quote() {
        let mut raw = RawQuote::new(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        raw.insert_first(Field::Open, "1.23");
        raw.insert_first(Field::Volume, "1,523,000");
        raw.insert_first(Field::Change, "(0.01)");
        raw.insert_first(Field::PercentageChange, " -0.80 % ");
        raw.insert_first(Field::DayRange, "1.220\n   - 1.250");

        let record = normalize(&raw);

        assert_eq!(record.date, "03/06/2024");
        assert_eq!(record.open, "1.230");
        assert_eq!(record.volume, "1523000");
        assert_eq!(record.change, "-0.010");
        assert_eq!(record.percentage_change, "-0.80%");
        assert_eq!(record.day_range, "1.220 - 1.250");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let raw = RawQuote::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let record = normalize(&raw);

        assert_eq!(record.date, "01/06/2024");
        assert_eq!(record.high, "0.000");
        assert_eq!(record.lacp, "0.000");
        assert_eq!(record.volume, "0");
        assert_eq!(record.percentage_change, "-");
        assert_eq!(record.year_range, "-");
    }

    #[test]
    fn test_malformed_values_get_defaults() {
        assert_eq!(normalize_value(Field::Close, Some("")), "0.000");
        assert_eq!(normalize_value(Field::Close, Some("-")), "0.000");
        assert_eq!(normalize_value(Field::Close, Some("suspended")), "0.000");
        assert_eq!(normalize_value(Field::Volume, Some("-")), "0");
        assert_eq!(normalize_value(Field::Lacp, Some("(1,234.5)")), "-1234.500");
        assert_eq!(normalize_value(Field::YearRange, Some("   ")), "-");
    }
}
