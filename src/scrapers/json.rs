use crate::errors::ParseError;
use crate::models::record::{Field, RawQuote};
use crate::scrapers::base::Extractor;
use crate::util;
use log::debug;
use serde_json::Value;

/// 按证券代码在 JSON 行数组中查找目标的抽取策略
pub struct JsonExtractor {
    symbol: String,
    rows_pointer: String,
    symbol_key: String,
    date_key: String,
    keys: Vec<(Field, String)>,
}

impl JsonExtractor {
    pub fn new(symbol: &str) -> Self {
        let keys = [
            (Field::Open, "open"),
            (Field::High, "high"),
            (Field::Low, "low"),
            (Field::Close, "close"),
            (Field::Volume, "volume"),
            (Field::Lacp, "lacp"),
            (Field::Change, "change"),
            (Field::PercentageChange, "change_percent"),
            (Field::DayRange, "day_range"),
            (Field::YearRange, "year_range"),
        ];

        Self {
            symbol: symbol.trim().to_string(),
            rows_pointer: "/data".to_string(),
            symbol_key: "stock_code".to_string(),
            date_key: "date".to_string(),
            keys: keys.iter().map(|(f, k)| (*f, k.to_string())).collect(),
        }
    }

    /// `rows_pointer` 为 JSON Pointer，空字符串表示根节点本身
    pub fn with_layout(mut self, rows_pointer: &str, symbol_key: &str, date_key: &str) -> Self {
        self.rows_pointer = rows_pointer.to_string();
        self.symbol_key = symbol_key.to_string();
        self.date_key = date_key.to_string();
        self
    }

    pub fn with_key(mut self, field: Field, key: &str) -> Self {
        match self.keys.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = key.to_string(),
            None => self.keys.push((field, key.to_string())),
        }
        self
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// JSONP 响应形如 callback({...})，只保留括号内的部分
fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(start), Some(end)) if start < end => &trimmed[start + 1..end],
        _ => trimmed,
    }
}

impl Extractor for JsonExtractor {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, body: &str) -> Result<RawQuote, ParseError> {
        let root: Value = serde_json::from_str(strip_jsonp(body))?;

        let rows = if self.rows_pointer.is_empty() {
            Some(&root)
        } else {
            root.pointer(&self.rows_pointer)
        }
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::MissingRows(self.rows_pointer.clone()))?;
        debug!("Scanning {} rows for {}", rows.len(), self.symbol);

        let row = rows
            .iter()
            .find(|row| {
                row.get(&self.symbol_key)
                    .and_then(value_text)
                    .is_some_and(|code| code.trim() == self.symbol)
            })
            .ok_or_else(|| ParseError::SymbolNotFound(self.symbol.clone()))?;

        // 行内没有日期时使用根节点上的日期
        let date_text = row
            .get(&self.date_key)
            .or_else(|| root.get(&self.date_key))
            .and_then(value_text)
            .ok_or(ParseError::MissingDate)?;
        let date = util::parse_source_date(&date_text).ok_or(ParseError::InvalidDate(date_text))?;

        let mut quote = RawQuote::new(date);
        for (field, key) in &self.keys {
            if let Some(value) = row.get(key).and_then(value_text) {
                quote.insert_first(*field, value);
            }
        }

        if quote.fields.is_empty() {
            return Err(ParseError::NoFields(self.symbol.clone()));
        }
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const FEED: &str = r#"{
        "date": "2024-06-03",
        "data": [
            {"stock_code": "5347", "open": "10.100", "close": "10.200"},
            {"stock_code": "0155", "open": "1.23", "high": 1.25, "low": "1.22",
             "close": "1.24", "volume": 152300, "change": "(0.01)",
             "change_percent": "-0.80%", "day_range": "1.220 - 1.250"}
        ]
    }"#;

    #[test]
    fn test_finds_symbol_row() {
        let quote = JsonExtractor::new("0155").extract(FEED).unwrap();

        assert_eq!(quote.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(quote.get(Field::Open), Some("1.23"));
        assert_eq!(quote.get(Field::High), Some("1.25"));
        assert_eq!(quote.get(Field::Volume), Some("152300"));
        assert_eq!(quote.get(Field::Change), Some("(0.01)"));
        assert_eq!(quote.get(Field::YearRange), None);
    }

    #[test]
    fn test_row_date_and_custom_layout() {
        let body = r#"callback([{"code": 155, "d": "03/06/2024", "last": "1.24"}])"#;
        let extractor = JsonExtractor::new("155")
            .with_layout("", "code", "d")
            .with_key(Field::Close, "last");

        let quote = extractor.extract(body).unwrap();

        assert_eq!(quote.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(quote.get(Field::Close), Some("1.24"));
    }

    #[test]
    fn test_missing_symbol() {
        let err = JsonExtractor::new("9999").extract(FEED).unwrap_err();
        assert!(matches!(err, ParseError::SymbolNotFound(ref s) if s == "9999"));
    }

    #[test]
    fn test_missing_rows_and_bad_json() {
        assert!(matches!(
            JsonExtractor::new("0155").extract(r#"{"rows": []}"#),
            Err(ParseError::MissingRows(_))
        ));
        assert!(matches!(
            JsonExtractor::new("0155").extract("<html>blocked</html>"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_symbol_row_without_price_keys() {
        let body = r#"{"date": "2024-06-03", "data": [{"stock_code": "0155", "name": "MGRC"}]}"#;

        let err = JsonExtractor::new("0155").extract(body).unwrap_err();

        assert!(matches!(err, ParseError::NoFields(ref s) if s == "0155"));
    }

    #[test]
    fn test_missing_date() {
        let body = r#"{"data": [{"stock_code": "0155", "close": "1.24"}]}"#;
        assert!(matches!(
            JsonExtractor::new("0155").extract(body),
            Err(ParseError::MissingDate)
        ));
    }
}
