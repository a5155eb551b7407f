use crate::errors::ParseError;
use crate::ledger::LedgerSchema;
use crate::models::record::{Field, RawQuote};
use crate::scrapers::base::Extractor;
use crate::util;
use log::debug;
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {:?}", css, e)))
}

fn cell_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_table<'a>(document: &'a Html, table_selector: &str) -> Result<ElementRef<'a>, ParseError> {
    document
        .select(&selector(table_selector)?)
        .next()
        .ok_or(ParseError::MissingTable)
}

/// 根据表头文字识别字段，`key` 需已转为小写。
///
/// 区间和前收盘价先于 open/high/low/close 判断，避免 "Previous Close"
/// 或 "52 Weeks High/Low" 之类的标签被误认。
pub fn match_label(key: &str) -> Option<Field> {
    if key.contains("previous") || key.contains("lacp") {
        Some(Field::Lacp)
    } else if key.contains("day range") {
        Some(Field::DayRange)
    } else if key.contains("52 week") {
        Some(Field::YearRange)
    } else if key.contains("open") {
        Some(Field::Open)
    } else if key.contains("high") {
        Some(Field::High)
    } else if key.contains("low") {
        Some(Field::Low)
    } else if key.contains("close") {
        Some(Field::Close)
    } else if key.contains("volume") {
        Some(Field::Volume)
    } else if key == "change" {
        Some(Field::Change)
    } else if key.contains('%') {
        Some(Field::PercentageChange)
    } else {
        None
    }
}

/// 按 th/td 标签匹配的抽取策略
pub struct LabelExtractor {
    table_selector: String,
}

impl LabelExtractor {
    pub fn new() -> Self {
        Self {
            table_selector: "table".to_string(),
        }
    }

    pub fn with_table_selector(mut self, css: &str) -> Self {
        self.table_selector = css.to_string();
        self
    }
}

impl Default for LabelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for LabelExtractor {
    fn name(&self) -> &'static str {
        "html-label"
    }

    fn extract(&self, body: &str) -> Result<RawQuote, ParseError> {
        let document = Html::parse_document(body);
        let table = first_table(&document, &self.table_selector)?;

        let tr = selector("tr")?;
        let th = selector("th")?;
        let td = selector("td")?;

        let mut date_text = None;
        let mut values = Vec::new();

        for row in table.select(&tr) {
            let (Some(label), Some(value)) = (row.select(&th).next(), row.select(&td).next()) else {
                continue;
            };
            let key = util::squash_whitespace(&cell_text(label)).to_lowercase();
            let value = cell_text(value);

            if key == "date" || key.starts_with("date ") {
                date_text.get_or_insert(value);
            } else if let Some(field) = match_label(&key) {
                values.push((field, value));
            } else {
                debug!("Ignoring row {:?}", key);
            }
        }

        // 没有日期行时取该表第一个数据单元格
        let date_text = match date_text {
            Some(text) => text,
            None => table
                .select(&td)
                .next()
                .map(cell_text)
                .ok_or(ParseError::MissingDate)?,
        };
        let date = util::parse_source_date(&date_text).ok_or(ParseError::InvalidDate(date_text))?;

        // 只有日期没有行情，说明页面结构已变
        if values.is_empty() {
            return Err(ParseError::NoFields(util::format_ledger_date(&date)));
        }

        let mut quote = RawQuote::new(date);
        for (field, value) in values {
            quote.insert_first(field, value);
        }
        Ok(quote)
    }
}

/// 表格列的含义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Value(Field),
    Skip,
}

/// 按单元格顺序取值的抽取策略
pub struct PositionExtractor {
    table_selector: String,
    columns: Vec<Column>,
}

impl PositionExtractor {
    /// 默认列顺序与账本一致
    pub fn new(schema: LedgerSchema) -> Self {
        let mut columns = vec![Column::Date];
        columns.extend(schema.fields().into_iter().map(Column::Value));
        Self {
            table_selector: "table".to_string(),
            columns,
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_table_selector(mut self, css: &str) -> Self {
        self.table_selector = css.to_string();
        self
    }
}

impl Extractor for PositionExtractor {
    fn name(&self) -> &'static str {
        "html-position"
    }

    fn extract(&self, body: &str) -> Result<RawQuote, ParseError> {
        let document = Html::parse_document(body);
        let table = first_table(&document, &self.table_selector)?;

        let cells: Vec<String> = table.select(&selector("td")?).map(cell_text).collect();
        if cells.len() < self.columns.len() {
            return Err(ParseError::TooFewCells {
                expected: self.columns.len(),
                found: cells.len(),
            });
        }

        let date_text = self
            .columns
            .iter()
            .position(|c| *c == Column::Date)
            .map(|i| cells[i].clone())
            .ok_or(ParseError::MissingDate)?;
        let date = util::parse_source_date(&date_text).ok_or(ParseError::InvalidDate(date_text))?;

        let mut quote = RawQuote::new(date);
        for (column, value) in self.columns.iter().zip(cells) {
            if let Column::Value(field) = column {
                quote.insert_first(*field, value);
            }
        }
        Ok(quote)
    }
}
