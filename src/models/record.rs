use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// 字段的取值类型，决定规范化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Price,
    Integer,
    Percentage,
    Text,
}

/// 除日期外的逻辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    Lacp,
    Change,
    PercentageChange,
    DayRange,
    YearRange,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::Lacp,
        Field::Change,
        Field::PercentageChange,
        Field::DayRange,
        Field::YearRange,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Volume => FieldKind::Integer,
            Field::PercentageChange => FieldKind::Percentage,
            Field::DayRange | Field::YearRange => FieldKind::Text,
            _ => FieldKind::Price,
        }
    }

    /// Column title used in the ledger header
    pub fn column(self) -> &'static str {
        match self {
            Field::Open => "Open",
            Field::High => "High",
            Field::Low => "Low",
            Field::Close => "Close",
            Field::Volume => "Volume",
            Field::Lacp => "LACP",
            Field::Change => "Change",
            Field::PercentageChange => "Percentage Change",
            Field::DayRange => "Day Range",
            Field::YearRange => "Year Range",
        }
    }
}

/// 抽取器的输出：交易日期加上原始字段文本
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub fields: HashMap<Field, String>,
}

impl RawQuote {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: HashMap::new(),
        }
    }

    /// 同一字段只保留第一次出现的值
    pub fn insert_first(&mut self, field: Field, value: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// 规范化后的日线记录，所有字段均为展示格式的字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub lacp: String,
    pub change: String,
    pub percentage_change: String,
    pub day_range: String,
    pub year_range: String,
}

impl Record {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Open => &self.open,
            Field::High => &self.high,
            Field::Low => &self.low,
            Field::Close => &self.close,
            Field::Volume => &self.volume,
            Field::Lacp => &self.lacp,
            Field::Change => &self.change,
            Field::PercentageChange => &self.percentage_change,
            Field::DayRange => &self.day_range,
            Field::YearRange => &self.year_range,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Open => &mut self.open,
            Field::High => &mut self.high,
            Field::Low => &mut self.low,
            Field::Close => &mut self.close,
            Field::Volume => &mut self.volume,
            Field::Lacp => &mut self.lacp,
            Field::Change => &mut self.change,
            Field::PercentageChange => &mut self.percentage_change,
            Field::DayRange => &mut self.day_range,
            Field::YearRange => &mut self.year_range,
        }
    }

    /// 按给定字段顺序组装记录，缺失字段留空
    pub fn from_values<'a>(
        date: &str,
        values: impl IntoIterator<Item = (Field, &'a str)>,
    ) -> Self {
        let mut record = Record {
            date: date.to_string(),
            open: String::new(),
            high: String::new(),
            low: String::new(),
            close: String::new(),
            volume: String::new(),
            lacp: String::new(),
            change: String::new(),
            percentage_change: String::new(),
            day_range: String::new(),
            year_range: String::new(),
        };
        for (field, value) in values {
            *record.value_mut(field) = value.to_string();
        }
        record
    }
}
