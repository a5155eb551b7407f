use log::{debug, info};

use crate::errors::{PriceLedgerError, Result};
use crate::models::record::{Field, Record};
use crate::util;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const BOM: char = '\u{feff}';

/// 账本列结构，LACP 列可选，但表头与数据行必须一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSchema {
    WithLacp,
    WithoutLacp,
}

impl LedgerSchema {
    /// 日期之后的数据列，按写入顺序
    pub fn fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| *self == LedgerSchema::WithLacp || *f != Field::Lacp)
            .collect()
    }

    pub fn header(&self) -> String {
        let mut columns = vec!["Date"];
        columns.extend(self.fields().into_iter().map(Field::column));
        columns.join(",")
    }

    pub fn row<'a>(&self, record: &'a Record) -> Vec<&'a str> {
        let mut row = vec![record.date.as_str()];
        row.extend(self.fields().into_iter().map(|f| record.value(f)));
        row
    }
}

/// 合并一条记录的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    AlreadyExists,
}

/// 本地 CSV 账本：一行表头，数据行最新的在最前
pub struct Ledger {
    path: PathBuf,
    schema: LedgerSchema,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>, schema: LedgerSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> String {
        self.schema.header()
    }

    /// 账本不存在或为空时写入表头，返回是否新建
    pub fn initialize(&self) -> Result<bool> {
        let empty = match fs::read_to_string(&self.path) {
            Ok(content) => content.trim().is_empty(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        if empty {
            info!("Creating ledger {}", self.path.display());
            self.write_lines(&[self.header()], "\n")?;
        }
        Ok(empty)
    }

    /// 读取全部行，首行必须是当前表头
    pub fn read_lines(&self) -> Result<Vec<String>> {
        self.read_with_terminator().map(|(lines, _)| lines)
    }

    // 同时返回文件原有的换行符，重写时沿用
    fn read_with_terminator(&self) -> Result<(Vec<String>, &'static str)> {
        let content = fs::read_to_string(&self.path)?;
        let terminator = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let lines: Vec<String> = content.lines().map(str::to_string).collect();

        let header = self.header();
        match lines.first() {
            Some(first) if first.trim_start_matches(BOM).trim_end() == header => Ok((lines, terminator)),
            Some(first) => Err(PriceLedgerError::LedgerError(format!(
                "{} starts with {:?}, expected header {:?}",
                self.path.display(),
                first,
                header
            ))),
            None => Err(PriceLedgerError::LedgerError(format!(
                "{} has no header line",
                self.path.display()
            ))),
        }
    }

    /// 数据行中是否已有该日期，只比较第一列
    pub fn contains_date(lines: &[String], date: &str) -> bool {
        lines
            .iter()
            .skip(1)
            .any(|line| line.split(',').next().map(str::trim) == Some(date))
    }

    /// 将一条记录合并进账本。
    ///
    /// 日期已存在时不做任何写入；否则新行插在表头之后，其余行保持原样。
    /// 不按日期重新排序，乱序日期同样插到最前。
    pub fn merge(&self, record: &Record) -> Result<MergeOutcome> {
        self.initialize()?;
        let (mut lines, terminator) = self.read_with_terminator()?;

        if Self::contains_date(&lines, &record.date) {
            debug!("{} already in {}", record.date, self.path.display());
            return Ok(MergeOutcome::AlreadyExists);
        }

        let line = self.serialize(record)?;
        lines.insert(1, line);
        self.write_lines(&lines, terminator)?;

        Ok(MergeOutcome::Inserted)
    }

    /// 以 CSV 规则序列化一行，必要时加引号
    pub fn serialize(&self, record: &Record) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        writer.write_record(self.schema.row(record))?;

        let bytes = writer
            .into_inner()
            .map_err(|e| PriceLedgerError::LedgerError(e.to_string()))?;
        let line = String::from_utf8(bytes)
            .map_err(|e| PriceLedgerError::LedgerError(e.to_string()))?;
        Ok(line.trim_end_matches('\n').to_string())
    }

    /// 读取全部记录，顺序与文件一致
    pub fn records(&self) -> Result<Vec<Record>> {
        let lines = self.read_lines()?;
        let body = lines[1..].join("\n");
        let fields = self.schema.fields();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(body.as_bytes());

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let date = row.get(0).unwrap_or_default();
            let values = fields
                .iter()
                .enumerate()
                .map(|(i, f)| (*f, row.get(i + 1).unwrap_or_default()));
            records.push(Record::from_values(date, values));
        }

        Ok(records)
    }

    /// 账本中最晚的交易日期
    pub fn latest_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .records()?
            .iter()
            .filter_map(|r| util::parse_ledger_date(&r.date))
            .max())
    }

    // 先写临时文件再改名，避免留下写了一半的账本
    fn write_lines(&self, lines: &[String], terminator: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = lines.join(terminator);
        content.push_str(terminator);

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
