use crate::errors::{PriceLedgerError, Result};
use crate::ledger::LedgerSchema;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_URL: &str =
    "https://www.bursamalaysia.com/bm/trade/trading_resources/listing_directory/company-profile?stock_code=0155";
pub const DEFAULT_SYMBOL: &str = "0155";
pub const DEFAULT_LEDGER: &str = "everydayPrice.txt";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kuala_Lumpur";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 数据源格式，决定使用哪种抽取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    HtmlLabel,
    HtmlPosition,
    Json,
}

impl FromStr for SourceFormat {
    type Err = PriceLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "html" | "html-label" | "label" => Ok(SourceFormat::HtmlLabel),
            "html-position" | "position" => Ok(SourceFormat::HtmlPosition),
            "json" => Ok(SourceFormat::Json),
            other => Err(PriceLedgerError::ConfigError(format!(
                "Unknown source format: {}",
                other
            ))),
        }
    }
}

/// 一次运行的全部配置，构造后不再修改
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub symbol: String,
    pub ledger_path: PathBuf,
    pub schema: LedgerSchema,
    pub source_format: SourceFormat,
    pub timezone: Tz,
    pub timeout: Duration,
    pub max_attempts: usize,
    pub retry_delay: Duration,
    pub user_agent: String,
    pub referer: Option<String>,
    pub accept_language: Option<String>,
    pub skip_weekends: bool,
    // HTML 数据表的 CSS 选择器
    pub table_selector: String,
    // JSON 数据源的定位方式
    pub json_rows_pointer: String,
    pub json_symbol_key: String,
    pub json_date_key: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER),
            schema: LedgerSchema::WithLacp,
            source_format: SourceFormat::HtmlLabel,
            timezone: chrono_tz::Asia::Kuala_Lumpur,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: Some("https://www.bursamalaysia.com/".to_string()),
            accept_language: Some("en-US,en;q=0.9".to_string()),
            skip_weekends: true,
            table_selector: "table".to_string(),
            json_rows_pointer: "/data".to_string(),
            json_symbol_key: "stock_code".to_string(),
            json_date_key: "date".to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    pub fn with_schema(mut self, schema: LedgerSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_source_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// 按 IANA 名称设置时区，例如 `Asia/Kuala_Lumpur`
    pub fn with_timezone_name(self, name: &str) -> Result<Self> {
        let tz = name
            .parse::<Tz>()
            .map_err(|e| PriceLedgerError::ConfigError(format!("Invalid time zone {}: {}", name, e)))?;
        Ok(self.with_timezone(tz))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        // 至少请求一次
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_referer(mut self, referer: Option<&str>) -> Self {
        self.referer = referer.map(str::to_string);
        self
    }

    pub fn with_accept_language(mut self, language: Option<&str>) -> Self {
        self.accept_language = language.map(str::to_string);
        self
    }

    pub fn with_skip_weekends(mut self, skip: bool) -> Self {
        self.skip_weekends = skip;
        self
    }

    pub fn with_table_selector(mut self, css: &str) -> Self {
        self.table_selector = css.to_string();
        self
    }

    pub fn with_json_keys(mut self, rows_pointer: &str, symbol_key: &str, date_key: &str) -> Self {
        self.json_rows_pointer = rows_pointer.to_string();
        self.json_symbol_key = symbol_key.to_string();
        self.json_date_key = date_key.to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
