use thiserror::Error;

/// 抓取阶段的错误，网络异常或 HTTP 状态不可接受
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("giving up on {url} after {attempts} attempts, last error: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: usize,
        last_error: String,
    },
}

impl FetchError {
    /// 403 和网络错误视为暂时性失败
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Client(e) => !e.is_builder(),
            FetchError::Status { status, .. } => *status == 403,
            FetchError::RetriesExhausted { .. } => false,
        }
    }
}

/// 页面或数据格式与预期不符，通常意味着上游改版
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no data table found in page")]
    MissingTable,

    #[error("date cell not found")]
    MissingDate,

    #[error("unrecognised date: {0:?}")]
    InvalidDate(String),

    #[error("expected at least {expected} table cells, found {found}")]
    TooFewCells { expected: usize, found: usize },

    #[error("no recognised price fields for {0}")]
    NoFields(String),

    #[error("symbol {0} not present in feed")]
    SymbolNotFound(String),

    #[error("no row array at {0:?}")]
    MissingRows(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid selector {0}")]
    Selector(String),
}

#[derive(Error, Debug)]
pub enum PriceLedgerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Ledger error: {0}")]
    LedgerError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, PriceLedgerError>;
