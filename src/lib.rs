// 公开导出的模块
pub mod models;
pub mod ledger;
pub mod errors;
pub mod config;

// 抓取与解析的内部实现，主程序和测试需要访问
#[doc(hidden)]
pub mod scrapers;
#[doc(hidden)]
pub mod services;
#[doc(hidden)]
pub mod util;

// 重新导出常用类型
pub use config::{Config, SourceFormat};
pub use errors::{FetchError, ParseError, PriceLedgerError, Result};
pub use ledger::{Ledger, LedgerSchema, MergeOutcome};
pub use models::record::{Field, RawQuote, Record};
pub use services::price_service::{PriceService, RunOutcome};
