pub mod base;
pub mod html;
pub mod http;
pub mod json;

use crate::config::{Config, SourceFormat};
use base::Extractor;

/// 按数据源格式选择抽取策略
pub fn extractor_for(config: &Config) -> Box<dyn Extractor + Send + Sync> {
    match config.source_format {
        SourceFormat::HtmlLabel => {
            Box::new(html::LabelExtractor::new().with_table_selector(&config.table_selector))
        }
        SourceFormat::HtmlPosition => Box::new(
            html::PositionExtractor::new(config.schema).with_table_selector(&config.table_selector),
        ),
        SourceFormat::Json => Box::new(json::JsonExtractor::new(&config.symbol).with_layout(
            &config.json_rows_pointer,
            &config.json_symbol_key,
            &config.json_date_key,
        )),
    }
}
