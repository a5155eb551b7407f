use price_ledger::config::DEFAULT_LEDGER;
use price_ledger::ledger::{Ledger, LedgerSchema};
use std::error::Error;
use std::fs;
use std::path::Path;

/// 返回要输出的一行文字，只含最新交易日期
fn latest_date_line(path: &Path) -> Result<String, Box<dyn Error>> {
    // 根据表头判断是否带 LACP 列
    let content = fs::read_to_string(path)?;
    let header = content.lines().next().unwrap_or_default();
    let schema = if header.contains("LACP") {
        LedgerSchema::WithLacp
    } else {
        LedgerSchema::WithoutLacp
    };

    let ledger = Ledger::new(path, schema);
    Ok(match ledger.latest_date()? {
        Some(date) => format!("最新交易日期: {}", date.format("%d/%m/%Y")),
        None => "未找到有效的日期".to_string(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_LEDGER.to_string());
    let path = Path::new(&path);
    if !path.exists() {
        return Err(format!("账本文件 {} 不存在，请先运行 price_ledger", path.display()).into());
    }

    println!("{}", latest_date_line(path)?);
    Ok(())
}
