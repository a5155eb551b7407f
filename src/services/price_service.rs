use crate::config::Config;
use crate::errors::Result;
use crate::ledger::{Ledger, MergeOutcome};
use crate::models::record::Record;
use crate::scrapers::base::{Extractor, Fetcher};
use crate::scrapers::extractor_for;
use crate::scrapers::http::HttpFetcher;
use crate::services::normalizer;
use crate::util;
use chrono::NaiveDate;
use log::info;

/// 一次运行的终止状态（失败以 `Err` 返回）
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Added(Record),
    SkippedDuplicate(String),
    SkippedWeekend(NaiveDate),
}

/// 行情服务：抓取、解析、规范化，然后写入账本
pub struct PriceService {
    config: Config,
    fetcher: Box<dyn Fetcher + Send + Sync>,
    extractor: Box<dyn Extractor + Send + Sync>,
    ledger: Ledger,
}

impl PriceService {
    pub fn new(
        config: Config,
        fetcher: Box<dyn Fetcher + Send + Sync>,
        extractor: Box<dyn Extractor + Send + Sync>,
    ) -> Self {
        let ledger = Ledger::new(config.ledger_path.clone(), config.schema);
        Self {
            config,
            fetcher,
            extractor,
            ledger,
        }
    }

    /// 使用 HTTP 抓取器和配置指定的抽取策略
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        let extractor = extractor_for(&config);
        Ok(Self::new(config, Box::new(fetcher), extractor))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// 以配置时区的当天日期运行
    pub async fn run(&self) -> Result<RunOutcome> {
        let today = util::today_in(&self.config.timezone);
        self.run_on(today).await
    }

    pub async fn run_on(&self, today: NaiveDate) -> Result<RunOutcome> {
        if self.config.skip_weekends && util::is_weekend(&today) {
            info!("Market closed on {} ({}), skipping weekend", today, self.config.timezone);
            return Ok(RunOutcome::SkippedWeekend(today));
        }

        info!("Fetching data from {}", self.fetcher.source());
        let body = self.fetcher.fetch().await?;

        let raw = self.extractor.extract(&body)?;
        info!(
            "Extracted {} fields for {} using {} strategy",
            raw.fields.len(),
            raw.date,
            self.extractor.name()
        );

        let record = normalizer::normalize(&raw);

        match self.ledger.merge(&record)? {
            MergeOutcome::Inserted => {
                info!("Added record for {} to {}", record.date, self.ledger.path().display());
                Ok(RunOutcome::Added(record))
            }
            MergeOutcome::AlreadyExists => {
                info!("{} already exists, skipping update", record.date);
                Ok(RunOutcome::SkippedDuplicate(record.date))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FetchError, ParseError, PriceLedgerError};
    use crate::scrapers::html::LabelExtractor;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticFetcher {
        body: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        fn source(&self) -> &str {
            "fixture"
        }

        async fn fetch(&self) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or_else(|| FetchError::Status {
                status: 500,
                url: "fixture".to_string(),
            })
        }
    }

    fn page(date: &str) -> String {
        format!(
            "<table><tr><th>Date</th><td>{}</td></tr>\
             <tr><th>Open</th><td>1.23</td></tr>\
             <tr><th>Volume</th><td>1,000</td></tr></table>",
            date
        )
    }

    fn service(dir: &tempfile::TempDir, body: Option<String>) -> (PriceService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = Config::new().with_ledger_path(dir.path().join("prices.txt"));
        let fetcher = StaticFetcher {
            body,
            calls: calls.clone(),
        };
        (
            PriceService::new(config, Box::new(fetcher), Box::new(LabelExtractor::new())),
            calls,
        )
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[tokio::test]
    async fn test_run_adds_then_skips_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let (service, calls) = service(&dir, Some(page("03 Jun 2024")));

        let first = service.run_on(monday()).await.unwrap();
        let content = fs::read_to_string(service.ledger().path()).unwrap();
        let second = service.run_on(monday()).await.unwrap();

        match first {
            RunOutcome::Added(record) => {
                assert_eq!(record.date, "03/06/2024");
                assert_eq!(record.open, "1.230");
                assert_eq!(record.volume, "1000");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(second, RunOutcome::SkippedDuplicate("03/06/2024".to_string()));
        assert_eq!(fs::read_to_string(service.ledger().path()).unwrap(), content);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_weekend_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let (service, calls) = service(&dir, Some(page("31 May 2024")));
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let outcome = service.run_on(saturday).await.unwrap();

        assert_eq!(outcome, RunOutcome::SkippedWeekend(saturday));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!service.ledger().path().exists());
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_ledger_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir, None);

        let err = service.run_on(monday()).await.unwrap_err();

        assert!(matches!(err, PriceLedgerError::Fetch(FetchError::Status { status: 500, .. })));
        assert!(!service.ledger().path().exists());
    }

    #[tokio::test]
    async fn test_parse_error_leaves_ledger_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (service, _) = service(&dir, Some("<html>under maintenance</html>".to_string()));

        let err = service.run_on(monday()).await.unwrap_err();

        assert!(matches!(err, PriceLedgerError::Parse(ParseError::MissingTable)));
        assert!(!service.ledger().path().exists());
    }

    #[tokio::test]
    async fn test_date_without_prices_does_not_claim_the_day() {
        let dir = tempfile::tempdir().unwrap();
        let body = "<table><tbody><tr><td>03 Jun 2024</td></tr></tbody></table>";
        let (service, _) = service(&dir, Some(body.to_string()));

        let err = service.run_on(monday()).await.unwrap_err();

        assert!(matches!(err, PriceLedgerError::Parse(ParseError::NoFields(_))));
        assert!(!service.ledger().path().exists());
    }
}
