use crate::config::Config;
use crate::errors::{FetchError, PriceLedgerError, Result};
use crate::scrapers::base::Fetcher;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::{Duration, Instant};

/// 通过 HTTP GET 获取页面或接口数据
pub struct HttpFetcher {
    client: Client,
    url: String,
    max_attempts: usize,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// 按配置创建抓取器，设置超时和请求头
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = &config.referer {
            headers.insert(REFERER, header_value(referer)?);
        }
        if let Some(language) = &config.accept_language {
            headers.insert(ACCEPT_LANGUAGE, header_value(language)?);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: config.url.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
        })
    }

    async fn attempt(&self) -> std::result::Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        Ok(response.text().await?)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PriceLedgerError::ConfigError(format!("Invalid header value {:?}: {}", value, e)))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn source(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> std::result::Result<String, FetchError> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let start = Instant::now();
            let result = self.attempt().await;
            let elapsed = start.elapsed().as_millis();

            match result {
                Ok(body) => {
                    info!("Attempt {} GET {} ok, {} bytes in {} ms", attempt, self.url, body.len(), elapsed);
                    return Ok(body);
                }
                Err(e) if e.is_transient() => {
                    warn!("Attempt {} GET {} failed after {} ms: {}", attempt, self.url, elapsed, e);
                    last_error = e.to_string();
                    if attempt < self.max_attempts {
                        debug!("Retrying in {:?}", self.retry_delay);
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            url: self.url.clone(),
            attempts: self.max_attempts,
            last_error,
        })
    }
}
