use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::ArxivConfig,
    error::{EntryError, FetchError},
    feed::decode_feed,
    model::PaperRecord,
    recency::RecencyWindow
};

/// Papers surviving one fetch, plus what was dropped on the way.
#[derive(Debug, Default, Serialize)]
pub struct FetchReport {
    pub papers: Vec<PaperRecord>,
    /// Feed position of each malformed entry and why it was dropped.
    #[serde(serialize_with = "serialize_skipped")]
    pub skipped: Vec<(usize, EntryError)>,
    /// Entries outside the recency window.
    pub stale: usize,
}

impl FetchReport {
    pub fn into_papers(self) -> Vec<PaperRecord> {
        self.papers
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_skipped<S>(skipped: &Vec<(usize, EntryError)>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(skipped.iter()
        .map(|(position, e)| format!("entry {}: {}", position, e)))
}

/// Search client for the arXiv Atom API. Holds no per-call state, so one
/// instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ArxivFetcher {
    client: Client,
    config: ArxivConfig,
}

impl ArxivFetcher {
    pub fn new(config: ArxivConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(ArxivFetcher {
            client,
            config
        })
    }

    pub fn config(&self) -> &ArxivConfig {
        &self.config
    }

    fn create_query_url(&self, topic: &str, max_results: u32) -> Result<Url, FetchError> {
        let search_query = format!("all:{}", topic);
        let max_results = max_results.to_string();
        Url::parse_with_params(&self.config.endpoint, [
            ("search_query", search_query.as_str()),
            ("start", "0"),
            ("max_results", max_results.as_str()),
        ])
        .map_err(|e| FetchError::InvalidRequest(format!("bad endpoint {}: {}", self.config.endpoint, e)))
    }

    async fn get_raw_xml(&self, url: Url) -> Result<String, FetchError> {
        debug!(%url, "querying search endpoint");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "search endpoint returned failure status");
            return Err(FetchError::Status { status: status.as_u16() });
        }
        Ok(response.text().await?)
    }

    /// Fetches with the configured result bound.
    pub async fn fetch(&self, topic: &str) -> Result<FetchReport, FetchError> {
        self.fetch_papers(topic, self.config.max_results).await
    }

    pub async fn fetch_papers(&self, topic: &str, max_results: u32) -> Result<FetchReport, FetchError> {
        self.fetch_papers_at(topic, max_results, None).await
    }

    /// `now` pins the recency window; `None` means the current time.
    pub async fn fetch_papers_at(
        &self,
        topic: &str,
        max_results: u32,
        now: Option<DateTime<Utc>>
    ) -> Result<FetchReport, FetchError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(FetchError::InvalidRequest(String::from("topic must not be empty")));
        }
        if max_results == 0 {
            return Err(FetchError::InvalidRequest(String::from("max_results must be positive")));
        }

        let url = self.create_query_url(topic, max_results)?;
        let xml = self.get_raw_xml(url).await?;
        let window = RecencyWindow::new(
            now.unwrap_or_else(Utc::now),
            self.config.recency_years,
            self.config.recency_rule
        );
        let report = filter_feed(&xml, max_results, &window)?;

        for (position, e) in &report.skipped {
            warn!(position, error = %e, "skipping malformed feed entry");
        }
        info!(
            topic,
            papers = report.papers.len(),
            skipped = report.skipped.len(),
            stale = report.stale,
            "fetched papers"
        );
        Ok(report)
    }
}

/// Decode, bound and recency-filter one response body. Order is kept.
pub fn filter_feed(xml: &str, max_results: u32, window: &RecencyWindow) -> Result<FetchReport, FetchError> {
    let decoded = decode_feed(xml)?;
    let mut report = FetchReport {
        skipped: decoded.skipped,
        ..FetchReport::default()
    };
    for record in decoded.records.into_iter().take(max_results as usize) {
        if window.contains(&record.published()) {
            report.papers.push(record);
        } else {
            report.stale += 1;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::recency::RecencyRule;

    use super::*;

    fn entry(id: &str, published: &str) -> String {
        format!(concat!(
            "<entry><id>http://arxiv.org/abs/{}v1</id><published>{}</published>",
            "<title>Paper {}</title><summary>About {}</summary>",
            "<author><name>Someone</name></author></entry>"),
            id, published, id, id)
    }

    fn feed(entries: &[String]) -> String {
        format!("<feed xmlns=\"http://www.w3.org/2005/Atom\">{}</feed>", entries.concat())
    }

    fn window() -> RecencyWindow {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        RecencyWindow::new(now, 5, RecencyRule::Elapsed)
    }

    #[test]
    fn test_url_generation() {
        let fetcher = ArxivFetcher::new(ArxivConfig::default()).unwrap();
        let url = fetcher.create_query_url("graph neural networks", 7).unwrap();
        assert_eq!(
            url.as_str(),
            "https://export.arxiv.org/api/query?search_query=all%3Agraph+neural+networks&start=0&max_results=7",
            "URL improperly formatted"
        );
    }

    #[test]
    fn test_bad_endpoint_is_invalid_request() {
        let fetcher = ArxivFetcher::new(ArxivConfig::with_endpoint("not a url")).unwrap();
        assert!(matches!(
            fetcher.create_query_url("graphs", 5),
            Err(FetchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_filter_keeps_window_in_order() {
        let xml = feed(&[
            entry("2401.00001", "2024-01-01T00:00:00Z"),
            entry("1901.00002", "2019-01-01T00:00:00Z"),
            entry("2501.00003", "2025-01-01T00:00:00Z"),
            entry("1801.00004", "2018-01-01T00:00:00Z"),
            entry("2001.00005", "2020-01-01T00:00:00Z"),
        ]);
        let report = filter_feed(&xml, 10, &window()).unwrap();
        let ids = report.papers.iter().map(|p| p.arxiv_id()).collect::<Vec<_>>();
        assert_eq!(ids, ["2401.00001", "2501.00003"]);
        assert_eq!(report.stale, 3);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_filter_boundary_day() {
        let xml = feed(&[
            entry("2110.00001", "2021-10-15T00:00:00Z"),
            entry("2110.00002", "2021-10-14T23:59:59Z"),
        ]);
        let report = filter_feed(&xml, 10, &window()).unwrap();
        assert_eq!(report.papers.len(), 1);
        assert_eq!(report.papers[0].arxiv_id(), "2110.00001");
    }

    #[test]
    fn test_filter_never_exceeds_bound() {
        let entries = (0..6)
            .map(|i| entry(&format!("2501.0000{}", i), "2025-01-01T00:00:00Z"))
            .collect::<Vec<_>>();
        let report = filter_feed(&feed(&entries), 4, &window()).unwrap();
        assert_eq!(report.papers.len(), 4);
        assert_eq!(report.papers[3].arxiv_id(), "2501.00003");
    }

    #[test]
    fn test_report_serializes_skips_as_text() {
        let xml = feed(&[
            "<entry><id>http://arxiv.org/abs/1</id></entry>".to_string(),
            entry("2501.00001", "2025-01-01T00:00:00Z"),
        ]);
        let report = filter_feed(&xml, 10, &window()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"][0], "entry 0: missing field `title`");
        assert_eq!(json["papers"].as_array().map(Vec::len), Some(1));
    }
}
