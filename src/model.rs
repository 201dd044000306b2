use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::EntryError;

/// Timestamp layout used by the arXiv feed.
pub const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static ARXIV_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/abs/(?P<id>.+?)(?:v\d+)?/?$").expect("static regex")
});

// one record per feed entry, immutable once built.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    title: String,
    authors: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_text: String,
    #[serde(rename = "published_date")]
    published: DateTime<Utc>,
    url: String,
}

impl PaperRecord {
    pub fn new(
        title: String,
        authors: Vec<String>,
        abstract_text: String,
        published_date: &str,
        url: String
    ) -> Result<Self, EntryError> {
        if title.is_empty() {
            return Err(EntryError::MissingField("title"));
        }
        if abstract_text.is_empty() {
            return Err(EntryError::MissingField("summary"));
        }
        if url.is_empty() {
            return Err(EntryError::MissingField("id"));
        }
        let published = parse_published(published_date)?;
        Ok(PaperRecord {
            title,
            authors,
            abstract_text,
            published,
            url
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.published
    }

    /// Publication timestamp in the feed's own layout.
    pub fn published_date(&self) -> String {
        self.published.format(PUBLISHED_FORMAT).to_string()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// arXiv identifier without version suffix, e.g. `2301.07041`.
    /// Falls back to the full url for non-arXiv links.
    pub fn arxiv_id(&self) -> &str {
        ARXIV_ID.captures(&self.url)
            .and_then(|caps| caps.name("id"))
            .map(|m| m.as_str())
            .unwrap_or(&self.url)
    }
}

pub fn parse_published(value: &str) -> Result<DateTime<Utc>, EntryError> {
    NaiveDateTime::parse_from_str(value.trim(), PUBLISHED_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| EntryError::InvalidDate { value: value.to_string() })
}

/// A paper node as kept by a [`crate::storage::PaperStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPaper {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl From<&PaperRecord> for StoredPaper {
    fn from(record: &PaperRecord) -> Self {
        StoredPaper {
            id: record.arxiv_id().to_string(),
            title: record.title().to_string(),
            abstract_text: record.abstract_text().to_string()
        }
    }
}

/// Model answer located inside the context it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    /// Byte offset into the context, `None` when the model paraphrased.
    pub start: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperAnswer {
    pub title: String,
    pub answer: String,
    pub highlighted_context: String,
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn record(url: &str, published: &str) -> Result<PaperRecord, EntryError> {
        PaperRecord::new(
            "A title".to_string(),
            vec!["Ada Lovelace".to_string()],
            "An abstract".to_string(),
            published,
            url.to_string()
        )
    }

    #[test]
    fn test_published_date_round_trips_feed_layout() {
        let paper = record("http://arxiv.org/abs/2301.07041v2", "2023-01-17T18:58:55Z").unwrap();
        assert_eq!(paper.published().year(), 2023);
        assert_eq!(paper.published().hour(), 18);
        assert_eq!(paper.published_date(), "2023-01-17T18:58:55Z");
    }

    #[test]
    fn test_rejects_other_date_layouts() {
        let err = record("http://arxiv.org/abs/2301.07041v2", "2023-01-17").unwrap_err();
        assert_eq!(err, EntryError::InvalidDate { value: "2023-01-17".to_string() });
        assert!(record("http://arxiv.org/abs/2301.07041v2", "2023-01-17T18:58:55+02:00").is_err());
    }

    #[test]
    fn test_empty_fields_are_missing() {
        let err = PaperRecord::new(
            String::new(), vec![], "x".to_string(), "2023-01-17T18:58:55Z", "u".to_string()
        ).unwrap_err();
        assert_eq!(err, EntryError::MissingField("title"));
    }

    #[test]
    fn test_arxiv_id_extraction() {
        let new_style = record("http://arxiv.org/abs/2301.07041v2", "2023-01-17T18:58:55Z").unwrap();
        assert_eq!(new_style.arxiv_id(), "2301.07041");

        let old_style = record("http://arxiv.org/abs/math/0601001v1", "2006-01-01T00:00:00Z").unwrap();
        assert_eq!(old_style.arxiv_id(), "math/0601001");

        let other = record("https://example.org/paper/7", "2023-01-17T18:58:55Z").unwrap();
        assert_eq!(other.arxiv_id(), "https://example.org/paper/7");
    }

    #[test]
    fn test_serializes_with_feed_field_names() {
        let paper = record("http://arxiv.org/abs/2301.07041v2", "2023-01-17T18:58:55Z").unwrap();
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["abstract"], "An abstract");
        assert_eq!(json["published_date"], "2023-01-17T18:58:55Z");
        assert_eq!(json["authors"][0], "Ada Lovelace");
    }
}
