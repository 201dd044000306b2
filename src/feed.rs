//! Atom feed decoding for the arXiv search API.
//!
//! Decoding is two-staged: a streaming pass walks the `<feed>` document and
//! fails the whole call if it is not well-formed XML, then every `<entry>`
//! span is deserialized on its own so a malformed entry is skipped and
//! reported without losing its neighbours.

use quick_xml::{de::from_str, events::Event, Reader};
use serde::Deserialize;

use crate::{
    error::{EntryError, FetchError},
    model::PaperRecord
};

/// Marker arXiv puts in the id of the entry describing a rejected query.
const API_ERROR_MARKER: &str = "/api/errors";

/// Result of decoding one feed body, before the recency filter.
#[derive(Debug, Default)]
pub struct DecodedFeed {
    /// Well-formed entries in feed order.
    pub records: Vec<PaperRecord>,
    /// Feed position and cause of every dropped entry.
    pub skipped: Vec<(usize, EntryError)>,
}

pub fn decode_feed(xml: &str) -> Result<DecodedFeed, FetchError> {
    let mut reader = Reader::from_str(xml);
    if !open_feed_root(&mut reader)? {
        return Ok(DecodedFeed::default());
    }

    let mut decoded = DecodedFeed::default();
    let mut position = 0;
    loop {
        // children of <feed>; every element is consumed whole, so the next
        // End event closes the root.
        let entry = match reader.read_event()? {
            Event::Start(e) => {
                let span = reader.read_to_end(e.name())?;
                if e.local_name().as_ref() != b"entry" {
                    continue;
                }
                decode_entry(&xml[span.start as usize..span.end as usize])
            }
            Event::Empty(e) if e.local_name().as_ref() == b"entry" => Ok(AtomEntry::default()),
            Event::End(_) => break,
            Event::Eof => return Err(FetchError::Parse("unexpected end of document".to_string())),
            _ => continue,
        };

        if let Some(message) = entry.as_ref().ok().and_then(AtomEntry::upstream_error) {
            return Err(FetchError::Upstream { message });
        }
        match entry.and_then(AtomEntry::into_record) {
            Ok(record) => decoded.records.push(record),
            Err(e) => decoded.skipped.push((position, e)),
        }
        position += 1;
    }
    Ok(decoded)
}

/// Moves the reader past the opening `<feed>` tag. Returns false for an empty
/// `<feed/>`. Any other root, such as an html error page, fails the call.
fn open_feed_root(reader: &mut Reader<&[u8]>) -> Result<bool, FetchError> {
    loop {
        let (e, has_children) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::Eof => return Err(FetchError::Parse("empty document".to_string())),
            _ => continue,
        };
        if e.local_name().as_ref() != b"feed" {
            let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
            return Err(FetchError::Parse(format!("expected <feed> root, found <{}>", name)));
        }
        return Ok(has_children);
    }
}

fn decode_entry(inner: &str) -> Result<AtomEntry, EntryError> {
    from_str(&format!("<entry>{}</entry>", inner))
        .map_err(|e| EntryError::Malformed(e.to_string()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn required(field: Option<String>, name: &'static str) -> Result<String, EntryError> {
    field
        .map(|value| collapse_whitespace(&value))
        .filter(|value| !value.is_empty())
        .ok_or(EntryError::MissingField(name))
}

// Raw Atom model for a single entry. Every field is optional so a missing
// one is reported by name instead of as a decode failure.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomEntry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    #[serde(rename = "author")]
    authors: Vec<AtomAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AtomAuthor {
    name: Option<String>,
}

impl AtomEntry {
    fn upstream_error(&self) -> Option<String> {
        self.id.as_deref()
            .filter(|id| id.contains(API_ERROR_MARKER))
            .map(|_| self.summary.as_deref()
                .map(collapse_whitespace)
                .unwrap_or_else(|| String::from("unknown error")))
    }

    fn into_record(self) -> Result<PaperRecord, EntryError> {
        let title = required(self.title, "title")?;
        let summary = required(self.summary, "summary")?;
        let published = required(self.published, "published")?;
        let url = required(self.id, "id")?;
        let authors = self.authors.into_iter()
            .map(|author| required(author.name, "author/name"))
            .collect::<Result<Vec<_>, _>>()?;

        PaperRecord::new(title, authors, summary, &published, url)
    }
}
