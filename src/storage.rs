use async_trait::async_trait;
use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf}
};
use tokio::{sync::RwLock, task};
use tracing::debug;

use crate::{
    error::StoreError,
    format::Formatter,
    model::{PaperRecord, StoredPaper}
};

/// Keyed paper store with substring search, the way the graph database is used
/// by the assistant: paper nodes carrying an id, a title and an abstract.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Adds a paper node. An existing node with the same id is replaced in place.
    async fn add_paper(&self, id: &str, title: &str, abstract_text: &str) -> Result<(), StoreError>;

    /// Papers whose title or abstract contains `topic` (case-sensitive),
    /// in insertion order.
    async fn query_papers(&self, topic: &str) -> Result<Vec<StoredPaper>, StoreError>;

    async fn add_record(&self, record: &PaperRecord) -> Result<(), StoreError> {
        let paper = StoredPaper::from(record);
        self.add_paper(&paper.id, &paper.title, &paper.abstract_text).await
    }
}

fn upsert(papers: &mut Vec<StoredPaper>, paper: StoredPaper) {
    match papers.iter_mut().find(|p| p.id == paper.id) {
        Some(existing) => *existing = paper,
        None => papers.push(paper),
    }
}

fn matching(papers: &[StoredPaper], topic: &str) -> Vec<StoredPaper> {
    papers.iter()
        .filter(|p| p.title.contains(topic) || p.abstract_text.contains(topic))
        .cloned()
        .collect()
}

fn node(id: &str, title: &str, abstract_text: &str) -> StoredPaper {
    StoredPaper {
        id: id.to_string(),
        title: title.to_string(),
        abstract_text: abstract_text.to_string()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    papers: RwLock<Vec<StoredPaper>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaperStore for MemoryStore {
    async fn add_paper(&self, id: &str, title: &str, abstract_text: &str) -> Result<(), StoreError> {
        upsert(&mut *self.papers.write().await, node(id, title, abstract_text));
        Ok(())
    }

    async fn query_papers(&self, topic: &str) -> Result<Vec<StoredPaper>, StoreError> {
        Ok(matching(&self.papers.read().await, topic))
    }
}

/// Store persisted as one json object per line. The whole file is loaded on
/// open and rewritten on every add.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    papers: RwLock<Vec<StoredPaper>>,
}

impl JsonlStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let papers = match File::open(&path) {
            Ok(file) => read_jsonl(file)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), papers = papers.len(), "opened paper store");
        Ok(JsonlStore {
            path,
            papers: RwLock::new(papers)
        })
    }
}

// written beside the store, then renamed over it.
fn write_jsonl(path: &Path, papers: &[StoredPaper]) -> Result<(), StoreError> {
    let tmp = path.with_extension("jsonl.tmp");
    let mut writer = BufWriter::new(File::create(&tmp)?);
    papers.iter().try_for_each(|paper| -> Result<(), StoreError> {
        serde_json::to_writer(&mut writer, paper)?;
        writer.write_all(b"\n")?;
        Ok(())
    })?;
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_jsonl(file: File) -> Result<Vec<StoredPaper>, StoreError> {
    let mut papers = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        upsert(&mut papers, serde_json::from_str(&line)?);
    }
    Ok(papers)
}

#[async_trait]
impl PaperStore for JsonlStore {
    async fn add_paper(&self, id: &str, title: &str, abstract_text: &str) -> Result<(), StoreError> {
        // the guard is held across the write so files land in add order.
        let mut papers = self.papers.write().await;
        upsert(&mut papers, node(id, title, abstract_text));
        let path = self.path.clone();
        let snapshot = papers.clone();
        task::spawn_blocking(move || write_jsonl(&path, &snapshot))
            .await
            .map_err(io::Error::other)?
    }

    async fn query_papers(&self, topic: &str) -> Result<Vec<StoredPaper>, StoreError> {
        Ok(matching(&self.papers.read().await, topic))
    }
}

// Utils to store readme files on local device.
pub struct LocalSaver;

impl LocalSaver {
    pub fn save_as_readme(fname: &Path, data: &[PaperRecord]) -> io::Result<()> {
        let mut file = BufWriter::new(File::create(fname)?);
        data.iter().try_for_each(|result| -> io::Result<()> {
            file.write_all(Formatter::to_readme(result).as_bytes())?;
            Ok(())
        })?;
        file.flush()?;
        Ok(())
    }
}
