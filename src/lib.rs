//! Research paper assistant: fetches recent arXiv papers for a topic, keeps
//! them in a paper store and asks a language model about their abstracts.

pub mod agent;
pub mod assistant;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod format;
pub mod model;
pub mod prompt;
pub mod recency;
pub mod storage;

pub use fetcher::{ArxivFetcher, FetchReport};
pub use model::PaperRecord;
