use async_openai::error::OpenAIError;
use aws_sdk_bedrockruntime::{
    config::http::HttpResponse,
    error::SdkError,
    operation::invoke_model::InvokeModelError
};

/// Failure of a whole `fetch_papers` call. Never produced for an individual
/// bad entry, see [`EntryError`] for those.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Endpoint unreachable, timed out or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search endpoint answered with status {status}")]
    Status { status: u16 },

    /// Body is not a well-formed Atom feed.
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// arXiv reports query errors as an entry inside a 200 response.
    #[error("search endpoint rejected the query: {message}")]
    Upstream { message: String },
}

impl From<quick_xml::DeError> for FetchError {
    fn from(err: quick_xml::DeError) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<quick_xml::Error> for FetchError {
    fn from(err: quick_xml::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Why a single feed entry was dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unparsable published date `{value}`")]
    InvalidDate { value: String },

    /// The entry element is well-formed XML but not a readable Atom entry.
    #[error("malformed entry: {0}")]
    Malformed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),

    #[error("Bedrock error: {0}")]
    Bedrock(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model returned no completion")]
    EmptyCompletion,

    #[error("no papers to work from")]
    NoPapers,
}

impl From<SdkError<InvokeModelError, HttpResponse>> for AgentError {
    fn from(err: SdkError<InvokeModelError, HttpResponse>) -> Self {
        AgentError::Bedrock(format!("{}. Details: {:?}", err, err.raw_response()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store record is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid value `{value}` for {key}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
}

impl ConfigError {
    pub fn new(key: &str, value: &str) -> Self {
        ConfigError {
            key: key.to_string(),
            value: value.to_string()
        }
    }
}
