use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use research_assistant::{
    config::ArxivConfig,
    fetcher::{ArxivFetcher, FetchReport}
};

#[derive(Debug, Deserialize)]
struct FetchRequest {
    topic: String,
    max_results: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();

    // lambda configuration comes from function env vars, no env file.
    let fetcher = ArxivFetcher::new(ArxivConfig::from_env()?)?;
    let fetcher = &fetcher;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<FetchRequest>| async move {
        func(fetcher, event).await
    })).await?;
    Ok(())
}

async fn func(fetcher: &ArxivFetcher, event: LambdaEvent<FetchRequest>) -> Result<FetchReport, LambdaError> {
    let request = event.payload;
    let max_results = request.max_results.unwrap_or(fetcher.config().max_results);
    Ok(fetcher.fetch_papers(&request.topic, max_results).await?)
}
