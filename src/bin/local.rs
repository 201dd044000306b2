use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use aws_sdk_bedrockruntime::Client as BedrockClient;
use clap::Parser;
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tracing_subscriber::EnvFilter;

use research_assistant::{
    agent::{BedrockAgent, OpenAIAgent, TextGenerator},
    assistant::ResearchAssistant,
    config::{AppConfig, ModelBackend, ModelConfig},
    error::FetchError,
    fetcher::ArxivFetcher,
    format::Formatter,
    model::PaperAnswer,
    storage::{JsonlStore, LocalSaver, PaperStore}
};

#[derive(Parser, Debug)]
#[command(name = "research-assistant")]
#[command(about = "Find, store and question recent arXiv papers on a topic")]
struct Cli {
    /// Research topic to search for
    topic: String,

    /// Upper bound on papers requested from arXiv
    #[arg(long)]
    max_results: Option<u32>,

    /// Question to ask about one stored paper
    #[arg(long, requires = "paper")]
    question: Option<String>,

    /// 1-based number of the stored paper the question is about
    #[arg(long)]
    paper: Option<usize>,

    /// Suggest future research directions from the stored papers
    #[arg(long)]
    future_research: bool,

    /// Write the fetched papers as a markdown digest
    #[arg(long)]
    readme: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let fetcher = ArxivFetcher::new(config.arxiv.clone())?;
    let store = JsonlStore::open(&config.store.path)?;

    let fetched = match cli.max_results {
        Some(max_results) => fetcher.fetch_papers(&cli.topic, max_results).await,
        None => fetcher.fetch(&cli.topic).await,
    };
    let fetch_error = match fetched {
        Ok(report) if report.papers.is_empty() => {
            println!("No papers found for this topic.");
            None
        }
        Ok(report) => {
            for (idx, paper) in report.papers.iter().enumerate() {
                println!("{}", Formatter::to_list_item(idx + 1, paper));
                store.add_record(paper).await?;
            }
            if let Some(path) = &cli.readme {
                LocalSaver::save_as_readme(path, &report.papers)?;
            }
            None
        }
        Err(e) => Some(e),
    };

    let uses_store = cli.future_research || cli.question.is_some();
    check_fetch(fetch_error, uses_store)?;
    if !uses_store {
        return Ok(());
    }

    let assistant = ResearchAssistant::new(build_generator(&config.model).await, &config.model);
    let stored = store.query_papers(&cli.topic).await?;

    if let (Some(question), Some(number)) = (&cli.question, cli.paper) {
        match number.checked_sub(1).and_then(|i| stored.get(i)) {
            Some(paper) => {
                let answer = assistant.question_answer(&paper.abstract_text, question).await?;
                let rendered = PaperAnswer {
                    title: paper.title.clone(),
                    highlighted_context: Formatter::highlight(&paper.abstract_text, &answer.text),
                    answer: answer.text
                };
                println!("\n{}", Formatter::to_answer(&rendered));
            }
            None => println!("Invalid paper number or no relevant papers found to answer the question."),
        }
    }

    if cli.future_research {
        let directions = assistant.propose_future_research(&stored).await?;
        println!("\nFuture Research Directions: {}", directions);
    }
    Ok(())
}

/// A failed fetch only ends the run when nothing else is left to do; the
/// question and future research steps can still use earlier stored papers.
fn check_fetch(fetch_error: Option<FetchError>, uses_store: bool) -> Result<(), FetchError> {
    match fetch_error {
        Some(e) if !uses_store => Err(e),
        Some(e) => {
            eprintln!("Error fetching papers: {}", e);
            Ok(())
        }
        None => Ok(()),
    }
}

async fn build_generator(config: &ModelConfig) -> Arc<dyn TextGenerator> {
    match config.backend {
        ModelBackend::OpenAI => {
            let client = OpenAIClient::with_config(OpenAIConfig::new());
            Arc::new(OpenAIAgent::new(client, &config.model_name))
        }
        ModelBackend::Bedrock => {
            let conf = aws_config::load_from_env().await;
            Arc::new(BedrockAgent::new(BedrockClient::new(&conf), &config.model_name))
        }
    }
}
