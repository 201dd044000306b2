use std::sync::Arc;
use tokio::task;
use tracing::warn;

use crate::{
    agent::TextGenerator,
    config::ModelConfig,
    error::AgentError,
    format::{locate, Formatter},
    model::{Answer, PaperAnswer, PaperRecord, StoredPaper},
    prompt::{question_prompt, FUTURE_RESEARCH_PROMPT, SUMMARY_PROMPT}
};

/// Summaries, question answering and research proposals over paper abstracts.
/// Cheap to clone; clones share the generator.
#[derive(Clone)]
pub struct ResearchAssistant {
    generator: Arc<dyn TextGenerator>,
    max_summary_length: u32,
    max_future_research_length: u32,
}

impl ResearchAssistant {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &ModelConfig) -> Self {
        ResearchAssistant {
            generator,
            max_summary_length: config.max_summary_length,
            max_future_research_length: config.max_future_research_length
        }
    }

    pub async fn generate_summary(&self, text: &str) -> Result<String, AgentError> {
        let prompt = format!("{}{}", SUMMARY_PROMPT, text);
        self.generator.generate(&prompt, self.max_summary_length).await
    }

    pub async fn question_answer(&self, context: &str, question: &str) -> Result<Answer, AgentError> {
        let prompt = question_prompt(question, context);
        let reply = self.generator.generate(&prompt, self.max_summary_length).await?;
        let text = reply.trim().to_string();
        Ok(Answer {
            start: locate(context, &text),
            text
        })
    }

    /// Answers `question` against every abstract, one task per paper. Papers
    /// whose answer failed are logged and left out; order is kept.
    pub async fn answer_question(&self, papers: &[PaperRecord], question: &str) -> Vec<PaperAnswer> {
        let handles = papers.iter()
            .map(|paper| {
                let self_clone = self.clone();
                let title = paper.title().to_string();
                let context = paper.abstract_text().to_string();
                let question = question.to_string();
                task::spawn(async move {
                    let answer = self_clone.question_answer(&context, &question).await?;
                    Ok::<_, AgentError>(PaperAnswer {
                        highlighted_context: Formatter::highlight(&context, &answer.text),
                        answer: answer.text,
                        title
                    })
                })
            })
            .collect::<Vec<_>>();

        let mut results: Vec<PaperAnswer> = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(e)) => warn!(error = %e, "agent failed to answer"),
                Err(e) => warn!(error = %e, "answer task panicked or was cancelled"),
            }
        }
        results
    }

    pub async fn propose_future_research(&self, papers: &[StoredPaper]) -> Result<String, AgentError> {
        if papers.is_empty() {
            return Err(AgentError::NoPapers);
        }
        let combined = papers.iter()
            .map(|paper| format!("{} {}", paper.title, paper.abstract_text))
            .collect::<Vec<_>>()
            .join(" ");
        let prompt = format!("{}{}", FUTURE_RESEARCH_PROMPT, combined);
        self.generator.generate(&prompt, self.max_future_research_length).await
    }
}
