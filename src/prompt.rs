// prompts are prefixes, the caller appends its text. eg: prompt = SUMMARY_PROMPT + abstract

pub const SYSTEM_PROMPT: &str =
    "You are a research assistant helping a reader explore recent academic papers. \
    Answer precisely and only from the material you are given.";

pub const SUMMARY_PROMPT: &str = "summarize: ";

pub const FUTURE_RESEARCH_PROMPT: &str =
    "Based on the following paper summaries, propose potential future research opportunities: ";

/// Question answering is extractive: the reply should be a span copied from
/// the context so it can be highlighted there.
pub fn question_prompt(question: &str, context: &str) -> String {
    format!(
        "question: {} context: {}\nReply with the shortest exact span of the context that answers the question.",
        question, context
    )
}
