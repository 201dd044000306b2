use crate::model::{PaperAnswer, PaperRecord};

// Formatter for fetched papers and answers.
pub struct Formatter;

impl Formatter {
    pub fn to_readme(data: &PaperRecord) -> String {
        format!("### {}\n_{}_<br/>\n{}<br/>\n_Published: {}_, [{}]({})\n\n",
            data.title(),
            data.authors().join(", "),
            data.abstract_text(),
            data.published().format("%Y.%m.%d"),
            data.url(), data.url()
        )
    }

    /// One line of a numbered listing, `position` is 1-based.
    pub fn to_list_item(position: usize, data: &PaperRecord) -> String {
        format!("{}. [{}]({})", position, data.title(), data.url())
    }

    pub fn to_answer(data: &PaperAnswer) -> String {
        format!("### {}\n**Answer:** {}\n\n{}\n", data.title, data.answer, data.highlighted_context)
    }

    /// Wraps the first occurrence of `answer` in `**`. Returns the context
    /// untouched when the answer does not occur in it.
    pub fn highlight(context: &str, answer: &str) -> String {
        match locate(context, answer) {
            Some(start) => {
                let end = start + answer.len();
                format!("{}**{}**{}", &context[..start], &context[start..end], &context[end..])
            }
            None => context.to_string(),
        }
    }
}

/// Byte offset of `answer` inside `context`; empty answers are never found.
pub fn locate(context: &str, answer: &str) -> Option<usize> {
    if answer.is_empty() {
        return None;
    }
    context.find(answer)
}
