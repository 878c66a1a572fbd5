//! Prompt templates
//!
//! Pure functions from `{input text, history}` to a rendered request,
//! parameterized by task kind plus a fixed memory-summary template. The
//! router only consumes the trait; template text is a collaborator concern.

use relay_ai::{ChatRequest, Message};

use crate::task::TaskKind;

/// Prompt rendering collaborator
pub trait PromptSet: Send + Sync {
    /// System template for intent classification
    fn intent_template(&self) -> &str;

    /// System template for a task kind
    fn task_template(&self, kind: TaskKind) -> &str;

    /// System template for memory consolidation
    fn memory_template(&self) -> &str;

    /// Render the intent-classification prompt
    fn intent_prompt(&self, input: &str, history: &[Message]) -> ChatRequest {
        let mut request = ChatRequest::with_system(self.intent_template());
        request.messages = history.to_vec();
        request.push(Message::user(input));
        request
    }

    /// Render a task prompt: history plus the new user input
    fn task_prompt(&self, kind: TaskKind, input: &str, history: &[Message]) -> ChatRequest {
        let mut request = ChatRequest::with_system(self.task_template(kind));
        request.messages = history.to_vec();
        request.push(Message::user(input));
        request
    }

    /// Render the memory-consolidation prompt over the full history
    fn memory_prompt(&self, history: &[Message]) -> ChatRequest {
        let mut request = ChatRequest::with_system(self.memory_template());
        request.messages = history.to_vec();
        request
    }
}

const INTENT_TEMPLATE: &str = "\
You are an intent classifier for a conversational assistant. Read the user's \
latest message in the context of the conversation history and classify its \
intent as one of: qa (a question to answer), summarization (a request to \
summarize material), calculation (a request to compute something), or unknown \
(none of the above). Report a confidence between 0 and 1 and a short \
explanation of your reasoning.";

const QA_TEMPLATE: &str = "\
You are a question-answering assistant. Answer the user's question using the \
conversation history and the available tools. Cite the sources you relied on; \
an answer given with high confidence must name at least one source.";

const SUMMARIZATION_TEMPLATE: &str = "\
You are a summarization assistant. Summarize the material the user refers to, \
using the available tools to retrieve documents when needed. Extract the key \
points and report which document ids you summarized.";

const CALCULATION_TEMPLATE: &str = "\
You are a calculation assistant. Work out the user's calculation, using the \
calculator tool for arithmetic. Report the expression, the numeric result, a \
step-by-step explanation, and units when they apply.";

const MEMORY_TEMPLATE: &str = "\
Review the conversation so far. Produce a concise summary of what has been \
discussed and decided, and list the ids of any documents that are relevant \
to the user's most recent message.";

/// Built-in templates for the three task kinds and the memory step
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl PromptSet for DefaultPrompts {
    fn intent_template(&self) -> &str {
        INTENT_TEMPLATE
    }

    fn task_template(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Qa => QA_TEMPLATE,
            TaskKind::Summarization => SUMMARIZATION_TEMPLATE,
            TaskKind::Calculation => CALCULATION_TEMPLATE,
        }
    }

    fn memory_template(&self) -> &str {
        MEMORY_TEMPLATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_prompt_appends_input_after_history() {
        let history = vec![Message::user("earlier"), Message::assistant_text("reply")];
        let request = DefaultPrompts.task_prompt(TaskKind::Qa, "new question", &history);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[2].text(), "new question");
        assert!(request.system_prompt.is_some());
    }

    #[test]
    fn test_memory_prompt_has_no_new_input() {
        let history = vec![Message::user("q"), Message::assistant_text("a")];
        let request = DefaultPrompts.memory_prompt(&history);
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_templates_nonempty_for_all_kinds() {
        for kind in TaskKind::ALL {
            assert!(!DefaultPrompts.task_template(kind).trim().is_empty());
        }
        assert!(!DefaultPrompts.intent_template().trim().is_empty());
        assert!(!DefaultPrompts.memory_template().trim().is_empty());
    }
}
