//! Prompt shapes used when a query carries retrieved context

use super::LlmRequest;

/// Chat request: context as a system message followed by the user query
pub fn chat_request(query: &str, context: Option<&str>, temperature: Option<f32>) -> LlmRequest {
    let mut builder = LlmRequest::builder();

    if let Some(context) = context {
        builder = builder.system(format!(
            "Use the following context to answer the question:\n\n{}",
            context
        ));
    }

    builder = builder.user(query);

    if let Some(temperature) = temperature {
        builder = builder.temperature(temperature);
    }

    builder.build()
}

/// Single-string prompt for text-in/text-out endpoints
pub fn text_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer:",
            context, query
        ),
        None => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MessageRole;

    #[test]
    fn test_chat_request_without_context() {
        let request = chat_request("What is Python?", None, Some(0.7));

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.temperature, Some(0.7));
    }

    #[test]
    fn test_chat_request_with_context() {
        let request = chat_request("What is Python?", Some("Python is a language."), None);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(
            request.messages[0].content,
            "Use the following context to answer the question:\n\nPython is a language."
        );
        assert_eq!(request.messages[1].content, "What is Python?");
    }

    #[test]
    fn test_text_prompt() {
        assert_eq!(text_prompt("q", None), "q");
        assert_eq!(
            text_prompt("q", Some("ctx")),
            "Context:\nctx\n\nQuestion: q\n\nAnswer:"
        );
    }
}
