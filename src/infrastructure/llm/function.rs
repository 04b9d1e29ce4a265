use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{CompletionProvider, CompletionRequest, DomainError};

/// Signature every custom function must have: `(query, context) -> text`
pub type CompletionFn = dyn Fn(&str, Option<&str>) -> Result<String, DomainError> + Send + Sync;

/// Completion provider backed by a caller-supplied function
///
/// The function may block; it runs on Tokio's blocking pool.
#[derive(Clone)]
pub struct FunctionProvider {
    function: Arc<CompletionFn>,
}

impl FunctionProvider {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Result<String, DomainError> + Send + Sync + 'static,
    {
        Self {
            function: Arc::new(function),
        }
    }
}

impl fmt::Debug for FunctionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionProvider for FunctionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let function = Arc::clone(&self.function);
        let query = request.query.clone();
        let context = request.context().map(str::to_string);

        tokio::task::spawn_blocking(move || function(&query, context.as_deref()))
            .await
            .map_err(|e| {
                DomainError::internal(format!("Completion function did not finish: {}", e))
            })?
    }
}

/// Offline keyword responder used by the in-memory CLI mode
pub fn keyword_responder(query: &str, context: Option<&str>) -> Result<String, DomainError> {
    let lowered = query.to_lowercase();
    let topic = if lowered.contains("python") {
        "Python is a high-level, general-purpose programming language."
    } else if lowered.contains("rust") {
        "Rust is a systems programming language focused on safety and speed."
    } else if lowered.contains("cache") || lowered.contains("caching") {
        "A cache stores results so repeated requests are served faster."
    } else {
        "I do not have a canned answer for that question."
    };

    Ok(match context {
        Some(context) => format!(
            "{} (grounded in {} characters of retrieved context)",
            topic,
            context.chars().count()
        ),
        None => topic.to_string(),
    })
}
