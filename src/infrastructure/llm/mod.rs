//! LLM provider implementations

mod factory;
mod function;
mod gemini;
mod http_client;
mod openai;
mod registry;
mod remote;
mod wrapped;

pub use factory::LlmProviderFactory;
pub use function::{keyword_responder, CompletionFn, FunctionProvider};
pub use gemini::GeminiChatModel;
pub use http_client::{attribute_to, HttpClient, HttpClientTrait};
pub use openai::OpenAiChatModel;
pub use registry::{ProviderAnswer, ProviderRegistry};
pub use remote::{extract_text, RemoteEndpointProvider};
pub use wrapped::WrappedChatProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
