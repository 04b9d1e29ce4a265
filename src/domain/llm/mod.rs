mod chat;
mod completion;
mod message;
pub mod prompt;
mod request;
mod response;

pub use chat::ChatModel;
pub use completion::{CompletionProvider, CompletionRequest, ProviderDescriptor, ProviderKind};
pub use message::{Message, MessageRole};
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{LlmResponse, Usage};

#[cfg(test)]
pub use chat::mock::MockChatModel;
#[cfg(test)]
pub use completion::MockCompletionProvider;
