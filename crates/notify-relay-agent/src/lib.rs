pub mod client;
pub mod http;
pub mod provider;

pub use client::CompletionClient;
pub use http::HttpCompletionProvider;
pub use provider::{CompletionProvider, CompletionRequest, CompletionResult, ProviderError};
