// Content Generation Relay.
// All completion calls go through llm_client::CompletionBackend.

pub mod generator;
pub mod handlers;
pub mod prompts;
