mod catalog;
pub mod openai;
mod types;

pub use catalog::{ModelInfo, ProviderKind, OPENAI_CHAT_COMPLETIONS_URL};
pub use types::{combine_prompt, Credential, GenerationRequest};
