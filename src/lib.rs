//! Side-by-side comparison of streamed chat completions.
//!
//! The core is [`stream::StreamConsumer`]: one cancellable, observable
//! streaming chat-completions attempt. [`app::Comparison`] runs up to three of
//! them on the same prompt.

pub mod app;
pub mod config;
pub mod paths;
pub mod provider;
pub mod render;
pub mod stream;
