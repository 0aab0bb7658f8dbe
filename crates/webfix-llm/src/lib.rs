//! Webfix LLM services
//!
//! [`LlmCritic`] and [`LlmGenerator`] implement the pipeline's critique and
//! generation boundaries on top of an OpenAI-compatible chat-completions API.

pub mod client;
pub mod config;
pub mod critic;
pub mod generator;
pub mod parse;

pub use client::LlmClient;
pub use config::LlmConfig;
pub use critic::LlmCritic;
pub use generator::LlmGenerator;
pub use parse::{parse_critique, parse_generated, strip_markdown_fences};
