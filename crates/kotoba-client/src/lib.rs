//! Kotoba Prompt Service Client
//!
//! reqwest-based adapter implementing the
//! [`PromptStore`](kotoba::PromptStore) port against the REST prompt
//! service.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kotoba_client::PromptServiceClient;
//!
//! let client = PromptServiceClient::new("https://prompts.example.com", "sk-...");
//! let record = client.get_prompt(prompt_id).await?;
//! ```

mod client;
mod dto;

pub use client::{PromptServiceClient, DEFAULT_BASE_URL};
pub use dto::{PageMeta, VersionPage};
