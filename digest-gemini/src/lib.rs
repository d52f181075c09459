//! Gemini generative backend
//!
//! This crate provides:
//! - Client: credential rotation, `generateContent` calls and transient-error retry
//! - Backend: the four summarization shapes (text, files, URL context, video)
//! - Files: resumable upload and readiness polling for multimodal prompts
//! - Prompts: system instruction and the `summarize` function declaration

pub mod backend;
pub mod client;
pub mod error;
pub mod files;
pub mod prompts;
pub mod types;

pub use backend::GenerativeBackend;
pub use client::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::GeminiError;
pub use files::PromptFile;
pub use prompts::DEFAULT_LANGUAGE;
