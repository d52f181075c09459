//! Generative backend abstraction and its Gemini implementation

use async_trait::async_trait;
use digest_core::GenerationResult;
use tracing::{debug, instrument};

use crate::client::{extract_summarize_args, extract_text, GeminiClient};
use crate::error::GeminiError;
use crate::files::PromptFile;
use crate::prompts::{
    summarize_content_prompt, summarize_file_prompt, summarize_tool, summarize_tool_config,
    summarize_url_prompt, summarize_video_prompt, system_instruction,
};
use crate::types::{Content, GenerateContentRequest, Part, Tool, UrlContext};

/// A model able to translate titles and summarize content.
///
/// Every method picks one credential for the whole call. Errors carry an
/// [`digest_core::ErrorClass`] through [`GeminiError::class`].
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Model name shown in summary footers
    fn model(&self) -> &str;

    /// Secrets that must never appear in listed output
    fn secrets(&self) -> Vec<String> {
        Vec::new()
    }

    /// Summarize fetched text (already wrapped in a `<link>` tag)
    async fn summarize_text(
        &self,
        title: &str,
        content: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError>;

    /// Upload files and summarize them
    async fn summarize_files(
        &self,
        title: &str,
        files: Vec<PromptFile>,
        language: &str,
    ) -> Result<GenerationResult, GeminiError>;

    /// Let the model fetch `url` itself; the title is passed through untouched
    async fn summarize_url(
        &self,
        title: &str,
        url: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError>;

    /// Summarize a video referenced by URL
    async fn summarize_video(
        &self,
        title: &str,
        video_url: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError>;
}

fn structured_request(parts: Vec<Part>) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: Some(Content::system(system_instruction())),
        contents: vec![Content::user(parts)],
        tools: vec![summarize_tool()],
        tool_config: Some(summarize_tool_config()),
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    fn model(&self) -> &str {
        &self.config().model
    }

    fn secrets(&self) -> Vec<String> {
        self.api_keys().to_vec()
    }

    #[instrument(skip(self, content))]
    async fn summarize_text(
        &self,
        title: &str,
        content: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        let api_key = self.rotated_api_key();
        let request = structured_request(vec![Part::text(summarize_content_prompt(
            language, title, content,
        ))]);

        let args = extract_summarize_args(self.generate(api_key, &request).await?)?;
        Ok(GenerationResult::succeeded(args.translated_title, args.summarized_content)
            .with_fallbacks(title))
    }

    #[instrument(skip(self, files), fields(file_count = files.len()))]
    async fn summarize_files(
        &self,
        title: &str,
        files: Vec<PromptFile>,
        language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        let api_key = self.rotated_api_key();
        let uploaded = self.upload_files(api_key, files).await?;

        let mut parts = vec![Part::text(summarize_file_prompt(language, title))];
        parts.extend(
            uploaded
                .iter()
                .map(|file| Part::file(file.uri.clone(), Some(file.mime_type.clone()))),
        );

        let generated = self.generate(api_key, &structured_request(parts)).await;
        self.delete_files(api_key, &uploaded).await;

        let args = extract_summarize_args(generated?)?;
        Ok(GenerationResult::succeeded(args.translated_title, args.summarized_content)
            .with_fallbacks(title))
    }

    #[instrument(skip(self))]
    async fn summarize_url(
        &self,
        title: &str,
        url: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        let api_key = self.rotated_api_key();
        let request = GenerateContentRequest {
            system_instruction: Some(Content::system(system_instruction())),
            contents: vec![Content::user(vec![Part::text(summarize_url_prompt(
                language, url,
            ))])],
            tools: vec![Tool {
                url_context: Some(UrlContext {}),
                ..Default::default()
            }],
            tool_config: None,
        };

        let summary = extract_text(self.generate(api_key, &request).await?)?;
        debug!("Summarized {} with url context ({} chars)", url, summary.len());

        Ok(GenerationResult::succeeded(title, summary).with_fallbacks(title))
    }

    #[instrument(skip(self))]
    async fn summarize_video(
        &self,
        title: &str,
        video_url: &str,
        language: &str,
    ) -> Result<GenerationResult, GeminiError> {
        let api_key = self.rotated_api_key();
        let request = structured_request(vec![
            Part::text(summarize_video_prompt(language, title)),
            Part::file(video_url, None),
        ]);

        let args = extract_summarize_args(self.generate(api_key, &request).await?)?;
        Ok(GenerationResult::succeeded(args.translated_title, args.summarized_content)
            .with_fallbacks(title))
    }
}
