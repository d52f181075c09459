//! Prompt templates and the `summarize` function declaration

use std::collections::BTreeMap;

use chrono::Local;

use crate::types::{FunctionCallingConfig, FunctionDeclaration, Schema, Tool, ToolConfig};

pub const DEFAULT_LANGUAGE: &str = "English";

/// Name of the function the model must call with its results
pub const SUMMARIZE_FUNCTION_NAME: &str = "summarize";
pub const PARAM_TRANSLATED_TITLE: &str = "translated_title";
pub const PARAM_SUMMARIZED_CONTENT: &str = "summarized_content";

/// System instruction sent with every generation
pub fn system_instruction() -> String {
    format!(
        r#"You are a chat bot for summarizing contents retrieved from web sites or RSS feeds.

Current datetime is {}.

Respond to user messages according to the following principles:
- Do not repeat the user's request.
- Be as accurate as possible.
- Be as truthful as possible.
- Be as comprehensive and informative as possible.
"#,
        Local::now().format("%Y-%m-%d %H:%M:%S (%a) %Z")
    )
}

/// Prompt for fetched text, already wrapped in a `<link>` tag
pub fn summarize_content_prompt(language: &str, title: &str, content: &str) -> String {
    format!(
        r#"Translate the given title into {language} language, and summarize the content of following <link></link> tag in {language} language.

Title: {title}

{content}"#
    )
}

/// Prompt for uploaded file(s)
pub fn summarize_file_prompt(language: &str, title: &str) -> String {
    format!(
        r#"Translate the given title into {language} language, and summarize the content of attached file(s) in {language} language.

Title: {title}"#
    )
}

/// Prompt for a video referenced by URL
pub fn summarize_video_prompt(language: &str, title: &str) -> String {
    format!(
        r#"Translate the given title into {language} language, and summarize the content of attached video in {language} language.

Title: {title}"#
    )
}

/// Prompt for URL-context mode; the model fetches the page itself
pub fn summarize_url_prompt(language: &str, url: &str) -> String {
    format!(
        r#"Summarize the content of following URL in {language} language:

{url}"#
    )
}

/// Tool declaring the `summarize` function with its two required arguments
pub fn summarize_tool() -> Tool {
    let mut properties = BTreeMap::new();
    properties.insert(
        PARAM_TRANSLATED_TITLE.to_string(),
        Schema::string("Translated title"),
    );
    properties.insert(
        PARAM_SUMMARIZED_CONTENT.to_string(),
        Schema::string("Summarized content"),
    );

    Tool {
        function_declarations: Some(vec![FunctionDeclaration {
            name: SUMMARIZE_FUNCTION_NAME.to_string(),
            description: "This function translates the title and summarizes the content of given text or file(s)".to_string(),
            parameters: Schema {
                schema_type: "OBJECT".to_string(),
                description: None,
                properties: Some(properties),
                required: Some(vec![
                    PARAM_TRANSLATED_TITLE.to_string(),
                    PARAM_SUMMARIZED_CONTENT.to_string(),
                ]),
            },
        }]),
        url_context: None,
    }
}

/// Force a call to `summarize` and nothing else
pub fn summarize_tool_config() -> ToolConfig {
    ToolConfig {
        function_calling_config: FunctionCallingConfig {
            mode: "ANY".to_string(),
            allowed_function_names: vec![SUMMARIZE_FUNCTION_NAME.to_string()],
        },
    }
}
