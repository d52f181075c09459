//! File API: resumable upload, readiness polling and cleanup

use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::client::{check_status, GeminiClient};
use crate::error::GeminiError;
use crate::types::{FileInfo, UploadFileMetadata, UploadFileRequest, UploadFileResponse};

/// File bytes attached to a prompt
#[derive(Debug, Clone)]
pub struct PromptFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PromptFile {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl GeminiClient {
    /// Upload every file and wait until all of them are `ACTIVE`
    pub(crate) async fn upload_files(
        &self,
        api_key: &str,
        files: Vec<PromptFile>,
    ) -> Result<Vec<FileInfo>, GeminiError> {
        let mut uploaded = Vec::with_capacity(files.len());
        for (i, file) in files.into_iter().enumerate() {
            let display_name = format!("file {}", i + 1);
            match self.upload_file(api_key, file, &display_name).await {
                Ok(info) => uploaded.push(info),
                Err(e) => {
                    self.delete_files(api_key, &uploaded).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.wait_for_files_active(api_key, &uploaded).await {
            self.delete_files(api_key, &uploaded).await;
            return Err(e);
        }

        Ok(uploaded)
    }

    async fn upload_file(
        &self,
        api_key: &str,
        file: PromptFile,
        display_name: &str,
    ) -> Result<FileInfo, GeminiError> {
        let base_url = &self.config().base_url;
        let deadline = self.config().generation_timeout;

        let start = self
            .http()
            .post(format!("{}/upload/v1beta/files", base_url))
            .query(&[("key", api_key)])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", file.bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", file.mime_type.as_str())
            .timeout(deadline)
            .json(&UploadFileRequest {
                file: UploadFileMetadata {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let start = check_status(start).await?;
        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                GeminiError::MalformedResponse("upload url missing from response".to_string())
            })?;

        let size = file.bytes.len();
        let response = self
            .http()
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .timeout(deadline)
            .body(file.bytes)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let uploaded: UploadFileResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(GeminiError::from_reqwest)?;

        debug!(
            "Uploaded {} byte(s) of '{}' as {} ({})",
            size, file.mime_type, uploaded.file.name, uploaded.file.state
        );

        Ok(uploaded.file)
    }

    /// Poll all pending files concurrently under one shared deadline
    async fn wait_for_files_active(
        &self,
        api_key: &str,
        files: &[FileInfo],
    ) -> Result<(), GeminiError> {
        let mut pending = JoinSet::new();
        for file in files.iter().filter(|f| !f.is_active()) {
            pending.spawn(poll_until_active(
                self.http().clone(),
                format!("{}/v1beta/{}", self.config().base_url, file.name),
                api_key.to_string(),
                self.config().file_poll_interval,
                self.config().generation_timeout,
            ));
        }

        let deadline = self.config().file_ready_timeout;
        let waited = timeout(deadline, async {
            while let Some(joined) = pending.join_next().await {
                joined.map_err(|e| GeminiError::FileProcessing(e.to_string()))??;
            }
            Ok::<(), GeminiError>(())
        })
        .await;

        match waited {
            Ok(result) => result,
            Err(_) => {
                pending.abort_all();
                Err(GeminiError::Timeout(format!(
                    "uploaded files were not processed within {:?}",
                    deadline
                )))
            }
        }
    }

    /// Best-effort removal of uploaded files
    pub(crate) async fn delete_files(&self, api_key: &str, files: &[FileInfo]) {
        for file in files {
            let url = format!("{}/v1beta/{}", self.config().base_url, file.name);
            let result = match self
                .http()
                .delete(&url)
                .query(&[("key", api_key)])
                .timeout(self.config().generation_timeout)
                .send()
                .await
            {
                Ok(response) => check_status(response).await.map(|_| ()),
                Err(e) => Err(GeminiError::from_reqwest(e)),
            };

            if let Err(e) = result {
                warn!("Failed to delete uploaded file '{}': {}", file.name, e);
            }
        }
    }
}

async fn poll_until_active(
    client: Client,
    url: String,
    api_key: String,
    interval: Duration,
    request_timeout: Duration,
) -> Result<(), GeminiError> {
    loop {
        let response = client
            .get(&url)
            .query(&[("key", api_key.as_str())])
            .timeout(request_timeout)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let info: FileInfo = check_status(response)
            .await?
            .json()
            .await
            .map_err(GeminiError::from_reqwest)?;

        if info.is_active() {
            return Ok(());
        }
        if info.is_failed() {
            return Err(GeminiError::FileProcessing(format!(
                "file '{}' failed to process",
                info.name
            )));
        }

        sleep(interval).await;
    }
}
