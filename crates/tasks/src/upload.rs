use async_trait::async_trait;
use caiyun_types::{TaskOutcome, UploadConfig, UploadEnvelope, UploadRequest};
use rand::RngCore;
use tracing::{error, info};

use crate::{TaskContext, TaskError, TaskUnit};

/// Format of the `modifyTime` entry in the upload envelope
const MODIFY_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Uploads a freshly generated file of random bytes.
///
/// Unlike the other tasks, success is decided by the HTTP status alone; the
/// upload gateway has no declared status field.
pub struct UploadTask {
    ctx: TaskContext,
    config: UploadConfig,
}

impl UploadTask {
    pub fn new(ctx: TaskContext, config: UploadConfig) -> Self {
        Self { ctx, config }
    }

    fn build_request(&self) -> UploadRequest {
        let payload = random_payload(self.config.size_bytes());
        let modify_time = chrono::Local::now().format(MODIFY_TIME_FORMAT).to_string();
        let envelope = UploadEnvelope::for_payload(
            self.ctx.tokens.account_id(),
            self.config.filename.as_str(),
            self.config.directory_id.as_str(),
            modify_time,
            &payload,
        );
        UploadRequest { envelope, payload }
    }
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut payload);
    payload
}

#[async_trait]
impl TaskUnit for UploadTask {
    fn name(&self) -> &str {
        "upload"
    }

    async fn execute(&self) -> Result<TaskOutcome, TaskError> {
        if !self.config.enabled {
            info!(task = self.name(), "upload disabled, skipping");
            return Ok(TaskOutcome::skipped("upload disabled"));
        }

        let request = self.build_request();
        info!(
            task = self.name(),
            size = request.envelope.content_size,
            directory = %self.config.directory_id,
            "uploading synthetic file"
        );

        let receipt = self.ctx.api.upload(&self.ctx.tokens, &request).await?;
        if !receipt.is_ok() {
            error!(
                task = self.name(),
                status = receipt.status,
                body = %receipt.body,
                "upload failed"
            );
            return Ok(TaskOutcome::rejected(format!(
                "HTTP {}: {}",
                receipt.status, receipt.body
            )));
        }

        info!(task = self.name(), outcome = "success", "file uploaded");
        Ok(TaskOutcome::completed_with(format!(
            "uploaded {} bytes",
            request.envelope.content_size
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caiyun_client::{MockCall, MockCloudApi};
    use caiyun_types::{content_digest, TokenChain};
    use std::sync::Arc;

    fn task_with(api: Arc<MockCloudApi>, config: UploadConfig) -> UploadTask {
        let tokens = Arc::new(TokenChain::new("cred", "13800000000"));
        UploadTask::new(TaskContext::new(api, tokens), config)
    }

    #[tokio::test]
    async fn test_disabled_upload_makes_no_calls() {
        let api = Arc::new(MockCloudApi::new());
        let task = task_with(api.clone(), UploadConfig::disabled());

        let outcome = task.execute().await.unwrap();

        assert_eq!(outcome, TaskOutcome::skipped("upload disabled"));
        assert!(outcome.is_success());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_envelope_digest_matches_payload_sent() {
        let api = Arc::new(MockCloudApi::new());
        let config = UploadConfig::new(true, "dir-1").with_size_mb(1);
        let task = task_with(api.clone(), config);

        assert!(task.execute().await.unwrap().is_success());

        let uploads = api.uploads();
        assert_eq!(uploads.len(), 1);
        let sent = &uploads[0];
        assert_eq!(sent.payload.len(), 1024 * 1024);
        assert_eq!(sent.envelope.content_size, 1024 * 1024);
        assert_eq!(sent.envelope.digest, content_digest(&sent.payload));
        assert_eq!(sent.envelope.parent_catalog_id, "dir-1");
        assert_eq!(sent.envelope.owner_account, "13800000000");
        assert_eq!(sent.envelope.content_name, "7");
        assert_eq!(sent.envelope.modify_time.len(), 14);
    }

    #[tokio::test]
    async fn test_payloads_differ_between_runs() {
        let api = Arc::new(MockCloudApi::new());
        let task = task_with(api.clone(), UploadConfig::new(true, "dir").with_size_mb(1));

        task.execute().await.unwrap();
        task.execute().await.unwrap();

        let uploads = api.uploads();
        assert_ne!(uploads[0].envelope.digest, uploads[1].envelope.digest);
    }

    #[tokio::test]
    async fn test_non_200_status_fails_task() {
        let api = Arc::new(MockCloudApi::new().with_upload_status(502));
        let task = task_with(api.clone(), UploadConfig::new(true, "dir").with_size_mb(1));

        let outcome = task.execute().await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(api.call_count(MockCall::Upload), 1);
    }
}
