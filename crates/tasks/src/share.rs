use async_trait::async_trait;
use caiyun_types::{Declared, FileEntry, ShareConfig, TaskOutcome};
use tracing::{debug, error, info, warn};

use crate::{TaskContext, TaskError, TaskUnit};

/// Creates a public link for a file in the configured directory.
///
/// The file is the first listing entry whose name contains the configured
/// substring. Run it after [`crate::UploadTask`] when both are enabled, since
/// the file may be the one just uploaded.
pub struct ShareTask {
    ctx: TaskContext,
    config: ShareConfig,
}

/// First entry, in listing order, whose name contains `needle`
pub fn select_target<'a>(items: &'a [FileEntry], needle: &str) -> Option<&'a FileEntry> {
    items.iter().find(|entry| entry.name.contains(needle))
}

impl ShareTask {
    pub fn new(ctx: TaskContext, config: ShareConfig) -> Self {
        Self { ctx, config }
    }

    /// Walk the listing page by page until a match, the last page, or the page limit
    async fn find_target(&self) -> Result<Declared<Option<FileEntry>>, TaskError> {
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.config.max_pages {
            let page = match self
                .ctx
                .api
                .list_files(
                    &self.ctx.tokens,
                    &self.config.directory_id,
                    cursor.as_deref(),
                )
                .await?
            {
                Declared::Accepted(page) => page,
                Declared::Rejected { message } => return Ok(Declared::Rejected { message }),
            };
            debug!(
                task = self.name(),
                page = page_number,
                entries = page.items.len(),
                "listing page"
            );

            if let Some(entry) = select_target(&page.items, &self.config.filename) {
                return Ok(Declared::Accepted(Some(entry.clone())));
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(Declared::Accepted(None))
    }
}

#[async_trait]
impl TaskUnit for ShareTask {
    fn name(&self) -> &str {
        "share"
    }

    async fn execute(&self) -> Result<TaskOutcome, TaskError> {
        if !self.config.enabled {
            info!(task = self.name(), "share disabled, skipping");
            return Ok(TaskOutcome::skipped("share disabled"));
        }

        let target = match self.find_target().await? {
            Declared::Accepted(Some(entry)) => entry,
            Declared::Accepted(None) => {
                warn!(
                    task = self.name(),
                    filename = %self.config.filename,
                    "no target file to share"
                );
                return Ok(TaskOutcome::no_target(format!(
                    "no file name contains {:?}",
                    self.config.filename
                )));
            }
            Declared::Rejected { message } => {
                error!(task = self.name(), reason = %message, "file listing failed");
                return Ok(TaskOutcome::rejected(message));
            }
        };

        info!(task = self.name(), file = %target.name, "creating share link");
        match self
            .ctx
            .api
            .create_share_link(&self.ctx.tokens, &target)
            .await?
        {
            Declared::Accepted(link) => {
                info!(
                    task = self.name(),
                    outcome = "success",
                    url = %link.url,
                    "share link created"
                );
                Ok(TaskOutcome::completed_with(link.url))
            }
            Declared::Rejected { message } => {
                error!(task = self.name(), reason = %message, "share failed");
                Ok(TaskOutcome::rejected(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caiyun_client::{MockCall, MockCloudApi};
    use caiyun_types::{FailureKind, TokenChain};
    use std::sync::Arc;

    fn task_with(api: Arc<MockCloudApi>, config: ShareConfig) -> ShareTask {
        let tokens = Arc::new(TokenChain::new("cred", "acct"));
        ShareTask::new(TaskContext::new(api, tokens), config)
    }

    #[test]
    fn test_select_target_takes_first_match() {
        let items = vec![
            FileEntry::new("F1", "report"),
            FileEntry::new("F2", "target-7"),
            FileEntry::new("F3", "target-8"),
        ];
        assert_eq!(select_target(&items, "target").unwrap().file_id, "F2");
        assert!(select_target(&items, "zzz").is_none());
    }

    #[tokio::test]
    async fn test_shares_matching_file() {
        let api = Arc::new(MockCloudApi::new().with_files(&["report", "target-7"]));
        let task = task_with(api.clone(), ShareConfig::new(true, "dir", "target"));

        let outcome = task.execute().await.unwrap();

        assert_eq!(
            outcome,
            TaskOutcome::completed_with("https://caiyun.example/s/F2")
        );
        assert_eq!(api.call_count(MockCall::ShareLink), 1);
        assert_eq!(api.shared_files(), vec![FileEntry::new("F2", "target-7")]);
    }

    #[tokio::test]
    async fn test_no_match_fails_without_share_call() {
        let api = Arc::new(MockCloudApi::new().with_files(&["report", "target-7"]));
        let task = task_with(api.clone(), ShareConfig::new(true, "dir", "zzz"));

        let outcome = task.execute().await.unwrap();

        assert_eq!(outcome.failure_kind(), Some(FailureKind::NoTarget));
        assert_eq!(api.call_count(MockCall::ShareLink), 0);
    }

    #[tokio::test]
    async fn test_disabled_share_makes_no_calls() {
        let api = Arc::new(MockCloudApi::new().with_files(&["target"]));
        let task = task_with(api.clone(), ShareConfig::disabled());

        assert!(task.execute().await.unwrap().is_success());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_follows_pages_until_match() {
        let api = Arc::new(MockCloudApi::new().with_pages(&[
            &["a", "b"],
            &["c", "target-1"],
            &["target-2"],
        ]));
        let task = task_with(api.clone(), ShareConfig::new(true, "dir", "target"));

        let outcome = task.execute().await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(api.list_cursors(), vec![None, Some("1".to_string())]);
        assert_eq!(api.shared_files()[0].name, "target-1");
    }

    #[tokio::test]
    async fn test_page_limit_bounds_search() {
        let api = Arc::new(MockCloudApi::new().with_pages(&[&["a"], &["b"], &["target"]]));
        let task = task_with(
            api.clone(),
            ShareConfig::new(true, "dir", "target").with_max_pages(2),
        );

        let outcome = task.execute().await.unwrap();

        assert_eq!(outcome.failure_kind(), Some(FailureKind::NoTarget));
        assert_eq!(api.call_count(MockCall::ListFiles), 2);
        assert_eq!(api.call_count(MockCall::ShareLink), 0);
    }

    #[tokio::test]
    async fn test_rejected_listing_is_distinct_from_no_target() {
        let api = Arc::new(MockCloudApi::new().with_list_rejection("catalog not found"));
        let task = task_with(api.clone(), ShareConfig::new(true, "dir", "target"));

        let outcome = task.execute().await.unwrap();

        assert_eq!(outcome, TaskOutcome::rejected("catalog not found"));
        assert_eq!(api.call_count(MockCall::ShareLink), 0);
    }

    #[tokio::test]
    async fn test_rejected_share_reports_reason() {
        let api = Arc::new(
            MockCloudApi::new()
                .with_files(&["target"])
                .with_share_rejection("file under review"),
        );
        let task = task_with(api, ShareConfig::new(true, "dir", "target"));

        let outcome = task.execute().await.unwrap();

        assert_eq!(outcome, TaskOutcome::rejected("file under review"));
    }
}
