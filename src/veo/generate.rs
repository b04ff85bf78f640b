//! End-to-end generation: submit, poll, fetch.

use std::path::{Path, PathBuf};

use super::client::VideoService;
use super::error::GenerationError;
use super::fetch::{extract_video_uri, DOWNLOADING_MESSAGE};
use super::poller::{poll_until_done, LoadingMessages, PollPolicy};
use super::request::GenerationRequest;

/// A finished video: the remote asset and the local file it was saved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub uri: String,
    pub path: PathBuf,
}

/// Run one generation to completion.
///
/// Reports the first loading message before submitting, every rotated
/// message while polling, and the download message before fetching.
pub async fn generate_video<S, F>(
    service: &S,
    request: &GenerationRequest,
    policy: &PollPolicy,
    dest_dir: &Path,
    mut on_message: F,
) -> Result<GeneratedVideo, GenerationError>
where
    S: VideoService,
    F: FnMut(&str),
{
    let mut messages = LoadingMessages::new();
    on_message(messages.current());

    let operation = service.submit(request).await?;
    let operation =
        poll_until_done(service, operation, policy, &mut messages, &mut on_message).await?;

    let uri = extract_video_uri(&operation)?;
    on_message(DOWNLOADING_MESSAGE);
    let path = service.download(&uri, dest_dir).await?;

    Ok(GeneratedVideo { uri, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veo::poller::LOADING_MESSAGES;
    use crate::veo::testing::{done_operation, done_without_video, pending_operation, ScriptedService};
    use std::time::Duration;

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::builder("A lion on a beach").build().unwrap()
    }

    #[tokio::test]
    async fn test_generate_video_happy_path() {
        let service = ScriptedService::new()
            .with_submit(Ok(pending_operation()))
            .with_poll(Ok(done_operation("https://files.test/video")));
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();

        let video = generate_video(&service, &request(), &fast_policy(), dir.path(), |m| {
            seen.push(m.to_string())
        })
        .await
        .unwrap();

        assert_eq!(video.uri, "https://files.test/video");
        assert!(video.path.starts_with(dir.path()));
        assert_eq!(
            seen,
            vec![LOADING_MESSAGES[0], LOADING_MESSAGES[1], DOWNLOADING_MESSAGE]
        );
        assert_eq!(service.submit_calls(), 1);
        assert_eq!(service.download_calls(), 1);
    }

    #[tokio::test]
    async fn test_first_message_shown_even_when_submit_fails() {
        let service = ScriptedService::new().with_submit(Err(GenerationError::Request {
            status: 400,
            body: "bad".to_string(),
        }));
        let dir = tempfile::tempdir().unwrap();
        let mut seen = Vec::new();

        let result = generate_video(&service, &request(), &fast_policy(), dir.path(), |m| {
            seen.push(m.to_string())
        })
        .await;

        assert!(matches!(result, Err(GenerationError::Request { status: 400, .. })));
        assert_eq!(seen, vec![LOADING_MESSAGES[0]]);
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_result_skips_download() {
        let service = ScriptedService::new()
            .with_submit(Ok(pending_operation()))
            .with_poll(Ok(done_without_video()));
        let dir = tempfile::tempdir().unwrap();

        let result = generate_video(&service, &request(), &fast_policy(), dir.path(), |_| {}).await;

        assert!(matches!(result, Err(GenerationError::MissingResult)));
        assert_eq!(service.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_completing_immediately_skips_polling() {
        let service = ScriptedService::new().with_submit(Ok(done_operation("https://files.test/v")));
        let dir = tempfile::tempdir().unwrap();

        let video = generate_video(&service, &request(), &fast_policy(), dir.path(), |_| {})
            .await
            .unwrap();

        assert_eq!(video.uri, "https://files.test/v");
        assert_eq!(service.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_download_error_propagates() {
        let service = ScriptedService::new()
            .with_submit(Ok(done_operation("https://files.test/v")))
            .with_download(Err(GenerationError::Download {
                status: 404,
                body: "gone".to_string(),
            }));
        let dir = tempfile::tempdir().unwrap();

        let result = generate_video(&service, &request(), &fast_policy(), dir.path(), |_| {}).await;

        assert!(matches!(result, Err(GenerationError::Download { status: 404, .. })));
    }
}
