//! Result fetching: pull the video URI out of a finished operation and
//! materialize the asset as a local file.

use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use super::client::{ApiKey, Operation};
use super::error::GenerationError;

/// Status message reported while the finished video is downloaded.
pub const DOWNLOADING_MESSAGE: &str = "Downloading your masterpiece...";

/// Extract the download URI of the first generated sample.
///
/// # Errors
///
/// Returns `GenerationError::Operation` when the operation carries an error
/// object, and `GenerationError::MissingResult` when no URI is present at
/// any level of the response.
pub fn extract_video_uri(operation: &Operation) -> Result<String, GenerationError> {
    if let Some(error) = &operation.error {
        let payload = serde_json::json!({
            "error": {
                "code": error.code,
                "message": error.message,
                "status": error.status,
            }
        });
        return Err(GenerationError::Operation(payload.to_string()));
    }

    operation
        .response
        .as_ref()
        .and_then(|r| r.generate_video_response.as_ref())
        .and_then(|r| r.generated_samples.as_ref())
        .and_then(|samples| samples.first())
        .and_then(|sample| sample.video.as_ref())
        .and_then(|video| video.uri.clone())
        .filter(|uri| !uri.is_empty())
        .ok_or(GenerationError::MissingResult)
}

/// Append the credential to a download URI as the `key` query parameter.
pub fn authorized_url(uri: &str, api_key: &ApiKey) -> Result<url::Url, GenerationError> {
    let mut url = url::Url::parse(uri)?;
    url.query_pairs_mut().append_pair("key", api_key.expose());
    Ok(url)
}

/// Local file name for a downloaded video.
///
/// First 16 bytes of the SHA-256 of the URI, hex encoded, so the same asset
/// always lands on the same path.
pub fn video_file_name(uri: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uri.as_bytes());
    let digest = hasher.finalize();
    format!("{}.mp4", hex::encode(&digest[..16]))
}

/// Send a prepared download request and stream the body into `dest_dir`.
///
/// The request URL carries the credential, so transport errors are stripped
/// of their URL before being returned.
pub async fn download_to_dir(
    request: reqwest::RequestBuilder,
    uri: &str,
    dest_dir: &Path,
) -> Result<PathBuf, GenerationError> {
    tokio::fs::create_dir_all(dest_dir).await?;

    let response = request.send().await.map_err(|e| e.without_url())?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(GenerationError::Download {
            status: status.as_u16(),
            body,
        });
    }

    let dest = dest_dir.join(video_file_name(uri));
    let chunks = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(|e| GenerationError::from(e.without_url())));
    let written = save_stream(chunks, &dest).await?;

    log::info!("Video downloaded to {} ({} bytes)", dest.display(), written);
    Ok(dest)
}

/// Write every chunk of `chunks` to `dest`, returning the byte count.
///
/// A failed chunk or write removes the partial file.
async fn save_stream<S, B>(chunks: S, dest: &Path) -> Result<usize, GenerationError>
where
    S: Stream<Item = Result<B, GenerationError>>,
    B: AsRef<[u8]>,
{
    let mut file = tokio::fs::File::create(dest).await?;
    let mut chunks = std::pin::pin!(chunks);
    let mut written = 0usize;

    let outcome: Result<(), GenerationError> = async {
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            file.write_all(chunk.as_ref()).await?;
            written += chunk.as_ref().len();
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(dest).await {
            log::warn!(
                "Failed to remove partial download {}: {}",
                dest.display(),
                remove_err
            );
        }
        return Err(e);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::veo::client::{
        GenerateVideoResponse, GeneratedSample, OperationError, OperationResponse, VideoRef,
    };

    fn completed_with(samples: Option<Vec<GeneratedSample>>) -> Operation {
        Operation {
            name: "operations/1".to_string(),
            done: true,
            response: Some(OperationResponse {
                generate_video_response: Some(GenerateVideoResponse {
                    generated_samples: samples,
                }),
            }),
            error: None,
        }
    }

    #[test]
    fn test_extract_video_uri_returns_first_sample() {
        let op = completed_with(Some(vec![
            GeneratedSample {
                video: Some(VideoRef {
                    uri: Some("https://files.test/a".to_string()),
                }),
            },
            GeneratedSample {
                video: Some(VideoRef {
                    uri: Some("https://files.test/b".to_string()),
                }),
            },
        ]));
        assert_eq!(extract_video_uri(&op).unwrap(), "https://files.test/a");
    }

    #[test]
    fn test_extract_video_uri_missing_levels() {
        let no_response = Operation {
            name: "op".to_string(),
            done: true,
            ..Default::default()
        };
        assert!(matches!(
            extract_video_uri(&no_response),
            Err(GenerationError::MissingResult)
        ));
        assert!(matches!(
            extract_video_uri(&completed_with(None)),
            Err(GenerationError::MissingResult)
        ));
        assert!(matches!(
            extract_video_uri(&completed_with(Some(vec![]))),
            Err(GenerationError::MissingResult)
        ));
        assert!(matches!(
            extract_video_uri(&completed_with(Some(vec![GeneratedSample { video: None }]))),
            Err(GenerationError::MissingResult)
        ));
    }

    #[test]
    fn test_extract_video_uri_surfaces_operation_error() {
        let op = Operation {
            name: "op".to_string(),
            done: true,
            response: None,
            error: Some(OperationError {
                code: Some(8),
                message: Some("quota".to_string()),
                status: Some("RESOURCE_EXHAUSTED".to_string()),
            }),
        };
        match extract_video_uri(&op) {
            Err(GenerationError::Operation(payload)) => {
                assert!(payload.contains("RESOURCE_EXHAUSTED"));
                assert!(payload.contains("\"message\":\"quota\""));
            }
            other => panic!("expected operation error, got {:?}", other),
        }
    }

    #[test]
    fn test_authorized_url_appends_key() {
        let key = ApiKey::new("k123").unwrap();
        let url = authorized_url("https://files.test/v1/file?alt=media", &key).unwrap();
        assert_eq!(url.as_str(), "https://files.test/v1/file?alt=media&key=k123");

        let url = authorized_url("https://files.test/v1/file", &key).unwrap();
        assert_eq!(url.as_str(), "https://files.test/v1/file?key=k123");
    }

    #[test]
    fn test_authorized_url_rejects_invalid_uri() {
        let key = ApiKey::new("k").unwrap();
        assert!(matches!(
            authorized_url("not a url", &key),
            Err(GenerationError::Url(_))
        ));
    }

    #[test]
    fn test_video_file_name_is_deterministic() {
        let a = video_file_name("https://files.test/a");
        assert_eq!(a, video_file_name("https://files.test/a"));
        assert_ne!(a, video_file_name("https://files.test/b"));
        assert_eq!(a.len(), 32 + ".mp4".len());
        assert!(a.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_save_stream_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let chunks = futures_util::stream::iter(vec![
            Ok::<_, GenerationError>(b"abc".to_vec()),
            Ok(b"def".to_vec()),
        ]);

        let written = save_stream(chunks, &dest).await.unwrap();

        assert_eq!(written, 6);
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_save_stream_removes_partial_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let chunks = futures_util::stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(GenerationError::Timeout),
        ]);

        let result = save_stream(chunks, &dest).await;

        assert!(matches!(result, Err(GenerationError::Timeout)));
        assert!(!dest.exists());
    }
}
