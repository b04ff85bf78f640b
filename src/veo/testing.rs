//! Scripted `VideoService` used by unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::client::{
    GenerateVideoResponse, GeneratedSample, Operation, OperationResponse, VideoRef, VideoService,
};
use super::error::GenerationError;
use super::request::GenerationRequest;

pub fn pending_operation() -> Operation {
    Operation {
        name: "models/veo-2.0-generate-001/operations/test-op".to_string(),
        ..Default::default()
    }
}

pub fn done_operation(uri: &str) -> Operation {
    Operation {
        name: "models/veo-2.0-generate-001/operations/test-op".to_string(),
        done: true,
        response: Some(OperationResponse {
            generate_video_response: Some(GenerateVideoResponse {
                generated_samples: Some(vec![GeneratedSample {
                    video: Some(VideoRef {
                        uri: Some(uri.to_string()),
                    }),
                }]),
            }),
        }),
        error: None,
    }
}

pub fn done_without_video() -> Operation {
    Operation {
        done: true,
        ..pending_operation()
    }
}

/// Replays queued responses and counts calls.
///
/// An exhausted queue answers with a non-transient error so a runaway loop
/// fails fast instead of hanging the test.
#[derive(Default)]
pub struct ScriptedService {
    submits: Mutex<VecDeque<Result<Operation, GenerationError>>>,
    polls: Mutex<VecDeque<Result<Operation, GenerationError>>>,
    downloads: Mutex<VecDeque<Result<PathBuf, GenerationError>>>,
    submit_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    download_calls: AtomicUsize,
    submitted_prompts: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit(self, result: Result<Operation, GenerationError>) -> Self {
        self.submits.lock().unwrap().push_back(result);
        self
    }

    pub fn with_poll(self, result: Result<Operation, GenerationError>) -> Self {
        self.polls.lock().unwrap().push_back(result);
        self
    }

    pub fn with_download(self, result: Result<PathBuf, GenerationError>) -> Self {
        self.downloads.lock().unwrap().push_back(result);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn submitted_prompts(&self) -> Vec<String> {
        self.submitted_prompts.lock().unwrap().clone()
    }

    fn exhausted(what: &str) -> GenerationError {
        GenerationError::Validation(format!("no scripted {} response", what))
    }
}

impl VideoService for ScriptedService {
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation, GenerationError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_prompts
            .lock()
            .unwrap()
            .push(request.full_prompt());
        let next = self.submits.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(Self::exhausted("submit")))
    }

    async fn poll(&self, _operation: &Operation) -> Result<Operation, GenerationError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.polls.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(Self::exhausted("poll")))
    }

    async fn download(&self, uri: &str, dest_dir: &Path) -> Result<PathBuf, GenerationError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.downloads.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(dest_dir.join(super::fetch::video_file_name(uri))))
    }
}
