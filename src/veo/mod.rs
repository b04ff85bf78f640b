//! Veo video generation integration.
//!
//! Builds a generation request from form input, submits it to the Veo API,
//! polls the long-running operation until it completes, downloads the
//! resulting video and turns failures into user-facing messages.

mod classify;
mod client;
mod error;
mod fetch;
mod generate;
mod image;
mod poller;
mod request;
mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify, classify_error, GENERIC_ERROR_MESSAGE, QUOTA_EXCEEDED_MESSAGE};
pub use client::{
    ApiKey, GenerateVideoResponse, GeneratedSample, Operation, OperationError, OperationResponse,
    VeoClient, VideoRef, VideoService, API_KEY_ENV, API_KEY_FALLBACK_ENV, DEFAULT_MODEL,
    VEO_API_BASE_URL,
};
pub use error::{GenerationError, EMPTY_PROMPT_MESSAGE};
pub use fetch::{authorized_url, extract_video_uri, video_file_name, DOWNLOADING_MESSAGE};
pub use generate::{generate_video, GeneratedVideo};
pub use image::{
    detect_mime_type, encode_bytes, encode_file, is_image_mime, mime_type_for, EncodedImage,
};
pub use poller::{
    poll_until_done, LoadingMessages, PollPolicy, PollState, DEFAULT_POLL_INTERVAL,
    LOADING_MESSAGES,
};
pub use request::{validate_prompt, AspectRatio, GenerationRequest, GenerationRequestBuilder};
pub use retry::{calculate_backoff, Backoff};
