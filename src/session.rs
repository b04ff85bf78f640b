//! Form session: the state behind the generation form.
//!
//! Holds the user's inputs, the loading flag and rotating message while a
//! request is in flight, and the last result or classified error. Only one
//! generation runs at a time; failures never end the session, they are
//! recorded as a message and the form stays usable.

use std::path::{Path, PathBuf};

use crate::config::DefaultsConfig;
use crate::veo::{
    classify_error, detect_mime_type, encode_file, generate_video, is_image_mime, mime_type_for,
    validate_prompt, AspectRatio, GeneratedVideo, GenerationError, GenerationRequest, PollPolicy,
    VideoService,
};

/// A reference image picked by the user. Encoded only at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub path: PathBuf,
    /// MIME type declared by the user, if any.
    pub declared_mime: Option<String>,
}

impl ReferenceImage {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// MIME type sent with the upload. Falls back to png.
    pub fn mime_type(&self) -> String {
        mime_type_for(self.declared_mime.as_deref(), &self.file_name())
    }

    /// The file's own type, `None` when the extension is unknown.
    pub fn detected_mime_type(&self) -> Option<String> {
        detect_mime_type(self.declared_mime.as_deref(), &self.file_name())
    }
}

/// Holds the loading flag up for as long as it lives.
struct LoadingGuard<'a>(&'a mut bool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// State of one generation form.
#[derive(Debug, Clone)]
pub struct Session {
    defaults: DefaultsConfig,
    pub prompt: String,
    pub voice_text: String,
    pub watermark: String,
    pub aspect_ratio: AspectRatio,
    reference_image: Option<ReferenceImage>,
    is_loading: bool,
    loading_message: String,
    result: Option<GeneratedVideo>,
    error: Option<String>,
}

impl Session {
    pub fn new(defaults: DefaultsConfig) -> Self {
        Self {
            prompt: String::new(),
            voice_text: String::new(),
            watermark: defaults.watermark.clone(),
            aspect_ratio: defaults.aspect_ratio,
            reference_image: None,
            is_loading: false,
            loading_message: String::new(),
            result: None,
            error: None,
            defaults,
        }
    }

    pub fn reference_image(&self) -> Option<&ReferenceImage> {
        self.reference_image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn loading_message(&self) -> &str {
        &self.loading_message
    }

    pub fn result(&self) -> Option<&GeneratedVideo> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.defaults.output_dir()
    }

    /// Pick a reference image. Files whose type is not `image/*`, or cannot
    /// be determined, are refused.
    pub fn set_reference_image(
        &mut self,
        path: impl Into<PathBuf>,
        declared_mime: Option<String>,
    ) -> Result<(), String> {
        let image = ReferenceImage {
            path: path.into(),
            declared_mime,
        };
        match image.detected_mime_type() {
            Some(mime) if is_image_mime(&mime) => {}
            Some(mime) => {
                return Err(format!(
                    "'{}' is not an image ({}).",
                    image.path.display(),
                    mime
                ));
            }
            None => {
                return Err(format!(
                    "Cannot tell the type of '{}'. Use a png, jpg or webp file, or give the MIME type.",
                    image.path.display()
                ));
            }
        }
        self.reference_image = Some(image);
        Ok(())
    }

    pub fn clear_reference_image(&mut self) {
        self.reference_image = None;
    }

    /// Whether the generate action is currently available.
    pub fn can_submit(&self) -> bool {
        !self.is_loading && !self.prompt.trim().is_empty()
    }

    /// Assemble the request from the current form values, encoding the
    /// reference image if one is selected.
    pub fn build_request(&self) -> Result<GenerationRequest, GenerationError> {
        validate_prompt(&self.prompt)?;

        let image = match &self.reference_image {
            Some(image) => Some(encode_file(&image.path, image.declared_mime.as_deref())?),
            None => None,
        };

        GenerationRequest::builder(self.prompt.clone())
            .voice_text(Some(self.voice_text.clone()))
            .watermark_text(Some(self.watermark.clone()))
            .reference_image(image)
            .aspect_ratio(self.aspect_ratio)
            .build()
    }

    /// Run a generation with the current form values.
    ///
    /// An empty prompt is refused without contacting the service. Every
    /// other failure is classified, stored as the session error and returned.
    pub async fn generate<S, F>(
        &mut self,
        service: &S,
        policy: &PollPolicy,
        dest_dir: &Path,
        mut on_message: F,
    ) -> Result<GeneratedVideo, String>
    where
        S: VideoService,
        F: FnMut(&str),
    {
        if self.is_loading {
            return Err("A video is already being generated.".to_string());
        }

        if let Err(e) = validate_prompt(&self.prompt) {
            let message = classify_error(&e);
            self.error = Some(message.clone());
            return Err(message);
        }

        self.error = None;
        self.result = None;

        let outcome = match self.build_request() {
            Ok(request) => {
                let _loading = LoadingGuard::start(&mut self.is_loading);
                let loading_message = &mut self.loading_message;
                generate_video(service, &request, policy, dest_dir, |m| {
                    loading_message.clear();
                    loading_message.push_str(m);
                    on_message(m);
                })
                .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(video) => {
                self.result = Some(video.clone());
                Ok(video)
            }
            Err(e) => {
                log::error!("Video generation error: {}", e);
                let message = classify_error(&e);
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Reset every field to its initial value.
    pub fn start_over(&mut self) {
        *self = Session::new(self.defaults.clone());
    }

    /// Human-readable view of the form.
    pub fn summary(&self) -> String {
        let or_none = |s: &str| {
            if s.is_empty() {
                "(none)".to_string()
            } else {
                format!("\"{}\"", s)
            }
        };
        let image = self
            .reference_image
            .as_ref()
            .map(|i| format!("{} ({})", i.path.display(), i.mime_type()))
            .unwrap_or_else(|| "(none)".to_string());

        let mut lines = vec![
            format!("Prompt:       {}", or_none(&self.prompt)),
            format!("Voice:        {}", or_none(&self.voice_text)),
            format!("Watermark:    {}", or_none(&self.watermark)),
            format!("Aspect ratio: {}", self.aspect_ratio),
            format!("Image:        {}", image),
        ];
        if let Some(result) = &self.result {
            lines.push(format!("Video:        {}", result.path.display()));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error:        {}", error));
        }
        lines.join("\n")
    }
}
