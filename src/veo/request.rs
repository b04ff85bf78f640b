//! Generation request assembly.
//!
//! The voice-over and watermark inputs are not separate API fields; they are
//! folded into the prompt as natural-language instructions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{GenerationError, EMPTY_PROMPT_MESSAGE};
use super::image::EncodedImage;

/// Output frame shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(format!(
                "Unknown aspect ratio '{}'. Supported: 16:9, 9:16",
                other
            )),
        }
    }
}

/// Reject empty or whitespace-only prompts before anything is sent.
pub fn validate_prompt(prompt: &str) -> Result<(), GenerationError> {
    if prompt.trim().is_empty() {
        return Err(GenerationError::Validation(EMPTY_PROMPT_MESSAGE.to_string()));
    }
    Ok(())
}

/// Escape user text so it stays inside a double-quoted span.
fn quote_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' | '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Clause instructing the subject to speak the given text.
pub fn voice_clause(voice_text: &str) -> String {
    format!(
        " The subject should say the following with synchronized lip movement: \"{}\"",
        quote_safe(voice_text)
    )
}

/// Clause instructing a bottom-right watermark with the given text.
pub fn watermark_clause(watermark: &str) -> String {
    format!(
        " A watermark with the text \"{}\" should be added to the bottom right corner of the video.",
        quote_safe(watermark)
    )
}

/// A fully-formed generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    voice_text: Option<String>,
    watermark_text: Option<String>,
    reference_image: Option<EncodedImage>,
    aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            prompt: prompt.into(),
            voice_text: None,
            watermark_text: None,
            reference_image: None,
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn voice_text(&self) -> Option<&str> {
        self.voice_text.as_deref()
    }

    pub fn watermark_text(&self) -> Option<&str> {
        self.watermark_text.as_deref()
    }

    pub fn reference_image(&self) -> Option<&EncodedImage> {
        self.reference_image.as_ref()
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// The prompt actually sent: raw prompt, then the voice clause, then the
    /// watermark clause.
    pub fn full_prompt(&self) -> String {
        let mut full = self.prompt.clone();
        if let Some(voice) = &self.voice_text {
            full.push_str(&voice_clause(voice));
        }
        if let Some(watermark) = &self.watermark_text {
            full.push_str(&watermark_clause(watermark));
        }
        full
    }
}

/// Builder for [`GenerationRequest`]. Empty optional strings count as absent.
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    prompt: String,
    voice_text: Option<String>,
    watermark_text: Option<String>,
    reference_image: Option<EncodedImage>,
    aspect_ratio: AspectRatio,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

impl GenerationRequestBuilder {
    pub fn voice_text(mut self, voice: Option<String>) -> Self {
        self.voice_text = non_empty(voice);
        self
    }

    pub fn watermark_text(mut self, watermark: Option<String>) -> Self {
        self.watermark_text = non_empty(watermark);
        self
    }

    pub fn reference_image(mut self, image: Option<EncodedImage>) -> Self {
        self.reference_image = image;
        self
    }

    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Validate the prompt and produce the request.
    pub fn build(self) -> Result<GenerationRequest, GenerationError> {
        validate_prompt(&self.prompt)?;
        Ok(GenerationRequest {
            prompt: self.prompt,
            voice_text: self.voice_text,
            watermark_text: self.watermark_text,
            reference_image: self.reference_image,
            aspect_ratio: self.aspect_ratio,
        })
    }
}
