//! Input Collector - Per-Mode Values, One Active Submission
//!
//! The collector remembers every mode's value. Only the active mode's
//! value is placed in the request it hands out.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::profiles::ProfileId;

/// Maximum length of literal text, in characters.
pub const MAX_LITERAL_CHARS: usize = 20;

/// Extensions the upload boundary accepts (lowercase, no dot).
pub const ACCEPTED_UPLOAD_EXTENSIONS: [&str; 7] = ["svg", "png", "jpg", "jpeg", "ai", "eps", "pdf"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Unsupported upload type: {0} (expected one of svg, png, jpg, jpeg, ai, eps, pdf)")]
    UnsupportedUpload(String),

    #[error("Upload has no file name")]
    MissingFileName,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Prompt,
    Text,
    Upload,
}

/// Reference to a user-selected file. Content is never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRef {
    pub name: String,
    pub size: u64,
}

impl UploadRef {
    pub fn new(name: impl Into<String>, size: u64) -> Result<Self, InputError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InputError::MissingFileName);
        }

        let extension = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ACCEPTED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
            return Err(InputError::UnsupportedUpload(name));
        }

        Ok(Self { name, size })
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub mode: InputMode,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_literal")]
    pub literal_text: Option<String>,
    #[serde(default)]
    pub upload: Option<UploadRef>,
    pub profile: ProfileId,
}

/// Requests read from JSON get the same cap as typed input.
fn deserialize_literal<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|t| truncate_literal(&t)))
}

impl GenerationRequest {
    pub fn prompt(text: impl Into<String>, profile: ProfileId) -> Self {
        Self {
            mode: InputMode::Prompt,
            prompt_text: Some(text.into()),
            literal_text: None,
            upload: None,
            profile,
        }
    }

    pub fn text(text: &str, profile: ProfileId) -> Self {
        Self {
            mode: InputMode::Text,
            prompt_text: None,
            literal_text: Some(truncate_literal(text)),
            upload: None,
            profile,
        }
    }

    pub fn upload(upload: UploadRef, profile: ProfileId) -> Self {
        Self {
            mode: InputMode::Upload,
            prompt_text: None,
            literal_text: None,
            upload: Some(upload),
            profile,
        }
    }

    /// Text that ends up on the artifact's label.
    ///
    /// Prompt mode yields an empty string so the synthesizer default applies.
    pub fn label_text(&self) -> String {
        match self.mode {
            InputMode::Text => self.literal_text.clone().unwrap_or_default(),
            InputMode::Upload => self
                .upload
                .as_ref()
                .map(|u| truncate_literal(u.stem()))
                .unwrap_or_default(),
            InputMode::Prompt => String::new(),
        }
    }
}

/// True iff at least one of the three input fields is non-empty after trimming.
pub fn can_submit(request: &GenerationRequest) -> bool {
    let filled = |s: &Option<String>| s.as_deref().map_or(false, |v| !v.trim().is_empty());

    filled(&request.prompt_text)
        || filled(&request.literal_text)
        || request.upload.as_ref().map_or(false, |u| !u.name.trim().is_empty())
}

fn truncate_literal(text: &str) -> String {
    text.chars().take(MAX_LITERAL_CHARS).collect()
}

/// Holds the values of every input mode plus the selected profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputCollector {
    mode: InputMode,
    prompt_text: String,
    literal_text: String,
    upload: Option<UploadRef>,
    profile: Option<ProfileId>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Selected profile; laser until the user picks one.
    pub fn profile(&self) -> ProfileId {
        self.profile.unwrap_or(ProfileId::FALLBACK)
    }

    pub fn set_profile(&mut self, profile: ProfileId) {
        self.profile = Some(profile);
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt_text = text.into();
    }

    pub fn literal_text(&self) -> &str {
        &self.literal_text
    }

    /// Records at most MAX_LITERAL_CHARS characters; the rest is dropped silently.
    pub fn set_literal_text(&mut self, text: &str) {
        self.literal_text = truncate_literal(text);
    }

    pub fn upload(&self) -> Option<&UploadRef> {
        self.upload.as_ref()
    }

    pub fn select_upload(&mut self, name: impl Into<String>, size: u64) -> Result<&UploadRef, InputError> {
        let upload = UploadRef::new(name, size)?;
        tracing::debug!(file = %upload.name, size = upload.size, "upload selected");
        Ok(&*self.upload.insert(upload))
    }

    pub fn clear_upload(&mut self) {
        self.upload = None;
    }

    /// Turn the selected upload into a prompt and switch to prompt mode.
    ///
    /// Returns false when nothing is uploaded.
    pub fn upload_to_prompt(&mut self) -> bool {
        let Some(upload) = &self.upload else {
            return false;
        };
        self.prompt_text = format!("Make a fabrication-ready file from {}", upload.name);
        self.mode = InputMode::Prompt;
        true
    }

    /// Request carrying only the active mode's value.
    pub fn request(&self) -> GenerationRequest {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        GenerationRequest {
            mode: self.mode,
            prompt_text: match self.mode {
                InputMode::Prompt => non_empty(&self.prompt_text),
                _ => None,
            },
            literal_text: match self.mode {
                InputMode::Text => non_empty(&self.literal_text),
                _ => None,
            },
            upload: match self.mode {
                InputMode::Upload => self.upload.clone(),
                _ => None,
            },
            profile: self.profile(),
        }
    }

    pub fn can_submit(&self) -> bool {
        can_submit(&self.request())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector_cannot_submit() {
        let collector = InputCollector::new();
        assert!(!collector.can_submit());
    }

    #[test]
    fn test_whitespace_only_cannot_submit() {
        let mut collector = InputCollector::new();
        collector.set_prompt("   \t ");
        assert!(!collector.can_submit());
        collector.set_prompt(" a wall mount ");
        assert!(collector.can_submit());
    }

    #[test]
    fn test_literal_text_truncated_at_input() {
        let mut collector = InputCollector::new();
        let twenty = "ABCDEFGHIJKLMNOPQRST";
        collector.set_literal_text(twenty);
        assert_eq!(collector.literal_text(), twenty);

        collector.set_literal_text("ABCDEFGHIJKLMNOPQRSTU");
        assert_eq!(collector.literal_text(), twenty);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let mut collector = InputCollector::new();
        collector.set_literal_text(&"é".repeat(25));
        assert_eq!(collector.literal_text().chars().count(), MAX_LITERAL_CHARS);
    }

    #[test]
    fn test_deserialized_request_is_capped() {
        let json = r#"{"mode":"text","literal_text":"ABCDEFGHIJKLMNOPQRSTUVWXY","profile":"laser"}"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.literal_text.as_deref(), Some("ABCDEFGHIJKLMNOPQRST"));

        let json = r#"{"mode":"prompt","prompt_text":"a coaster","profile":"mill"}"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert!(request.literal_text.is_none());
    }

    #[test]
    fn test_mode_switch_keeps_values() {
        let mut collector = InputCollector::new();
        collector.set_prompt("a coaster");
        collector.set_mode(InputMode::Text);
        collector.set_literal_text("AVA");
        collector.set_mode(InputMode::Prompt);

        assert_eq!(collector.prompt_text(), "a coaster");
        assert_eq!(collector.literal_text(), "AVA");

        let request = collector.request();
        assert_eq!(request.prompt_text.as_deref(), Some("a coaster"));
        assert!(request.literal_text.is_none());
    }

    #[test]
    fn test_only_active_mode_is_submitted() {
        let mut collector = InputCollector::new();
        collector.set_prompt("something");
        collector.set_mode(InputMode::Text);
        assert!(!collector.can_submit());
    }

    #[test]
    fn test_upload_extension_checked() {
        assert!(UploadRef::new("logo.SVG", 10).is_ok());
        assert!(UploadRef::new("photo.jpeg", 10).is_ok());
        assert_eq!(
            UploadRef::new("model.stl", 10),
            Err(InputError::UnsupportedUpload("model.stl".into()))
        );
        assert_eq!(UploadRef::new("  ", 0), Err(InputError::MissingFileName));
        assert!(UploadRef::new("noext", 1).is_err());
    }

    #[test]
    fn test_upload_label_uses_stem() {
        let upload = UploadRef::new("family-crest.png", 2048).unwrap();
        let request = GenerationRequest::upload(upload, ProfileId::Vinyl);
        assert!(can_submit(&request));
        assert_eq!(request.label_text(), "family-crest");
    }

    #[test]
    fn test_upload_to_prompt() {
        let mut collector = InputCollector::new();
        collector.set_mode(InputMode::Upload);
        assert!(!collector.upload_to_prompt());

        collector.select_upload("crest.svg", 512).unwrap();
        assert!(collector.upload_to_prompt());
        assert_eq!(collector.mode(), InputMode::Prompt);
        assert!(collector.prompt_text().contains("crest.svg"));
        assert!(collector.upload().is_some());
    }

    #[test]
    fn test_default_profile_is_laser() {
        let mut collector = InputCollector::new();
        assert_eq!(collector.profile(), ProfileId::Laser);
        collector.set_profile(ProfileId::Mill);
        assert_eq!(collector.request().profile, ProfileId::Mill);
    }
}
