//! Journal lines and audio cue identifiers handed back to the presentation layer.
//!
//! The core never plays sound or renders text itself; it only reports what
//! happened. Whether a cue is audible is decided by [`AudioSettings`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DEFAULT_SFX_VOLUME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    CopyMessage,
    ImportSuccess,
    DialogOpen,
    ButtonClick,
    Completion,
}

impl SoundCue {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CopyMessage => "copy_message",
            Self::ImportSuccess => "import_success",
            Self::DialogOpen => "dialog_open",
            Self::ButtonClick => "button_click",
            Self::Completion => "completion",
        }
    }

    /// Sound asset the presentation layer should play for this cue.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.wav", self.as_str())
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: DEFAULT_SFX_VOLUME,
        }
    }
}

impl AudioSettings {
    #[must_use]
    pub fn new(enabled: bool, volume: f32) -> Self {
        let mut settings = Self {
            enabled,
            volume: DEFAULT_SFX_VOLUME,
        };
        settings.set_volume(volume);
        settings
    }

    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
    }

    /// Cues worth playing under these settings.
    #[must_use]
    pub fn audible(&self, cues: &[SoundCue]) -> Vec<SoundCue> {
        if !self.enabled || self.volume <= 0.0 {
            return Vec::new();
        }
        cues.to_vec()
    }
}

/// Marks journal lines the presentation layer highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTag {
    Postscript,
    RunComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<LogTag>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything one operation wants shown or played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub log: Vec<LogEntry>,
    pub cues: Vec<SoundCue>,
}

impl Feedback {
    pub fn note(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry {
            message: message.into(),
            tag: None,
        });
    }

    pub fn tagged(&mut self, message: impl Into<String>, tag: LogTag) {
        self.log.push(LogEntry {
            message: message.into(),
            tag: Some(tag),
        });
    }

    pub fn cue(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    pub fn extend(&mut self, other: Self) {
        self.log.extend(other.log);
        self.cues.extend(other.cues);
    }

    #[must_use]
    pub fn has_cue(&self, cue: SoundCue) -> bool {
        self.cues.contains(&cue)
    }
}

/// Append-only record of every journal line produced in a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<LogEntry>,
}

impl Journal {
    pub fn record(&mut self, feedback: &Feedback) {
        self.entries.extend(feedback.log.iter().cloned());
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Plain-text export, one entry per line.
    #[must_use]
    pub fn export(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.message);
            out.push('\n');
        }
        out
    }
}
