//! Presentation port: where a resolved language meets the host surface.
//!
//! A session calls [`PresentationHook::apply`] every time it publishes a
//! resolved language, so the host can update document language and text
//! direction. The fade overlay is described by [`FadeSettings`] only; drawing
//! it is left to the host, keyed off the session's `ready` flag.

use crate::i18n::language::Direction;
use crate::i18n::registry::{DEFAULT_FADE_COLOR, DEFAULT_FADE_DURATION};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Receives the active language and its direction.
pub trait PresentationHook: Send + Sync {
    fn apply(&self, language: &str, direction: Direction);
}

/// Ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresentation;

impl PresentationHook for NoopPresentation {
    fn apply(&self, _language: &str, _direction: Direction) {}
}

/// Remembers every update, in order.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    applied: Mutex<Vec<(String, Direction)>>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<(String, Direction)> {
        self.applied
            .lock()
            .map(|applied| applied.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<(String, Direction)> {
        self.applied().pop()
    }
}

impl PresentationHook for RecordingPresentation {
    fn apply(&self, language: &str, direction: Direction) {
        if let Ok(mut applied) = self.applied.lock() {
            applied.push((language.to_string(), direction));
        }
    }
}

/// Fade overlay parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FadeSettings {
    pub color: String,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            color: DEFAULT_FADE_COLOR.to_string(),
            duration: DEFAULT_FADE_DURATION,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
