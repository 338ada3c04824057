//! Withdrawal note validation.
//!
//! Lengths are counted in characters, not bytes.

use thiserror::Error;

pub const MIN_NOTE_LENGTH: usize = 20;
pub const MAX_NOTE_LENGTH: usize = 1000;

/// Inclusive length bounds for a submittable note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for NoteBounds {
    fn default() -> Self {
        Self {
            min: MIN_NOTE_LENGTH,
            max: MAX_NOTE_LENGTH,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteError {
    #[error("Note must be at least {min} characters")]
    TooShort { min: usize, len: usize },

    #[error("Note must be at most {max} characters")]
    TooLong { max: usize, len: usize },
}

/// Outcome of [`validate_note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteValidation {
    pub valid: bool,
    pub error: Option<NoteError>,
}

pub fn validate_note(note: &str, bounds: NoteBounds) -> NoteValidation {
    let len = note_length(note);
    let error = if len < bounds.min {
        Some(NoteError::TooShort {
            min: bounds.min,
            len,
        })
    } else if len > bounds.max {
        Some(NoteError::TooLong {
            max: bounds.max,
            len,
        })
    } else {
        None
    };

    NoteValidation {
        valid: error.is_none(),
        error,
    }
}

pub fn note_length(note: &str) -> usize {
    note.chars().count()
}

/// Cut `raw` to at most `max` characters, the way a length-limited input does.
pub fn truncate_note(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Counter shown under the note input, e.g. `25/1000 characters`.
pub fn note_counter(note: &str, bounds: NoteBounds) -> String {
    format!("{}/{} characters", note_length(note), bounds.max)
}
