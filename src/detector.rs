//! Statistical encoding detection.
//!
//! [`ChardetDetector`] checks byte order marks and UTF-8 validity first (chardetng
//! handles neither UTF-16 nor BOMs), then falls back to chardetng's byte-frequency
//! model for legacy encodings. Any other implementation of [`Detect`] can be
//! plugged into a [`Converter`](crate::Converter).

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fmt;

use crate::encoding::{bom_encoding, is_utf8};

/// Confidence assigned when chardetng judges its guess reliable.
const ASSESSED_CONFIDENCE: f32 = 0.75;
/// Confidence assigned when chardetng could not separate its guess from the rest.
const UNASSESSED_CONFIDENCE: f32 = 0.25;
/// Confidence for non-ASCII input that validates as UTF-8.
const UTF8_CONFIDENCE: f32 = 0.99;

/// What the detector believes the input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guess {
    /// The input was empty.
    Empty,
    /// The detector produced no label.
    Unknown,
    /// A concrete encoding.
    Encoding(&'static Encoding),
}

/// Result of running a detector over one byte buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    guess: Guess,
    confidence: f32,
}

impl Detection {
    /// Detection for empty input; always fully confident.
    pub const fn empty() -> Self {
        Self {
            guess: Guess::Empty,
            confidence: 1.0,
        }
    }

    /// Detection that produced no label.
    pub const fn unknown() -> Self {
        Self {
            guess: Guess::Unknown,
            confidence: 0.0,
        }
    }

    /// Detection naming `encoding`. Confidence is clamped to `[0, 1]`.
    pub fn new(encoding: &'static Encoding, confidence: f32) -> Self {
        Self {
            guess: Guess::Encoding(encoding),
            confidence: if confidence.is_nan() {
                0.0
            } else {
                confidence.clamp(0.0, 1.0)
            },
        }
    }

    pub const fn guess(&self) -> Guess {
        self.guess
    }

    /// The guessed encoding, if there is one.
    pub const fn encoding(&self) -> Option<&'static Encoding> {
        match self.guess {
            Guess::Encoding(encoding) => Some(encoding),
            Guess::Empty | Guess::Unknown => None,
        }
    }

    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Label for display: the encoding name, `"empty"` or `"unknown"`.
    pub fn label(&self) -> &'static str {
        match self.guess {
            Guess::Empty => "empty",
            Guess::Unknown => "unknown",
            Guess::Encoding(encoding) => encoding.name(),
        }
    }

    /// True if the label names a Unicode Transformation Format.
    pub fn is_unicode(&self) -> bool {
        self.encoding()
            .is_some_and(|encoding| encoding.name().to_ascii_lowercase().contains("utf"))
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}%)", self.label(), self.confidence * 100.0)
    }
}

/// Something that can guess the encoding of a byte buffer.
///
/// Implementations must be pure and must not panic on malformed input.
pub trait Detect {
    fn detect(&self, data: &[u8]) -> Detection;
}

impl<F> Detect for F
where
    F: Fn(&[u8]) -> Detection,
{
    fn detect(&self, data: &[u8]) -> Detection {
        self(data)
    }
}

/// The default detector, backed by chardetng.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetDetector;

impl ChardetDetector {
    pub const fn new() -> Self {
        Self
    }
}

impl Detect for ChardetDetector {
    fn detect(&self, data: &[u8]) -> Detection {
        if data.is_empty() {
            return Detection::empty();
        }

        if let Some(encoding) = bom_encoding(data) {
            return Detection::new(encoding, 1.0);
        }

        if data.is_ascii() {
            return Detection::new(UTF_8, 1.0);
        }
        if is_utf8(data) {
            return Detection::new(UTF_8, UTF8_CONFIDENCE);
        }

        let mut detector = EncodingDetector::new();
        detector.feed(data, true);
        let (encoding, reliable) = detector.guess_assess(None, false);
        let confidence = if reliable {
            ASSESSED_CONFIDENCE
        } else {
            UNASSESSED_CONFIDENCE
        };
        Detection::new(encoding, confidence)
    }
}

/// Detect the encoding of `data` with the default detector.
pub fn detect(data: &[u8]) -> Detection {
    ChardetDetector.detect(data)
}
