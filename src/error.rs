use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::detector::Detection;
use crate::format::TargetFormat;

/// Error type for detection and conversion operations.
#[derive(Error, Debug)]
pub enum TxtconvError {
    /// The requested target format is not one of the supported formats.
    #[error("Invalid format '{0}'. Supported formats are: {list}", list = TargetFormat::names().join(", "))]
    InvalidTargetFormat(String),

    /// The source file could not be read.
    #[error("Cannot read file '{}': {source}", .path.display())]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every candidate encoding failed to decode the input.
    #[error(
        "All decoding attempts failed (tried {}; detected {detection}). Could not correctly read the source data",
        .attempted.join(", ")
    )]
    AllDecodeAttemptsFailed {
        /// Detector result for the input, reported alongside the failure.
        detection: Detection,
        /// Candidate encodings in the order they were tried.
        attempted: Vec<&'static str>,
    },

    /// The decoded text contains a character the target format cannot represent.
    #[error(
        "Cannot encode {character:?} at byte {offset} as {target}; text was decoded with {decoded_with}"
    )]
    EncodeFailed {
        /// Detector result for the input, reported alongside the failure.
        detection: Detection,
        target: TargetFormat,
        decoded_with: &'static str,
        character: char,
        offset: usize,
    },

    /// The converted bytes could not be written.
    #[error("Error writing to file '{}': {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, TxtconvError>;
