//! txtconv: text file encoding detector and converter
//!
//! Detects the character encoding of text files and converts them to one of a
//! small set of target formats. Built for recovering Central European text that
//! was saved in a legacy code page and later mislabelled.
//!
//! # Quick Start
//!
//! ```no_run
//! use txtconv::{Converter, Outcome, TargetFormat};
//!
//! let converter = Converter::new();
//! match converter.convert_file("notes.txt", "notes_UTF8.txt", TargetFormat::Utf8).unwrap() {
//!     Outcome::Written(conversion) => {
//!         println!("Detected: {}", conversion.detection);
//!         println!("Decoded with: {}", conversion.decoded_with.name());
//!     }
//!     Outcome::EmptyInput => println!("Created empty file"),
//! }
//! ```
//!
//! # How decoding is chosen
//!
//! Statistical detectors are unreliable on short single-byte text, so the
//! detector's guess is not trusted blindly:
//!
//! 1. Empty input is never decoded; the output is simply empty.
//! 2. If the detector reports a UTF encoding, that encoding is tried first.
//! 3. Then windows-1250 and ISO-8859-2 are tried, in that order.
//! 4. Finally any other detector guess is tried.
//!
//! The first encoding that decodes without error wins. The decoded text is then
//! encoded into the requested [`TargetFormat`]; characters the target cannot
//! represent are reported rather than replaced.
//!
//! ```
//! use txtconv::{Converter, Detection, TargetFormat};
//!
//! // Any closure can stand in for the detector.
//! let converter = Converter::with_detector(|_: &[u8]| Detection::unknown());
//! let outcome = converter.convert(b"Gr\xfc\xdf", TargetFormat::Utf8).unwrap();
//! assert_eq!(outcome.bytes(), "Grüß".as_bytes());
//! ```

pub mod batch;
mod candidates;
mod convert;
mod detector;
mod encoding;
mod error;
mod format;
mod info;

pub use candidates::{Candidate, CandidateList, DEFAULT_PRIORITY, Source};
pub use convert::{Attempt, Conversion, Converter, Outcome};
pub use detector::{ChardetDetector, Detect, Detection, Guess, detect};
pub use error::{Result, TxtconvError};
pub use format::TargetFormat;
pub use info::{
    ColumnWidths, DirectoryListing, FileInfo, Stats, Totals, format_size, group_by_directory,
    list_files,
};

// Re-export for advanced usage
pub use encoding::{Unmappable, decode_strict, encode_strict, has_utf8_bom, is_utf8};
pub use encoding_rs::Encoding;
