//! Decode with a prioritised fallback chain, then re-encode.

use encoding_rs::Encoding;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::candidates::{Candidate, CandidateList, DEFAULT_PRIORITY};
use crate::detector::{ChardetDetector, Detect, Detection};
use crate::error::{Result, TxtconvError};
use crate::format::TargetFormat;

/// One decode attempt, in the order it was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub candidate: Candidate,
    pub succeeded: bool,
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The re-encoded output.
    pub bytes: Vec<u8>,
    /// The decoded text that was re-encoded.
    pub text: String,
    /// What the detector reported for the input.
    pub detection: Detection,
    /// The candidate whose decode succeeded.
    pub decoded_with: Candidate,
    /// Every attempt made, ending with the successful one.
    pub attempts: Vec<Attempt>,
    pub target: TargetFormat,
}

impl Conversion {
    /// True when the winning encoding is not what the detector guessed.
    pub fn used_fallback(&self) -> bool {
        self.detection.encoding() != Some(self.decoded_with.encoding)
    }
}

/// Terminal result of converting one buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The input decoded and re-encoded successfully.
    Written(Conversion),
    /// The input was empty; the output is empty too and nothing was decoded.
    EmptyInput,
}

impl Outcome {
    /// The bytes to persist for this outcome.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Outcome::Written(conversion) => &conversion.bytes,
            Outcome::EmptyInput => &[],
        }
    }
}

/// Encoding converter.
///
/// # Example
///
/// ```
/// use txtconv::{Converter, Outcome, TargetFormat};
///
/// let converter = Converter::new();
/// let outcome = converter.convert(b"Zaj\xb9\xe6", TargetFormat::Utf8).unwrap();
/// match outcome {
///     Outcome::Written(conversion) => assert_eq!(conversion.text, "Zająć"),
///     Outcome::EmptyInput => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Converter<D = ChardetDetector> {
    detector: D,
    /// Legacy encodings tried before a non-Unicode detector guess.
    priority: Vec<&'static Encoding>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Create a converter with the chardetng detector and the default
    /// windows-1250, ISO-8859-2 priority.
    pub fn new() -> Self {
        Self::with_detector(ChardetDetector::new())
    }
}

impl<D: Detect> Converter<D> {
    /// Create a converter that uses `detector` for the initial guess.
    pub fn with_detector(detector: D) -> Self {
        Self {
            detector,
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }

    /// Replace the legacy priority encodings, in attempt order.
    pub fn priority(&mut self, encodings: &[&'static Encoding]) -> &mut Self {
        self.priority = encodings.to_vec();
        self
    }

    /// Run the detector alone.
    pub fn detect(&self, data: &[u8]) -> Detection {
        self.detector.detect(data)
    }

    /// Read `path` and run the detector over its contents.
    pub fn detect_path<P: AsRef<Path>>(&self, path: P) -> Result<Detection> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| TxtconvError::UnreadableInput {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.detect(&data))
    }

    /// The attempt order for a given detection.
    pub fn candidates(&self, detection: &Detection) -> CandidateList {
        CandidateList::build(&self.priority, detection)
    }

    /// Convert `data` to `target`.
    ///
    /// Empty input short-circuits to [`Outcome::EmptyInput`]. Otherwise the
    /// candidates are tried in order and the first one that decodes cleanly
    /// wins; later candidates are never attempted.
    pub fn convert(&self, data: &[u8], target: TargetFormat) -> Result<Outcome> {
        if data.is_empty() {
            debug!(%target, "empty input, nothing to decode");
            return Ok(Outcome::EmptyInput);
        }

        let detection = self.detect(data);
        debug!(
            label = detection.label(),
            confidence = detection.confidence(),
            "detected encoding"
        );

        let candidates = self.candidates(&detection);
        debug!(candidates = ?candidates.names(), "decode order");

        let mut attempts = Vec::with_capacity(candidates.len());
        let mut decoded = None;
        for candidate in &candidates {
            match candidate.decode(data) {
                Some(text) => {
                    attempts.push(Attempt {
                        candidate: *candidate,
                        succeeded: true,
                    });
                    decoded = Some((*candidate, text));
                    break;
                }
                None => {
                    debug!(encoding = candidate.name(), "decode failed");
                    attempts.push(Attempt {
                        candidate: *candidate,
                        succeeded: false,
                    });
                }
            }
        }

        let Some((decoded_with, text)) = decoded else {
            warn!(tried = ?candidates.names(), "all decoding attempts failed");
            return Err(TxtconvError::AllDecodeAttemptsFailed {
                detection,
                attempted: candidates.names(),
            });
        };
        info!(encoding = decoded_with.name(), %target, "decoded input");

        let bytes = target
            .encode(&text)
            .map_err(|unmappable| TxtconvError::EncodeFailed {
                detection,
                target,
                decoded_with: decoded_with.name(),
                character: unmappable.character,
                offset: unmappable.offset,
            })?;

        Ok(Outcome::Written(Conversion {
            bytes,
            text,
            detection,
            decoded_with,
            attempts,
            target,
        }))
    }

    /// Convert `data` to the format called `format`.
    ///
    /// The name is validated before anything else happens.
    pub fn convert_named(&self, data: &[u8], format: &str) -> Result<Outcome> {
        let target: TargetFormat = format.parse()?;
        self.convert(data, target)
    }

    /// Convert the file at `input` and write the result to `output`.
    ///
    /// `output` is only touched once conversion has succeeded. Empty input
    /// produces an empty output file.
    pub fn convert_file<P, Q>(&self, input: P, output: Q, target: TargetFormat) -> Result<Outcome>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let output = output.as_ref();

        let data = fs::read(input).map_err(|source| TxtconvError::UnreadableInput {
            path: input.to_path_buf(),
            source,
        })?;
        let outcome = self.convert(&data, target)?;

        fs::write(output, outcome.bytes()).map_err(|source| TxtconvError::WriteFailed {
            path: output.to_path_buf(),
            source,
        })?;
        Ok(outcome)
    }

    /// [`Converter::convert_file`] with a format name. An unknown name fails
    /// before either path is accessed.
    pub fn convert_file_named<P, Q>(&self, input: P, output: Q, format: &str) -> Result<Outcome>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let target: TargetFormat = format.parse()?;
        self.convert_file(input, output, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::Source;
    use encoding_rs::{ISO_8859_2, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1250, WINDOWS_1252};

    fn stub(encoding: &'static Encoding, confidence: f32) -> Converter<impl Fn(&[u8]) -> Detection> {
        Converter::with_detector(move |_: &[u8]| Detection::new(encoding, confidence))
    }

    fn written(outcome: Outcome) -> Conversion {
        match outcome {
            Outcome::Written(conversion) => conversion,
            Outcome::EmptyInput => panic!("expected a conversion"),
        }
    }

    #[test]
    fn test_empty_input_never_fails() {
        let converter = Converter::new();
        for target in TargetFormat::ALL {
            let outcome = converter.convert(b"", target).unwrap();
            assert_eq!(outcome, Outcome::EmptyInput);
            assert!(outcome.bytes().is_empty());
        }
    }

    #[test]
    fn test_empty_input_skips_detection() {
        let converter = Converter::with_detector(|_: &[u8]| -> Detection {
            panic!("detector must not run on empty input")
        });
        assert_eq!(converter.convert(b"", TargetFormat::Ansi).unwrap(), Outcome::EmptyInput);
    }

    #[test]
    fn test_legacy_priority_beats_low_confidence_guess() {
        let conversion = written(
            stub(WINDOWS_1252, 0.2)
                .convert(b"Zaj\xb9\xe6", TargetFormat::Utf8)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, WINDOWS_1250);
        assert_eq!(conversion.decoded_with.source, Source::Priority);
        assert_eq!(conversion.text, "Zająć");
        assert!(conversion.used_fallback());
    }

    #[test]
    fn test_invalid_windows_1250_falls_through_to_iso() {
        // 0x81 is unassigned in windows-1250 but a C1 control in ISO-8859-2
        let conversion = written(
            stub(WINDOWS_1252, 0.2)
                .convert(b"\xb1\x81", TargetFormat::Utf8)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, ISO_8859_2);
        assert_eq!(conversion.attempts.len(), 2);
        assert!(!conversion.attempts[0].succeeded);
        assert!(conversion.attempts[1].succeeded);
        assert_eq!(conversion.text, "ą\u{81}");
    }

    #[test]
    fn test_unicode_guess_preempts_legacy() {
        let source = "Zażółć gęślą jaźń";
        let conversion = written(
            stub(UTF_8, 0.99)
                .convert(source.as_bytes(), TargetFormat::Ansi)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, UTF_8);
        assert_eq!(conversion.decoded_with.source, Source::Detected);
        assert_eq!(conversion.attempts.len(), 1);
        assert_eq!(conversion.text, source);
        assert!(!conversion.used_fallback());
        // windows-1250 would also have decoded these bytes, into mojibake
        let legacy = Candidate {
            encoding: WINDOWS_1250,
            source: Source::Priority,
        };
        assert!(
            legacy
                .decode(source.as_bytes())
                .is_some_and(|text| text != source)
        );
    }

    #[test]
    fn test_utf16_guess_preempts_legacy() {
        let data = TargetFormat::Utf16Be.encode("ąę").unwrap();
        let conversion = written(stub(UTF_16BE, 0.4).convert(&data, TargetFormat::Utf8).unwrap());
        assert_eq!(conversion.decoded_with.encoding, UTF_16BE);
        assert_eq!(conversion.bytes, "ąę".as_bytes());
    }

    #[test]
    fn test_failed_unicode_guess_falls_back() {
        let conversion = written(
            stub(UTF_8, 0.9)
                .convert(b"Zaj\xb9\xe6", TargetFormat::Utf8)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, WINDOWS_1250);
        assert_eq!(conversion.attempts.len(), 2);
        assert_eq!(conversion.attempts[0].candidate.encoding, UTF_8);
        assert!(!conversion.attempts[0].succeeded);
    }

    #[test]
    fn test_first_success_wins() {
        let conversion = written(
            stub(ISO_8859_2, 0.9)
                .convert(b"plain ascii", TargetFormat::Utf8)
                .unwrap(),
        );
        assert_eq!(conversion.attempts.len(), 1);
        assert_eq!(conversion.decoded_with.encoding, WINDOWS_1250);

        // Both legacy encodings accept 0xB1; the first one's reading is used.
        let conversion = written(stub(ISO_8859_2, 0.9).convert(b"\xb1", TargetFormat::Utf8).unwrap());
        assert_eq!(conversion.text, "±");
        assert_eq!(conversion.attempts.len(), 1);
    }

    #[test]
    fn test_total_failure() {
        let mut converter = stub(UTF_16LE, 0.5);
        converter.priority(&[UTF_8]);
        // Invalid UTF-8, and an odd length is invalid UTF-16.
        let err = converter.convert(&[0xFF], TargetFormat::Utf8).unwrap_err();
        match err {
            TxtconvError::AllDecodeAttemptsFailed { detection, attempted } => {
                assert_eq!(detection.encoding(), Some(UTF_16LE));
                assert_eq!(attempted, ["UTF-16LE", "UTF-8"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_encode_failure_is_distinct() {
        let err = stub(UTF_8, 0.99)
            .convert("日本".as_bytes(), TargetFormat::Iso8859_2)
            .unwrap_err();
        match err {
            TxtconvError::EncodeFailed {
                detection,
                target,
                decoded_with,
                character,
                offset,
            } => {
                assert_eq!(detection.encoding(), Some(UTF_8));
                assert!(detection.is_unicode());
                assert_eq!(target, TargetFormat::Iso8859_2);
                assert_eq!(decoded_with, "UTF-8");
                assert_eq!(character, '日');
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_convert_named_rejects_unknown_format() {
        let converter = Converter::with_detector(|_: &[u8]| -> Detection {
            panic!("detector must not run for an invalid format")
        });
        let err = converter.convert_named(b"abc", "UTF32").unwrap_err();
        assert!(matches!(err, TxtconvError::InvalidTargetFormat(_)));
    }

    #[test]
    fn test_mis_saved_polish_to_iso() {
        let conversion = written(
            Converter::new()
                .convert(b"Zaj\xb9\xe6", TargetFormat::Iso8859_2)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, WINDOWS_1250);
        assert!(!conversion.detection.is_unicode());
        assert_eq!(conversion.text, "Zająć");
        assert_eq!(conversion.bytes, b"Zaj\xb1\xe6");
    }

    #[test]
    fn test_plus_minus_sign_has_no_iso_8859_2_form() {
        // 0xB1 is '±' in windows-1250, which ISO-8859-2 cannot represent.
        let err = Converter::new()
            .convert(b"Zaj\xb1\xe6", TargetFormat::Iso8859_2)
            .unwrap_err();
        match err {
            TxtconvError::EncodeFailed {
                detection,
                decoded_with,
                character,
                offset,
                ..
            } => {
                assert!(!detection.is_unicode());
                assert_eq!(decoded_with, "windows-1250");
                assert_eq!(character, '±');
                assert_eq!(offset, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_utf8_with_bom_to_utf16() {
        let conversion = written(
            Converter::new()
                .convert("\u{feff}żółw".as_bytes(), TargetFormat::Utf16Le)
                .unwrap(),
        );
        assert_eq!(conversion.decoded_with.encoding, UTF_8);
        assert_eq!(conversion.text, "żółw");
        assert_eq!(conversion.bytes, TargetFormat::Utf16Le.encode("żółw").unwrap());
    }
}
