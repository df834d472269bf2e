//! Ordered decode candidates.
//!
//! The order is the whole policy:
//!
//! 1. A Unicode guess from the detector, if any. UTF byte patterns are
//!    structural, so a confident Unicode signal outranks everything else.
//! 2. The legacy priority encodings (windows-1250, then ISO-8859-2 by default).
//!    Single-byte legacy text is frequently misdetected, so these are tried
//!    before a non-Unicode guess.
//! 3. Any other detector guess, as the last resort.
//!
//! Encodings are compared by codec identity, so an alias of a priority encoding
//! is not tried twice.

use encoding_rs::Encoding;

use crate::detector::Detection;
use crate::encoding::decode_strict;

/// Legacy encodings tried ahead of a non-Unicode detector guess.
pub static DEFAULT_PRIORITY: [&Encoding; 2] = [
    &encoding_rs::WINDOWS_1250_INIT,
    &encoding_rs::ISO_8859_2_INIT,
];

/// Why an encoding is in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The detector's guess.
    Detected,
    /// One of the configured legacy priority encodings.
    Priority,
}

/// A single encoding to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub encoding: &'static Encoding,
    pub source: Source,
}

impl Candidate {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decode `data`, or `None` if it is not valid in this encoding.
    pub fn decode(&self, data: &[u8]) -> Option<String> {
        decode_strict(self.encoding, data)
    }
}

/// The ordered, duplicate-free list of encodings to attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    candidates: Vec<Candidate>,
}

impl CandidateList {
    /// Build the attempt order for one detection result.
    pub fn build(priority: &[&'static Encoding], detection: &Detection) -> Self {
        let mut list = Self {
            candidates: Vec::with_capacity(priority.len() + 1),
        };

        let detected = detection.encoding();
        if detection.is_unicode() {
            if let Some(encoding) = detected {
                list.push(encoding, Source::Detected);
            }
        }
        for &encoding in priority {
            list.push(encoding, Source::Priority);
        }
        if let Some(encoding) = detected {
            list.push(encoding, Source::Detected);
        }
        list
    }

    fn push(&mut self, encoding: &'static Encoding, source: Source) {
        if !self.contains(encoding) {
            self.candidates.push(Candidate { encoding, source });
        }
    }

    pub fn contains(&self, encoding: &'static Encoding) -> bool {
        self.candidates.iter().any(|c| c.encoding == encoding)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Encoding names in attempt order.
    pub fn names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(Candidate::name).collect()
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{ISO_8859_2, UTF_8, UTF_16LE, WINDOWS_1250, WINDOWS_1252};

    #[test]
    fn test_default_priority() {
        assert_eq!(DEFAULT_PRIORITY, [WINDOWS_1250, ISO_8859_2]);
    }

    #[test]
    fn test_legacy_first_for_non_unicode_guess() {
        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::new(WINDOWS_1252, 0.2));
        assert_eq!(list.names(), ["windows-1250", "ISO-8859-2", "windows-1252"]);
        assert_eq!(list.iter().last().map(|c| c.source), Some(Source::Detected));
    }

    #[test]
    fn test_unicode_guess_goes_first_and_only_once() {
        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::new(UTF_16LE, 0.9));
        assert_eq!(list.names(), ["UTF-16LE", "windows-1250", "ISO-8859-2"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_guess_equal_to_priority_is_not_repeated() {
        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::new(ISO_8859_2, 0.9));
        assert_eq!(list.names(), ["windows-1250", "ISO-8859-2"]);
        assert!(list.iter().all(|c| c.source == Source::Priority));
    }

    #[test]
    fn test_alias_resolves_to_same_codec() {
        let cp1250 = Encoding::for_label(b"cp1250").unwrap();
        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::new(cp1250, 0.9));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_no_label_keeps_priority_only() {
        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::unknown());
        assert_eq!(list.names(), ["windows-1250", "ISO-8859-2"]);

        let list = CandidateList::build(&DEFAULT_PRIORITY, &Detection::empty());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_custom_priority() {
        let list = CandidateList::build(&[UTF_8], &Detection::new(WINDOWS_1252, 0.1));
        assert_eq!(list.names(), ["UTF-8", "windows-1252"]);

        let list = CandidateList::build(&[], &Detection::unknown());
        assert!(list.is_empty());
    }
}
