use encoding_rs::{Encoding, ISO_8859_2, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1250};
use std::fmt;
use std::str::FromStr;

use crate::encoding::{UTF8_BOM, Unmappable, decode_strict, encode_strict};
use crate::error::TxtconvError;

/// Output format for converted files.
///
/// The set is closed: every value maps to exactly one codec, and names outside
/// the set are rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    /// UTF-8 without a byte order mark.
    Utf8,
    /// UTF-8 without a byte order mark ("with-out BOM"); identical to [`TargetFormat::Utf8`].
    Utf8WithoutBom,
    /// UTF-8 preceded by `EF BB BF`.
    Utf8Bom,
    /// Windows-1250, the Central European ANSI code page.
    Ansi,
    /// ISO-8859-2 (Latin-2).
    Iso8859_2,
    /// UTF-16 little-endian, no BOM.
    Utf16Le,
    /// UTF-16 big-endian, no BOM.
    Utf16Be,
}

impl TargetFormat {
    /// Every supported format, in display order.
    pub const ALL: [TargetFormat; 7] = [
        TargetFormat::Utf8,
        TargetFormat::Utf8WithoutBom,
        TargetFormat::Utf8Bom,
        TargetFormat::Ansi,
        TargetFormat::Iso8859_2,
        TargetFormat::Utf16Le,
        TargetFormat::Utf16Be,
    ];

    /// The canonical upper-case name, also used as the default file suffix.
    pub const fn name(self) -> &'static str {
        match self {
            TargetFormat::Utf8 => "UTF8",
            TargetFormat::Utf8WithoutBom => "UTF8WBOM",
            TargetFormat::Utf8Bom => "UTF8BOM",
            TargetFormat::Ansi => "ANSI",
            TargetFormat::Iso8859_2 => "ISO8859_2",
            TargetFormat::Utf16Le => "UTF16LE",
            TargetFormat::Utf16Be => "UTF16BE",
        }
    }

    /// Names of all supported formats.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.name()).collect()
    }

    /// The codec that produces this format's bytes.
    pub fn encoding(self) -> &'static Encoding {
        match self {
            TargetFormat::Utf8 | TargetFormat::Utf8WithoutBom | TargetFormat::Utf8Bom => UTF_8,
            TargetFormat::Ansi => WINDOWS_1250,
            TargetFormat::Iso8859_2 => ISO_8859_2,
            TargetFormat::Utf16Le => UTF_16LE,
            TargetFormat::Utf16Be => UTF_16BE,
        }
    }

    /// Whether output starts with a byte order mark.
    pub const fn writes_bom(self) -> bool {
        matches!(self, TargetFormat::Utf8Bom)
    }

    /// Serialise `text` in this format.
    pub fn encode(self, text: &str) -> std::result::Result<Vec<u8>, Unmappable> {
        let body = encode_strict(self.encoding(), text)?;
        if !self.writes_bom() {
            return Ok(body);
        }
        let mut out = Vec::with_capacity(UTF8_BOM.len() + body.len());
        out.extend_from_slice(&UTF8_BOM);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Read back bytes written in this format.
    pub fn decode(self, data: &[u8]) -> Option<String> {
        decode_strict(self.encoding(), data)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetFormat {
    type Err = TxtconvError;

    /// Parse a format name, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TxtconvError::InvalidTargetFormat(s.to_string()))
    }
}
