//! Strict decoding and encoding on top of `encoding_rs`.
//!
//! `encoding_rs` follows the WHATWG Encoding Standard, which never fails: malformed
//! input becomes U+FFFD and unmappable output becomes an HTML numeric character
//! reference. Conversion needs the opposite, so everything here reports failure
//! instead of substituting.

use encoding_rs::{EncoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use simdutf8::basic::from_utf8;

/// The UTF-8 byte order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Check if the given bytes are valid UTF-8.
///
/// Uses SIMD-accelerated validation for performance.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (Byte Order Mark).
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&UTF8_BOM)
}

/// Returns the encoding announced by a leading BOM, if any.
pub fn bom_encoding(data: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_bom(data).map(|(encoding, _)| encoding)
}

/// Strip the BOM only when it belongs to `encoding`.
///
/// A UTF-8 BOM in front of windows-1250 text is three ordinary characters, so it
/// is left alone for every other encoding.
fn strip_own_bom<'a>(encoding: &'static Encoding, data: &'a [u8]) -> &'a [u8] {
    match Encoding::for_bom(data) {
        Some((bom_encoding, len)) if bom_encoding == encoding => &data[len..],
        _ => data,
    }
}

/// Windows code pages leave a few positions of 0x80..=0x9F unassigned. The
/// WHATWG tables map those bytes to the matching C1 control, which is never
/// what a real code page 125x document contains.
fn has_unassigned_windows_byte(encoding: &'static Encoding, text: &str) -> bool {
    encoding.name().starts_with("windows-")
        && text.chars().any(|c| ('\u{80}'..='\u{9F}').contains(&c))
}

/// Decode `data` as `encoding`, returning `None` on any malformed sequence.
///
/// The encoding's own BOM is removed first. No replacement characters are ever
/// produced.
pub fn decode_strict(encoding: &'static Encoding, data: &[u8]) -> Option<String> {
    let data = strip_own_bom(encoding, data);
    let text = encoding.decode_without_bom_handling_and_without_replacement(data)?;
    if has_unassigned_windows_byte(encoding, &text) {
        return None;
    }
    Some(text.into_owned())
}

/// A character that the output encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmappable {
    /// The offending character.
    pub character: char,
    /// Byte offset of the character within the source text.
    pub offset: usize,
}

/// Encode `text` as `encoding`, failing on the first unrepresentable character.
///
/// `encoding_rs` only encodes to ASCII-compatible encodings, so UTF-16 is
/// serialised directly. No BOM is written.
pub fn encode_strict(
    encoding: &'static Encoding,
    text: &str,
) -> std::result::Result<Vec<u8>, Unmappable> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }

    let mut encoder = encoding.new_encoder();
    let mut output = Vec::with_capacity(
        encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len()),
    );
    let mut consumed = 0;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut output, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => return Ok(output),
            EncoderResult::OutputFull => output.reserve(text.len() - consumed + 16),
            EncoderResult::Unmappable(character) => {
                return Err(Unmappable {
                    character,
                    offset: consumed - character.len_utf8(),
                });
            }
        }
    }
}
