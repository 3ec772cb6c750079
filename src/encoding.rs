//! Input decoding: BOM handling, UTF-8 validation and transcoding of legacy
//! encodings using chardetng and `encoding_rs`.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use simdutf8::basic::from_utf8;

use crate::error::{DatasetError, Result};

/// Check if the given bytes are valid UTF-8.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (EF BB BF).
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&[0xEF, 0xBB, 0xBF])
}

/// Check if the data starts with a UTF-16 BOM of either byte order.
pub fn has_utf16_bom(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xFE]) || data.starts_with(&[0xFE, 0xFF])
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    if has_utf8_bom(data) { &data[3..] } else { data }
}

/// Resolve an encoding label such as `"windows-1252"` or `"latin1"`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DatasetError::InvalidArgument(format!("unknown encoding '{label}'")))
}

/// Detect the encoding of data and transcode to UTF-8 if necessary.
///
/// UTF-16 input is recognized by its BOM; other non-UTF-8 input is handed to
/// chardetng. Returns (`data`, `was_transcoded`).
pub fn detect_and_transcode(data: &[u8]) -> (Cow<'_, [u8]>, bool) {
    if let Some((encoding, _)) = Encoding::for_bom(data)
        && encoding != encoding_rs::UTF_8
    {
        let (decoded, _, _) = encoding.decode(data);
        return (Cow::Owned(decoded.into_owned().into_bytes()), true);
    }

    if is_utf8(data) {
        return (Cow::Borrowed(data), false);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);

    if encoding == encoding_rs::UTF_8 {
        return (Cow::Borrowed(data), false);
    }

    let (decoded, _, _) = encoding.decode(data);
    (Cow::Owned(decoded.into_owned().into_bytes()), true)
}

/// Decode one physical line.
///
/// Valid UTF-8 is borrowed as is. Anything else is decoded with `fallback`
/// when one is configured, and rejected otherwise.
pub fn decode_line<'a>(
    bytes: &'a [u8],
    line: u64,
    fallback: Option<&'static Encoding>,
) -> Result<Cow<'a, str>> {
    if let Ok(text) = from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }
    match fallback {
        Some(encoding) => {
            let (decoded, _) = encoding.decode_without_bom_handling(bytes);
            Ok(decoded)
        }
        None => Err(DatasetError::InvalidEncoding { line }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8(b"Hello, World!"));
        assert!(is_utf8("こんにちは".as_bytes()));
        assert!(!is_utf8(&[0x80, 0x81, 0x82]));
    }

    #[test]
    fn test_boms() {
        let with_bom = [0xEF, 0xBB, 0xBF, b'a', b'b', b'c'];
        assert!(has_utf8_bom(&with_bom));
        assert!(!has_utf8_bom(b"abc"));
        assert_eq!(skip_bom(&with_bom), b"abc");
        assert_eq!(skip_bom(b"abc"), b"abc");

        assert!(has_utf16_bom(&[0xFF, 0xFE, b'H', 0x00]));
        assert!(!has_utf16_bom(&with_bom));
    }

    #[test]
    fn test_detect_and_transcode_utf8() {
        let data = b"ID,a\nr1,1\n";
        let (result, was_transcoded) = detect_and_transcode(data);
        assert!(!was_transcoded);
        assert_eq!(&result[..], data);
    }

    #[test]
    fn test_detect_and_transcode_utf16_le() {
        let data: &[u8] = &[0xFF, 0xFE, b'I', 0x00, b'D', 0x00];
        let (result, was_transcoded) = detect_and_transcode(data);
        assert!(was_transcoded);
        assert_eq!(&result[..], b"ID");
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"abc", 1, None).unwrap(), "abc");

        // "café" in windows-1252
        let latin = [b'c', b'a', b'f', 0xE9];
        assert!(matches!(
            decode_line(&latin, 3, None),
            Err(DatasetError::InvalidEncoding { line: 3 })
        ));
        let encoding = encoding_for_label("windows-1252").unwrap();
        assert_eq!(decode_line(&latin, 3, Some(encoding)).unwrap(), "café");
    }

    #[test]
    fn test_unknown_label() {
        assert!(encoding_for_label("no-such-encoding").unwrap_err().is_usage());
    }
}
