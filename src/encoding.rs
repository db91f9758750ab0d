/*!
 * Text/binary classification and lossy decoding
 *
 * Classification works on a sample of at most [`SAMPLE_SIZE`] bytes. The
 * detector names an encoding and a confidence in `[0, 1]`. A file counts as
 * binary when no encoding is found or the confidence is below
 * [`CONFIDENCE_THRESHOLD`]. The heuristic can be wrong on short or unusual
 * files.
 *
 * A byte order mark decides the encoding outright. Without one, input that is
 * valid UTF-8 is UTF-8 and anything else is handed to `chardetng`, so legacy
 * single-byte text (Latin-1, windows-1252, ...) decodes instead of turning
 * into replacement characters.
 */

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chardetng::EncodingDetector;
use content_inspector::ContentType;
use encoding_rs::{Encoding, UTF_8};

/// Number of leading bytes inspected by the classifier
pub const SAMPLE_SIZE: usize = 1024;

/// Minimum detector confidence for a file to be treated as text
pub const CONFIDENCE_THRESHOLD: f32 = 0.9;

/// Detector verdict for a byte sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Detected encoding, `None` when the sample does not look like text
    pub encoding: Option<&'static Encoding>,
    /// Share of the decoded sample that is printable text
    pub confidence: f32,
}

impl Detection {
    fn unknown() -> Self {
        Self {
            encoding: None,
            confidence: 0.0,
        }
    }

    /// Whether this verdict classifies the sample as binary
    pub fn is_binary(&self) -> bool {
        self.encoding.is_none() || self.confidence < CONFIDENCE_THRESHOLD
    }
}

/// Decide whether the file at `path` is binary
///
/// Any I/O failure while sampling counts as binary, so an unreadable file is
/// skipped rather than decoded into garbage.
pub fn is_binary(path: &Path) -> bool {
    match read_sample(path) {
        Ok(sample) => detect(&sample).is_binary(),
        Err(e) => {
            log::debug!("Could not sample {}: {}", path.display(), e);
            true
        }
    }
}

/// Run the detector over a byte sample
pub fn detect(sample: &[u8]) -> Detection {
    if sample.is_empty() {
        return Detection::unknown();
    }

    // NUL bytes without a BOM
    if content_inspector::inspect(sample) == ContentType::BINARY {
        return Detection::unknown();
    }

    let (encoding, body) = match Encoding::for_bom(sample) {
        Some((encoding, bom_len)) => (encoding, &sample[bom_len..]),
        None if is_utf8_prefix(sample) => (UTF_8, sample),
        None => (guess_legacy(sample, sample.len() < SAMPLE_SIZE), sample),
    };

    Detection {
        encoding: Some(encoding),
        confidence: confidence(encoding, body, sample.len() >= SAMPLE_SIZE),
    }
}

/// Pick the encoding used to decode a whole file
pub fn sniff_encoding(bytes: &[u8]) -> &'static Encoding {
    match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => guess_legacy(bytes, true),
    }
}

/// Decode bytes, stripping a BOM and replacing malformed sequences with U+FFFD
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!("Malformed {} sequences replaced while decoding", actual.name());
    }
    text.into_owned()
}

fn read_sample(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

fn guess_legacy(bytes: &[u8], last: bool) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, last);
    detector.guess(None, true)
}

/// Valid UTF-8, allowing a sequence cut off at the end of the sample
fn is_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    }
}

/// C0 controls other than tab, newline, vertical tab, form feed, CR and ESC, plus C1
fn is_control(c: char) -> bool {
    match c {
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | '\u{1B}' => false,
        _ => c < ' ' || ('\u{80}'..='\u{9F}').contains(&c),
    }
}

fn confidence(encoding: &'static Encoding, body: &[u8], truncated: bool) -> f32 {
    let (text, _) = encoding.decode_without_bom_handling(body);
    let total = text.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut suspicious = text
        .chars()
        .filter(|c| *c == char::REPLACEMENT_CHARACTER || is_control(*c))
        .count();

    // Sequence cut off by the sample boundary
    if truncated && text.ends_with(char::REPLACEMENT_CHARACTER) {
        suspicious -= 1;
    }

    1.0 - suspicious as f32 / total as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_16LE;
    use std::fs;
    use tempfile::tempdir;

    const LATIN1_SAMPLE: &[u8] =
        b"R\xe9sum\xe9: caf\xe9 au lait, na\xefve fa\xe7ade, d\xe9j\xe0 vu. Plain ASCII follows.\n";

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_plain_text_is_confident() {
        let detection = detect(b"fn main() {\n\tprintln!(\"hi\");\n}\n");
        assert_eq!(detection.encoding, Some(UTF_8));
        assert!((detection.confidence - 1.0).abs() < f32::EPSILON);
        assert!(!detection.is_binary());
    }

    #[test]
    fn test_nul_bytes_mean_binary() {
        let sample: Vec<u8> = (0u8..=255).cycle().take(SAMPLE_SIZE).collect();
        let detection = detect(&sample);
        assert_eq!(detection.encoding, None);
        assert!(detection.is_binary());
    }

    #[test]
    fn test_control_heavy_text_is_binary() {
        let sample: Vec<u8> = b"ab\x01\x02\x03\x04".repeat(50);
        assert!(detect(&sample).is_binary());
    }

    #[test]
    fn test_truncated_multibyte_at_sample_end() {
        let mut sample = vec![b'a'; SAMPLE_SIZE - 1];
        sample.push("é".as_bytes()[0]);
        let detection = detect(&sample);
        assert_eq!(detection.encoding, Some(UTF_8));
        assert!((detection.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_sample_has_no_encoding() {
        assert!(detect(&[]).is_binary());
    }

    #[test]
    fn test_utf16_roundtrip_through_decode() {
        let bytes = utf16le_with_bom("héllo wörld\n");
        let detection = detect(&bytes);
        assert_eq!(detection.encoding, Some(UTF_16LE));
        assert!(!detection.is_binary());

        assert_eq!(sniff_encoding(&bytes), UTF_16LE);
        assert_eq!(decode(&bytes, UTF_16LE), "héllo wörld\n");
    }

    #[test]
    fn test_legacy_text_is_detected_and_decoded() {
        let detection = detect(LATIN1_SAMPLE);
        assert!(!detection.is_binary());
        assert_ne!(detection.encoding, Some(UTF_8));

        let encoding = sniff_encoding(LATIN1_SAMPLE);
        assert_ne!(encoding, UTF_8);
        assert_eq!(
            decode(LATIN1_SAMPLE, encoding),
            "Résumé: café au lait, naïve façade, déjà vu. Plain ASCII follows.\n"
        );
    }

    #[test]
    fn test_decode_strips_bom_and_replaces_invalid_sequences() {
        assert_eq!(decode(b"caf\xE9 ok", UTF_8), "caf\u{FFFD} ok");

        let bom = [b"\xEF\xBB\xBF".as_slice(), b"text".as_slice()].concat();
        assert_eq!(sniff_encoding(&bom), UTF_8);
        assert_eq!(decode(&bom, UTF_8), "text");
    }

    #[test]
    fn test_is_binary_on_files() {
        let temp_dir = tempdir().unwrap();
        let text = temp_dir.path().join("a.txt");
        let latin1 = temp_dir.path().join("notes.txt");
        let binary = temp_dir.path().join("blob.bin");
        fs::write(&text, "hello world").unwrap();
        fs::write(&latin1, LATIN1_SAMPLE).unwrap();
        fs::write(&binary, [0u8, 159, 146, 150, 0, 1, 2, 3]).unwrap();

        assert!(!is_binary(&text));
        assert!(!is_binary(&latin1));
        assert!(is_binary(&binary));
        assert!(is_binary(&temp_dir.path().join("missing.txt")));
    }
}
