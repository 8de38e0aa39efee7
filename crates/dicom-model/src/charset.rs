//! Specific Character Set handling for display-text decoding.
//!
//! DICOM names character repertoires by defined terms carried in
//! (0008,0005). Decoding only affects how string values are rendered for
//! humans; stored bytes are never altered.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// A resolved Specific Character Set.
///
/// The default repertoire (ISO-IR 6) is a strict ASCII subset; unknown
/// defined terms fall back to it rather than failing, since character set
/// resolution must never abort a decode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpecificCharacterSet {
    encoding: Option<&'static Encoding>,
}

impl SpecificCharacterSet {
    /// Resolve a defined term such as `"ISO_IR 100"` or `"ISO_IR 192"`.
    #[must_use]
    pub fn from_term(term: &str) -> Self {
        let encoding = match term.trim() {
            "" | "ISO_IR 6" => None,
            "ISO_IR 100" => Some(encoding_rs::WINDOWS_1252),
            "ISO_IR 101" => Some(encoding_rs::ISO_8859_2),
            "ISO_IR 109" => Some(encoding_rs::ISO_8859_3),
            "ISO_IR 110" => Some(encoding_rs::ISO_8859_4),
            "ISO_IR 144" => Some(encoding_rs::ISO_8859_5),
            "ISO_IR 127" => Some(encoding_rs::ISO_8859_6),
            "ISO_IR 126" => Some(encoding_rs::ISO_8859_7),
            "ISO_IR 138" => Some(encoding_rs::ISO_8859_8),
            "ISO_IR 148" => Some(encoding_rs::WINDOWS_1254),
            "ISO_IR 166" => Some(encoding_rs::WINDOWS_874),
            "ISO_IR 13" => Some(encoding_rs::SHIFT_JIS),
            "ISO_IR 192" => Some(encoding_rs::UTF_8),
            "GB18030" => Some(encoding_rs::GB18030),
            "GBK" => Some(encoding_rs::GBK),
            _ => None,
        };
        Self { encoding }
    }

    /// Decode bytes for display.
    #[must_use]
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self.encoding {
            Some(encoding) => encoding.decode_without_bom_handling(bytes).0,
            None => String::from_utf8_lossy(bytes),
        }
    }
}
