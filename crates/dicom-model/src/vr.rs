//! Value representations and their capabilities.
//!
//! Each VR fixes the kind of data an attribute carries, its padding rule,
//! whether multi-byte numeric values are endian-sensitive, and whether the
//! XML-shaped surface syntax transports the value as base64 text.

use std::fmt;

use crate::charset::SpecificCharacterSet;
use crate::error::{DicomError, Result};
use crate::tag::Tag;

/// DICOM value representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Float
    OF,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Time
    TM,
    /// Unique Identifier
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
}

impl VR {
    /// Parse the two-letter VR code.
    pub fn from_code(code: &str) -> Result<Self> {
        Ok(match code {
            "AE" => Self::AE,
            "AS" => Self::AS,
            "AT" => Self::AT,
            "CS" => Self::CS,
            "DA" => Self::DA,
            "DS" => Self::DS,
            "DT" => Self::DT,
            "FL" => Self::FL,
            "FD" => Self::FD,
            "IS" => Self::IS,
            "LO" => Self::LO,
            "LT" => Self::LT,
            "OB" => Self::OB,
            "OF" => Self::OF,
            "OW" => Self::OW,
            "PN" => Self::PN,
            "SH" => Self::SH,
            "SL" => Self::SL,
            "SQ" => Self::SQ,
            "SS" => Self::SS,
            "ST" => Self::ST,
            "TM" => Self::TM,
            "UI" => Self::UI,
            "UL" => Self::UL,
            "UN" => Self::UN,
            "US" => Self::US,
            "UT" => Self::UT,
            other => {
                return Err(DicomError::malformed(format!("unknown VR code: {other:?}")));
            }
        })
    }

    /// The two-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AE => "AE",
            Self::AS => "AS",
            Self::AT => "AT",
            Self::CS => "CS",
            Self::DA => "DA",
            Self::DS => "DS",
            Self::DT => "DT",
            Self::FL => "FL",
            Self::FD => "FD",
            Self::IS => "IS",
            Self::LO => "LO",
            Self::LT => "LT",
            Self::OB => "OB",
            Self::OF => "OF",
            Self::OW => "OW",
            Self::PN => "PN",
            Self::SH => "SH",
            Self::SL => "SL",
            Self::SQ => "SQ",
            Self::SS => "SS",
            Self::ST => "ST",
            Self::TM => "TM",
            Self::UI => "UI",
            Self::UL => "UL",
            Self::UN => "UN",
            Self::US => "US",
            Self::UT => "UT",
        }
    }

    /// Whether values of this VR are character strings.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            Self::AE
                | Self::AS
                | Self::CS
                | Self::DA
                | Self::DS
                | Self::DT
                | Self::IS
                | Self::LO
                | Self::LT
                | Self::PN
                | Self::SH
                | Self::ST
                | Self::TM
                | Self::UI
                | Self::UT
        )
    }

    /// Whether string values are decoded through the Specific Character Set
    /// (0008,0005). The remaining string VRs use the default repertoire.
    #[must_use]
    pub const fn uses_specific_character_set(self) -> bool {
        matches!(
            self,
            Self::LO | Self::LT | Self::PN | Self::SH | Self::ST | Self::UT
        )
    }

    /// Whether the XML-shaped surface syntax transports this VR as base64
    /// text instead of Value elements.
    #[must_use]
    pub const fn is_inline_binary(self) -> bool {
        matches!(self, Self::OB | Self::OF | Self::OW | Self::UN)
    }

    /// Width in bytes of a single numeric value, for endian toggling.
    /// Width 1 means the byte order is not significant.
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::AT | Self::OW | Self::SS | Self::US => 2,
            Self::FL | Self::OF | Self::SL | Self::UL => 4,
            Self::FD => 8,
            _ => 1,
        }
    }

    /// Whether the explicit-VR wire form uses the 12-byte header with a
    /// reserved field and a 32-bit length.
    #[must_use]
    pub const fn requires_long_header(self) -> bool {
        matches!(
            self,
            Self::OB | Self::OF | Self::OW | Self::SQ | Self::UN | Self::UT
        )
    }

    /// Padding byte used to even out odd-length values.
    #[must_use]
    pub const fn padding(self) -> u8 {
        match self {
            Self::UI => 0,
            vr if vr.is_string() => b' ',
            _ => 0,
        }
    }

    /// Swap the byte order of every value in place. A no-op for VRs whose
    /// values are not endian-sensitive.
    pub fn toggle_endian(self, bytes: &mut [u8]) {
        match self.byte_width() {
            2 => {
                for pair in bytes.chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            width @ (4 | 8) => {
                for chunk in bytes.chunks_exact_mut(width) {
                    chunk.reverse();
                }
            }
            _ => {}
        }
    }

    /// Write a human-readable rendering of an encoded value into `out`,
    /// spending at most `max_chars` characters. Returns whether the complete
    /// rendering fit within the budget.
    ///
    /// Multi-valued content is separated by `\`. Used by the text dump; the
    /// rendering is not meant to round-trip.
    pub fn prompt_value(
        self,
        bytes: &[u8],
        big_endian: bool,
        charset: Option<&SpecificCharacterSet>,
        max_chars: usize,
        out: &mut String,
    ) -> bool {
        if self.is_string() {
            let decoded = match charset {
                Some(cs) if self.uses_specific_character_set() => cs.decode(bytes),
                _ => SpecificCharacterSet::default().decode(bytes),
            };
            let trimmed = decoded.trim_end_matches(['\0', ' ']);
            return push_bounded(trimmed, max_chars, out);
        }
        match self {
            Self::AT => prompt_each(bytes, 4, max_chars, out, |b| {
                let (group, element) = if big_endian {
                    (
                        u16::from_be_bytes([b[0], b[1]]),
                        u16::from_be_bytes([b[2], b[3]]),
                    )
                } else {
                    (
                        u16::from_le_bytes([b[0], b[1]]),
                        u16::from_le_bytes([b[2], b[3]]),
                    )
                };
                Tag::new(group, element).to_string()
            }),
            Self::FL | Self::OF => prompt_each(bytes, 4, max_chars, out, |b| {
                let bits = if big_endian {
                    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
                } else {
                    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
                };
                f32::from_bits(bits).to_string()
            }),
            Self::FD => prompt_each(bytes, 8, max_chars, out, |b| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(b);
                if big_endian {
                    f64::from_bits(u64::from_be_bytes(raw)).to_string()
                } else {
                    f64::from_bits(u64::from_le_bytes(raw)).to_string()
                }
            }),
            Self::SL => prompt_each(bytes, 4, max_chars, out, |b| {
                let raw = [b[0], b[1], b[2], b[3]];
                if big_endian {
                    i32::from_be_bytes(raw).to_string()
                } else {
                    i32::from_le_bytes(raw).to_string()
                }
            }),
            Self::UL => prompt_each(bytes, 4, max_chars, out, |b| {
                let raw = [b[0], b[1], b[2], b[3]];
                if big_endian {
                    u32::from_be_bytes(raw).to_string()
                } else {
                    u32::from_le_bytes(raw).to_string()
                }
            }),
            Self::SS => prompt_each(bytes, 2, max_chars, out, |b| {
                let raw = [b[0], b[1]];
                if big_endian {
                    i16::from_be_bytes(raw).to_string()
                } else {
                    i16::from_le_bytes(raw).to_string()
                }
            }),
            Self::OW | Self::US => prompt_each(bytes, 2, max_chars, out, |b| {
                let raw = [b[0], b[1]];
                if big_endian {
                    u16::from_be_bytes(raw).to_string()
                } else {
                    u16::from_le_bytes(raw).to_string()
                }
            }),
            _ => prompt_each(bytes, 1, max_chars, out, |b| b[0].to_string()),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Append `text` to `out` up to `max_chars` characters; reports whether the
/// whole text fit.
fn push_bounded(text: &str, max_chars: usize, out: &mut String) -> bool {
    for (count, ch) in text.chars().enumerate() {
        if count >= max_chars {
            return false;
        }
        out.push(ch);
    }
    true
}

/// Render fixed-width values `\`-separated within the character budget.
fn prompt_each(
    bytes: &[u8],
    width: usize,
    max_chars: usize,
    out: &mut String,
    render: impl Fn(&[u8]) -> String,
) -> bool {
    let mut remaining = max_chars;
    let mut first = true;
    for chunk in bytes.chunks_exact(width) {
        let value = render(chunk);
        let needed = value.chars().count() + usize::from(!first);
        if needed > remaining {
            if !first && remaining > 0 {
                out.push('\\');
                remaining -= 1;
            }
            for ch in value.chars().take(remaining) {
                out.push(ch);
            }
            return false;
        }
        if !first {
            out.push('\\');
        }
        out.push_str(&value);
        remaining -= needed;
        first = false;
    }
    true
}
