//! Incremental base64 decoding across arbitrary chunk boundaries.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::borrow::Cow;

use dicom_model::{DicomError, Result};

/// Accumulates base64 source text whose chunk boundaries never align with
/// the 4-character decode groups.
///
/// Each `feed` first completes any pending carry group, then decodes all
/// remaining full groups in one pass and re-buffers the new remainder. The
/// carry persists only across feeds within one base64 run; callers clear it
/// whenever a new run begins. ASCII whitespace in the source text is
/// insignificant.
#[derive(Debug, Default)]
pub(crate) struct Base64Accumulator {
    carry: [u8; 4],
    carry_len: usize,
}

impl Base64Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any pending carry characters.
    pub fn clear(&mut self) {
        self.carry_len = 0;
    }

    /// Whether no source characters are pending.
    pub fn is_empty(&self) -> bool {
        self.carry_len == 0
    }

    /// Decode a chunk of source text, appending the decoded bytes to `out`.
    pub fn feed(&mut self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        let bytes = text.as_bytes();
        let filtered: Cow<'_, [u8]> = if bytes.iter().any(u8::is_ascii_whitespace) {
            Cow::Owned(
                bytes
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect(),
            )
        } else {
            Cow::Borrowed(bytes)
        };
        let mut src = filtered.as_ref();

        if self.carry_len > 0 {
            let take = (4 - self.carry_len).min(src.len());
            self.carry[self.carry_len..self.carry_len + take].copy_from_slice(&src[..take]);
            self.carry_len += take;
            src = &src[take..];
            if self.carry_len < 4 {
                return Ok(());
            }
            decode_groups(&self.carry, out)?;
            self.carry_len = 0;
        }

        let full = src.len() & !3;
        decode_groups(&src[..full], out)?;

        let remainder = &src[full..];
        self.carry[..remainder.len()].copy_from_slice(remainder);
        self.carry_len = remainder.len();
        Ok(())
    }
}

fn decode_groups(src: &[u8], out: &mut Vec<u8>) -> Result<()> {
    if src.is_empty() {
        return Ok(());
    }
    let decoded = STANDARD
        .decode(src)
        .map_err(|err| DicomError::malformed(format!("invalid base64 group: {err}")))?;
    out.extend_from_slice(&decoded);
    Ok(())
}
