//! Binary DICOM stream reader.
//!
//! Reads a part-10 stream: optional 128-byte preamble plus `DICM` marker,
//! the file-meta group in explicit VR little endian, then the main data set
//! in the transfer syntax named by (0002,0010). Streams without a preamble
//! are probed from their first element header.
//!
//! The reader is pull-driven: [`read_attributes`](DicomReader::read_attributes)
//! parses one header at a time and hands control to an
//! [`InputHandler`](crate::handler::InputHandler), which may delegate back
//! for the default store behavior.

use std::io::{BufReader, Read};

use tracing::debug;

use dicom_model::{
    Attributes, DicomError, ElementDictionary, Fragments, Result, Sequence, Tag, VR, Value, tags,
};

use crate::handler::InputHandler;

/// Wire marker for undefined (delimited) lengths.
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

const TS_IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
const TS_EXPLICIT_VR_BE: &str = "1.2.840.10008.1.2.2";
const TS_DEFLATED_LE: &str = "1.2.840.10008.1.2.1.99";

const PREAMBLE_LEN: usize = 128;
const HEADER_LEN: usize = 8;

/// Pull-decoder over a binary DICOM stream.
pub struct DicomReader<R: Read> {
    source: BufReader<R>,
    /// Replay buffer for probed or unread bytes, consumed before `source`.
    front: Vec<u8>,
    front_pos: usize,
    pos: u64,
    preamble: Option<Vec<u8>>,
    dictionary: ElementDictionary,
    explicit_vr: bool,
    big_endian: bool,
    in_file_meta: bool,
    transfer_syntax: Option<String>,
    /// Current element header.
    tag: Tag,
    vr: Option<VR>,
    length: u32,
    level: usize,
    tag_position: u64,
}

impl<R: Read> DicomReader<R> {
    /// Open a reader over a binary DICOM stream, consuming the preamble and
    /// probing the encoding.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = Self {
            source: BufReader::new(source),
            front: Vec::new(),
            front_pos: 0,
            pos: 0,
            preamble: None,
            dictionary: ElementDictionary::new(),
            explicit_vr: true,
            big_endian: false,
            in_file_meta: false,
            transfer_syntax: None,
            tag: Tag::default(),
            vr: None,
            length: 0,
            level: 0,
            tag_position: 0,
        };
        reader.probe()?;
        Ok(reader)
    }

    /// The 128-byte preamble, when the stream carried one.
    #[must_use]
    pub fn preamble(&self) -> Option<&[u8]> {
        self.preamble.as_deref()
    }

    /// Tag of the current element header.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// VR of the current element header; `None` for delimitation items and
    /// unresolvable implicit elements.
    #[must_use]
    pub fn vr(&self) -> Option<VR> {
        self.vr
    }

    /// Value length of the current element header; [`UNDEFINED_LENGTH`]
    /// marks delimited content.
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Sequence nesting level of the current element.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Byte position at which the current element header started.
    #[must_use]
    pub fn tag_position(&self) -> u64 {
        self.tag_position
    }

    /// Byte order of the active transfer syntax.
    #[must_use]
    pub fn big_endian(&self) -> bool {
        self.big_endian
    }

    /// Transfer syntax collected from the file-meta group, when present.
    #[must_use]
    pub fn transfer_syntax(&self) -> Option<&str> {
        self.transfer_syntax.as_deref()
    }

    /// Read elements into `attrs`, calling the handler once per header.
    /// Stops at the byte `limit` when given, at end of stream, at an item
    /// delimitation (closing an undefined-length item), or when the handler
    /// signals stop.
    pub fn read_attributes<H: InputHandler<R>>(
        &mut self,
        attrs: &mut Attributes,
        limit: Option<u64>,
        handler: &mut H,
    ) -> Result<()> {
        let end = limit.map(|len| self.pos + len);
        loop {
            if let Some(end) = end
                && self.pos >= end
            {
                break;
            }
            if !self.read_header()? {
                if end.is_some() {
                    return Err(DicomError::malformed("unexpected end of stream"));
                }
                break;
            }
            if self.tag == tags::ITEM_DELIMITATION_ITEM {
                break;
            }
            if !handler.read_value(self, attrs)? {
                break;
            }
        }
        Ok(())
    }

    /// Default consumption of the current element: sequences recurse through
    /// the handler, delimited binary collects fragments, plain values are
    /// stored raw (stream byte order) into `attrs`.
    pub fn read_value_into<H: InputHandler<R>>(
        &mut self,
        attrs: &mut Attributes,
        handler: &mut H,
    ) -> Result<bool> {
        let tag = self.tag;
        match self.vr {
            Some(VR::SQ) => {
                let mut sequence = Sequence::with_capacity(4);
                let proceed = self.read_sequence_items(&mut sequence, handler)?;
                sequence.trim_to_size();
                attrs.set_value(tag, None, VR::SQ, Value::Sequence(sequence));
                Ok(proceed)
            }
            Some(vr) if self.length == UNDEFINED_LENGTH => {
                let mut fragments = Fragments::with_capacity(vr, 4);
                let proceed = self.read_fragment_items(&mut fragments, handler)?;
                fragments.trim_to_size();
                attrs.set_value(tag, None, vr, Value::Fragments(fragments));
                Ok(proceed)
            }
            _ => {
                let bytes = self.read_value_bytes()?;
                let vr = self.vr.unwrap_or(VR::UN);
                attrs.set_value(tag, None, vr, Value::Bytes(bytes));
                Ok(true)
            }
        }
    }

    /// Default consumption of the current sequence item header.
    pub fn read_item_into<H: InputHandler<R>>(
        &mut self,
        sequence: &mut Sequence,
        handler: &mut H,
    ) -> Result<bool> {
        let limit = (self.length != UNDEFINED_LENGTH).then(|| u64::from(self.length));
        let mut item = Attributes::with_endianness(self.big_endian);
        self.read_attributes(&mut item, limit, handler)?;
        item.trim_to_size();
        sequence.push(item);
        Ok(true)
    }

    /// Default consumption of the current fragment item header.
    pub fn read_fragment_into(&mut self, fragments: &mut Fragments) -> Result<bool> {
        let bytes = self.read_value_bytes()?;
        fragments.push(Value::Bytes(bytes));
        Ok(true)
    }

    /// Read the current element's value bytes.
    pub fn read_value_bytes(&mut self) -> Result<Vec<u8>> {
        if self.length == UNDEFINED_LENGTH {
            return Err(DicomError::malformed(format!(
                "{} has no defined value length",
                self.tag
            )));
        }
        let mut bytes = vec![0u8; self.length as usize];
        self.read_exact_value(&mut bytes)?;
        if self.in_file_meta && self.tag == tags::TRANSFER_SYNTAX_UID {
            let text = String::from_utf8_lossy(&bytes);
            self.transfer_syntax = Some(text.trim_end_matches(['\0', ' ']).to_owned());
        }
        Ok(bytes)
    }

    /// Read exactly `buf.len()` value bytes, for handlers consuming the
    /// value themselves.
    pub fn read_exact_value(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let read = self.read_some(&mut buf[filled..])?;
            if read == 0 {
                return Err(DicomError::malformed("unexpected end of stream"));
            }
            filled += read;
        }
        Ok(())
    }

    fn read_sequence_items<H: InputHandler<R>>(
        &mut self,
        sequence: &mut Sequence,
        handler: &mut H,
    ) -> Result<bool> {
        let end =
            (self.length != UNDEFINED_LENGTH).then(|| self.pos + u64::from(self.length));
        self.level += 1;
        let mut proceed = true;
        loop {
            if let Some(end) = end
                && self.pos >= end
            {
                break;
            }
            if !self.read_header()? {
                self.level -= 1;
                return Err(DicomError::malformed("unexpected end of stream in sequence"));
            }
            if self.tag == tags::SEQUENCE_DELIMITATION_ITEM {
                break;
            }
            if self.tag != tags::ITEM {
                self.level -= 1;
                return Err(DicomError::malformed(format!(
                    "unexpected {} where an item was required",
                    self.tag
                )));
            }
            if !handler.read_sequence_value(self, sequence)? {
                proceed = false;
                break;
            }
        }
        self.level -= 1;
        Ok(proceed)
    }

    fn read_fragment_items<H: InputHandler<R>>(
        &mut self,
        fragments: &mut Fragments,
        handler: &mut H,
    ) -> Result<bool> {
        self.level += 1;
        let mut proceed = true;
        loop {
            if !self.read_header()? {
                self.level -= 1;
                return Err(DicomError::malformed(
                    "unexpected end of stream in fragment list",
                ));
            }
            if self.tag == tags::SEQUENCE_DELIMITATION_ITEM {
                break;
            }
            if self.tag != tags::ITEM {
                self.level -= 1;
                return Err(DicomError::malformed(format!(
                    "unexpected {} where a fragment was required",
                    self.tag
                )));
            }
            if !handler.read_fragments_value(self, fragments)? {
                proceed = false;
                break;
            }
        }
        self.level -= 1;
        Ok(proceed)
    }

    /// Read the next element header. Returns false at a clean end of stream.
    fn read_header(&mut self) -> Result<bool> {
        self.tag_position = self.pos;
        let mut header = [0u8; HEADER_LEN];
        if !self.try_fill_header(&mut header)? {
            return Ok(false);
        }
        if self.in_file_meta {
            // The file-meta group ends at the first non-0002 header.
            let group = u16::from_le_bytes([header[0], header[1]]);
            if group != 0x0002 {
                self.unread(&header);
                self.in_file_meta = false;
                self.switch_transfer_syntax()?;
                return self.read_header();
            }
        }
        let (group, element) = if self.big_endian {
            (
                u16::from_be_bytes([header[0], header[1]]),
                u16::from_be_bytes([header[2], header[3]]),
            )
        } else {
            (
                u16::from_le_bytes([header[0], header[1]]),
                u16::from_le_bytes([header[2], header[3]]),
            )
        };
        self.tag = Tag::new(group, element);
        if group == 0xFFFE {
            self.vr = None;
            self.length = self.read_u32(&header[4..8]);
            return Ok(true);
        }
        if self.explicit_vr || self.in_file_meta {
            let code = std::str::from_utf8(&header[4..6])
                .map_err(|_| self.bad_vr_code(&header[4..6]))?;
            let vr = VR::from_code(code).map_err(|_| self.bad_vr_code(&header[4..6]))?;
            if vr.requires_long_header() {
                let mut length = [0u8; 4];
                self.read_exact_value(&mut length)?;
                self.length = self.read_u32(&length);
            } else {
                self.length = u32::from(if self.big_endian {
                    u16::from_be_bytes([header[6], header[7]])
                } else {
                    u16::from_le_bytes([header[6], header[7]])
                });
            }
            // Undefined-length UN is parsed as an implicit sequence.
            self.vr = if vr == VR::UN && self.length == UNDEFINED_LENGTH {
                Some(VR::SQ)
            } else {
                Some(vr)
            };
        } else {
            self.length = self.read_u32(&header[4..8]);
            self.vr = self.dictionary.vr_of(self.tag, None).ok();
            if self.length == UNDEFINED_LENGTH && self.tag != tags::PIXEL_DATA {
                self.vr = Some(VR::SQ);
            }
        }
        Ok(true)
    }

    fn bad_vr_code(&self, code: &[u8]) -> DicomError {
        DicomError::malformed(format!(
            "invalid VR code {:02X?} for {} at offset {}",
            code, self.tag, self.tag_position
        ))
    }

    fn read_u32(&self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        }
    }

    fn switch_transfer_syntax(&mut self) -> Result<()> {
        let ts = self.transfer_syntax.as_deref().unwrap_or_default();
        match ts {
            TS_IMPLICIT_VR_LE => {
                self.explicit_vr = false;
                self.big_endian = false;
            }
            TS_EXPLICIT_VR_BE => {
                self.explicit_vr = true;
                self.big_endian = true;
            }
            TS_DEFLATED_LE => {
                return Err(DicomError::malformed(
                    "deflated transfer syntax is not supported",
                ));
            }
            // Encapsulated syntaxes all use explicit VR little endian.
            _ => {
                self.explicit_vr = true;
                self.big_endian = false;
            }
        }
        debug!(
            transfer_syntax = ts,
            explicit_vr = self.explicit_vr,
            big_endian = self.big_endian,
            "leaving file meta group"
        );
        Ok(())
    }

    /// Consume the preamble if present, otherwise probe the first header to
    /// guess the encoding of a headerless stream.
    fn probe(&mut self) -> Result<()> {
        let mut head = vec![0u8; PREAMBLE_LEN + 4];
        let mut filled = 0;
        while filled < head.len() {
            let read = self.source.read(&mut head[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        head.truncate(filled);
        if filled == PREAMBLE_LEN + 4 && &head[PREAMBLE_LEN..] == b"DICM" {
            self.preamble = Some(head[..PREAMBLE_LEN].to_vec());
            self.pos = (PREAMBLE_LEN + 4) as u64;
            self.in_file_meta = true;
            self.explicit_vr = true;
            return Ok(());
        }
        // No preamble: replay the probed bytes as data.
        self.front = head;
        if self.front.len() >= HEADER_LEN {
            let group = u16::from_le_bytes([self.front[0], self.front[1]]);
            if group == 0x0002 {
                self.in_file_meta = true;
                self.explicit_vr = true;
            } else {
                let code = &self.front[4..6];
                self.explicit_vr = std::str::from_utf8(code)
                    .is_ok_and(|code| VR::from_code(code).is_ok());
            }
        }
        Ok(())
    }

    fn try_fill_header(&mut self, header: &mut [u8; HEADER_LEN]) -> Result<bool> {
        let read = self.read_some(&mut header[..])?;
        if read == 0 {
            return Ok(false);
        }
        let mut filled = read;
        while filled < HEADER_LEN {
            let read = self.read_some(&mut header[filled..])?;
            if read == 0 {
                return Err(DicomError::malformed("truncated element header"));
            }
            filled += read;
        }
        Ok(true)
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.front_pos < self.front.len() {
            let take = buf.len().min(self.front.len() - self.front_pos);
            buf[..take].copy_from_slice(&self.front[self.front_pos..self.front_pos + take]);
            self.front_pos += take;
            self.pos += take as u64;
            return Ok(take);
        }
        let read = self.source.read(buf)?;
        self.pos += read as u64;
        Ok(read)
    }

    fn unread(&mut self, bytes: &[u8]) {
        let mut rebuilt = bytes.to_vec();
        rebuilt.extend_from_slice(&self.front[self.front_pos..]);
        self.front = rebuilt;
        self.front_pos = 0;
        self.pos -= bytes.len() as u64;
    }
}
