//! The text dump formatter: one line per element.
//!
//! Each line carries the byte offset of the element header, one `>` per
//! nesting level, the tag, VR, value length, a width-bounded value rendering
//! and the dictionary keyword:
//!
//! ```text
//! 152: (0008,0060) CS #2 [MR] Modality
//! ```

use std::fmt::Write as _;
use std::io::{Read, Write};

use dicom_io::{DicomReader, InputHandler, UNDEFINED_LENGTH};
use dicom_model::{Attributes, DicomError, ElementDictionary, Fragments, Result, Sequence, Tag, VR, tags};

/// Default number of characters per output line.
pub const DEFAULT_WIDTH: usize = 78;
/// Smallest usable line width; narrower configurations are rejected before
/// any output is produced.
pub const MIN_WIDTH: usize = 40;

/// Streaming text dump over a binary pull-decoder.
#[derive(Debug)]
pub struct Dcm2Txt<W: Write> {
    width: usize,
    first: bool,
    dictionary: ElementDictionary,
    out: W,
}

impl<W: Write> Dcm2Txt<W> {
    /// Dump with the default line width.
    pub fn new(out: W) -> Self {
        Self {
            width: DEFAULT_WIDTH,
            first: true,
            dictionary: ElementDictionary::new(),
            out,
        }
    }

    /// Dump with an explicit line width; widths below [`MIN_WIDTH`] are a
    /// configuration error.
    pub fn with_width(out: W, width: usize) -> Result<Self> {
        if width < MIN_WIDTH {
            return Err(DicomError::configuration(format!(
                "line width must be at least {MIN_WIDTH}, got {width}"
            )));
        }
        let mut dump = Self::new(out);
        dump.width = width;
        Ok(dump)
    }

    /// Configured line width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Read a binary DICOM stream and write one line per element.
    pub fn parse<R: Read>(&mut self, input: R) -> Result<()> {
        let mut reader = DicomReader::new(input)?;
        let mut attrs = Attributes::new();
        reader.read_attributes(&mut attrs, None, self)
    }

    fn prompt_preamble(&mut self, preamble: &[u8]) -> Result<()> {
        let mut line = String::with_capacity(self.width);
        line.push_str("0: [");
        if VR::OB.prompt_value(preamble, false, None, self.width - 5, &mut line) {
            line.push(']');
        }
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn append_prefix<R: Read>(reader: &DicomReader<R>, line: &mut String) {
        let _ = write!(line, "{}: ", reader.tag_position());
        for _ in 0..reader.level() {
            line.push('>');
        }
    }

    fn append_header<R: Read>(reader: &DicomReader<R>, line: &mut String) {
        let _ = write!(line, "{} ", reader.tag());
        if let Some(vr) = reader.vr() {
            let _ = write!(line, "{vr} ");
        }
        if reader.length() == UNDEFINED_LENGTH {
            line.push_str("#-1");
        } else {
            let _ = write!(line, "#{}", reader.length());
        }
    }

    fn append_keyword(&self, tag: Tag, line: &mut String) {
        line.push(' ');
        line.push_str(self.dictionary.keyword_of(tag, None));
        if line.chars().count() > self.width {
            *line = line.chars().take(self.width).collect();
        }
    }

    fn value_budget(&self, line: &str) -> usize {
        self.width.saturating_sub(line.chars().count() + 1)
    }
}

impl<R: Read, W: Write> InputHandler<R> for Dcm2Txt<W> {
    fn read_value(&mut self, reader: &mut DicomReader<R>, attrs: &mut Attributes) -> Result<bool> {
        if self.first {
            self.first = false;
            if let Some(preamble) = reader.preamble() {
                let preamble = preamble.to_vec();
                self.prompt_preamble(&preamble)?;
            }
        }
        let mut line = String::with_capacity(self.width + 30);
        Self::append_prefix(reader, &mut line);
        Self::append_header(reader, &mut line);
        let vr = reader.vr();
        if vr.is_none() || vr == Some(VR::SQ) || reader.length() == UNDEFINED_LENGTH {
            self.append_keyword(reader.tag(), &mut line);
            writeln!(self.out, "{line}")?;
            return reader.read_value_into(attrs, self);
        }
        let tag = reader.tag();
        let vr = vr.expect("checked above");
        reader.read_value_into(attrs, self)?;
        line.push_str(" [");
        let budget = self.value_budget(&line);
        let charset = attrs.specific_character_set();
        let fit = vr.prompt_value(
            attrs.bytes_of(tag, None).unwrap_or(&[]),
            reader.big_endian(),
            Some(&charset),
            budget,
            &mut line,
        );
        if fit {
            line.push(']');
            self.append_keyword(tag, &mut line);
        }
        writeln!(self.out, "{line}")?;
        // Keep only what later elements need for decoding and display.
        match tag {
            tags::FILE_META_INFORMATION_GROUP_LENGTH
            | tags::TRANSFER_SYNTAX_UID
            | tags::SPECIFIC_CHARACTER_SET => {}
            tag if !tag.is_private_creator() => {
                attrs.remove(tag, None);
            }
            _ => {}
        }
        Ok(true)
    }

    fn read_sequence_value(
        &mut self,
        reader: &mut DicomReader<R>,
        sequence: &mut Sequence,
    ) -> Result<bool> {
        let mut line = String::with_capacity(self.width);
        Self::append_prefix(reader, &mut line);
        Self::append_header(reader, &mut line);
        self.append_keyword(reader.tag(), &mut line);
        writeln!(self.out, "{line}")?;
        reader.read_item_into(sequence, self)
    }

    fn read_fragments_value(
        &mut self,
        reader: &mut DicomReader<R>,
        fragments: &mut Fragments,
    ) -> Result<bool> {
        let mut line = String::with_capacity(self.width + 20);
        Self::append_prefix(reader, &mut line);
        Self::append_header(reader, &mut line);
        let mut bytes = vec![0u8; reader.length() as usize];
        reader.read_exact_value(&mut bytes)?;
        line.push_str(" [");
        let budget = self.value_budget(&line);
        if fragments
            .vr()
            .prompt_value(&bytes, reader.big_endian(), None, budget, &mut line)
        {
            line.push(']');
            self.append_keyword(reader.tag(), &mut line);
        }
        writeln!(self.out, "{line}")?;
        Ok(true)
    }
}
