//! The streaming data-set decoder.
//!
//! Consumes a forward-only stream of structural events shaped like the DICOM
//! native XML model and incrementally builds an [`Attributes`] tree. A
//! single forward pass either produces a structurally valid tree or fails
//! deterministically; no lookahead, no backtracking, no partial-attribute
//! recovery.

use dicom_model::{
    Attributes, BulkDataLocator, DicomError, ElementDictionary, Fragments, NameComponent,
    NameGroup, PersonName, Result, Sequence, Tag, VR, Value, pad_to_length,
};
use tracing::trace;

use crate::base64::Base64Accumulator;
use crate::name::ElementName;

/// Attributes carried by an opening structural event: a hex tag with
/// optional private creator and VR code on attribute-open, a 1-based decimal
/// index on item/value/person-name/fragment-open.
#[derive(Debug, Default)]
pub struct StartAttributes {
    pub tag: Option<String>,
    pub private_creator: Option<String>,
    pub vr: Option<String>,
    pub number: Option<String>,
}

impl StartAttributes {
    fn number(&self) -> Result<usize> {
        let text = self
            .number
            .as_deref()
            .ok_or_else(|| DicomError::malformed("missing number attribute"))?;
        match text.trim().parse::<usize>() {
            Ok(number) if number >= 1 => Ok(number),
            _ => Err(DicomError::malformed(format!(
                "invalid number attribute: {text:?}"
            ))),
        }
    }
}

/// A sequence under construction. The tag is captured at open time so that
/// nested attributes cannot clobber it before the matching close.
#[derive(Debug)]
struct PendingSequence {
    tag: Tag,
    private_creator: Option<String>,
    sequence: Sequence,
}

/// A fragment list under construction.
#[derive(Debug)]
struct PendingFragments {
    tag: Tag,
    private_creator: Option<String>,
    fragments: Fragments,
}

/// What the accumulated content currently belongs to.
#[derive(Debug, Default)]
enum Scratch {
    #[default]
    Plain,
    PersonName {
        name: PersonName,
        group: NameGroup,
    },
    Locator(LocatorScratch),
}

#[derive(Debug, Default)]
struct LocatorScratch {
    uri: String,
    transfer_syntax: String,
    offset: u64,
    length: u32,
}

/// The value an attribute resolves to at close time.
enum Finalized {
    Locator(BulkDataLocator),
    Bytes(Vec<u8>),
    Strings(Vec<Option<String>>),
}

/// Streaming decoder building an attribute tree from structural events.
///
/// Attributes tagged in the reserved file-meta group are routed into a
/// second, lazily created top-level [`Attributes`], never nested under a
/// sequence item, regardless of where in the event stream they appear.
///
/// A decoder instance decodes one event stream and is not reusable.
#[derive(Debug)]
pub struct DatasetDecoder {
    dictionary: ElementDictionary,
    big_endian: bool,
    file_meta: Option<Attributes>,
    /// Open attribute-set contexts; index 0 is the decode root.
    items: Vec<Attributes>,
    /// Open sequences, innermost last.
    sequences: Vec<PendingSequence>,
    /// Scratch fields for the in-progress attribute.
    tag: Tag,
    private_creator: Option<String>,
    vr: VR,
    base64: bool,
    scratch: Scratch,
    text: String,
    binary: Vec<u8>,
    carry: Base64Accumulator,
    values: Vec<Option<String>>,
    pending_locator: Option<BulkDataLocator>,
    fragments: Option<PendingFragments>,
}

impl DatasetDecoder {
    /// Decoder seeded with the caller-supplied root attribute set.
    #[must_use]
    pub fn new(root: Attributes) -> Self {
        Self::with_dictionary(root, ElementDictionary::new())
    }

    /// Decoder resolving implicit VRs through the given dictionary.
    #[must_use]
    pub fn with_dictionary(root: Attributes, dictionary: ElementDictionary) -> Self {
        let big_endian = root.big_endian();
        Self {
            dictionary,
            big_endian,
            file_meta: None,
            items: vec![root],
            sequences: Vec::new(),
            tag: Tag::default(),
            private_creator: None,
            vr: VR::UN,
            base64: false,
            scratch: Scratch::Plain,
            text: String::with_capacity(64),
            binary: Vec::with_capacity(64),
            carry: Base64Accumulator::new(),
            values: Vec::new(),
            pending_locator: None,
            fragments: None,
        }
    }

    /// The file-meta attribute set, once a group-0002 attribute has been
    /// finalized.
    #[must_use]
    pub fn file_meta_information(&self) -> Option<&Attributes> {
        self.file_meta.as_ref()
    }

    /// Tear down into the decoded root and the optional file-meta set.
    #[must_use]
    pub fn into_parts(self) -> (Attributes, Option<Attributes>) {
        let root = self
            .items
            .into_iter()
            .next()
            .expect("decoder is seeded with a root context");
        (root, self.file_meta)
    }

    /// An element has been opened.
    pub fn element_start(&mut self, name: &str, attributes: &StartAttributes) -> Result<()> {
        match ElementName::parse(name) {
            Some(ElementName::DicomAttribute) => self.start_attribute(attributes)?,
            Some(ElementName::Item) => self.start_item(attributes.number()?)?,
            Some(ElementName::Value) => self.start_value(attributes.number()?),
            Some(ElementName::PersonName) => self.start_person_name(attributes.number()?),
            Some(ElementName::Alphabetic) => self.select_name_group(NameGroup::Alphabetic)?,
            Some(ElementName::Ideographic) => self.select_name_group(NameGroup::Ideographic)?,
            Some(ElementName::Phonetic) => self.select_name_group(NameGroup::Phonetic)?,
            Some(ElementName::BulkDataLocator) => {
                self.scratch = Scratch::Locator(LocatorScratch::default());
                self.base64 = false;
            }
            Some(ElementName::DataFragment) => self.start_fragment(attributes.number()?)?,
            Some(_) | None => {}
        }
        self.text.clear();
        self.binary.clear();
        Ok(())
    }

    /// A chunk of character content has arrived. Base64 runs tolerate chunk
    /// boundaries misaligned with the 4-character decode groups.
    pub fn character_data(&mut self, chunk: &str) -> Result<()> {
        if self.base64 {
            self.carry.feed(chunk, &mut self.binary)
        } else {
            self.text.push_str(chunk);
            Ok(())
        }
    }

    /// An element has been closed.
    pub fn element_end(&mut self, name: &str) -> Result<()> {
        match ElementName::parse(name) {
            Some(ElementName::DicomAttribute) => self.end_attribute()?,
            Some(ElementName::Item) => self.end_item()?,
            Some(ElementName::Value) => self.end_value(),
            Some(ElementName::PersonName) => self.end_person_name()?,
            Some(ElementName::FamilyName) => self.end_name_component(NameComponent::FamilyName)?,
            Some(ElementName::GivenName) => self.end_name_component(NameComponent::GivenName)?,
            Some(ElementName::MiddleName) => self.end_name_component(NameComponent::MiddleName)?,
            Some(ElementName::NamePrefix) => self.end_name_component(NameComponent::NamePrefix)?,
            Some(ElementName::NameSuffix) => self.end_name_component(NameComponent::NameSuffix)?,
            Some(ElementName::BulkDataLocator) => self.end_locator()?,
            Some(ElementName::DataFragment) => self.end_fragment()?,
            Some(ElementName::Uri) => {
                let text = std::mem::take(&mut self.text);
                self.locator_scratch("URI")?.uri = text;
            }
            Some(ElementName::TransferSyntax) => {
                let text = std::mem::take(&mut self.text);
                self.locator_scratch("TransferSyntax")?.transfer_syntax = text;
            }
            Some(ElementName::Offset) => {
                let offset = parse_number::<u64>(&self.text, "Offset")?;
                self.locator_scratch("Offset")?.offset = offset;
            }
            Some(ElementName::Length) => {
                let length = parse_number::<u32>(&self.text, "Length")?;
                self.locator_scratch("Length")?.length = length;
            }
            Some(
                ElementName::Alphabetic | ElementName::Ideographic | ElementName::Phonetic,
            )
            | None => {}
        }
        Ok(())
    }

    /// The event stream has ended; compacts the finished tree.
    pub fn document_end(&mut self) -> Result<()> {
        if self.items.len() != 1 || !self.sequences.is_empty() {
            return Err(DicomError::structural(
                "document ended with unclosed items or sequences",
            ));
        }
        if let Some(file_meta) = &mut self.file_meta {
            file_meta.trim_to_size();
        }
        self.items[0].trim_to_size();
        Ok(())
    }

    fn start_attribute(&mut self, attributes: &StartAttributes) -> Result<()> {
        let tag = Tag::from_hex(
            attributes
                .tag
                .as_deref()
                .ok_or_else(|| DicomError::malformed("DicomAttribute without tag"))?,
        )?;
        self.tag = tag;
        self.private_creator = attributes.private_creator.clone();
        self.vr = match attributes.vr.as_deref() {
            Some(code) => VR::from_code(code)?,
            None => self
                .dictionary
                .vr_of(tag, self.private_creator.as_deref())?,
        };
        trace!(%tag, vr = %self.vr, "attribute open");
        if self.vr == VR::SQ {
            self.sequences.push(PendingSequence {
                tag,
                private_creator: self.private_creator.clone(),
                sequence: Sequence::with_capacity(10),
            });
        } else {
            self.base64 = self.vr.is_inline_binary();
            if self.base64 {
                self.carry.clear();
            }
        }
        Ok(())
    }

    fn start_item(&mut self, number: usize) -> Result<()> {
        let big_endian = self.big_endian;
        let pending = self
            .sequences
            .last_mut()
            .ok_or_else(|| DicomError::structural("Item outside of an open sequence"))?;
        let len = pending.sequence.len();
        if number < len {
            return Err(DicomError::structural(format!(
                "item number {number} after item {len} already closed"
            )));
        }
        let item = if number == len {
            // Reopening the most recently closed item.
            pending
                .sequence
                .take_last()
                .expect("number >= 1 implies a closed item exists")
        } else {
            pending.sequence.ensure_len(number - 1, big_endian);
            Attributes::with_endianness(big_endian)
        };
        self.items.push(item);
        Ok(())
    }

    fn start_value(&mut self, number: usize) {
        pad_to_length(&mut self.values, number - 1, || None);
    }

    fn start_person_name(&mut self, number: usize) {
        self.start_value(number);
        self.scratch = Scratch::PersonName {
            name: PersonName::new(),
            group: NameGroup::Alphabetic,
        };
    }

    fn select_name_group(&mut self, selected: NameGroup) -> Result<()> {
        match &mut self.scratch {
            Scratch::PersonName { group, .. } => {
                *group = selected;
                Ok(())
            }
            _ => Err(DicomError::structural(
                "name group outside of an open PersonName",
            )),
        }
    }

    fn start_fragment(&mut self, number: usize) -> Result<()> {
        let pending = self.fragments.get_or_insert_with(|| PendingFragments {
            tag: self.tag,
            private_creator: self.private_creator.clone(),
            fragments: Fragments::with_capacity(self.vr, 10),
        });
        if number <= pending.fragments.len() {
            return Err(DicomError::structural(format!(
                "fragment number {number} after fragment {} already closed",
                pending.fragments.len()
            )));
        }
        pending.fragments.ensure_len(number - 1);
        self.base64 = true;
        self.carry.clear();
        Ok(())
    }

    fn end_attribute(&mut self) -> Result<()> {
        if self.vr == VR::SQ {
            let pending = self
                .sequences
                .pop()
                .ok_or_else(|| DicomError::structural("sequence close without open sequence"))?;
            let mut sequence = pending.sequence;
            sequence.trim_to_size();
            self.items
                .last_mut()
                .expect("context stack is seeded with the root")
                .set_value(
                    pending.tag,
                    pending.private_creator.as_deref(),
                    VR::SQ,
                    Value::Sequence(sequence),
                );
            return Ok(());
        }
        if let Some(pending) = self.fragments.take() {
            let mut fragments = pending.fragments;
            fragments.trim_to_size();
            let vr = fragments.vr();
            self.items
                .last_mut()
                .expect("context stack is seeded with the root")
                .set_value(
                    pending.tag,
                    pending.private_creator.as_deref(),
                    vr,
                    Value::Fragments(fragments),
                );
            return Ok(());
        }
        let tag = self.tag;
        let vr = self.vr;
        let private_creator = self.private_creator.take();
        // Finalized-value precedence: locator > decoded bytes > string list.
        let finalized = if let Some(locator) = self.pending_locator.take() {
            self.values.clear();
            self.binary.clear();
            Finalized::Locator(locator)
        } else if self.base64 {
            Finalized::Bytes(self.take_bytes()?)
        } else {
            Finalized::Strings(std::mem::take(&mut self.values))
        };
        let target = if tag.is_file_meta_information() {
            self.file_meta.get_or_insert_with(Attributes::new)
        } else {
            self.items
                .last_mut()
                .expect("context stack is seeded with the root")
        };
        match finalized {
            Finalized::Locator(locator) => {
                target.set_bulk_data(tag, private_creator.as_deref(), vr, locator);
            }
            Finalized::Bytes(bytes) => {
                target.set_bytes(tag, private_creator.as_deref(), vr, bytes);
            }
            Finalized::Strings(values) => {
                target.set_strings(tag, private_creator.as_deref(), vr, values);
            }
        }
        Ok(())
    }

    fn end_item(&mut self) -> Result<()> {
        if self.items.len() <= 1 {
            return Err(DicomError::structural("Item close without open item"));
        }
        let mut item = self.items.pop().expect("length checked above");
        item.trim_to_size();
        self.sequences
            .last_mut()
            .ok_or_else(|| DicomError::structural("Item close without open sequence"))?
            .sequence
            .push(item);
        // The scratch VR is reused while items decode; restore it so the
        // enclosing attribute-close still routes as a sequence.
        self.vr = VR::SQ;
        Ok(())
    }

    fn end_value(&mut self) {
        // Base64 runs are committed wholesale at attribute-close.
        if !self.base64 {
            self.values.push(Some(std::mem::take(&mut self.text)));
        }
    }

    fn end_person_name(&mut self) -> Result<()> {
        match std::mem::take(&mut self.scratch) {
            Scratch::PersonName { name, .. } => {
                self.values.push(Some(name.to_string()));
                Ok(())
            }
            other => {
                self.scratch = other;
                Err(DicomError::structural(
                    "PersonName close without open PersonName",
                ))
            }
        }
    }

    fn end_name_component(&mut self, component: NameComponent) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        match &mut self.scratch {
            Scratch::PersonName { name, group } => {
                name.set(*group, component, text);
                Ok(())
            }
            _ => Err(DicomError::structural(
                "name component outside of an open PersonName",
            )),
        }
    }

    fn end_locator(&mut self) -> Result<()> {
        match std::mem::take(&mut self.scratch) {
            Scratch::Locator(locator) => {
                self.pending_locator = Some(BulkDataLocator::new(
                    locator.uri,
                    locator.transfer_syntax,
                    locator.offset,
                    locator.length,
                ));
                Ok(())
            }
            other => {
                self.scratch = other;
                Err(DicomError::structural(
                    "BulkDataLocator close without open locator",
                ))
            }
        }
    }

    fn end_fragment(&mut self) -> Result<()> {
        let big_endian = self.big_endian;
        if let Some(locator) = self.pending_locator.take() {
            let pending = self
                .fragments
                .as_mut()
                .ok_or_else(|| DicomError::structural("DataFragment close without fragment list"))?;
            pending.fragments.push(Value::Bulk(locator));
            return Ok(());
        }
        let mut bytes = self.take_bytes()?;
        let pending = self
            .fragments
            .as_mut()
            .ok_or_else(|| DicomError::structural("DataFragment close without fragment list"))?;
        if big_endian {
            pending.fragments.vr().toggle_endian(&mut bytes);
        }
        pending.fragments.push(Value::Bytes(bytes));
        Ok(())
    }

    fn locator_scratch(&mut self, field: &str) -> Result<&mut LocatorScratch> {
        match &mut self.scratch {
            Scratch::Locator(locator) => Ok(locator),
            _ => Err(DicomError::structural(format!(
                "{field} outside of an open BulkDataLocator"
            ))),
        }
    }

    fn take_bytes(&mut self) -> Result<Vec<u8>> {
        if !self.carry.is_empty() {
            return Err(DicomError::malformed(
                "base64 content is not a multiple of 4 characters",
            ));
        }
        Ok(std::mem::take(&mut self.binary))
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, field: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| DicomError::malformed(format!("invalid {field} value: {text:?}")))
}
