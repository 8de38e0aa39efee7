//! Ordered attribute sets and nested sequences.

use crate::charset::SpecificCharacterSet;
use crate::tag::{Tag, tags};
use crate::value::{BulkDataLocator, Fragments, Value, pad_to_length};
use crate::vr::VR;

/// One attribute: tag, optional private creator, VR and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub private_creator: Option<String>,
    pub vr: VR,
    pub value: Value,
}

/// An ordered set of attributes, keyed by (tag, private creator).
///
/// Elements are kept sorted by tag so iteration renders data sets in
/// canonical order. The `big_endian` flag declares the byte order of stored
/// multi-byte numeric values. An `Attributes` belongs to exactly one parent
/// context: the decode root or a single sequence item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    big_endian: bool,
    elements: Vec<Element>,
}

impl Attributes {
    /// Empty little-endian attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty attribute set with the given byte order.
    #[must_use]
    pub fn with_endianness(big_endian: bool) -> Self {
        Self {
            big_endian,
            elements: Vec::new(),
        }
    }

    /// Declared byte order of stored numeric values.
    #[must_use]
    pub fn big_endian(&self) -> bool {
        self.big_endian
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn position(&self, tag: Tag, private_creator: Option<&str>) -> Result<usize, usize> {
        self.elements
            .binary_search_by(|el| (el.tag, el.private_creator.as_deref()).cmp(&(tag, private_creator)))
    }

    /// Store a prepared value verbatim, replacing any prior value under the
    /// same (tag, creator). This is the low-level operation used when the
    /// bytes are already in the container's declared byte order.
    pub fn set_value(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        vr: VR,
        value: Value,
    ) -> &mut Value {
        let element = Element {
            tag,
            private_creator: private_creator.map(str::to_owned),
            vr,
            value,
        };
        let index = match self.position(tag, private_creator) {
            Ok(index) => {
                self.elements[index] = element;
                index
            }
            Err(index) => {
                self.elements.insert(index, element);
                index
            }
        };
        &mut self.elements[index].value
    }

    /// Store string values (1-indexed, gaps kept as `None`).
    pub fn set_strings(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        vr: VR,
        values: Vec<Option<String>>,
    ) {
        self.set_value(tag, private_creator, vr, Value::Strings(values));
    }

    /// Store a single string value.
    pub fn set_string(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        vr: VR,
        value: impl Into<String>,
    ) {
        self.set_strings(tag, private_creator, vr, vec![Some(value.into())]);
    }

    /// Store inline bytes. The input is in little-endian value order and is
    /// converted to the container's declared byte order before storage.
    pub fn set_bytes(&mut self, tag: Tag, private_creator: Option<&str>, vr: VR, mut bytes: Vec<u8>) {
        if self.big_endian {
            vr.toggle_endian(&mut bytes);
        }
        self.set_value(tag, private_creator, vr, Value::Bytes(bytes));
    }

    /// Store a bulk data reference.
    pub fn set_bulk_data(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        vr: VR,
        locator: BulkDataLocator,
    ) {
        self.set_value(tag, private_creator, vr, Value::Bulk(locator));
    }

    /// Insert an empty sequence under the tag, replacing any prior value,
    /// and return it for filling.
    pub fn new_sequence(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        capacity: usize,
    ) -> &mut Sequence {
        let value = self.set_value(
            tag,
            private_creator,
            VR::SQ,
            Value::Sequence(Sequence::with_capacity(capacity)),
        );
        match value {
            Value::Sequence(seq) => seq,
            _ => unreachable!("set_value stored a sequence"),
        }
    }

    /// Insert an empty fragment list under the tag, replacing any prior
    /// value, and return it for filling.
    pub fn new_fragments(
        &mut self,
        tag: Tag,
        private_creator: Option<&str>,
        vr: VR,
        capacity: usize,
    ) -> &mut Fragments {
        let value = self.set_value(
            tag,
            private_creator,
            vr,
            Value::Fragments(Fragments::with_capacity(vr, capacity)),
        );
        match value {
            Value::Fragments(frags) => frags,
            _ => unreachable!("set_value stored a fragment list"),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, tag: Tag, private_creator: Option<&str>) -> Option<Value> {
        match self.position(tag, private_creator) {
            Ok(index) => Some(self.elements.remove(index).value),
            Err(_) => None,
        }
    }

    #[must_use]
    pub fn contains(&self, tag: Tag, private_creator: Option<&str>) -> bool {
        self.position(tag, private_creator).is_ok()
    }

    #[must_use]
    pub fn get(&self, tag: Tag, private_creator: Option<&str>) -> Option<&Element> {
        self.position(tag, private_creator)
            .ok()
            .map(|index| &self.elements[index])
    }

    /// Inline bytes of an attribute, when stored as bytes.
    #[must_use]
    pub fn bytes_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&[u8]> {
        self.get(tag, private_creator)
            .and_then(|el| el.value.bytes())
    }

    /// String values of an attribute, when stored as strings.
    #[must_use]
    pub fn strings_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&[Option<String>]> {
        self.get(tag, private_creator)
            .and_then(|el| el.value.strings())
    }

    /// First present string value of an attribute.
    #[must_use]
    pub fn string_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&str> {
        self.strings_of(tag, private_creator)?
            .iter()
            .flatten()
            .next()
            .map(String::as_str)
    }

    /// Nested sequence of an attribute.
    #[must_use]
    pub fn sequence_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&Sequence> {
        match self.get(tag, private_creator) {
            Some(Element {
                value: Value::Sequence(seq),
                ..
            }) => Some(seq),
            _ => None,
        }
    }

    /// Fragment list of an attribute.
    #[must_use]
    pub fn fragments_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&Fragments> {
        match self.get(tag, private_creator) {
            Some(Element {
                value: Value::Fragments(frags),
                ..
            }) => Some(frags),
            _ => None,
        }
    }

    /// Resolve the Specific Character Set (0008,0005) declared by this data
    /// set; affects only display-text decoding of certain string VRs.
    #[must_use]
    pub fn specific_character_set(&self) -> SpecificCharacterSet {
        self.strings_of(tags::SPECIFIC_CHARACTER_SET, None)
            .into_iter()
            .flatten()
            .flatten()
            .find(|term| !term.trim().is_empty())
            .map_or_else(SpecificCharacterSet::default, |term| {
                SpecificCharacterSet::from_term(term)
            })
    }

    /// Iterate elements in tag order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Drop excess capacity once this context is known closed. Pure memory
    /// hygiene, never semantically observable.
    pub fn trim_to_size(&mut self) {
        self.elements.shrink_to_fit();
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// An ordered list of attribute-set items, owned by exactly one sequence
/// attribute. Items are 1-indexed and contiguous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    items: Vec<Attributes>,
}

impl Sequence {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Attributes> {
        self.items.get(index)
    }

    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Attributes> {
        self.items.get_mut(index)
    }

    pub fn push(&mut self, item: Attributes) {
        self.items.push(item);
    }

    /// Detach the most recently added item.
    pub fn take_last(&mut self) -> Option<Attributes> {
        self.items.pop()
    }

    /// Extend with empty items until `len` items are held.
    pub fn ensure_len(&mut self, len: usize, big_endian: bool) {
        pad_to_length(&mut self.items, len, || {
            Attributes::with_endianness(big_endian)
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attributes> {
        self.items.iter()
    }

    /// Drop excess capacity once the sequence is finalized.
    pub fn trim_to_size(&mut self) {
        self.items.shrink_to_fit();
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Attributes;
    type IntoIter = std::slice::Iter<'a, Attributes>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_per_tag() {
        let mut attrs = Attributes::new();
        attrs.set_string(Tag(0x0010_0020), None, VR::LO, "A");
        attrs.set_string(Tag(0x0010_0020), None, VR::LO, "B");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.string_of(Tag(0x0010_0020), None), Some("B"));
    }

    #[test]
    fn elements_iterate_in_tag_order() {
        let mut attrs = Attributes::new();
        attrs.set_string(Tag(0x0020_0010), None, VR::SH, "S1");
        attrs.set_string(Tag(0x0008_0060), None, VR::CS, "MR");
        attrs.set_string(Tag(0x0010_0010), None, VR::PN, "Doe^John");
        let order: Vec<Tag> = attrs.iter().map(|el| el.tag).collect();
        assert_eq!(
            order,
            [Tag(0x0008_0060), Tag(0x0010_0010), Tag(0x0020_0010)]
        );
    }

    #[test]
    fn private_creator_disambiguates() {
        let mut attrs = Attributes::new();
        attrs.set_string(Tag(0x0009_1001), Some("ACME 1.0"), VR::LO, "a");
        attrs.set_string(Tag(0x0009_1001), Some("OTHER 1.0"), VR::LO, "b");
        assert_eq!(attrs.len(), 2);
        assert_eq!(
            attrs.string_of(Tag(0x0009_1001), Some("ACME 1.0")),
            Some("a")
        );
        assert_eq!(
            attrs.string_of(Tag(0x0009_1001), Some("OTHER 1.0")),
            Some("b")
        );
        assert_eq!(attrs.string_of(Tag(0x0009_1001), None), None);
    }

    #[test]
    fn set_bytes_converts_to_declared_endianness() {
        let mut le = Attributes::new();
        le.set_bytes(Tag(0x0028_0010), None, VR::US, vec![0x01, 0x02]);
        assert_eq!(le.bytes_of(Tag(0x0028_0010), None), Some(&[0x01, 0x02][..]));

        let mut be = Attributes::with_endianness(true);
        be.set_bytes(Tag(0x0028_0010), None, VR::US, vec![0x01, 0x02]);
        assert_eq!(be.bytes_of(Tag(0x0028_0010), None), Some(&[0x02, 0x01][..]));
    }

    #[test]
    fn locator_replaces_inline_value() {
        let mut attrs = Attributes::new();
        attrs.set_bytes(Tag(0x7FE0_0010), None, VR::OW, vec![0, 1, 2, 3]);
        attrs.set_bulk_data(
            Tag(0x7FE0_0010),
            None,
            VR::OW,
            BulkDataLocator::new("file:/tmp/pixels", "1.2.840.10008.1.2.1", 0, 4),
        );
        let element = attrs.get(Tag(0x7FE0_0010), None).unwrap();
        assert!(matches!(element.value, Value::Bulk(_)));
    }

    #[test]
    fn sequence_gap_fill_and_remove() {
        let mut attrs = Attributes::new();
        {
            let seq = attrs.new_sequence(Tag(0x0008_1140), None, 4);
            seq.ensure_len(2, false);
            assert_eq!(seq.len(), 2);
        }
        assert!(attrs.sequence_of(Tag(0x0008_1140), None).is_some());
        assert!(attrs.remove(Tag(0x0008_1140), None).is_some());
        assert!(attrs.remove(Tag(0x0008_1140), None).is_none());
    }

    #[test]
    fn resolves_declared_character_set() {
        let mut attrs = Attributes::new();
        attrs.set_strings(
            tags::SPECIFIC_CHARACTER_SET,
            None,
            VR::CS,
            vec![Some(String::new()), Some("ISO_IR 192".to_owned())],
        );
        assert_eq!(
            attrs.specific_character_set(),
            SpecificCharacterSet::from_term("ISO_IR 192")
        );
    }
}
