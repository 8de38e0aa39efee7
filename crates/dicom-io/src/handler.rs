//! Per-element callbacks driving the pull-decoder.

use std::io::Read;

use dicom_model::{Attributes, Fragments, Result, Sequence};

use crate::reader::DicomReader;

/// Receives one callback per decoded element, item, or fragment. Each
/// returns whether the caller should continue reading.
///
/// The handler decides what to do with the value: delegate to the reader's
/// default consumption (`read_value_into` and friends), consume the bytes
/// itself, or skip. The dump formatter is the canonical non-default
/// implementation.
pub trait InputHandler<R: Read> {
    /// Called after an element header has been read, before its value.
    fn read_value(&mut self, reader: &mut DicomReader<R>, attrs: &mut Attributes) -> Result<bool>;

    /// Called after an item header has been read inside a sequence.
    fn read_sequence_value(
        &mut self,
        reader: &mut DicomReader<R>,
        sequence: &mut Sequence,
    ) -> Result<bool>;

    /// Called after an item header has been read inside a fragment list.
    fn read_fragments_value(
        &mut self,
        reader: &mut DicomReader<R>,
        fragments: &mut Fragments,
    ) -> Result<bool>;
}

/// Default handler: stores every value into the attribute tree.
#[derive(Debug, Default)]
pub struct StoreHandler;

impl<R: Read> InputHandler<R> for StoreHandler {
    fn read_value(&mut self, reader: &mut DicomReader<R>, attrs: &mut Attributes) -> Result<bool> {
        reader.read_value_into(attrs, self)
    }

    fn read_sequence_value(
        &mut self,
        reader: &mut DicomReader<R>,
        sequence: &mut Sequence,
    ) -> Result<bool> {
        reader.read_item_into(sequence, self)
    }

    fn read_fragments_value(
        &mut self,
        reader: &mut DicomReader<R>,
        fragments: &mut Fragments,
    ) -> Result<bool> {
        reader.read_fragment_into(fragments)
    }
}
