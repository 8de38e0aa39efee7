//! quick-xml driver feeding structural events into the decoder.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use dicom_model::{Attributes, DicomError, Result};

use crate::decoder::{DatasetDecoder, StartAttributes};

/// Decode a complete XML-shaped data set from `source` into the supplied
/// root, returning the root and the optional file-meta attribute set.
pub fn read_dataset<R: BufRead>(
    source: R,
    root: Attributes,
) -> Result<(Attributes, Option<Attributes>)> {
    read_dataset_with(source, DatasetDecoder::new(root))
}

/// Decode with a caller-configured decoder (e.g. one carrying a dictionary
/// with registered private blocks).
pub fn read_dataset_with<R: BufRead>(
    source: R,
    mut decoder: DatasetDecoder,
) -> Result<(Attributes, Option<Attributes>)> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(start) => {
                let name = element_name(&start)?;
                let attributes = start_attributes(&start)?;
                decoder.element_start(&name, &attributes)?;
            }
            Event::Empty(start) => {
                let name = element_name(&start)?;
                let attributes = start_attributes(&start)?;
                decoder.element_start(&name, &attributes)?;
                decoder.element_end(&name)?;
            }
            Event::End(end) => {
                let name = decode_utf8(end.local_name().as_ref())?;
                decoder.element_end(&name)?;
            }
            Event::Text(text) => {
                let raw = std::str::from_utf8(text.as_ref())
                    .map_err(|err| DicomError::malformed(format!("invalid UTF-8: {err}")))?;
                let unescaped = quick_xml::escape::unescape(raw)
                    .map_err(|err| DicomError::malformed(format!("invalid XML escape: {err}")))?;
                decoder.character_data(&unescaped)?;
            }
            Event::CData(cdata) => {
                let raw = std::str::from_utf8(cdata.as_ref())
                    .map_err(|err| DicomError::malformed(format!("invalid UTF-8: {err}")))?;
                decoder.character_data(raw)?;
            }
            Event::Eof => {
                decoder.document_end()?;
                break;
            }
            _ => {}
        }
        buf.clear();
    }
    let (root, file_meta) = decoder.into_parts();
    debug!(
        elements = root.len(),
        file_meta = file_meta.is_some(),
        "decoded data set"
    );
    Ok((root, file_meta))
}

fn xml_error(err: quick_xml::Error) -> DicomError {
    DicomError::malformed(format!("malformed XML: {err}"))
}

fn element_name(start: &BytesStart<'_>) -> Result<String> {
    decode_utf8(start.local_name().as_ref())
}

fn decode_utf8(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|err| DicomError::malformed(format!("invalid UTF-8: {err}")))
}

fn start_attributes(start: &BytesStart<'_>) -> Result<StartAttributes> {
    let mut attributes = StartAttributes::default();
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|err| DicomError::malformed(format!("malformed XML: {err}")))?;
        let raw = std::str::from_utf8(attribute.value.as_ref())
            .map_err(|err| DicomError::malformed(format!("invalid UTF-8: {err}")))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|err| DicomError::malformed(format!("invalid XML escape: {err}")))?
            .into_owned();
        match attribute.key.local_name().as_ref() {
            b"tag" => attributes.tag = Some(value),
            b"privateCreator" => attributes.private_creator = Some(value),
            b"vr" => attributes.vr = Some(value),
            b"number" => attributes.number = Some(value),
            _ => {}
        }
    }
    Ok(attributes)
}
