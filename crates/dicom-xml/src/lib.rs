//! Streaming decoder for the XML-shaped DICOM surface syntax.
//!
//! The surface syntax is structurally isomorphic to the native binary
//! encoding: attributes carry hex tags with optional private creator and VR,
//! sequence items and multi-values carry 1-based indices, inline binary
//! travels as base64 text, and bulk data may be referenced by locator
//! instead of carried inline.
//!
//! The decoder consumes four structural events — element start, character
//! data, element end, document end — in a single forward pass and builds an
//! [`Attributes`](dicom_model::Attributes) tree, routing file-meta
//! attributes into their own top-level set.
//!
//! # Example
//!
//! ```
//! use dicom_model::{Attributes, Tag};
//! use dicom_xml::read_dataset;
//!
//! let xml = br#"<NativeDicomModel>
//!   <DicomAttribute tag="00100010" vr="PN">
//!     <PersonName number="1">
//!       <Alphabetic><FamilyName>Doe</FamilyName><GivenName>John</GivenName></Alphabetic>
//!     </PersonName>
//!   </DicomAttribute>
//! </NativeDicomModel>"#;
//!
//! let (dataset, _) = read_dataset(&xml[..], Attributes::new()).unwrap();
//! assert_eq!(dataset.string_of(Tag(0x0010_0010), None), Some("Doe^John"));
//! ```

mod base64;
mod decoder;
mod name;
mod reader;

pub use decoder::{DatasetDecoder, StartAttributes};
pub use name::ElementName;
pub use reader::{read_dataset, read_dataset_with};
