//! DICOM data model.
//!
//! This crate provides the attribute/value model underlying the toolkit:
//! tags, value representations, the element dictionary, attribute sets with
//! nested sequences and fragment lists, person names, bulk data references,
//! specific-character-set display decoding and DA/TM/DT date-time
//! conversion.

pub mod attributes;
pub mod charset;
pub mod datetime;
pub mod dictionary;
pub mod error;
pub mod person_name;
pub mod tag;
pub mod value;
pub mod vr;

pub use attributes::{Attributes, Element, Sequence};
pub use charset::SpecificCharacterSet;
pub use dictionary::{ElementDictionary, PrivateEntry};
pub use error::{DicomError, Result};
pub use person_name::{NameComponent, NameGroup, PersonName};
pub use tag::{Tag, tags};
pub use value::{BulkDataLocator, Fragments, Value, pad_to_length};
pub use vr::VR;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
