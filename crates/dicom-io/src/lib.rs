//! Binary DICOM stream decoding.
//!
//! Provides a pull-driven reader over part-10 streams and the
//! [`InputHandler`] callback seam consumed by the text dump tool.

mod handler;
mod reader;

pub use handler::{InputHandler, StoreHandler};
pub use reader::{DicomReader, UNDEFINED_LENGTH};
