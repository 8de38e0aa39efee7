//! dcm2txt: text dump of DICOM streams.

pub mod dump;
pub mod logging;

pub use dump::{Dcm2Txt, DEFAULT_WIDTH, MIN_WIDTH};
