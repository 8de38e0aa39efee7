//! Dump formatter tests over in-memory streams.

use dicom_cli::dump::Dcm2Txt;
use dicom_model::{DicomError, VR};

fn explicit(bytes: &mut Vec<u8>, group: u16, element: u16, vr: VR, value: &[u8]) {
    bytes.extend_from_slice(&group.to_le_bytes());
    bytes.extend_from_slice(&element.to_le_bytes());
    bytes.extend_from_slice(vr.code().as_bytes());
    if vr.requires_long_header() {
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&u32::try_from(value.len()).unwrap().to_le_bytes());
    } else {
        bytes.extend_from_slice(&u16::try_from(value.len()).unwrap().to_le_bytes());
    }
    bytes.extend_from_slice(value);
}

fn sample_stream() -> Vec<u8> {
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    explicit(&mut bytes, 0x0002, 0x0000, VR::UL, &28u32.to_le_bytes());
    explicit(&mut bytes, 0x0002, 0x0010, VR::UI, b"1.2.840.10008.1.2.1\0");
    explicit(&mut bytes, 0x0008, 0x0060, VR::CS, b"MR");
    explicit(&mut bytes, 0x0010, 0x0010, VR::PN, b"Doe^John");
    bytes
}

#[test]
fn dumps_one_line_per_element() {
    let mut out = Vec::new();
    let mut dump = Dcm2Txt::with_width(&mut out, 78).unwrap();
    dump.parse(&sample_stream()[..]).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // 128 zero bytes cannot fit in 78 columns: the rendering is cut off
    // without the closing bracket or a keyword.
    assert!(lines[0].starts_with("0: [0\\0\\0"));
    assert!(!lines[0].ends_with(']'));
    assert_eq!(lines[0].chars().count(), 77);
    assert!(lines[1].starts_with("132: (0002,0000) UL #4 [28]"));
    assert!(lines[1].ends_with("GroupLength"));
    assert!(
        lines[2].contains("(0002,0010) UI #20 [1.2.840.10008.1.2.1] TransferSyntaxUID"),
        "got: {}",
        lines[2]
    );
    assert!(
        lines[3].contains("(0008,0060) CS #2 [MR] Modality"),
        "got: {}",
        lines[3]
    );
    assert!(
        lines[4].contains("(0010,0010) PN #8 [Doe^John] PatientName"),
        "got: {}",
        lines[4]
    );
}

#[test]
fn nested_sequences_are_indented() {
    let mut bytes = sample_stream();
    // Undefined-length sequence with one undefined-length item.
    bytes.extend_from_slice(&0x0008u16.to_le_bytes());
    bytes.extend_from_slice(&0x1140u16.to_le_bytes());
    bytes.extend_from_slice(b"SQ");
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE000u16.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    explicit(&mut bytes, 0x0020, 0x0013, VR::IS, b"7 ");
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE00Du16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0xFFFEu16.to_le_bytes());
    bytes.extend_from_slice(&0xE0DDu16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let mut out = Vec::new();
    let mut dump = Dcm2Txt::with_width(&mut out, 78).unwrap();
    dump.parse(&bytes[..]).unwrap();

    let text = String::from_utf8(out).unwrap();
    let seq_line = text
        .lines()
        .find(|line| line.contains("(0008,1140)"))
        .unwrap();
    assert!(seq_line.contains("SQ #-1 ReferencedImageSequence"));
    let item_line = text
        .lines()
        .find(|line| line.contains("(FFFE,E000)"))
        .unwrap();
    assert!(item_line.contains(">"), "item line is indented: {item_line}");
    let nested_line = text
        .lines()
        .find(|line| line.contains("(0020,0013)"))
        .unwrap();
    assert!(
        nested_line.contains(">(0020,0013) IS #2 [7] InstanceNumber"),
        "got: {nested_line}"
    );
}

#[test]
fn narrow_width_is_rejected_before_output() {
    let mut out = Vec::new();
    let err = Dcm2Txt::with_width(&mut out, 10).unwrap_err();
    assert!(matches!(err, DicomError::Configuration { .. }));
    assert!(out.is_empty(), "no output may be produced");
}

#[test]
fn minimum_width_is_accepted() {
    let mut out = Vec::new();
    assert!(Dcm2Txt::with_width(&mut out, 40).is_ok());
    assert!(Dcm2Txt::with_width(&mut out, 39).is_err());
}

#[test]
fn long_values_lose_bracket_and_keyword() {
    let mut bytes = sample_stream();
    explicit(
        &mut bytes,
        0x0010,
        0x4000,
        VR::LT,
        "a very long comment that certainly exceeds the narrowest permitted line width"
            .as_bytes(),
    );
    let mut out = Vec::new();
    let mut dump = Dcm2Txt::with_width(&mut out, 40).unwrap();
    dump.parse(&bytes[..]).unwrap();

    let text = String::from_utf8(out).unwrap();
    let comment_line = text
        .lines()
        .find(|line| line.contains("(0010,4000)"))
        .unwrap();
    assert!(!comment_line.contains("PatientComments"));
    assert!(!comment_line.ends_with(']'));
    assert!(comment_line.chars().count() <= 40 + 20);
}
