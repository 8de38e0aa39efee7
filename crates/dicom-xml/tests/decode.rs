//! End-to-end decoding tests over the XML-shaped surface syntax.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use dicom_model::{Attributes, DicomError, Tag, Value, tags};
use dicom_xml::{DatasetDecoder, StartAttributes, read_dataset};

fn decode(xml: &str) -> (Attributes, Option<Attributes>) {
    read_dataset(xml.as_bytes(), Attributes::new()).expect("decode data set")
}

fn attribute_atts(tag: &str, vr: Option<&str>) -> StartAttributes {
    StartAttributes {
        tag: Some(tag.to_owned()),
        vr: vr.map(str::to_owned),
        ..StartAttributes::default()
    }
}

#[test]
fn round_trip_tree() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00080008" vr="CS">
    <Value number="1">ORIGINAL</Value>
    <Value number="2">PRIMARY</Value>
    <Value number="3">AXIAL</Value>
  </DicomAttribute>
  <DicomAttribute tag="00081140" vr="SQ">
    <Item number="1">
      <DicomAttribute tag="00081155" vr="UI">
        <Value number="1">1.2.840.113619.2.1.1</Value>
      </DicomAttribute>
    </Item>
    <Item number="2">
      <DicomAttribute tag="00081155" vr="UI">
        <Value number="1">1.2.840.113619.2.1.2</Value>
      </DicomAttribute>
    </Item>
  </DicomAttribute>
  <DicomAttribute tag="7FE00010" vr="OB">
    <DataFragment number="1"></DataFragment>
    <DataFragment number="2">AQID</DataFragment>
  </DicomAttribute>
</NativeDicomModel>"#,
    );

    let values = dataset.strings_of(Tag(0x0008_0008), None).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].as_deref(), Some("ORIGINAL"));

    let seq = dataset.sequence_of(Tag(0x0008_1140), None).unwrap();
    assert_eq!(seq.len(), 2);
    assert_eq!(
        seq.get(0).unwrap().string_of(Tag(0x0008_1155), None),
        Some("1.2.840.113619.2.1.1")
    );
    assert_eq!(
        seq.get(1).unwrap().string_of(Tag(0x0008_1155), None),
        Some("1.2.840.113619.2.1.2")
    );

    let frags = dataset.fragments_of(tags::PIXEL_DATA, None).unwrap();
    assert_eq!(frags.len(), 2);
    assert_eq!(frags.get(0).unwrap().bytes(), Some(&[][..]));
    assert_eq!(frags.get(1).unwrap().bytes(), Some(&[1, 2, 3][..]));
}

#[test]
fn multi_value_gap_fill() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00080008" vr="CS">
    <Value number="1">ORIGINAL</Value>
    <Value number="3">AXIAL</Value>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let values = dataset.strings_of(Tag(0x0008_0008), None).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0].as_deref(), Some("ORIGINAL"));
    assert_eq!(values[1], None);
    assert_eq!(values[2].as_deref(), Some("AXIAL"));
}

#[test]
fn file_meta_routing_from_nested_position() {
    let (dataset, file_meta) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00081110" vr="SQ">
    <Item number="1">
      <DicomAttribute tag="00020010" vr="UI">
        <Value number="1">1.2.840.10008.1.2.1</Value>
      </DicomAttribute>
    </Item>
  </DicomAttribute>
  <DicomAttribute tag="00020002" vr="UI">
    <Value number="1">1.2.840.10008.5.1.4.1.1.4</Value>
  </DicomAttribute>
</NativeDicomModel>"#,
    );

    let file_meta = file_meta.expect("file meta created");
    assert_eq!(
        file_meta.string_of(tags::TRANSFER_SYNTAX_UID, None),
        Some("1.2.840.10008.1.2.1")
    );
    assert_eq!(
        file_meta.string_of(Tag(0x0002_0002), None),
        Some("1.2.840.10008.5.1.4.1.1.4")
    );
    assert!(!dataset.contains(tags::TRANSFER_SYNTAX_UID, None));
    assert!(!dataset.contains(Tag(0x0002_0002), None));
    // The sequence survives, with the nested file-meta attribute removed
    // from its item.
    let seq = dataset.sequence_of(Tag(0x0008_1110), None).unwrap();
    assert_eq!(seq.len(), 1);
    assert!(seq.get(0).unwrap().is_empty());
}

#[test]
fn person_name_assembly() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00100010" vr="PN">
    <PersonName number="1">
      <Alphabetic>
        <FamilyName>Doe</FamilyName>
        <GivenName>John</GivenName>
      </Alphabetic>
    </PersonName>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    assert_eq!(dataset.string_of(tags::PATIENT_NAME, None), Some("Doe^John"));
}

#[test]
fn person_name_groups() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00100010" vr="PN">
    <PersonName number="1">
      <Alphabetic><FamilyName>Yamada</FamilyName><GivenName>Taro</GivenName></Alphabetic>
      <Ideographic><FamilyName>山田</FamilyName><GivenName>太郎</GivenName></Ideographic>
      <Phonetic><FamilyName>やまだ</FamilyName><GivenName>たろう</GivenName></Phonetic>
    </PersonName>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    assert_eq!(
        dataset.string_of(tags::PATIENT_NAME, None),
        Some("Yamada^Taro=山田^太郎=やまだ^たろう")
    );
}

#[test]
fn locator_wins_over_inline_bytes() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="7FE00010" vr="OW">AAEC
    <BulkDataLocator>
      <Length>512</Length>
      <Offset>1024</Offset>
      <TransferSyntax>1.2.840.10008.1.2.1</TransferSyntax>
      <URI>file:/var/spool/pixels.raw</URI>
    </BulkDataLocator>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let element = dataset.get(tags::PIXEL_DATA, None).unwrap();
    match &element.value {
        Value::Bulk(locator) => {
            assert_eq!(locator.uri, "file:/var/spool/pixels.raw");
            assert_eq!(locator.transfer_syntax, "1.2.840.10008.1.2.1");
            assert_eq!(locator.offset, 1024);
            assert_eq!(locator.length, 512);
        }
        other => panic!("expected bulk data locator, got {other:?}"),
    }
}

#[test]
fn locator_as_fragment_entry() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="7FE00010" vr="OB">
    <DataFragment number="1"></DataFragment>
    <DataFragment number="2">
      <BulkDataLocator>
        <Length>128</Length>
        <Offset>0</Offset>
        <TransferSyntax>1.2.840.10008.1.2.1</TransferSyntax>
        <URI>file:/var/spool/frame2.raw</URI>
      </BulkDataLocator>
    </DataFragment>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let frags = dataset.fragments_of(tags::PIXEL_DATA, None).unwrap();
    assert_eq!(frags.len(), 2);
    assert!(matches!(frags.get(1), Some(Value::Bulk(_))));
}

#[test]
fn implicit_vr_resolved_through_dictionary() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00100010">
    <PersonName number="1">
      <Alphabetic><FamilyName>Doe</FamilyName></Alphabetic>
    </PersonName>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let element = dataset.get(tags::PATIENT_NAME, None).unwrap();
    assert_eq!(element.vr, dicom_model::VR::PN);
}

#[test]
fn unknown_tag_without_vr_is_rejected() {
    let err = read_dataset(
        br#"<NativeDicomModel><DicomAttribute tag="00091001"/></NativeDicomModel>"#.as_slice(),
        Attributes::new(),
    )
    .unwrap_err();
    assert!(matches!(err, DicomError::UnresolvedVr { .. }));
}

#[test]
fn base64_chunk_invariance() {
    let payload: Vec<u8> = (0u8..30).collect();
    let encoded = STANDARD.encode(&payload);

    let reference = decode_in_chunks(&encoded, encoded.len());
    assert_eq!(reference, payload);
    for chunk_size in [1usize, 2, 3, 5, 7, 12] {
        assert_eq!(
            decode_in_chunks(&encoded, chunk_size),
            reference,
            "chunk size {chunk_size}"
        );
    }
}

fn decode_in_chunks(encoded: &str, chunk_size: usize) -> Vec<u8> {
    let mut decoder = DatasetDecoder::new(Attributes::new());
    decoder
        .element_start("DicomAttribute", &attribute_atts("7FE00010", Some("OB")))
        .unwrap();
    for chunk in encoded.as_bytes().chunks(chunk_size) {
        decoder
            .character_data(std::str::from_utf8(chunk).unwrap())
            .unwrap();
    }
    decoder.element_end("DicomAttribute").unwrap();
    decoder.document_end().unwrap();
    let (dataset, _) = decoder.into_parts();
    dataset.bytes_of(tags::PIXEL_DATA, None).unwrap().to_vec()
}

#[test]
fn carry_left_at_attribute_close_is_rejected() {
    let mut decoder = DatasetDecoder::new(Attributes::new());
    decoder
        .element_start("DicomAttribute", &attribute_atts("7FE00010", Some("OB")))
        .unwrap();
    decoder.character_data("QQ").unwrap();
    let err = decoder.element_end("DicomAttribute").unwrap_err();
    assert!(matches!(err, DicomError::MalformedInput { .. }));
}

#[test]
fn stale_carry_does_not_cross_into_a_new_run() {
    // Two pending characters left by one binary run must not leak into the
    // next run's first group.
    let mut decoder = DatasetDecoder::new(Attributes::new());
    decoder
        .element_start("DicomAttribute", &attribute_atts("7FE00010", Some("OB")))
        .unwrap();
    decoder.character_data("QQ").unwrap();
    decoder
        .element_start("DicomAttribute", &attribute_atts("00091001", Some("OB")))
        .unwrap();
    decoder.character_data("QUJD").unwrap();
    decoder.element_end("DicomAttribute").unwrap();
    decoder.document_end().unwrap();
    let (dataset, _) = decoder.into_parts();
    assert_eq!(dataset.bytes_of(Tag(0x0009_1001), None), Some(&b"ABC"[..]));
}

#[test]
fn truncated_base64_is_rejected() {
    let err = read_dataset(
        br#"<NativeDicomModel><DicomAttribute tag="7FE00010" vr="OB">QUJD</DicomAttribute></NativeDicomModel>"#
            .as_slice(),
        Attributes::new(),
    )
    .unwrap_err();
    assert!(matches!(err, DicomError::MalformedInput { .. }));
}

#[test]
fn out_of_context_closes_are_structural_errors() {
    let mut decoder = DatasetDecoder::new(Attributes::new());
    let err = decoder.element_end("Item").unwrap_err();
    assert!(matches!(err, DicomError::Structural { .. }));

    let mut decoder = DatasetDecoder::new(Attributes::new());
    let err = decoder.element_end("BulkDataLocator").unwrap_err();
    assert!(matches!(err, DicomError::Structural { .. }));

    let mut decoder = DatasetDecoder::new(Attributes::new());
    let err = decoder.element_end("FamilyName").unwrap_err();
    assert!(matches!(err, DicomError::Structural { .. }));
}

#[test]
fn malformed_indices_are_rejected() {
    let mut decoder = DatasetDecoder::new(Attributes::new());
    decoder
        .element_start("DicomAttribute", &attribute_atts("00080008", Some("CS")))
        .unwrap();
    let err = decoder
        .element_start(
            "Value",
            &StartAttributes {
                number: Some("0".to_owned()),
                ..StartAttributes::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DicomError::MalformedInput { .. }));

    let mut decoder = DatasetDecoder::new(Attributes::new());
    let err = decoder
        .element_start("DicomAttribute", &attribute_atts("10,0010", Some("PN")))
        .unwrap_err();
    assert!(matches!(err, DicomError::MalformedInput { .. }));
}

#[test]
fn item_numbers_must_not_decrease() {
    let xml = r#"<NativeDicomModel>
  <DicomAttribute tag="00081140" vr="SQ">
    <Item number="2"></Item>
    <Item number="1"></Item>
  </DicomAttribute>
</NativeDicomModel>"#;
    let err = read_dataset(xml.as_bytes(), Attributes::new()).unwrap_err();
    assert!(matches!(err, DicomError::Structural { .. }));
}

#[test]
fn reopening_the_last_item_continues_it() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00081140" vr="SQ">
    <Item number="1">
      <DicomAttribute tag="00080060" vr="CS"><Value number="1">MR</Value></DicomAttribute>
    </Item>
    <Item number="1">
      <DicomAttribute tag="00200013" vr="IS"><Value number="1">7</Value></DicomAttribute>
    </Item>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let seq = dataset.sequence_of(Tag(0x0008_1140), None).unwrap();
    assert_eq!(seq.len(), 1);
    let item = seq.get(0).unwrap();
    assert_eq!(item.string_of(Tag(0x0008_0060), None), Some("MR"));
    assert_eq!(item.string_of(Tag(0x0020_0013), None), Some("7"));
}

#[test]
fn item_gap_fill_keeps_order() {
    let (dataset, _) = decode(
        r#"<NativeDicomModel>
  <DicomAttribute tag="00081140" vr="SQ">
    <Item number="3">
      <DicomAttribute tag="00200013" vr="IS"><Value number="1">3</Value></DicomAttribute>
    </Item>
  </DicomAttribute>
</NativeDicomModel>"#,
    );
    let seq = dataset.sequence_of(Tag(0x0008_1140), None).unwrap();
    assert_eq!(seq.len(), 3);
    assert!(seq.get(0).unwrap().is_empty());
    assert!(seq.get(1).unwrap().is_empty());
    assert_eq!(
        seq.get(2).unwrap().string_of(Tag(0x0020_0013), None),
        Some("3")
    );
}

#[test]
fn big_endian_root_toggles_decoded_words() {
    // 0x0102 0x0304 little-endian on the wire; a big-endian root stores
    // word-swapped bytes. Decode first, then toggle.
    let encoded = STANDARD.encode([0x02u8, 0x01, 0x04, 0x03]);
    let xml = format!(
        r#"<NativeDicomModel><DicomAttribute tag="7FE00010" vr="OW">{encoded}</DicomAttribute></NativeDicomModel>"#
    );
    let (dataset, _) =
        read_dataset(xml.as_bytes(), Attributes::with_endianness(true)).unwrap();
    assert_eq!(
        dataset.bytes_of(tags::PIXEL_DATA, None),
        Some(&[0x01, 0x02, 0x03, 0x04][..])
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunked_base64_matches_single_feed(
            payload in proptest::collection::vec(any::<u8>(), 0..200),
            splits in proptest::collection::vec(1usize..16, 1..8),
        ) {
            let encoded = STANDARD.encode(&payload);
            let mut decoder = DatasetDecoder::new(Attributes::new());
            decoder
                .element_start("DicomAttribute", &attribute_atts("7FE00010", Some("OB")))
                .unwrap();
            let mut rest = encoded.as_str();
            let mut split_iter = splits.iter().cycle();
            while !rest.is_empty() {
                let take = (*split_iter.next().unwrap()).min(rest.len());
                decoder.character_data(&rest[..take]).unwrap();
                rest = &rest[take..];
            }
            decoder.element_end("DicomAttribute").unwrap();
            decoder.document_end().unwrap();
            let (dataset, _) = decoder.into_parts();
            prop_assert_eq!(dataset.bytes_of(tags::PIXEL_DATA, None).unwrap(), &payload[..]);
        }

        #[test]
        fn value_gap_fill_is_monotone(indices in proptest::collection::vec(1usize..24, 1..12)) {
            let mut sorted = indices;
            sorted.sort_unstable();
            let mut decoder = DatasetDecoder::new(Attributes::new());
            decoder
                .element_start("DicomAttribute", &attribute_atts("00080008", Some("CS")))
                .unwrap();
            for (ordinal, number) in sorted.iter().enumerate() {
                decoder
                    .element_start(
                        "Value",
                        &StartAttributes {
                            number: Some(number.to_string()),
                            ..StartAttributes::default()
                        },
                    )
                    .unwrap();
                decoder.character_data(&format!("v{ordinal}")).unwrap();
                decoder.element_end("Value").unwrap();
            }
            decoder.element_end("DicomAttribute").unwrap();
            decoder.document_end().unwrap();
            let (dataset, _) = decoder.into_parts();
            let values = dataset.strings_of(Tag(0x0008_0008), None).unwrap();
            // The list is gap-filled, never sparse: its length reaches at
            // least the highest index, and every slot is either a written
            // value or an explicit placeholder.
            prop_assert!(values.len() >= *sorted.last().unwrap());
            prop_assert!(values.iter().flatten().count() == sorted.len());
        }
    }
}
