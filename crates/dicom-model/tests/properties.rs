//! Property tests for the low-level model primitives.

use proptest::prelude::*;

use dicom_model::{Tag, VR, pad_to_length};

proptest! {
    #[test]
    fn toggle_endian_is_an_involution(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        for vr in [VR::US, VR::SS, VR::OW, VR::AT, VR::UL, VR::SL, VR::FL, VR::OF, VR::FD, VR::OB, VR::UN] {
            let mut toggled = bytes.clone();
            vr.toggle_endian(&mut toggled);
            vr.toggle_endian(&mut toggled);
            prop_assert_eq!(&toggled, &bytes, "{} toggled twice", vr);
        }
    }

    #[test]
    fn toggle_endian_preserves_length(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut toggled = bytes.clone();
        VR::UL.toggle_endian(&mut toggled);
        prop_assert_eq!(toggled.len(), bytes.len());
    }

    #[test]
    fn pad_to_length_is_monotone(lengths in proptest::collection::vec(0usize..64, 1..16)) {
        let mut items: Vec<u32> = Vec::new();
        let mut previous = 0usize;
        for len in lengths {
            pad_to_length(&mut items, len, || 0);
            prop_assert!(items.len() >= previous, "length never shrinks");
            prop_assert!(items.len() >= len);
            previous = items.len();
        }
    }

    #[test]
    fn tag_hex_round_trips(value in any::<u32>()) {
        let hex = format!("{value:08X}");
        prop_assert_eq!(Tag::from_hex(&hex).unwrap(), Tag(value));
    }
}
