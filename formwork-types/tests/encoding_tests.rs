use formwork_types::{Encoding, Error, latin1_decode, latin1_encode};
use proptest::prelude::*;

// ── latin1 ───────────────────────────────────────────────────────

#[test]
fn latin1_accepts_single_byte_code_points() {
    assert_eq!(latin1_encode("abc\u{ff}").unwrap(), vec![b'a', b'b', b'c', 0xff]);
}

#[test]
fn latin1_rejects_wide_code_points() {
    assert_eq!(latin1_encode("a\u{100}"), Err(Error::CodePointOutOfRange(0x100)));
    assert!(latin1_encode("snow ☃").is_err());
}

#[test]
fn latin1_decode_maps_bytes_to_code_points() {
    assert_eq!(latin1_decode(&[0x68, 0x69, 0xe9]), "hi\u{e9}");
}

// ── Encoding ─────────────────────────────────────────────────────

#[test]
fn default_encoding_is_base64() {
    assert_eq!(Encoding::default(), Encoding::Base64);
}

#[test]
fn hex_encodes_lowercase() {
    assert_eq!(Encoding::Hex.encode(&[0xde, 0xad, 0xbe, 0xef]), b"deadbeef".to_vec());
}

#[test]
fn base64_encodes_with_padding() {
    assert_eq!(Encoding::Base64.encode(b"hi"), b"aGk=".to_vec());
}

#[test]
fn invalid_hex_is_reported() {
    let err = Encoding::Hex.decode(b"zz").unwrap_err();
    assert!(matches!(err, Error::InvalidEncoding { encoding: Encoding::Hex, .. }));
}

#[test]
fn invalid_base64_is_reported() {
    assert!(Encoding::Base64.decode(b"***").is_err());
}

#[test]
fn display_names_match_manifest_spelling() {
    assert_eq!(Encoding::Base64.to_string(), "base64");
    assert_eq!(Encoding::Hex.to_string(), "hex");
    assert_eq!(Encoding::Raw.to_string(), "none");
}

proptest! {
    #[test]
    fn every_encoding_roundtrips(raw in prop::collection::vec(any::<u8>(), 0..512)) {
        for encoding in [Encoding::Base64, Encoding::Hex, Encoding::Raw] {
            let encoded = encoding.encode(&raw);
            prop_assert_eq!(encoding.decode(&encoded).unwrap(), raw.clone());
        }
    }

    #[test]
    fn latin1_roundtrips(raw in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(latin1_encode(&latin1_decode(&raw)).unwrap(), raw);
    }
}
