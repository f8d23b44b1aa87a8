//! Stream filter pipeline tests.

use pdf_graft::decoders::{
    decode_ascii85, decode_ascii_hex, decode_predictor, decode_stream, decode_stream_with_limit, encode_flate,
    DecodeParams,
};
use pdf_graft::error::Error;
use pdf_graft::object::{Dict, Object};

fn filters(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_flate_decoder_integration() {
    let original = b"Hello, World! This is a test of FlateDecode compression.";
    let compressed = encode_flate(original).unwrap();
    let decoded = decode_stream(&compressed, &filters(&["FlateDecode"]), None).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_ascii_hex_decoder_integration() {
    let decoded = decode_stream(b"48656C6C6F>", &filters(&["ASCIIHexDecode"]), None).unwrap();
    assert_eq!(decoded, b"Hello");
    assert_eq!(decode_ascii_hex(b"4 8 6\n5>").unwrap(), b"He");
}

#[test]
fn test_ascii85_decoder_integration() {
    let decoded = decode_stream(b"87cURD]i,\"Ebo80~>", &filters(&["A85"]), None).unwrap();
    assert_eq!(decoded, b"Hello World!");
    assert_eq!(decode_ascii85(b"z~>").unwrap(), vec![0; 4]);
}

#[test]
fn test_image_filters_pass_through() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xD9];
    assert_eq!(decode_stream(&jpeg, &filters(&["DCTDecode"]), None).unwrap(), jpeg);
}

#[test]
fn test_filter_pipeline_multiple() {
    // Flate-compress, then hex-encode: decoding applies the filters in order.
    let compressed = encode_flate(b"layered").unwrap();
    let mut hex: String = compressed.iter().map(|b| format!("{:02X}", b)).collect();
    hex.push('>');
    let decoded = decode_stream(hex.as_bytes(), &filters(&["ASCIIHexDecode", "FlateDecode"]), None).unwrap();
    assert_eq!(decoded, b"layered");
}

#[test]
fn test_filter_pipeline_unsupported() {
    let result = decode_stream(b"data", &filters(&["LZWDecode"]), None);
    assert!(matches!(result, Err(Error::Unsupported(_))));
}

#[test]
fn test_decode_stream_empty_filters() {
    assert_eq!(decode_stream(b"raw", &[], None).unwrap(), b"raw");
}

#[test]
fn test_decompression_limit() {
    let compressed = encode_flate(&vec![b'a'; 10_000]).unwrap();
    let result = decode_stream_with_limit(&compressed, &filters(&["FlateDecode"]), None, 1_000);
    assert!(result.is_err());
}

#[test]
fn test_png_up_predictor() {
    let params = DecodeParams {
        predictor: 12,
        columns: 3,
        ..Default::default()
    };
    // Two rows, PNG "Up" filter (type 2) on each.
    let data = [2, 1, 2, 3, 2, 1, 1, 1];
    assert_eq!(decode_predictor(&data, &params).unwrap(), vec![1, 2, 3, 2, 3, 4]);

    let compressed = encode_flate(&data).unwrap();
    let decoded = decode_stream(&compressed, &filters(&["FlateDecode"]), Some(&params)).unwrap();
    assert_eq!(decoded, vec![1, 2, 3, 2, 3, 4]);
}

#[test]
fn test_stream_object_decodes_through_its_filters() {
    let mut dict = Dict::new();
    dict.insert("Filter".to_string(), Object::name("FlateDecode"));
    let stream = Object::stream(dict, encode_flate(b"q 1 0 0 1 0 0 cm Q").unwrap());
    assert_eq!(stream.decode_stream_data().unwrap(), b"q 1 0 0 1 0 0 cm Q");

    assert!(Object::Integer(1).decode_stream_data().is_err());
}
