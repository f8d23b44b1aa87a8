//! Parse → serialize → parse round trips, full and incremental.

mod common;

use common::*;
use pdf_graft::editor::rotate;
use pdf_graft::error::Error;
use pdf_graft::parser_config::ParserOptions;
use pdf_graft::reader::{parse, parse_file, parse_with_options};
use pdf_graft::writer::{save, save_to_file, serialize, SaveOptions};
use proptest::prelude::*;

#[test]
fn test_inherited_attributes_resolve() {
    let doc = parse(&inherited_tree_pdf()).unwrap();
    assert_eq!(doc.version(), "1.4");
    assert_eq!(
        geometry(&doc),
        vec![(500.0, 700.0, 90), (300.0, 400.0, 0), (300.0, 400.0, 90)]
    );
    assert!(contents(&doc)[2].contains("(three) Tj"));
}

#[test]
fn test_full_rewrite_preserves_pages_and_objects() {
    let doc = parse(&inherited_tree_pdf()).unwrap();
    let bytes = serialize(&doc).unwrap();
    let again = parse(&bytes).unwrap();

    assert_eq!(geometry(&again), geometry(&doc));
    assert_eq!(contents(&again), contents(&doc));
    assert_eq!(
        again.graph().reachable_from_root().len(),
        doc.graph().reachable_from_root().len()
    );
}

#[test]
fn test_output_is_deterministic() {
    let doc = parse(&inherited_tree_pdf()).unwrap();
    assert_eq!(serialize(&doc).unwrap(), serialize(&doc).unwrap());
}

#[test]
fn test_compressed_output_reads_back() {
    let doc = letter_document(2);
    let bytes = save(&doc, &SaveOptions::full_rewrite().with_compression(true)).unwrap();
    let again = parse(&bytes).unwrap();
    assert_eq!(contents(&again), contents(&doc));
}

#[test]
fn test_version_override() {
    let doc = letter_document(1);
    let bytes = save(&doc, &SaveOptions::full_rewrite().with_version("1.5")).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.5"));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let doc = sized_document(&[(200.0, 300.0), (400.0, 100.0)]);
    save_to_file(&doc, &path, &SaveOptions::default()).unwrap();

    let again = parse_file(&path).unwrap();
    assert_eq!(geometry(&again), geometry(&doc));
}

#[test]
fn test_incremental_update_appends() {
    let original = inherited_tree_pdf();
    let doc = parse(&original).unwrap();
    let rotated = rotate(&doc, Some(&[2]), 180).unwrap();

    let bytes = save(&rotated, &SaveOptions::incremental()).unwrap();
    assert!(bytes.starts_with(&original));
    let tail = &bytes[original.len()..];
    assert!(tail.windows(5).any(|w| w == b"/Prev"));

    let again = parse(&bytes).unwrap();
    assert_eq!(geometry(&again)[1], (300.0, 400.0, 180));
    assert_eq!(geometry(&again)[0], (500.0, 700.0, 90));
}

#[test]
fn test_unchanged_incremental_is_identity() {
    let original = inherited_tree_pdf();
    let doc = parse(&original).unwrap();
    assert_eq!(save(&doc, &SaveOptions::incremental()).unwrap(), original);
}

#[test]
fn test_incremental_needs_loaded_bytes() {
    let doc = letter_document(1);
    assert!(matches!(save(&doc, &SaveOptions::incremental()), Err(Error::Validation(_))));
}

#[test]
fn test_damaged_xref_recovered_only_when_lenient() {
    let mut data = inherited_tree_pdf();
    let at = data.windows(9).rposition(|w| w == b"startxref").unwrap();
    data.truncate(at);
    data.extend_from_slice(b"startxref\n999999\n%%EOF\n");

    let doc = parse_with_options(&data, None, &ParserOptions::lenient()).unwrap();
    assert_eq!(doc.page_count().unwrap(), 3);
    assert!(matches!(
        parse_with_options(&data, None, &ParserOptions::strict()),
        Err(Error::MalformedDocument { .. })
    ));
    // Reconstructed files can only be rewritten in full.
    assert!(save(&doc, &SaveOptions::incremental()).is_err());
    assert!(save(&doc, &SaveOptions::full_rewrite()).is_ok());
}

#[test]
fn test_unreadable_hybrid_stream_is_ignored() {
    for trailer_extra in ["/XRefStm 999999 ", "/XRefStm -5 "] {
        let objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] >>".to_string(),
        ];
        let doc = parse(&build_pdf(&objects, trailer_extra)).unwrap();
        assert_eq!(geometry(&doc), vec![(200.0, 100.0, 0)]);
    }
}

#[test]
fn test_xref_subsection_overflow_is_malformed() {
    let mut data = inherited_tree_pdf();
    let at = data.windows(5).rposition(|w| w == b"xref\n").unwrap();
    let count_end = at + data[at..].iter().position(|&b| b == b' ').unwrap();
    data.splice(at + 5..count_end, b"4294967295".iter().copied());

    assert!(matches!(
        parse_with_options(&data, None, &ParserOptions::strict()),
        Err(Error::MalformedDocument { .. })
    ));
    // Lenient parsing falls back to scanning the objects.
    assert_eq!(parse(&data).unwrap().page_count().unwrap(), 3);
}

#[test]
fn test_garbage_is_not_a_pdf() {
    assert!(matches!(parse(b"hello world"), Err(Error::MalformedDocument { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_round_trip_keeps_geometry(
        pages in prop::collection::vec((50u32..2000, 50u32..2000, 0i64..4), 1..6)
    ) {
        let sizes: Vec<(f64, f64)> = pages.iter().map(|(w, h, _)| (*w as f64, *h as f64)).collect();
        let mut doc = sized_document(&sizes);
        for (i, (_, _, quarter)) in pages.iter().enumerate() {
            doc.set_page_rotation(i, quarter * 90).unwrap();
        }

        let again = parse(&serialize(&doc).unwrap()).unwrap();
        prop_assert_eq!(geometry(&again), geometry(&doc));
        prop_assert_eq!(
            again.graph().reachable_from_root().len(),
            doc.graph().reachable_from_root().len()
        );
    }
}
