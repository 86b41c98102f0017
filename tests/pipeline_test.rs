//! Integration tests for the page extraction pipeline.

mod common;

use std::sync::atomic::Ordering;

use common::{Answer, FakeRasterizer, MemoryPages, ScriptedOcr};
use pagetext::{Error, ExtractOptions, OcrErrorPolicy, PageMethod, Pipeline};

fn pipeline(ocr: ScriptedOcr, rasterizer: FakeRasterizer) -> Pipeline {
    Pipeline::new(ExtractOptions::default())
        .with_ocr_engine(ocr)
        .with_rasterizer(rasterizer)
}

#[test]
fn test_contract_salary_blank_scenario() {
    let ocr = ScriptedOcr::new(&[(2, Answer::Text("SALARY\n"))]);
    let calls = ocr.calls();
    let pages = MemoryPages::new(&["Contract Term", "", "   "]);

    let extraction = pipeline(ocr, FakeRasterizer::default())
        .extract(&pages)
        .unwrap();

    assert_eq!(extraction.text, "Contract Term\nSALARY");
    assert_eq!(*calls.lock().unwrap(), vec![2, 3]);

    let methods: Vec<_> = extraction.pages.iter().map(|p| p.method).collect();
    assert_eq!(
        methods,
        vec![PageMethod::Direct, PageMethod::Ocr, PageMethod::Empty]
    );
    assert_eq!(extraction.skipped_pages(), 1);
    assert_eq!(extraction.pages[0].chars, "Contract Term".len());
    assert_eq!(extraction.pages[1].chars, "SALARY\n".len());
}

#[test]
fn test_ocr_attempted_once_per_blank_page_only() {
    let ocr = ScriptedOcr::new(&[
        (2, Answer::Text("two")),
        (4, Answer::Text("four")),
    ]);
    let calls = ocr.calls();
    let rasterizer = FakeRasterizer::default();
    let rendered = rasterizer.calls.clone();
    let pages = MemoryPages::new(&["one", "", "three", "\n"]);

    let extraction = pipeline(ocr, rasterizer).extract(&pages).unwrap();

    assert_eq!(extraction.text, "one\ntwo\nthree\nfour");
    assert_eq!(*calls.lock().unwrap(), vec![2, 4]);
    assert_eq!(rendered.load(Ordering::SeqCst), 2);
    assert_eq!(extraction.direct_pages(), 2);
    assert_eq!(extraction.ocr_pages(), 2);
}

#[test]
fn test_result_contains_direct_text_in_page_order() {
    let pages = MemoryPages::new(&["alpha ", "", " beta\n", "gamma"]);
    let ocr = ScriptedOcr::new(&[(2, Answer::Text("scanned"))]);

    let extraction = pipeline(ocr, FakeRasterizer::default())
        .extract(&pages)
        .unwrap();

    let alpha = extraction.text.find("alpha").unwrap();
    let scanned = extraction.text.find("scanned").unwrap();
    let beta = extraction.text.find("beta").unwrap();
    let gamma = extraction.text.find("gamma").unwrap();
    assert!(alpha < scanned && scanned < beta && beta < gamma);
    assert_eq!(extraction.text, "alpha \nscanned\n beta\n\ngamma");
}

#[test]
fn test_extraction_is_idempotent() {
    let pages = MemoryPages::new(&["first", "", "third"]);
    let run = || {
        pipeline(
            ScriptedOcr::new(&[(2, Answer::Text("second"))]),
            FakeRasterizer::default(),
        )
        .extract(&pages)
        .unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_blank_document_is_empty_extraction() {
    let pages = MemoryPages::new(&["", " ", "\n\n"]);
    let err = pipeline(ScriptedOcr::default(), FakeRasterizer::default())
        .extract(&pages)
        .unwrap_err();

    assert!(matches!(err, Error::EmptyExtraction { pages: 3 }));
    assert!(err.is_user_facing());
}

#[test]
fn test_failed_page_is_skipped_by_default() {
    let ocr = ScriptedOcr::new(&[
        (1, Answer::Fail("tesseract crashed")),
        (2, Answer::Text("recovered")),
    ]);
    let calls = ocr.calls();
    let pages = MemoryPages::new(&["", ""]);

    let extraction = pipeline(ocr, FakeRasterizer::default())
        .extract(&pages)
        .unwrap();

    assert_eq!(extraction.text, "recovered");
    assert_eq!(extraction.pages[0].method, PageMethod::OcrFailed);
    assert!(extraction.pages[0]
        .warning
        .as_deref()
        .unwrap()
        .contains("tesseract crashed"));
    assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_abort_policy_stops_at_first_failure() {
    let ocr = ScriptedOcr::new(&[
        (2, Answer::Fail("bad page")),
        (3, Answer::Text("never reached")),
    ]);
    let calls = ocr.calls();
    let options = ExtractOptions::default().with_ocr_error_policy(OcrErrorPolicy::AbortDocument);
    let pipeline = Pipeline::new(options)
        .with_ocr_engine(ocr)
        .with_rasterizer(FakeRasterizer::default());

    let err = pipeline
        .extract(&MemoryPages::new(&["text", "", ""]))
        .unwrap_err();

    match err {
        Error::OcrFailed { page, message } => {
            assert_eq!(page, 2);
            assert!(message.contains("bad page"));
        }
        other => panic!("expected OcrFailed, got {:?}", other),
    }
    assert_eq!(*calls.lock().unwrap(), vec![2]);
}

#[test]
fn test_undecodable_raster_counts_as_ocr_failure() {
    let rasterizer = FakeRasterizer {
        corrupt_pages: vec![1],
        ..FakeRasterizer::default()
    };
    let ocr = ScriptedOcr::new(&[(2, Answer::Text("page two"))]);
    let calls = ocr.calls();

    let extraction = pipeline(ocr, rasterizer)
        .extract(&MemoryPages::new(&["", ""]))
        .unwrap();

    assert_eq!(extraction.text, "page two");
    assert_eq!(extraction.pages[0].method, PageMethod::OcrFailed);
    assert_eq!(*calls.lock().unwrap(), vec![2]);
}

#[test]
fn test_undecodable_raster_aborts_under_strict_policy() {
    let rasterizer = FakeRasterizer {
        corrupt_pages: vec![1],
        ..FakeRasterizer::default()
    };
    let pipeline = Pipeline::new(ExtractOptions::default().strict_ocr())
        .with_ocr_engine(ScriptedOcr::default())
        .with_rasterizer(rasterizer);

    let err = pipeline.extract(&MemoryPages::new(&[""])).unwrap_err();
    assert!(matches!(err, Error::OcrFailed { page: 1, .. }));
}

#[test]
fn test_unavailable_engine_falls_back_to_direct_text() {
    let ocr = ScriptedOcr {
        available: Some(false),
        ..ScriptedOcr::default()
    };
    let calls = ocr.calls();
    let pages = MemoryPages::new(&["", "kept", ""]);

    let extraction = pipeline(ocr, FakeRasterizer::default())
        .extract(&pages)
        .unwrap();

    assert_eq!(extraction.text, "kept");
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(extraction.pages[0].method, PageMethod::OcrUnavailable);
    assert_eq!(extraction.pages[2].method, PageMethod::OcrUnavailable);
}

#[test]
fn test_unavailable_engine_with_no_text_layer_is_empty() {
    let ocr = ScriptedOcr {
        available: Some(false),
        ..ScriptedOcr::default()
    };
    let err = pipeline(ocr, FakeRasterizer::default())
        .extract(&MemoryPages::new(&["", ""]))
        .unwrap_err();
    assert!(matches!(err, Error::EmptyExtraction { pages: 2 }));
}

#[test]
fn test_unavailable_rasterizer_disables_ocr() {
    let rasterizer = FakeRasterizer {
        unavailable: true,
        ..FakeRasterizer::default()
    };
    let rendered = rasterizer.calls.clone();
    let extraction = pipeline(ScriptedOcr::default(), rasterizer)
        .extract(&MemoryPages::new(&["", "body"]))
        .unwrap();

    assert_eq!(extraction.text, "body");
    assert_eq!(rendered.load(Ordering::SeqCst), 0);
}

#[test]
fn test_engine_lost_mid_document_is_not_retried() {
    let ocr = ScriptedOcr::new(&[
        (1, Answer::Unavailable),
        (3, Answer::Text("unreachable")),
    ]);
    let calls = ocr.calls();
    let options = ExtractOptions::default().strict_ocr();
    let pipeline = Pipeline::new(options)
        .with_ocr_engine(ocr)
        .with_rasterizer(FakeRasterizer::default());

    // Unavailability degrades even under the strict policy.
    let extraction = pipeline
        .extract(&MemoryPages::new(&["", "middle", ""]))
        .unwrap();

    assert_eq!(extraction.text, "middle");
    assert_eq!(*calls.lock().unwrap(), vec![1]);
    assert_eq!(extraction.pages[2].method, PageMethod::OcrUnavailable);
}

#[test]
fn test_unreadable_text_layer_falls_back_to_ocr() {
    let ocr = ScriptedOcr::new(&[(2, Answer::Text("recovered by ocr"))]);
    let calls = ocr.calls();
    // Page 2 has text, but its text layer cannot be decoded.
    let pages = MemoryPages::new(&["first", "garbled", "third"]).with_unreadable(&[2]);

    let extraction = pipeline(ocr, FakeRasterizer::default())
        .extract(&pages)
        .unwrap();

    assert_eq!(extraction.text, "first\nrecovered by ocr\nthird");
    assert_eq!(*calls.lock().unwrap(), vec![2]);
    let methods: Vec<_> = extraction.pages.iter().map(|p| p.method).collect();
    assert_eq!(
        methods,
        vec![PageMethod::Direct, PageMethod::Ocr, PageMethod::Direct]
    );
}

#[test]
fn test_unreadable_text_layer_does_not_abort_strict_run() {
    let pipeline = Pipeline::new(ExtractOptions::default().strict_ocr())
        .with_ocr_engine(ScriptedOcr::default())
        .with_rasterizer(FakeRasterizer::default());
    let pages = MemoryPages::new(&["", "kept"]).with_unreadable(&[1]);

    let extraction = pipeline.extract(&pages).unwrap();
    assert_eq!(extraction.text, "kept");
    assert_eq!(extraction.pages[0].method, PageMethod::Empty);
}

#[test]
fn test_report_serializes_to_json() {
    let extraction = pipeline(
        ScriptedOcr::new(&[(2, Answer::Text("ocr"))]),
        FakeRasterizer::default(),
    )
    .extract(&MemoryPages::new(&["direct", ""]))
    .unwrap();

    let json: serde_json::Value = serde_json::to_value(&extraction).unwrap();
    assert_eq!(json["text"], "direct\nocr");
    assert_eq!(json["pages"][0]["method"], "direct");
    assert_eq!(json["pages"][1]["method"], "ocr");
    assert!(json["pages"][0].get("warning").is_none());
}
