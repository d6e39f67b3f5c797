//! Integration tests for the PDF report merger

mod common;

use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use common::*;
use pdf_report_merger::layout::PaperSize;
use pdf_report_merger::{
    plan_only, ErrorKind, MergePipeline, MergeRequest, MergeStatus, Stage,
};
use rstest::rstest;
use tempfile::TempDir;

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_main_with_two_trials() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 3);
    let a = write_numbered_pdf(dir.path(), "A.pdf", 2);
    let b = write_numbered_pdf(dir.path(), "B.pdf", 1);
    let out = dir.path().join("out.pdf");

    let request = MergeRequest::new(&main, vec![a, b], "Report", &out);
    let mut pipeline = MergePipeline::new(request);
    let summary = pipeline.run().unwrap();

    assert_eq!(pipeline.stage(), Stage::Done);
    assert_eq!(summary.total_pages, 8);
    assert_eq!(summary.cover_positions, vec![4, 7]);
    assert!(summary.bytes_written > 0);

    let doc = load_output(&out);
    let pages = page_ids(&doc);
    assert_eq!(pages.len(), 8);

    let expected_body = [
        "main p1", "main p2", "main p3", "A", "A p1", "A p2", "B", "B p1",
    ];
    for (i, (&page_id, body)) in pages.iter().zip(expected_body).enumerate() {
        assert_eq!(page_text(&doc, page_id), vec![body.to_string()], "page {}", i + 1);
        assert_eq!(
            footer_text(&doc, page_id),
            vec!["Report".to_string(), format!("Page {} of 8", i + 1)],
            "footer on page {}",
            i + 1
        );
    }
}

#[rstest]
#[case(3, vec![], 3)]
#[case(0, vec![2], 3)]
#[case(1, vec![0], 2)]
#[case(2, vec![1, 1, 1], 8)]
fn test_total_page_count(
    #[case] main_pages: usize,
    #[case] trial_pages: Vec<usize>,
    #[case] expected: usize,
) {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", main_pages);
    let trials = trial_pages
        .iter()
        .enumerate()
        .map(|(i, &pages)| write_numbered_pdf(dir.path(), &format!("trial{i}.pdf"), pages))
        .collect();
    let out = dir.path().join("out.pdf");

    let summary = MergePipeline::new(MergeRequest::new(&main, trials, "T", &out))
        .run()
        .unwrap();
    assert_eq!(summary.total_pages, expected);

    let doc = load_output(&out);
    let pages = page_ids(&doc);
    assert_eq!(pages.len(), expected);
    let last = footer_text(&doc, pages[expected - 1]);
    assert_eq!(last.last().unwrap(), &format!("Page {expected} of {expected}"));
}

#[test]
fn test_no_trials_only_adds_footers() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let out = dir.path().join("out.pdf");

    let summary = MergePipeline::new(MergeRequest::new(&main, vec![], "Solo", &out))
        .run()
        .unwrap();
    assert!(summary.cover_positions.is_empty());

    let doc = load_output(&out);
    let pages = page_ids(&doc);
    assert_eq!(page_text(&doc, pages[0]), vec!["main p1"]);
    assert_eq!(footer_text(&doc, pages[1]), vec!["Solo", "Page 2 of 2"]);
}

#[test]
fn test_unreadable_trial_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let good = write_numbered_pdf(dir.path(), "good.pdf", 1);
    let broken = dir.path().join("broken.pdf");
    fs::write(&broken, b"%PDF-1.4\nthis is not a pdf").unwrap();
    let out = dir.path().join("out.pdf");

    let main_before = fs::read(&main).unwrap();
    let good_before = fs::read(&good).unwrap();

    let mut pipeline =
        MergePipeline::new(MergeRequest::new(&main, vec![good.clone(), broken], "R", &out));
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnreadableFile);
    assert!(err.to_string().contains("broken.pdf"));
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert!(!out.exists());
    assert_eq!(fs::read(&main).unwrap(), main_before);
    assert_eq!(fs::read(&good).unwrap(), good_before);
}

#[test]
fn test_missing_trial_reports_unreadable() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("out.pdf");

    let status = MergePipeline::new(MergeRequest::new(
        &main,
        vec![dir.path().join("absent.pdf")],
        "R",
        &out,
    ))
    .execute();

    match status {
        MergeStatus::Failed { kind, message } => {
            assert_eq!(kind, ErrorKind::UnreadableFile);
            assert!(message.contains("absent.pdf"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn test_trial_order_moves_covers() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let a = write_numbered_pdf(dir.path(), "A.pdf", 2);
    let b = write_numbered_pdf(dir.path(), "B.pdf", 1);

    let forward = dir.path().join("forward.pdf");
    let reverse = dir.path().join("reverse.pdf");
    let s1 = MergePipeline::new(MergeRequest::new(&main, vec![a.clone(), b.clone()], "", &forward))
        .run()
        .unwrap();
    let s2 = MergePipeline::new(MergeRequest::new(&main, vec![b, a], "", &reverse))
        .run()
        .unwrap();

    assert_eq!(s1.total_pages, s2.total_pages);
    assert_eq!(s1.cover_positions, vec![2, 5]);
    assert_eq!(s2.cover_positions, vec![2, 4]);

    let doc = load_output(&reverse);
    let pages = page_ids(&doc);
    assert_eq!(page_text(&doc, pages[1]), vec!["B"]);
    assert_eq!(page_text(&doc, pages[3]), vec!["A"]);
}

#[test]
fn test_rerun_is_stable() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let a = write_numbered_pdf(dir.path(), "A.pdf", 1);
    let out = dir.path().join("out.pdf");

    let footers = |path: &std::path::Path| {
        let doc = load_output(path);
        page_ids(&doc)
            .into_iter()
            .map(|id| footer_text(&doc, id))
            .collect::<Vec<_>>()
    };

    MergePipeline::new(MergeRequest::new(&main, vec![a.clone()], "Again", &out))
        .run()
        .unwrap();
    let first = footers(&out);

    MergePipeline::new(MergeRequest::new(&main, vec![a], "Again", &out))
        .run()
        .unwrap();
    let second = footers(&out);

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn test_empty_title_shows_only_page_number() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("out.pdf");

    MergePipeline::new(MergeRequest::new(&main, vec![], "", &out))
        .run()
        .unwrap();

    let doc = load_output(&out);
    let pages = page_ids(&doc);
    assert_eq!(footer_text(&doc, pages[0]), vec!["Page 1 of 1"]);
}

#[test]
fn test_existing_output_is_replaced() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("out.pdf");
    fs::write(&out, b"old contents").unwrap();

    MergePipeline::new(MergeRequest::new(&main, vec![], "New", &out))
        .run()
        .unwrap();

    assert!(fs::read(&out).unwrap().starts_with(b"%PDF-"));
    assert_eq!(page_ids(&load_output(&out)).len(), 1);
}

#[test]
fn test_cancelled_merge_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let out = dir.path().join("out.pdf");

    let flag = Arc::new(AtomicBool::new(true));
    let mut pipeline =
        MergePipeline::new(MergeRequest::new(&main, vec![], "R", &out)).with_cancel_flag(flag);
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(!out.exists());
}

#[test]
fn test_empty_main_without_trials_rejected() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 0);
    let out = dir.path().join("out.pdf");

    let err = MergePipeline::new(MergeRequest::new(&main, vec![], "R", &out))
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyMerge);
    assert!(!out.exists());
}

#[test]
fn test_cover_matches_main_page_size() {
    let dir = TempDir::new().unwrap();
    let main = write_pdf(dir.path(), "main.pdf", &["only page"], A4);
    let trial = write_numbered_pdf(dir.path(), "T.pdf", 1);
    let out = dir.path().join("out.pdf");

    MergePipeline::new(MergeRequest::new(&main, vec![trial], "", &out))
        .run()
        .unwrap();

    let doc = load_output(&out);
    let pages = page_ids(&doc);
    let cover = page_media_box(&doc, pages[1]);
    assert_close(cover[2], A4[0]);
    assert_close(cover[3], A4[1]);

    // the trial keeps its own Letter size
    let trial_box = page_media_box(&doc, pages[2]);
    assert_close(trial_box[2], LETTER[0]);
    assert_close(trial_box[3], LETTER[1]);
}

#[rstest]
#[case(PaperSize::Letter, LETTER)]
#[case(PaperSize::A4, A4)]
fn test_cover_fallback_when_main_is_empty(#[case] fallback: PaperSize, #[case] expected: [f32; 2]) {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 0);
    let trial = write_numbered_pdf(dir.path(), "T.pdf", 1);
    let out = dir.path().join("out.pdf");

    let mut request = MergeRequest::new(&main, vec![trial], "", &out);
    request.cover_fallback = fallback;
    MergePipeline::new(request).run().unwrap();

    let doc = load_output(&out);
    let cover = page_media_box(&doc, page_ids(&doc)[0]);
    assert_close(cover[2], expected[0]);
    assert_close(cover[3], expected[1]);
}

#[test]
fn test_plan_only_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 3);
    let a = write_numbered_pdf(dir.path(), "A.pdf", 2);
    let b = write_numbered_pdf(dir.path(), "B.pdf", 1);
    let out = dir.path().join("out.pdf");

    let plan = plan_only(&MergeRequest::new(&main, vec![a, b], "", &out)).unwrap();
    assert_eq!(plan.total_pages(), 8);
    assert_eq!(plan.cover_position(0), Some(4));
    assert_eq!(plan.cover_position(1), Some(7));
    assert!(!out.exists());
}

#[test]
fn test_output_metadata() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("out.pdf");

    MergePipeline::new(MergeRequest::new(&main, vec![], "Quarterly Review", &out))
        .run()
        .unwrap();

    let info = pdf_report_merger::pdf::inspect(&out).unwrap();
    assert_eq!(info.page_count, 1);
    assert_eq!(info.title.as_deref(), Some("Quarterly Review"));
}

#[test]
fn test_title_punctuation_printed_exactly() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let trial = write_numbered_pdf(dir.path(), "T.pdf", 1);
    let out = dir.path().join("out.pdf");

    let title = "Smith\u{2019}s Trial \u{2013} \u{20ac}5k";
    MergePipeline::new(MergeRequest::new(&main, vec![trial], title, &out))
        .run()
        .unwrap();

    let doc = load_output(&out);
    for (i, page_id) in page_ids(&doc).into_iter().enumerate() {
        assert_eq!(
            footer_bytes(&doc, page_id),
            vec![
                b"Smith\x92s Trial \x96 \x805k".to_vec(),
                format!("Page {} of 3", i + 1).into_bytes(),
            ]
        );
    }
}

#[test]
fn test_title_without_glyph_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("out.pdf");

    let err = MergePipeline::new(MergeRequest::new(&main, vec![], "\u{8a66}\u{9a13}", &out))
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(!out.exists());
}

#[test]
fn test_title_too_long_for_footer_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let out = dir.path().join("out.pdf");

    let title = "Consolidated Results of the Field Trials Conducted Across the Northern Region and \
                 the Adjoining Coastal Districts During the Season";
    let err = MergePipeline::new(MergeRequest::new(&main, vec![], title, &out))
        .run()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Overlay);
    assert!(err.to_string().contains("does not fit"));
    assert!(!out.exists());
}

#[test]
fn test_page_too_small_for_footer_aborts_merge() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let tiny = write_pdf(dir.path(), "tiny.pdf", &["strip"], [200.0, 30.0]);
    let out = dir.path().join("out.pdf");

    let mut pipeline = MergePipeline::new(MergeRequest::new(&main, vec![tiny], "R", &out));
    let err = pipeline.run().unwrap_err();

    match err {
        pdf_report_merger::Error::Overlay { page_number, .. } => assert_eq!(page_number, 4),
        other => panic!("expected overlay error, got {other:?}"),
    }
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert!(!out.exists());
}

#[test]
fn test_unwritable_output_reports_write_error() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    let out = dir.path().join("missing").join("out.pdf");

    let status = MergePipeline::new(MergeRequest::new(&main, vec![], "R", &out)).execute();

    assert!(matches!(status, MergeStatus::Failed { kind: ErrorKind::Write, .. }));
    assert!(!out.exists());
    // only the input remains, no temporary file
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_cancel_between_pages() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 4);
    let out = dir.path().join("out.pdf");

    let flag = Arc::new(AtomicBool::new(false));
    let stamped = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (cancel, seen) = (Arc::clone(&flag), Arc::clone(&stamped));

    let mut pipeline = MergePipeline::new(MergeRequest::new(&main, vec![], "R", &out))
        .with_cancel_flag(flag)
        .on_page_stamped(move |page, _total| {
            seen.lock().unwrap().push(page);
            if page == 2 {
                cancel.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        });
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert_eq!(*stamped.lock().unwrap(), vec![1, 2]);
    assert!(!out.exists());
}

#[test]
fn test_progress_reports_every_page() {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 2);
    let trial = write_numbered_pdf(dir.path(), "T.pdf", 1);
    let out = dir.path().join("out.pdf");

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    MergePipeline::new(MergeRequest::new(&main, vec![trial], "R", &out))
        .on_page_stamped(move |page, total| sink.lock().unwrap().push((page, total)))
        .run()
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

#[rstest]
#[case(90, vec![0.0, 1.0, -1.0, 0.0, 612.0, 0.0])]
#[case(180, vec![-1.0, 0.0, 0.0, -1.0, 612.0, 792.0])]
#[case(270, vec![0.0, -1.0, 1.0, 0.0, 0.0, 792.0])]
fn test_rotated_pages_keep_footer_at_viewed_bottom(
    #[case] rotation: i64,
    #[case] expected: Vec<f32>,
) {
    let dir = TempDir::new().unwrap();
    let main = write_numbered_pdf(dir.path(), "main.pdf", 1);
    set_rotation(&main, rotation);
    let out = dir.path().join("out.pdf");

    MergePipeline::new(MergeRequest::new(&main, vec![], "Turned", &out))
        .run()
        .unwrap();

    let doc = load_output(&out);
    let page = page_ids(&doc)[0];
    assert_eq!(footer_matrix(&doc, page), expected);
    assert_eq!(footer_text(&doc, page), vec!["Turned", "Page 1 of 1"]);
}
