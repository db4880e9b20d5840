//! End-to-end pipeline tests: split, render, export, deliver

use scrawl::prelude::*;
use scrawl_core::FontFace;
use std::sync::Arc;

/// Deterministic face with no real font bytes; glyphs render as
/// fallback marks, which is all the pipeline needs.
struct ScriptStub;

impl FontFace for ScriptStub {
    fn family(&self) -> &str {
        "script-stub"
    }

    fn data(&self) -> &[u8] {
        &[]
    }

    fn units_per_em(&self) -> u16 {
        1000
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        Some(ch as u32)
    }

    fn advance_width(&self, _glyph_id: u32, size: f32) -> f32 {
        size * 0.5
    }
}

fn context(paper_dir: &std::path::Path) -> Scrawl {
    let scrawl = Scrawl::builder(paper_dir)
        .device_profile(DeviceProfile {
            memory_gb: 16.0,
            cores: 8,
            screen: scrawl_core::quality::ScreenClass::Medium,
        })
        .quality_preset(QualityPreset::High)
        .retry_policy(RetryPolicy::immediate(1))
        .build();
    scrawl.fonts().register_face("Hand", Arc::new(ScriptStub));
    scrawl
}

fn config(text: &str) -> RenderConfig {
    RenderConfig {
        canvas_width: 160,
        canvas_height: 220,
        text: text.to_string(),
        font_family: "Hand".to_string(),
        ..RenderConfig::default()
    }
}

#[test]
fn document_splits_renders_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let scrawl = context(dir.path());

    let mut cfg = config("one two three four five six");
    cfg.words_per_page = 2;
    let document = scrawl.render_document(&cfg).unwrap();
    assert_eq!(document.pages.len(), 3);
    assert_eq!(document.split.total_pages, 3);
    assert_eq!(document.fallback_pages, 0);

    let exported = scrawl.export_pages(&document, ExportFormat::Png);
    assert!(exported.iter().all(|r| r.success));

    let out = dir.path().join("out");
    let downloads = scrawl.download_pages(&exported, &out, "letter");
    assert!(downloads.iter().all(|d| d.success));
    assert!(out.join("letter_001.png").exists());
    assert!(out.join("letter_003.png").exists());

    let archive = scrawl.download_archive(&exported, &out, "letter");
    assert!(archive.success);
    assert!(out.join("letter.tar.gz").exists());
}

#[test]
fn unregistered_font_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let scrawl = context(dir.path());
    let mut cfg = config("hello");
    cfg.font_family = "Nonexistent".to_string();
    assert!(scrawl.render_document(&cfg).is_err());
}

#[test]
fn empty_text_still_produces_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let scrawl = context(dir.path());
    let document = scrawl.render_document(&config("")).unwrap();
    assert_eq!(document.pages.len(), 1);
    assert!(!document.pages[0].is_empty());
}

#[test]
fn truncation_respects_max_pages() {
    let dir = tempfile::tempdir().unwrap();
    let scrawl = context(dir.path());
    let mut cfg = config(&"word ".repeat(50));
    cfg.words_per_page = 5;
    cfg.max_pages = 2;
    let document = scrawl.render_document(&cfg).unwrap();
    assert_eq!(document.pages.len(), 2);
    assert!(document.split.truncated);
    assert!(document.split.remaining_words.unwrap() > 0);
}

#[test]
fn lined_template_with_metadata_renders_without_texture() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("college.json"),
        r#"{
            "lineHeight": 32.0,
            "marginTop": 40.0,
            "marginLeft": 24.0,
            "lineSpacing": 0.0,
            "lineColor": "B0C4DE",
            "baselineOffset": 24.0
        }"#,
    )
    .unwrap();
    let scrawl = context(dir.path());

    let mut cfg = config("stay on the lines");
    cfg.template = Some(PaperTemplate::new(
        "college",
        "College Ruled",
        "college.png",
        PaperKind::Lined,
    ));
    let document = scrawl.render_document(&cfg).unwrap();
    assert_eq!(document.pages.len(), 1);
    // Primary path handled it; synthesized paper is not a fallback
    assert_eq!(document.fallback_pages, 0);
}

#[test]
fn degraded_quality_shrinks_the_surface() {
    let dir = tempfile::tempdir().unwrap();
    let scrawl = context(dir.path());

    let full = scrawl.render_document(&config("hi")).unwrap();

    let slow = PerformanceReport {
        avg_render_ms: 2000.0,
        memory_used_mb: 100.0,
        frame_rate: 60.0,
    };
    assert!(scrawl.observe_performance(&slow));
    let degraded = scrawl.render_document(&config("hi")).unwrap();
    assert!(degraded.pages[0].width < full.pages[0].width);
}

#[test]
fn blank_and_textured_paper_render_identically_sized_pages() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::from_pixel(24, 24, image::Rgba([235, 228, 210, 255]))
        .save(dir.path().join("kraft.png"))
        .unwrap();
    let scrawl = context(dir.path());

    let plain = scrawl.render_document(&config("note")).unwrap();
    let mut cfg = config("note");
    cfg.template = Some(PaperTemplate::new(
        "kraft",
        "Kraft",
        "kraft.png",
        PaperKind::Blank,
    ));
    let textured = scrawl.render_document(&cfg).unwrap();

    assert_eq!(plain.pages[0].width, textured.pages[0].width);
    assert_ne!(plain.pages[0].data, textured.pages[0].data);
    assert_eq!(textured.fallback_pages, 0);
}
