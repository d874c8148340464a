use preset_market::{DEFAULT_PREVIEW_PATH, PreviewOutcome, PreviewRenderer, preview_file_name};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_render_writes_png_under_public_prefix() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/uploads/previews");

    let layout = json!({"canvas_width": 800, "canvas_height": 300});
    let outcome = renderer.render(&layout);

    assert!(outcome.is_generated(), "unexpected outcome: {:?}", outcome);
    let expected = format!("/uploads/previews/{}", preview_file_name(&layout));
    assert_eq!(outcome.path(), expected);

    let file = temp_dir.path().join(preview_file_name(&layout));
    let image = image::open(&file).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (800, 300));
}

#[test]
fn test_identical_layouts_share_a_file() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/uploads/previews/");

    let first = renderer.render(&json!({"canvas_width": 64, "canvas_height": 32, "padding": 4}));
    let second = renderer.render(&json!({"padding": 4, "canvas_height": 32, "canvas_width": 64}));

    assert_eq!(first.path(), second.path());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_bad_layouts_fall_back_to_placeholder() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/uploads/previews");

    let broken = [
        json!({"text_bg": "rgba(1,2)"}),
        json!({"background_color": "definitely-not-a-color"}),
        json!({"text_color": 42}),
        json!({"canvas_width": -1}),
        json!("not an object"),
    ];

    for layout in broken {
        match renderer.render(&layout) {
            PreviewOutcome::Fallback { path, .. } => assert_eq!(path, DEFAULT_PREVIEW_PATH),
            other => panic!("expected fallback for {}, got {:?}", layout, other),
        }
    }
}

#[test]
fn test_missing_font_file_still_renders() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/p")
        .with_default_font(temp_dir.path().join("missing.ttf"));

    let outcome = renderer.render(&json!({
        "canvas_width": 120,
        "canvas_height": 60,
        "body_font": "/no/such/font.ttf"
    }));
    assert!(outcome.is_generated());
}

#[test]
fn test_unparseable_font_file_still_renders() {
    let temp_dir = tempdir().unwrap();
    let font_path = temp_dir.path().join("garbage.ttf");
    std::fs::write(&font_path, b"not a font").unwrap();

    let renderer = PreviewRenderer::new(temp_dir.path().join("out"), "/p");
    let outcome = renderer.render(&json!({
        "canvas_width": 120,
        "canvas_height": 60,
        "body_font": font_path.to_string_lossy()
    }));
    assert!(outcome.is_generated());
}

#[test]
fn test_unwritable_output_dir_falls_back() {
    let temp_dir = tempdir().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    // A regular file where the output directory should be
    let renderer = PreviewRenderer::new(blocker.join("previews"), "/p")
        .with_fallback_path("/static/placeholder.png");
    let outcome = renderer.render(&json!({"canvas_width": 10, "canvas_height": 10}));

    assert!(!outcome.is_generated());
    assert_eq!(outcome.path(), "/static/placeholder.png");
}

#[test]
fn test_overlay_pixels_in_written_file() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/p");
    let layout = json!({
        "canvas_width": 40,
        "canvas_height": 40,
        "background_color": "#ffffff",
        "box_left": 0,
        "box_top": 0,
        "box_width": 10,
        "box_height": 10,
        "text_bg": "rgba(0,0,0)",
        "padding": 100
    });

    assert!(renderer.render(&layout).is_generated());
    let image = image::open(temp_dir.path().join(preview_file_name(&layout)))
        .unwrap()
        .to_rgb8();

    // Default alpha 0.52 -> 132/255 toward black
    let expected = ((255u32 * (255 - 132) + 127) / 255) as u8;
    assert_eq!(image.get_pixel(5, 5).0, [expected; 3]);
    assert_eq!(image.get_pixel(20, 20).0, [255, 255, 255]);
}

#[test]
fn test_sample_text_drawn_without_any_configured_font() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/p")
        .with_default_font(temp_dir.path().join("missing.ttf"));
    let layout = json!({
        "canvas_width": 400,
        "canvas_height": 100,
        "background_color": "#000000",
        "text_bg": "#000000",
        "text_color": "#ffffff",
        "font_size": 40,
        "padding": 10,
        "body_font": "/no/such/font.ttf"
    });

    assert!(renderer.render(&layout).is_generated());
    let image = image::open(temp_dir.path().join(preview_file_name(&layout)))
        .unwrap()
        .to_rgb8();

    let lit = image.pixels().filter(|p| p.0 != [0, 0, 0]).count();
    assert!(lit > 100, "expected sample text, found {} lit pixels", lit);
}

#[test]
fn test_huge_offsets_render_clipped() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/p");

    let far_away = [
        json!({"canvas_width": 64, "canvas_height": 32, "box_left": 1e19}),
        json!({"canvas_width": 64, "canvas_height": 32, "box_left": 1e19, "text_bg": "#ff0000"}),
        json!({"canvas_width": 64, "canvas_height": 32, "box_top": -1e19, "text_bg": "#ff0000"}),
        json!({"canvas_width": 64, "canvas_height": 32, "padding": 1e12}),
        json!({"canvas_width": 64, "canvas_height": 32, "padding": -1e12}),
    ];

    for layout in far_away {
        let outcome = renderer.render(&layout);
        assert!(outcome.is_generated(), "{}: {:?}", layout, outcome);
    }
}

#[test]
fn test_oversized_font_falls_back() {
    let temp_dir = tempdir().unwrap();
    let renderer = PreviewRenderer::new(temp_dir.path(), "/p");

    let outcome = renderer.render(&json!({"font_size": 1e12}));
    assert_eq!(outcome.path(), DEFAULT_PREVIEW_PATH);
}
