//! End-to-end scenarios driven through the public session API.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use lid_compositor::{
    CompositorConfig, CompositorError, DesignSession, HexColor, LayerKind, LoadOutcome,
    MemoryAssetSource, PointF, SizePx, Texture, UploadFile, place_artwork,
};

fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn rgba(session: &DesignSession, x: u32, y: u32) -> [u8; 4] {
    let px = session
        .compositor()
        .surface()
        .expect("surface rendered")
        .pixel(x, y)
        .unwrap();
    [px.red(), px.green(), px.blue(), px.alpha()]
}

fn close(actual: [u8; 4], expected: [u8; 4]) -> bool {
    actual
        .iter()
        .zip(expected.iter())
        .all(|(a, e)| a.abs_diff(*e) <= 2)
}

#[test]
fn default_state_renders_fallback_and_exports() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    session.resolve_pending();

    assert_eq!(session.state().texture().id, "plain");
    assert!(session.state().artwork().is_none());
    // Below the gloss band the safe area is the plain fill.
    assert_eq!(rgba(&session, 320, 500), [0xf3, 0xf4, 0xf6, 255]);

    let snapshot = session.snapshot().unwrap();
    assert!(!snapshot.png_bytes().is_empty());
    assert_eq!((snapshot.width(), snapshot.height()), (640, 640));
}

#[test]
fn cosmic_nova_bitmap_replaces_fallback() {
    let source = MemoryAssetSource::new().with("/photos/lid1.png", png(30, 20, [90, 20, 160, 255]));
    let mut session = DesignSession::new(CompositorConfig::default(), source).unwrap();
    session.resolve_pending();

    let ticket = session.select_texture("cosmic-nova").unwrap().expect("needs a load");
    // Until the bitmap arrives the default fallback shows.
    assert_eq!(rgba(&session, 320, 500), [0xec, 0xef, 0xf1, 255]);

    let bytes = session.loader().fetch(&ticket);
    assert!(session.complete_load(&ticket, bytes).is_committed());

    // Cover scaling fills the safe area edge to edge.
    for (x, y) in [(320, 500), (40, 320), (600, 320), (320, 600)] {
        let px = rgba(&session, x, y);
        assert!(close(px, [90, 20, 160, 255]), "({x}, {y}) = {px:?}");
    }
    // The outer margin is untouched.
    assert_eq!(rgba(&session, 5, 320), [0x0b, 0x0f, 0x1a, 255]);
}

#[test]
fn rotated_wide_artwork_swaps_extent() {
    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    session
        .import_file(UploadFile::new("wide.png", "image/png", png(4000, 2000, [0, 0, 0, 255])))
        .unwrap();
    let natural = session.state().artwork().unwrap().natural_size();
    assert_eq!(natural, SizePx::new(4000, 2000));

    let area = session.config().surface.safe_area();
    session.set_scale(1.0);
    let flat = place_artwork(&session.state().transform(), natural, area).bounds();
    session.set_rotation(90.0);
    let turned = place_artwork(&session.state().transform(), natural, area).bounds();

    assert!((flat.width - 584.0).abs() < 1e-3);
    assert!((flat.height - 292.0).abs() < 1e-3);
    assert!((turned.width - flat.height).abs() < 1e-3);
    assert!((turned.height - flat.width).abs() < 1e-3);
    assert!((turned.center().x - 320.0).abs() < 1e-3);
    assert!((turned.center().y - 320.0).abs() < 1e-3);
}

#[test]
fn export_is_gated_on_first_render() {
    let mut session = DesignSession::new(
        CompositorConfig::default(),
        MemoryAssetSource::new(),
    )
    .unwrap();
    assert!(matches!(session.snapshot(), Err(CompositorError::ExportUnavailable)));

    session.set_pixel_ratio(2.0);
    let snapshot = session.snapshot().unwrap();
    assert_eq!((snapshot.width(), snapshot.height()), (1280, 1280));
    let decoded = image::load_from_memory(snapshot.png_bytes()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1280, 1280));
}

#[test]
fn slow_earlier_texture_does_not_win() {
    let source = MemoryAssetSource::new()
        .with("/photos/lid1.png", png(4, 4, [255, 0, 0, 255]))
        .with("/photos/lid2.png", png(4, 4, [0, 0, 255, 255]));
    let mut session = DesignSession::new(CompositorConfig::default(), source).unwrap();

    let a = session.select_texture("cosmic-nova").unwrap().unwrap();
    let b = session.select_texture("volcano-lava").unwrap().unwrap();

    let bytes_b = session.loader().fetch(&b);
    assert!(session.complete_load(&b, bytes_b).is_committed());
    let bytes_a = session.loader().fetch(&a);
    assert!(session.complete_load(&a, bytes_a).is_stale());

    assert!(session.loader().texture_bitmap("volcano-lava").is_some());
    assert!(session.loader().texture_bitmap("cosmic-nova").is_none());
    assert_eq!(session.state().texture().id, "volcano-lava");
    assert!(close(rgba(&session, 320, 500), [0, 0, 255, 255]));
}

#[test]
fn broken_texture_uses_its_fallback_color() {
    let mut config = CompositorConfig::default();
    config.catalog.push(
        Texture::image("broken", "Broken", "/photos/broken.png")
            .with_fallback_color(HexColor::new(0x20, 0x80, 0x40)),
    );
    let source = MemoryAssetSource::new().with("/photos/broken.png", b"definitely not a png".to_vec());
    let mut session = DesignSession::new(config, source).unwrap();

    session.select_texture("broken").unwrap();
    let outcomes = session.resolve_pending();
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, LoadOutcome::Failed(CompositorError::AssetLoad { .. }))));

    assert_eq!(rgba(&session, 320, 500), [0x20, 0x80, 0x40, 255]);
}

#[test]
fn controller_keeps_transform_in_range() {
    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    for i in 0..200 {
        let v = (i as f32 - 100.0) * 7.3;
        session.set_scale(v / 50.0);
        session.set_rotation(v);
        let t = session.state().transform();
        assert!((0.2..=3.0).contains(&t.scale()));
        assert!((-180.0..=180.0).contains(&t.rotation_degrees()));
    }
    session.set_scale(f32::NAN);
    assert!(session.state().transform().scale().is_finite());
}

#[test]
fn same_state_renders_identically() {
    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    session
        .import_file(UploadFile::new("a.png", "image/png", png(50, 80, [240, 120, 0, 200])))
        .unwrap();
    session.set_rotation(33.0);
    session.pointer_down(PointF::new(300.0, 300.0));
    session.pointer_move(PointF::new(260.0, 350.0));
    session.pointer_up();

    let first = session.render().unwrap().clone();
    let second = session.render().unwrap();
    assert_eq!(first.data(), second.data());
}

#[test]
fn snapshot_after_hiding_guides_has_no_guides() {
    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    session.resolve_pending();

    let decode = |png: &[u8]| image::load_from_memory(png).unwrap().to_rgba8();
    let with_guides = decode(session.snapshot().unwrap().png_bytes());
    let first_revision = session.snapshot().unwrap().revision();
    assert_ne!(with_guides.get_pixel(47, 44), with_guides.get_pixel(54, 44));

    session.set_layer_enabled(LayerKind::Guides, false);
    assert!(!session.snapshot_is_current());

    let snapshot = session.snapshot().unwrap();
    assert!(snapshot.revision() > first_revision);
    let without = decode(snapshot.png_bytes());
    assert_eq!(without.get_pixel(47, 44), without.get_pixel(54, 44));
    assert!(session.snapshot_is_current());
}

#[test]
fn undecodable_first_dropped_image_keeps_artwork() {
    let mut session = DesignSession::new(CompositorConfig::default(), MemoryAssetSource::new()).unwrap();
    session
        .import_file(UploadFile::new("keep.png", "image/png", png(8, 8, [10, 10, 10, 255])))
        .unwrap();
    let revision = session.revision();

    let files = vec![
        UploadFile::new("broken.png", "image/png", b"not really a png".to_vec()),
        UploadFile::new("fine.png", "image/png", png(4, 4, [200, 0, 0, 255])),
    ];
    assert!(matches!(
        session.drop_files(files),
        Err(CompositorError::UnsupportedImage(_))
    ));
    assert_eq!(session.state().artwork().unwrap().label(), Some("keep.png"));
    assert_eq!(session.revision(), revision);
}

#[test]
fn texture_load_is_stale_after_switching_to_solid_or_cached() {
    let source = MemoryAssetSource::new()
        .with("/photos/lid1.png", png(4, 4, [255, 0, 0, 255]))
        .with("/photos/lid2.png", png(4, 4, [0, 0, 255, 255]));
    let mut session = DesignSession::new(CompositorConfig::default(), source).unwrap();

    // Switch to a solid texture while the load is in flight.
    let slow = session.select_texture("cosmic-nova").unwrap().unwrap();
    assert!(session.select_texture("plain").unwrap().is_none());
    let bytes = session.loader().fetch(&slow);
    assert!(session.complete_load(&slow, bytes).is_stale());
    assert!(session.loader().texture_bitmap("cosmic-nova").is_none());
    assert_eq!(rgba(&session, 320, 500), [0xf3, 0xf4, 0xf6, 255]);

    // Switch to an already cached texture while another load is in flight.
    let lava = session.select_texture("volcano-lava").unwrap().unwrap();
    let bytes = session.loader().fetch(&lava);
    assert!(session.complete_load(&lava, bytes).is_committed());
    let slow = session.select_texture("cosmic-nova").unwrap().unwrap();
    assert!(session.select_texture("volcano-lava").unwrap().is_none());
    let bytes = session.loader().fetch(&slow);
    assert!(session.complete_load(&slow, bytes).is_stale());

    assert!(session.loader().texture_bitmap("cosmic-nova").is_none());
    assert_eq!(session.state().texture().id, "volcano-lava");
    assert!(close(rgba(&session, 320, 500), [0, 0, 255, 255]));
}
