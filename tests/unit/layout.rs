use std::io::Cursor;

use image::Rgba;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "loopcomp_layout_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, img: &RgbaImage) {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn manifest_parses_with_defaults() {
    let m: LayoutManifest = serde_json::from_str(
        r#"{ "items": [ { "id": "a", "src": "a.gif", "x": 3, "y": -2 },
                        { "id": "b", "src": "b.png", "x": 0, "y": 0, "w": 8, "h": 8, "shape": "ellipse" } ] }"#,
    )
    .unwrap();
    assert_eq!(m.items.len(), 2);
    assert_eq!(m.items[0].shape, ItemShape::Rounded);
    assert_eq!(m.items[0].w, None);
    assert_eq!(m.items[1].shape, ItemShape::Ellipse);
    m.validate().unwrap();

    let opts = PrepareOpts::default();
    assert_eq!(m.items[1].mask_shape(&opts), MaskShape::Ellipse);
    assert_eq!(m.items[0].mask_shape(&opts), opts.default_shape());
}

#[test]
fn manifest_rejects_duplicates_and_unknown_fields() {
    let dup: LayoutManifest = serde_json::from_str(
        r#"{ "items": [ { "id": "a", "src": "a", "x": 0, "y": 0 },
                        { "id": "a", "src": "b", "x": 0, "y": 0 } ] }"#,
    )
    .unwrap();
    assert!(dup.validate().is_err());

    let unknown = serde_json::from_str::<LayoutManifest>(
        r#"{ "items": [ { "id": "a", "src": "a", "x": 0, "y": 0, "z": 1 } ] }"#,
    );
    assert!(unknown.is_err());
}

#[test]
fn load_splits_statics_and_skips_unreadable_items() {
    let dir = temp_dir("load");
    write_png(&dir.join("still.png"), &RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255])));
    std::fs::write(dir.join("junk.gif"), b"not an image").unwrap();

    let m = LayoutManifest {
        items: vec![
            LayoutItem {
                id: "still".to_owned(),
                src: PathBuf::from("still.png"),
                x: 1,
                y: 1,
                w: None,
                h: None,
                shape: ItemShape::Rect,
                radius: None,
            },
            LayoutItem {
                id: "junk".to_owned(),
                src: PathBuf::from("junk.gif"),
                x: 0,
                y: 0,
                w: None,
                h: None,
                shape: ItemShape::Rect,
                radius: None,
            },
            LayoutItem {
                id: "missing".to_owned(),
                src: PathBuf::from("missing.gif"),
                x: 0,
                y: 0,
                w: None,
                h: None,
                shape: ItemShape::Rect,
                radius: None,
            },
        ],
    };
    let loaded = m.load(&dir, &PrepareOpts::default()).unwrap();
    assert_eq!(loaded.statics.len(), 1);
    assert!(loaded.assets.is_empty());
    assert_eq!(loaded.statics[0].0, PlacementRect::new(1, 1, 4, 4));

    let bg = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
    let painted = loaded.paint_statics(&bg);
    assert_eq!(painted.get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
    assert_eq!(painted.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn load_rejects_invalid_prepare_options_up_front() {
    let dir = temp_dir("bad_opts");
    write_png(&dir.join("still.png"), &RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])));
    let m = LayoutManifest {
        items: vec![LayoutItem {
            id: "still".to_owned(),
            src: PathBuf::from("still.png"),
            x: 0,
            y: 0,
            w: None,
            h: None,
            shape: ItemShape::Rect,
            radius: None,
        }],
    };
    let opts = PrepareOpts {
        max_render_width: 0,
        ..PrepareOpts::default()
    };
    let err = m.load(&dir, &opts).unwrap_err();
    assert!(matches!(err, LoopcompError::Validation(_)));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn load_item_reports_each_stage_failure() {
    let dir = temp_dir("item");
    std::fs::write(dir.join("junk.gif"), b"not an image").unwrap();
    let item = |src: &str| LayoutItem {
        id: "x".to_owned(),
        src: PathBuf::from(src),
        x: 0,
        y: 0,
        w: None,
        h: None,
        shape: ItemShape::Rect,
        radius: None,
    };
    let opts = PrepareOpts::default();
    assert!(matches!(
        load_item(&item("junk.gif"), &dir, &opts),
        Err(LoopcompError::Decode(_))
    ));
    assert!(matches!(
        load_item(&item("missing.gif"), &dir, &opts),
        Err(LoopcompError::Other(_))
    ));

    let _ = std::fs::remove_dir_all(&dir);
}
