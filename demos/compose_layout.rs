use std::collections::BTreeMap;

use image::{Rgba, RgbaImage};
use loopcomp::{
    AnimatedAsset, ComposeOpts, OutputFormat, PlacementRect, Rational, compose_animation,
    plan_timeline,
};

fn solid_frames(colors: &[[u8; 4]], size: u32) -> Vec<RgbaImage> {
    colors
        .iter()
        .map(|&c| RgbaImage::from_pixel(size, size, Rgba(c)))
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let background = RgbaImage::from_pixel(200, 120, Rgba([24, 24, 32, 255]));

    // Two loops of 200 ms and 150 ms combine into a 600 ms composite period.
    let blink = AnimatedAsset::new(
        "blink",
        solid_frames(&[[230, 60, 60, 255], [60, 60, 230, 255]], 48),
        vec![Rational::from_millis(100); 2],
    )?;
    let pulse = AnimatedAsset::new(
        "pulse",
        solid_frames(&[[60, 200, 90, 255]], 48),
        vec![Rational::from_millis(150)],
    )?;
    let assets = [blink, pulse];

    let placements = BTreeMap::from([
        ("blink".to_owned(), PlacementRect::new(24, 36, 48, 48)),
        ("pulse".to_owned(), PlacementRect::new(128, 36, 48, 48)),
    ]);

    let opts = ComposeOpts {
        use_external_optimizer: false,
        ..ComposeOpts::default()
    };

    let plan = plan_timeline(&assets, &opts)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);

    let out_dir = std::path::Path::new("target");
    std::fs::create_dir_all(out_dir)?;
    for format in [OutputFormat::Apng, OutputFormat::Gif] {
        let out = compose_animation(&background, &placements, &assets, format, &opts)?;
        let out_path = out_dir.join(format!("compose_layout.{}", format.extension()));
        std::fs::write(&out_path, &out.bytes)?;
        eprintln!(
            "wrote {} ({} frames, {})",
            out_path.display(),
            out.frame_count,
            out.mime
        );
    }

    Ok(())
}
