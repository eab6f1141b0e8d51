use image::{Rgba, RgbaImage};

use super::*;
use crate::foundation::core::Rational;
use crate::render::synth::CompositeFrame;

#[test]
fn output_format_parses_and_displays() {
    assert_eq!("apng".parse::<OutputFormat>().unwrap(), OutputFormat::Apng);
    assert_eq!(" GIF ".parse::<OutputFormat>().unwrap(), OutputFormat::Gif);
    assert!("webm".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Gif.to_string(), "gif");
    assert_eq!(OutputFormat::Apng.extension(), "png");
}

#[test]
fn output_format_serde_is_lowercase() {
    assert_eq!(serde_json::to_string(&OutputFormat::Apng).unwrap(), "\"apng\"");
    let f: OutputFormat = serde_json::from_str("\"gif\"").unwrap();
    assert_eq!(f, OutputFormat::Gif);
}

#[test]
fn canvas_size_checks_frames() {
    let empty = CompositeSequence {
        frames: Vec::new(),
        ticks_per_second: 1,
    };
    assert!(canvas_size(&empty).is_err());

    let zero_clock = CompositeSequence {
        frames: vec![CompositeFrame {
            image: RgbaImage::new(2, 2),
            duration_ticks: 1,
        }],
        ticks_per_second: 0,
    };
    assert!(canvas_size(&zero_clock).is_err());
}

#[test]
fn encode_sequence_dispatches_by_format() {
    let still = CompositeSequence::still(
        RgbaImage::from_pixel(3, 3, Rgba([5, 6, 7, 255])),
        Rational::ONE,
    );
    let opts = ComposeOpts {
        use_external_optimizer: false,
        ..ComposeOpts::default()
    };
    let png = encode_sequence(&still, OutputFormat::Apng, &opts).unwrap();
    assert_eq!(png.mime, "image/png");
    let gif = encode_sequence(&still, OutputFormat::Gif, &opts).unwrap();
    assert_eq!(gif.mime, "image/gif");
    assert!(gif.bytes.starts_with(b"GIF89a"));
}
