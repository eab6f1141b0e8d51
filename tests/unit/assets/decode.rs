use std::io::Cursor;

use image::codecs::gif::GifEncoder;
use image::{Delay, RgbaImage};

use super::*;
use crate::config::ComposeOpts;
use crate::encode::apng::encode_apng;
use crate::render::synth::{CompositeFrame, CompositeSequence};

fn gif_bytes(delays_ms: &[u32]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = GifEncoder::new(&mut buf);
        let frames = delays_ms.iter().enumerate().map(|(i, &ms)| {
            let px = image::Rgba([(i * 60) as u8, 0, 0, 255]);
            Frame::from_parts(
                RgbaImage::from_pixel(4, 3, px),
                0,
                0,
                Delay::from_numer_denom_ms(ms, 1),
            )
        });
        enc.encode_frames(frames).unwrap();
    }
    buf
}

#[test]
fn gif_with_several_frames_is_animated() {
    let bytes = gif_bytes(&[100, 150, 30]);
    let src = decode_source(&bytes, &PrepareOpts::default()).unwrap();
    let SourceImage::Animated { frames, durations } = src else {
        panic!("expected animated source");
    };
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].dimensions(), (4, 3));
    assert_eq!(
        durations,
        vec![
            Rational::from_millis(100),
            Rational::from_millis(150),
            Rational::from_millis(30),
        ]
    );
}

#[test]
fn single_frame_gif_is_static() {
    let bytes = gif_bytes(&[100]);
    let src = decode_source(&bytes, &PrepareOpts::default()).unwrap();
    assert!(matches!(src, SourceImage::Static(ref img) if img.dimensions() == (4, 3)));
}

#[test]
fn still_png_is_static() {
    let img = RgbaImage::from_pixel(2, 5, image::Rgba([9, 9, 9, 128]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    let src = decode_source(&buf, &PrepareOpts::default()).unwrap();
    let SourceImage::Static(out) = src else {
        panic!("expected static source");
    };
    assert_eq!(out.dimensions(), (2, 5));
    assert_eq!(out.get_pixel(0, 0).0, [9, 9, 9, 128]);
}

#[test]
fn apng_frames_keep_exact_delays() {
    let red = RgbaImage::from_pixel(5, 4, image::Rgba([255, 0, 0, 255]));
    let green = RgbaImage::from_pixel(5, 4, image::Rgba([0, 255, 0, 255]));
    // 20 ticks per second: 2 ticks = 100 ms, 5 ticks = 250 ms.
    let seq = CompositeSequence {
        frames: vec![
            CompositeFrame {
                image: red,
                duration_ticks: 2,
            },
            CompositeFrame {
                image: green,
                duration_ticks: 5,
            },
        ],
        ticks_per_second: 20,
    };
    let out = encode_apng(&seq, &ComposeOpts::default()).unwrap();

    let src = decode_source(&out.bytes, &PrepareOpts::default()).unwrap();
    let SourceImage::Animated { frames, durations } = src else {
        panic!("expected animated source");
    };
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(frames[1].get_pixel(4, 3).0, [0, 255, 0, 255]);
    assert_eq!(
        durations,
        vec![Rational::new(1, 10).unwrap(), Rational::new(1, 4).unwrap()]
    );
}

#[test]
fn still_webp_is_static() {
    let img = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
        .unwrap();
    let src = decode_source(&buf, &PrepareOpts::default()).unwrap();
    let SourceImage::Static(out) = src else {
        panic!("expected static source");
    };
    assert_eq!(out.dimensions(), (3, 2));
    assert_eq!(out.get_pixel(1, 1).0, [10, 20, 30, 255]);
}

#[test]
fn garbage_is_a_decode_error() {
    let err = decode_source(b"not an image", &PrepareOpts::default()).unwrap_err();
    assert!(matches!(err, LoopcompError::Decode(_)));
}

#[test]
fn normalize_delay_raises_zero_and_short_delays_to_minimum() {
    let opts = PrepareOpts::default();
    assert_eq!(normalize_delay(0, 1, &opts), Rational::from_millis(10));
    assert_eq!(normalize_delay(0, 100, &opts), Rational::from_millis(10));
    assert_eq!(normalize_delay(5, 1, &opts), Rational::from_millis(10));
    assert_eq!(normalize_delay(40, 1, &opts), Rational::from_millis(40));

    let slow = PrepareOpts {
        min_frame_delay_ms: 20,
        ..PrepareOpts::default()
    };
    assert_eq!(normalize_delay(0, 1, &slow), Rational::from_millis(20));
}

#[test]
fn normalize_delay_bounds_the_denominator() {
    let opts = PrepareOpts {
        max_denominator: 100,
        ..PrepareOpts::default()
    };
    // 1000/7 ms = 1/7 s is already under the bound.
    assert_eq!(normalize_delay(1000, 7, &opts), Rational::new(1, 7).unwrap());
    // 333 ms = 333/1000 s reduces to 1/3 under a 100 bound.
    assert_eq!(normalize_delay(333, 1, &opts), Rational::new(1, 3).unwrap());
}
