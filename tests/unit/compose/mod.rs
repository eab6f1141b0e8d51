use image::Rgba;

use super::*;

fn ms(v: u64) -> Rational {
    Rational::from_millis(v)
}

fn solid_asset(id: &str, colors: &[[u8; 4]], durations: &[u64]) -> AnimatedAsset {
    AnimatedAsset::new(
        id,
        colors
            .iter()
            .map(|&c| RgbaImage::from_pixel(10, 10, Rgba(c)))
            .collect(),
        durations.iter().map(|&d| ms(d)).collect(),
    )
    .unwrap()
}

#[test]
fn build_timing_two_assets() {
    let a = [ms(100), ms(100)];
    let b = [ms(150)];
    let timing = build_timing(&[&a, &b], &ComposeOpts::default()).unwrap();
    assert_eq!(timing.global.ticks_per_second, 20);
    assert_eq!(timing.clock.period_ticks(), 12);
    assert_eq!(timing.clock.period_secs(), ms(600));
    assert_eq!(timing.events.intervals().count(), 8);
}

#[test]
fn plan_reports_each_stage() {
    let assets = [
        solid_asset("a", &[[255, 0, 0, 255], [0, 255, 0, 255]], &[100, 100]),
        solid_asset("b", &[[0, 0, 255, 255]], &[150]),
        AnimatedAsset::new("empty", Vec::new(), Vec::new()).unwrap(),
    ];
    let plan = plan_timeline(&assets, &ComposeOpts::default()).unwrap();
    assert_eq!(plan.global_denominator, 20);
    assert_eq!(plan.period_ticks, 12);
    assert!((plan.period_secs - 0.6).abs() < 1e-12);
    assert!(!plan.truncated);
    assert_eq!(plan.event_count, 9);
    assert_eq!(plan.assets.len(), 2);
    assert_eq!(plan.assets[0].period_ticks, 4);
    assert_eq!(plan.assets[1].period_ticks, 3);

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["global_denominator"], 20);
    assert_eq!(json["assets"][1]["placement_id"], "b");
}

#[test]
fn plan_without_assets_is_the_still() {
    let plan = plan_timeline(&[], &ComposeOpts::default()).unwrap();
    assert_eq!(plan.global_denominator, 1);
    assert_eq!(plan.period_ticks, 1);
    assert!(plan.assets.is_empty());
}

#[test]
fn unplaced_assets_are_skipped() {
    let bg = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
    let assets = [solid_asset("a", &[[255, 0, 0, 255], [0, 255, 0, 255]], &[100, 100])];
    let seq = compose_sequence(&bg, &BTreeMap::new(), &assets, &ComposeOpts::default()).unwrap();
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.frames[0].image, bg);
    assert_eq!(seq.total_secs().unwrap(), Rational::ONE);
}

#[test]
fn empty_background_is_rejected() {
    let bg = RgbaImage::new(0, 0);
    assert!(compose_sequence(&bg, &BTreeMap::new(), &[], &ComposeOpts::default()).is_err());
}

#[test]
fn invalid_options_are_rejected() {
    let bg = RgbaImage::new(2, 2);
    let opts = ComposeOpts {
        max_events: 1,
        ..ComposeOpts::default()
    };
    let r = compose_animation(&bg, &BTreeMap::new(), &[], OutputFormat::Apng, &opts);
    assert!(r.is_err());
}
