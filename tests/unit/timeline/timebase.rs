use super::*;

fn ms(v: u64) -> Rational {
    Rational::from_millis(v)
}

#[test]
fn compute_accumulates_exact_ticks() {
    let a = AssetTimebase::compute(&[ms(100), ms(100)], 20).unwrap();
    assert_eq!(a.cumulative_ticks(), &[2, 4]);
    assert_eq!(a.period_ticks(), 4);
    assert_eq!(a.period_secs(), ms(200));
    assert_eq!(a.frame_count(), 2);

    let b = AssetTimebase::compute(&[ms(150)], 20).unwrap();
    assert_eq!(b.cumulative_ticks(), &[3]);
    assert_eq!(b.period_ticks(), 3);
}

#[test]
fn compute_period_is_sum_of_increments() {
    let durations = [ms(40), ms(120), Rational::new(1, 3).unwrap(), ms(20)];
    let g = lcm_of_denominators([durations.as_slice()]).unwrap();
    let tb = AssetTimebase::compute(&durations, g).unwrap();
    assert_eq!(tb.frame_count(), durations.len());
    assert!(tb.cumulative_ticks().windows(2).all(|w| w[0] < w[1]));
    let sum: u64 = durations.iter().map(|d| d.num() * (g / d.den())).sum();
    assert_eq!(tb.period_ticks(), sum);
}

#[test]
fn compute_clamps_zero_ticks_to_one() {
    let tb = AssetTimebase::compute(&[Rational::ZERO, ms(500)], 2).unwrap();
    assert_eq!(tb.cumulative_ticks(), &[1, 2]);
}

#[test]
fn compute_rejects_unrepresentable_denominator() {
    assert!(AssetTimebase::compute(&[Rational::new(1, 3).unwrap()], 10).is_err());
    assert!(AssetTimebase::compute(&[ms(100)], 0).is_err());
}

#[test]
fn empty_asset_has_zero_period() {
    let tb = AssetTimebase::compute(&[], 10).unwrap();
    assert_eq!(tb.period_ticks(), 0);
    assert_eq!(tb.frame_index_at(7), 0);
}

#[test]
fn frame_index_round_trips_every_tick() {
    let tb = AssetTimebase::compute(&[ms(100), ms(300), ms(200)], 10).unwrap();
    assert_eq!(tb.cumulative_ticks(), &[1, 4, 6]);
    let mut start = 0;
    for (i, &end) in tb.cumulative_ticks().iter().enumerate() {
        for t in start..end {
            assert_eq!(tb.frame_index_at(t), i, "tick {t}");
            assert_eq!(tb.frame_index_at(t + tb.period_ticks()), i, "looped tick {t}");
        }
        start = end;
    }
}

#[test]
fn snap_durations_keeps_at_least_one_step() {
    let snapped = snap_durations(&[Rational::new(1, 7919).unwrap(), ms(105)], 100);
    assert_eq!(snapped, vec![Rational::new(1, 100).unwrap(), Rational::new(11, 100).unwrap()]);
}

#[test]
fn lcm_of_denominators_handles_empty_and_overflow() {
    assert_eq!(lcm_of_denominators(std::iter::empty::<&[Rational]>()), Some(1));
    let primes = [
        Rational::new(1, 4_294_967_291).unwrap(),
        Rational::new(1, 4_294_967_279).unwrap(),
        Rational::new(1, 4_294_967_231).unwrap(),
    ];
    assert_eq!(lcm_of_denominators([primes.as_slice()]), None);
}
