use super::*;

#[test]
fn rational_reduces_and_rejects_zero_den() {
    let r = Rational::new(150, 1000).unwrap();
    assert_eq!((r.num(), r.den()), (3, 20));
    assert!(Rational::new(1, 0).is_err());
    assert_eq!(Rational::new(0, 7).unwrap(), Rational::ZERO);
}

#[test]
fn rational_from_delay_ms() {
    assert_eq!(Rational::from_delay_ms(100, 1), Rational::new(1, 10).unwrap());
    assert_eq!(Rational::from_delay_ms(1000, 3), Rational::new(1, 3).unwrap());
    assert_eq!(Rational::from_delay_ms(40, 0), Rational::new(1, 25).unwrap());
}

#[test]
fn rational_checked_add_and_ordering() {
    let a = Rational::new(1, 10).unwrap();
    let b = Rational::new(3, 20).unwrap();
    assert_eq!(a.checked_add(b).unwrap(), Rational::new(1, 4).unwrap());
    assert!(a < b);
    assert_eq!(a.max(b), b);
}

#[test]
fn limit_denominator_keeps_small_denominators() {
    let third = Rational::new(1, 3).unwrap();
    assert_eq!(third.limit_denominator(1000), third);
}

#[test]
fn limit_denominator_picks_nearest_fraction() {
    // 3.141592653589793 with denominator bounds, matching the classic convergents.
    let pi = Rational::new(3_141_592_653_589_793, 1_000_000_000_000_000).unwrap();
    assert_eq!(pi.limit_denominator(10), Rational::new(22, 7).unwrap());
    assert_eq!(pi.limit_denominator(100), Rational::new(311, 99).unwrap());
    assert_eq!(pi.limit_denominator(1000), Rational::new(355, 113).unwrap());

    let x = Rational::new(3333, 10000).unwrap();
    assert_eq!(x.limit_denominator(10), Rational::new(1, 3).unwrap());
}

#[test]
fn abs_diff_is_symmetric() {
    let a = Rational::new(1, 3).unwrap();
    let b = Rational::from_millis(333);
    let d = a.abs_diff_f64(b);
    assert!((d - (1.0 / 3000.0)).abs() < 1e-12);
    assert_eq!(d, b.abs_diff_f64(a));
}

#[test]
fn lcm_helpers() {
    assert_eq!(checked_lcm(4, 3), Some(12));
    assert_eq!(checked_lcm(0, 5), Some(5));
    assert_eq!(checked_lcm(u64::MAX, u64::MAX - 1), None);
    assert_eq!(saturating_lcm(u64::MAX, u64::MAX - 1), u64::MAX);
    assert_eq!(gcd(12, 18), 6);
}

#[test]
fn checked_div_reduces_first() {
    let r = Rational::new(3, 20).unwrap();
    assert_eq!(r.checked_div_u64(3).unwrap(), Rational::new(1, 20).unwrap());
    assert_eq!(r.checked_div_u64(0), None);
    assert_eq!(Rational::ZERO.checked_div_u64(7).unwrap(), Rational::ZERO);
    assert_eq!(Rational::new(1, u64::MAX).unwrap().checked_div_u64(2), None);
}
