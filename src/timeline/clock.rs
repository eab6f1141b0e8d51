use crate::foundation::core::{Rational, saturating_lcm};
use crate::foundation::error::{LoopcompError, LoopcompResult};
use crate::timeline::timebase::{
    AssetTimebase, bound_durations, lcm_of_denominators, snap_durations,
};

/// Shared tick rate plus the per-asset durations expressed exactly on it.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalTimebase {
    /// Ticks per second (`G`); every duration times `G` is an integer.
    pub ticks_per_second: u64,
    /// Durations per asset, in input order, after bounding (and snapping, if needed).
    pub durations: Vec<Vec<Rational>>,
    /// `true` when durations had to be snapped to the `1/max_denominator` grid.
    pub snapped: bool,
}

/// Pick the shared tick rate for a set of assets.
///
/// Durations are first bounded to `max_denominator`. When the least common multiple of the
/// resulting denominators overflows or exceeds `max_tick_denominator`, every duration is snapped
/// to the `1/max_denominator` grid instead, which caps the tick rate at `max_denominator`.
pub fn resolve_global_timebase(
    duration_sets: &[&[Rational]],
    max_denominator: u64,
    max_tick_denominator: u64,
) -> GlobalTimebase {
    let bounded: Vec<Vec<Rational>> = duration_sets
        .iter()
        .map(|set| bound_durations(set, max_denominator))
        .collect();

    match lcm_of_denominators(bounded.iter().map(Vec::as_slice)) {
        Some(g) if g <= max_tick_denominator => GlobalTimebase {
            ticks_per_second: g,
            durations: bounded,
            snapped: false,
        },
        lcm => {
            tracing::debug!(
                ?lcm,
                max_tick_denominator,
                "tick denominator over budget; snapping durations to 1/{max_denominator} s"
            );
            let snapped: Vec<Vec<Rational>> = bounded
                .iter()
                .map(|set| snap_durations(set, max_denominator))
                .collect();
            let g = lcm_of_denominators(snapped.iter().map(Vec::as_slice))
                .unwrap_or(max_denominator.max(1));
            GlobalTimebase {
                ticks_per_second: g,
                durations: snapped,
                snapped: true,
            }
        }
    }
}

/// Composite loop length on the shared clock.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeClock {
    ticks_per_second: u64,
    period_ticks: u64,
    full_period_ticks: u64,
    tick_secs: Rational,
    truncated: bool,
}

impl CompositeClock {
    /// Combine asset periods into one composite period and apply the duration guardrail.
    ///
    /// The period is the LCM of every asset period (each at least one tick), saturating instead
    /// of overflowing. Wall-clock length is estimated with the smallest seconds-per-tick ratio
    /// among the assets; when that estimate exceeds `max_composite_secs` the period is cut to
    /// `floor(max_composite_secs / tick_secs)` ticks and loop closure is given up.
    pub fn new(
        ticks_per_second: u64,
        timebases: &[AssetTimebase],
        max_composite_secs: f64,
    ) -> LoopcompResult<Self> {
        if ticks_per_second == 0 {
            return Err(LoopcompError::validation("ticks_per_second must be > 0"));
        }
        if timebases.is_empty() {
            return Err(LoopcompError::validation(
                "composite clock needs at least one asset",
            ));
        }
        if !max_composite_secs.is_finite() || max_composite_secs <= 0.0 {
            return Err(LoopcompError::validation(
                "max_composite_secs must be finite and > 0",
            ));
        }

        let full_period_ticks = timebases
            .iter()
            .map(|tb| tb.period_ticks.max(1))
            .fold(1u64, saturating_lcm);

        let fallback = Rational::new(1, ticks_per_second)?;
        let tick_secs = timebases
            .iter()
            .filter(|tb| tb.period_ticks > 0)
            .filter_map(|tb| tb.period_secs.checked_div_u64(tb.period_ticks))
            .filter(|r| !r.is_zero())
            .min()
            .unwrap_or(fallback);

        let mut period_ticks = full_period_ticks;
        let mut truncated = false;
        let est_secs = full_period_ticks as f64 * tick_secs.as_f64();
        if est_secs > max_composite_secs {
            let cap = (max_composite_secs / tick_secs.as_f64()).floor().max(1.0);
            period_ticks = if cap >= full_period_ticks as f64 {
                full_period_ticks
            } else {
                cap as u64
            };
            truncated = period_ticks < full_period_ticks;
            tracing::debug!(
                full_period_ticks,
                period_ticks,
                est_secs,
                max_composite_secs,
                "composite period truncated"
            );
        }

        Ok(Self {
            ticks_per_second,
            period_ticks,
            full_period_ticks,
            tick_secs,
            truncated,
        })
    }

    /// Ticks per second (`G`).
    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    /// Composite period in ticks, after the guardrail.
    pub fn period_ticks(&self) -> u64 {
        self.period_ticks
    }

    /// Composite period before the guardrail (saturated at `u64::MAX`).
    pub fn full_period_ticks(&self) -> u64 {
        self.full_period_ticks
    }

    /// Seconds-per-tick estimate used by the guardrail.
    pub fn tick_secs_estimate(&self) -> Rational {
        self.tick_secs
    }

    /// `true` when the guardrail shortened the period.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Exact `ticks / G` seconds.
    pub fn ticks_to_secs(&self, ticks: u64) -> Rational {
        Rational::new(ticks, self.ticks_per_second).unwrap_or(Rational::ZERO)
    }

    /// Composite period in seconds.
    pub fn period_secs(&self) -> Rational {
        self.ticks_to_secs(self.period_ticks)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
