use crate::foundation::core::{Rational, checked_lcm};
use crate::foundation::error::{LoopcompError, LoopcompResult};

/// One asset's frame boundaries on the shared integer clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetTimebase {
    /// Tick at which each frame's display interval ends within one loop.
    pub(crate) cumulative_ticks: Vec<u64>,
    /// Ticks in one loop (`0` for an asset without frames).
    pub(crate) period_ticks: u64,
    /// Exact loop length in seconds.
    pub(crate) period_secs: Rational,
}

impl AssetTimebase {
    /// Convert `durations` into cumulative ticks at `ticks_per_second`.
    ///
    /// Every denominator must divide `ticks_per_second`. Frames that would last zero ticks are
    /// stretched to one tick so boundaries stay strictly increasing.
    pub fn compute(durations: &[Rational], ticks_per_second: u64) -> LoopcompResult<Self> {
        if ticks_per_second == 0 {
            return Err(LoopcompError::validation("ticks_per_second must be > 0"));
        }

        let mut cumulative_ticks = Vec::with_capacity(durations.len());
        let mut acc = 0u64;
        let mut period_secs = Rational::ZERO;
        for (i, d) in durations.iter().enumerate() {
            if ticks_per_second % d.den() != 0 {
                return Err(LoopcompError::validation(format!(
                    "frame {i} duration {d} is not representable at {ticks_per_second} ticks/s"
                )));
            }
            let inc = d
                .num()
                .checked_mul(ticks_per_second / d.den())
                .ok_or_else(|| LoopcompError::validation(format!("frame {i} tick overflow")))?
                .max(1);
            acc = acc
                .checked_add(inc)
                .ok_or_else(|| LoopcompError::validation("asset period tick overflow"))?;
            cumulative_ticks.push(acc);
            period_secs = period_secs
                .checked_add(*d)
                .ok_or_else(|| LoopcompError::validation("asset period overflow"))?;
        }

        Ok(Self {
            cumulative_ticks,
            period_ticks: acc,
            period_secs,
        })
    }

    /// Frame-end ticks within one loop.
    pub fn cumulative_ticks(&self) -> &[u64] {
        &self.cumulative_ticks
    }

    /// Ticks in one loop.
    pub fn period_ticks(&self) -> u64 {
        self.period_ticks
    }

    /// Exact loop length in seconds.
    pub fn period_secs(&self) -> Rational {
        self.period_secs
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.cumulative_ticks.len()
    }

    /// Index of the frame displayed at absolute tick `tick`, looping every period.
    ///
    /// Selects the first frame whose end tick is strictly greater than `tick mod period`.
    pub fn frame_index_at(&self, tick: u64) -> usize {
        if self.period_ticks == 0 || self.cumulative_ticks.is_empty() {
            return 0;
        }
        let t = tick % self.period_ticks;
        let idx = self.cumulative_ticks.partition_point(|&end| end <= t);
        idx.min(self.cumulative_ticks.len() - 1)
    }
}

/// Bound each duration to a denominator of at most `max_den`.
pub(crate) fn bound_durations(durations: &[Rational], max_den: u64) -> Vec<Rational> {
    durations
        .iter()
        .map(|d| d.limit_denominator(max_den))
        .collect()
}

/// Round each duration to the nearest multiple of `1/grid`, keeping at least one step.
pub(crate) fn snap_durations(durations: &[Rational], grid: u64) -> Vec<Rational> {
    let grid = grid.max(1);
    durations
        .iter()
        .map(|d| {
            let steps = (d.as_f64() * grid as f64).round().max(1.0) as u64;
            Rational::new(steps, grid).unwrap_or(Rational::ONE)
        })
        .collect()
}

/// Least common multiple of every denominator in `sets`, or `None` on overflow.
///
/// Returns `Some(1)` when there are no durations at all.
pub(crate) fn lcm_of_denominators<'a>(
    sets: impl IntoIterator<Item = &'a [Rational]>,
) -> Option<u64> {
    let mut g = 1u64;
    for set in sets {
        for d in set {
            g = checked_lcm(g, d.den())?;
        }
    }
    Some(g)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timebase.rs"]
mod tests;
