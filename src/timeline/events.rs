use crate::timeline::timebase::AssetTimebase;

/// Sorted, de-duplicated instants at which the composite picture may change.
///
/// Always starts at `0` and ends at the composite period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventTimeline {
    instants: Vec<u64>,
    raw_count: usize,
    downsampled: bool,
}

impl EventTimeline {
    /// Collect every asset's frame boundaries, repeated across its loops, inside
    /// `[0, period_ticks]`.
    ///
    /// Each asset contributes `max(1, period_ticks / asset_period)` repetitions, so an asset whose
    /// loop is longer than the (possibly truncated) composite period still contributes the part
    /// of its first loop that fits. Above `max_events` instants the interior is thinned to every
    /// `k`-th element; the endpoints are always kept.
    pub fn build(timebases: &[AssetTimebase], period_ticks: u64, max_events: usize) -> Self {
        let mut events = vec![0, period_ticks];
        for tb in timebases {
            if tb.period_ticks == 0 {
                continue;
            }
            let reps = (period_ticks / tb.period_ticks).max(1);
            for r in 0..reps {
                let Some(base) = r.checked_mul(tb.period_ticks) else {
                    break;
                };
                for &boundary in std::iter::once(&0).chain(tb.cumulative_ticks.iter()) {
                    let Some(t) = base.checked_add(boundary) else {
                        continue;
                    };
                    if 0 < t && t < period_ticks {
                        events.push(t);
                    }
                }
            }
        }
        events.sort_unstable();
        events.dedup();

        let raw_count = events.len();
        let mut downsampled = false;
        if events.len() > max_events.max(2) {
            events = downsample(&events, max_events);
            downsampled = true;
            tracing::debug!(
                raw_count,
                kept = events.len(),
                max_events,
                "event timeline down-sampled"
            );
        }
        if events.len() < 2 {
            events = vec![0, period_ticks];
        }

        Self {
            instants: events,
            raw_count,
            downsampled,
        }
    }

    /// Instants in increasing order.
    pub fn instants(&self) -> &[u64] {
        &self.instants
    }

    /// Number of instants.
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    /// Always `false`; a timeline holds at least its two endpoints.
    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    /// Distinct instants before down-sampling.
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// `true` when the event ceiling thinned the timeline.
    pub fn downsampled(&self) -> bool {
        self.downsampled
    }

    /// Adjacent `(t0, t1)` pairs with `t1 > t0`.
    pub fn intervals(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.instants
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|(t0, t1)| t1 > t0)
    }
}

/// Keep the first and last instants plus every `k`-th interior instant, with `k` the smallest
/// stride that keeps the total at or under `max_events` (read as at least 2).
pub(crate) fn downsample(events: &[u64], max_events: usize) -> Vec<u64> {
    let max_events = max_events.max(2);
    if events.len() <= max_events {
        return events.to_vec();
    }
    let (Some(&first), Some(&last)) = (events.first(), events.last()) else {
        return Vec::new();
    };

    let interior = &events[1..events.len() - 1];
    let budget = max_events - 2;
    let mut out = Vec::with_capacity(max_events);
    out.push(first);
    if budget > 0 {
        let k = interior.len().div_ceil(budget);
        out.extend(interior.iter().step_by(k.max(1)).copied());
    }
    out.push(last);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/events.rs"]
mod tests;
