use std::iter::Sum;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Measured values carried by a call edge, and the summed values of a
/// method summary or edge group.
///
/// Times are in whatever unit the measurement mode produced (wall seconds,
/// process time, allocations, ...). The only requirement is that they are
/// non-negative and summable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeMetrics {
    /// Invocations represented by the edge.
    pub called: u64,
    pub total_time: f64,
    /// Time spent in the method itself.
    pub self_time: f64,
    /// Time spent blocked (waiting on other threads, I/O, ...).
    pub wait_time: f64,
    /// Time spent in methods called from here.
    pub children_time: f64,
}

impl EdgeMetrics {
    pub const ZERO: EdgeMetrics = EdgeMetrics {
        called: 0,
        total_time: 0.0,
        self_time: 0.0,
        wait_time: 0.0,
        children_time: 0.0,
    };

    /// Metrics for an edge with `total_time = self_time + children_time`.
    pub fn new(called: u64, self_time: f64, children_time: f64) -> Self {
        Self {
            called,
            total_time: self_time + children_time,
            self_time,
            wait_time: 0.0,
            children_time,
        }
    }

    pub fn with_wait(mut self, wait_time: f64) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Difference between `total_time` and `self_time + children_time`.
    pub fn time_identity_error(&self) -> f64 {
        (self.total_time - (self.self_time + self.children_time)).abs()
    }

    /// The same metrics with `-0.0` times replaced by `0.0`.
    pub fn normalized(self) -> Self {
        // Adding +0.0 maps -0.0 to +0.0 and leaves every other value alone.
        Self {
            called: self.called,
            total_time: self.total_time + 0.0,
            self_time: self.self_time + 0.0,
            wait_time: self.wait_time + 0.0,
            children_time: self.children_time + 0.0,
        }
    }

    /// Name of the first time field that is negative or not finite.
    pub(crate) fn invalid_field(&self) -> Option<(&'static str, f64)> {
        [
            ("total_time", self.total_time),
            ("self_time", self.self_time),
            ("wait_time", self.wait_time),
            ("children_time", self.children_time),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
    }
}

impl AddAssign<&EdgeMetrics> for EdgeMetrics {
    fn add_assign(&mut self, rhs: &EdgeMetrics) {
        self.called += rhs.called;
        self.total_time += rhs.total_time;
        self.self_time += rhs.self_time;
        self.wait_time += rhs.wait_time;
        self.children_time += rhs.children_time;
    }
}

impl<'a> Sum<&'a EdgeMetrics> for EdgeMetrics {
    fn sum<I: Iterator<Item = &'a EdgeMetrics>>(iter: I) -> Self {
        iter.fold(EdgeMetrics::ZERO, |mut acc, m| {
            acc += m;
            acc
        })
    }
}
