//! Trail store
//!
//! Each player owns one append-only trail of solid points. Points are placed at a
//! fixed arc-length spacing, not once per tick, so point density (and collision cost)
//! does not depend on frame rate or turn speed. A trail alternates between solid runs
//! and short random gaps; a dash forces an extra gap.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::rng::RandomSource;
use crate::project_to_shell;
use crate::tuning::TrailParams;

/// A player's trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    params: TrailParams,
    /// Solid samples in traversal order
    solid_points: Vec<DVec3>,
    /// Index into `solid_points` where each solid run starts
    segment_starts: Vec<usize>,
    /// A gap closed the last run; the next point opens a new segment
    segment_open: bool,
    /// Reference the next chord is measured from
    last_placed: Option<DVec3>,
    in_gap: bool,
    time_to_next_gap: f64,
    gap_remaining: f64,
    /// Fade-out progress while respawning (0 = opaque, 1 = gone)
    fade: f64,
}

impl Trail {
    pub fn new(params: TrailParams, rng: &mut dyn RandomSource) -> Self {
        Self {
            params,
            solid_points: Vec::new(),
            segment_starts: Vec::new(),
            segment_open: false,
            last_placed: None,
            in_gap: false,
            time_to_next_gap: rng.range(params.gap_interval.0, params.gap_interval.1),
            gap_remaining: 0.0,
            fade: 0.0,
        }
    }

    /// Drop all points and re-arm the gap timer (new round or respawn)
    pub fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.solid_points.clear();
        self.segment_starts.clear();
        self.segment_open = false;
        self.last_placed = None;
        self.in_gap = false;
        self.time_to_next_gap = rng.range(self.params.gap_interval.0, self.params.gap_interval.1);
        self.gap_remaining = 0.0;
        self.fade = 0.0;
    }

    /// Record the head position for this tick.
    ///
    /// Ticks that enter, spend, or leave a gap record nothing; they only move the
    /// chord reference so the next solid run starts where the gap ended.
    pub fn add_point(&mut self, point: DVec3, dt: f64, rng: &mut dyn RandomSource) {
        if self.in_gap {
            self.last_placed = Some(point);
            self.gap_remaining -= dt;
            if self.gap_remaining <= 0.0 {
                self.in_gap = false;
                self.segment_open = false;
            }
            return;
        }

        self.time_to_next_gap -= dt;
        if self.time_to_next_gap <= 0.0 {
            let (dur_min, dur_max) = self.params.gap_duration;
            let (int_min, int_max) = self.params.gap_interval;
            self.in_gap = true;
            self.gap_remaining = rng.range(dur_min, dur_max);
            self.time_to_next_gap = rng.range(int_min, int_max);
            self.segment_open = false;
            self.last_placed = Some(point);
            return;
        }

        let Some(last) = self.last_placed else {
            self.push_solid(point);
            self.last_placed = Some(point);
            return;
        };

        let spacing = self.params.sample_spacing;
        let delta = point - last;
        let distance = delta.length();
        if distance < spacing {
            return;
        }

        // Chord samples are re-projected; close enough to the geodesic at this spacing
        let dir = delta / distance;
        let mut traveled = spacing;
        let mut placed = last;
        while traveled <= distance {
            placed = project_to_shell(last + dir * traveled, self.params.shell_radius);
            self.push_solid(placed);
            traveled += spacing;
        }
        // Measure the next chord from the last sample so leftover distance carries over
        self.last_placed = Some(placed);
    }

    fn push_solid(&mut self, point: DVec3) {
        if !self.segment_open {
            self.segment_starts.push(self.solid_points.len());
            self.segment_open = true;
        }
        self.solid_points.push(point);
    }

    /// Force a gap of at least `duration`, regardless of the cycle phase.
    ///
    /// The trail resumes from `reference_point`, leaving a visible jump.
    pub fn force_gap(&mut self, duration: f64, reference_point: DVec3) {
        self.in_gap = true;
        self.gap_remaining = self.gap_remaining.max(duration);
        self.segment_open = false;
        self.last_placed = Some(reference_point);
    }

    pub fn set_fade(&mut self, progress: f64) {
        self.fade = progress.clamp(0.0, 1.0);
    }

    pub fn fade(&self) -> f64 {
        self.fade
    }

    pub fn in_gap(&self) -> bool {
        self.in_gap
    }

    pub fn solid_points(&self) -> &[DVec3] {
        &self.solid_points
    }

    pub fn len(&self) -> usize {
        self.solid_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solid_points.is_empty()
    }

    /// Contiguous solid runs, for drawing
    pub fn segments(&self) -> impl Iterator<Item = &[DVec3]> + '_ {
        self.segment_starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .segment_starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.solid_points.len());
            &self.solid_points[start..end]
        })
    }

    pub fn params(&self) -> &TrailParams {
        &self.params
    }

    /// Trail holding exactly `points` as one solid segment, with gaps disabled
    #[cfg(test)]
    pub(crate) fn with_points(params: TrailParams, points: &[DVec3]) -> Self {
        Self {
            params,
            solid_points: points.to_vec(),
            segment_starts: if points.is_empty() { Vec::new() } else { vec![0] },
            segment_open: !points.is_empty(),
            last_placed: points.last().copied(),
            in_gap: false,
            time_to_next_gap: f64::INFINITY,
            gap_remaining: 0.0,
            fade: 0.0,
        }
    }
}
