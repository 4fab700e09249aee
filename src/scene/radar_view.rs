use serde::{Deserialize, Serialize};

use super::radar::{place_marker, sweep_wedge_path, MarkerPlacement, RadarConfig, WedgePath};
use crate::animation::{FrameHandle, FrameScheduler};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerCategory {
    Blue,
    Green,
    Orange,
    Red,
}

impl MarkerCategory {
    pub fn hex(&self) -> &'static str {
        match self {
            MarkerCategory::Blue => "#22aaff",
            MarkerCategory::Green => "#42f599",
            MarkerCategory::Orange => "#ffa46a",
            MarkerCategory::Red => "#ff6a6a",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RadarMarker {
    pub angle_degrees: f32,
    pub normalized_radius: f32,
    pub label: String,
    pub category: MarkerCategory,
    #[serde(default)]
    pub badge: Option<char>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl RadarMarker {
    pub fn new(angle_degrees: f32, normalized_radius: f32, label: &str, category: MarkerCategory) -> Self {
        Self {
            angle_degrees,
            normalized_radius,
            label: label.to_owned(),
            category,
            badge: None,
            detail: None,
        }
    }

    fn with_badge(mut self, badge: char) -> Self {
        self.badge = Some(badge);
        self
    }

    fn with_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_owned());
        self
    }
}

pub fn default_markers() -> Vec<RadarMarker> {
    use MarkerCategory::*;
    vec![
        RadarMarker::new(270.0, 0.95, "Software Dev", Blue).with_badge('P').with_detail("Dals Skecipt"),
        RadarMarker::new(350.0, 0.55, "Software Dev", Green).with_badge('S'),
        RadarMarker::new(20.0, 0.55, "Javascript", Green).with_badge('S'),
        RadarMarker::new(40.0, 0.40, "Data Scientist @ BlsGen", Green).with_badge('G'),
        RadarMarker::new(75.0, 0.95, "Lead Engineer @ Tech Corp", Blue).with_badge('L'),
        RadarMarker::new(115.0, 0.65, "SQL", Orange).with_badge('O').with_detail("Dalfinanicct"),
        RadarMarker::new(135.0, 0.40, "UI/UX Design", Red).with_badge('R'),
        RadarMarker::new(165.0, 0.38, "FinTech Analyst", Red).with_badge('F'),
    ]
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepState {
    pub current_angle_degrees: f32,
}

impl SweepState {
    pub fn reset(&mut self) {
        self.current_angle_degrees = 0.0;
    }

    pub fn advance(&mut self, step_degrees: f32) -> f32 {
        self.current_angle_degrees = (self.current_angle_degrees + step_degrees).rem_euclid(360.0);
        self.current_angle_degrees
    }
}

/// Radar screen state: static markers plus the animated sweep beam.
pub struct RadarView {
    pub config: RadarConfig,
    pub markers: Vec<RadarMarker>,
    sweep: SweepState,
    sweep_path: Option<WedgePath>,
    sweep_task: Option<FrameHandle>,
}

impl RadarView {
    pub fn new(config: RadarConfig, markers: Vec<RadarMarker>) -> Self {
        Self { config, markers, sweep: SweepState::default(), sweep_path: None, sweep_task: None }
    }

    /// Resets the beam to 0° and schedules the sweep on `frames`. A sweep
    /// that is already running is replaced.
    pub fn start(&mut self, frames: &mut FrameScheduler<RadarView>) {
        self.sweep_task = None;
        self.sweep.reset();
        self.sweep_path = None;
        self.sweep_task = Some(frames.schedule(RadarView::on_frame));
        log::info!("Radar sweep started.");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.sweep_task.take() {
            handle.cancel();
            log::info!("Radar sweep stopped.");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweep_task.is_some()
    }

    pub fn sweep(&self) -> SweepState {
        self.sweep
    }

    /// Recomputes the beam at the current angle, then steps the angle.
    pub fn on_frame(&mut self) {
        self.sweep_path = Some(self.wedge_at(self.sweep.current_angle_degrees));
        self.sweep.advance(self.config.step_degrees);
    }

    /// Wedge drawn on the most recent frame, if the sweep has ticked since it started.
    pub fn sweep_path(&self) -> Option<&WedgePath> {
        self.sweep_path.as_ref()
    }

    pub fn wedge_at(&self, angle_degrees: f32) -> WedgePath {
        sweep_wedge_path(
            self.config.center(),
            self.config.outer_radius,
            angle_degrees,
            self.config.sweep_width_degrees,
        )
    }

    pub fn placements(&self) -> impl Iterator<Item = (&RadarMarker, MarkerPlacement)> + '_ {
        self.markers
            .iter()
            .map(|marker| (marker, place_marker(&self.config, marker.angle_degrees, marker.normalized_radius)))
    }
}

impl Default for RadarView {
    fn default() -> Self {
        Self::new(RadarConfig::default(), default_markers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::radar::LabelAnchor;

    #[test]
    fn sweep_wraps_at_full_turn() {
        let mut sweep = SweepState { current_angle_degrees: 358.0 };
        assert_eq!(sweep.advance(1.0), 359.0);
        assert_eq!(sweep.advance(1.0), 0.0);
        assert_eq!(sweep.advance(1.0), 1.0);
    }

    #[test]
    fn sweep_advances_one_degree_per_frame() {
        let mut frames = FrameScheduler::new();
        let mut view = RadarView::default();
        view.start(&mut frames);
        assert!(view.sweep_path().is_none());

        for _ in 0..3 {
            assert!(frames.tick(&mut view));
        }
        assert_eq!(view.sweep().current_angle_degrees, 3.0);
        let path = view.sweep_path().unwrap();
        assert_eq!(path.sectors[0].start_degrees, 2.0);
        assert_eq!(path.sectors[0].end_degrees, 42.0);
    }

    #[test]
    fn stopping_releases_the_task() {
        let mut frames = FrameScheduler::new();
        let mut view = RadarView::default();
        view.start(&mut frames);
        frames.tick(&mut view);

        view.stop();
        assert!(!view.is_running());
        assert!(!frames.tick(&mut view));
        assert_eq!(view.sweep().current_angle_degrees, 1.0);
    }

    #[test]
    fn restart_resets_angle_and_keeps_one_task() {
        let mut frames = FrameScheduler::new();
        let mut view = RadarView::default();
        view.start(&mut frames);
        for _ in 0..10 {
            frames.tick(&mut view);
        }

        view.start(&mut frames);
        assert_eq!(view.sweep().current_angle_degrees, 0.0);
        assert_eq!(frames.active_count(), 1);
        frames.tick(&mut view);
        assert_eq!(view.sweep().current_angle_degrees, 1.0);
    }

    #[test]
    fn wedge_splits_near_the_top() {
        let view = RadarView::default();
        assert_eq!(view.wedge_at(350.0).segment_count(), 2);
        assert_eq!(view.wedge_at(100.0).segment_count(), 1);
    }

    #[test]
    fn default_markers_anchor_by_side() {
        let view = RadarView::default();
        let anchors: Vec<_> = view.placements().map(|(m, p)| (m.angle_degrees as u32, p.anchor)).collect();
        assert_eq!(anchors.len(), 8);
        for (angle, anchor) in anchors {
            let expected = if (90..=270).contains(&angle) { LabelAnchor::End } else { LabelAnchor::Start };
            assert_eq!(anchor, expected, "angle {angle}");
        }
    }
}
