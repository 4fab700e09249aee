//! Polar geometry for the job radar: marker placement and the sweep wedge.
//!
//! Angles are in degrees, measured clockwise from straight up, in a y-down
//! coordinate space (the same space the radar is laid out in).

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RadarConfig {
    pub center: [f32; 2],
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub hub_radius: f32,
    pub ring_spacing: f32,
    pub sweep_width_degrees: f32,
    pub step_degrees: f32,
    pub label_offset: f32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            center: [230.0, 230.0],
            outer_radius: 215.0,
            inner_radius: 15.0,
            hub_radius: 45.0,
            ring_spacing: 20.0,
            sweep_width_degrees: 40.0,
            step_degrees: 1.0,
            label_offset: 14.0,
        }
    }
}

impl RadarConfig {
    pub fn center(&self) -> Vec2 {
        Vec2::from_array(self.center)
    }

    /// Ring radii from the inner ring out to the outer edge.
    pub fn ring_radii(&self) -> Vec<f32> {
        if self.ring_spacing <= 0.0 {
            return vec![self.inner_radius, self.outer_radius];
        }
        let mut radii = Vec::new();
        let mut r = self.inner_radius;
        while r <= self.outer_radius + f32::EPSILON {
            radii.push(r);
            r += self.ring_spacing;
        }
        radii
    }
}

pub fn polar_to_cartesian(center: Vec2, radius: f32, angle_degrees: f32) -> Vec2 {
    let angle_radians = (angle_degrees - 90.0).to_radians();
    Vec2::new(
        center.x + radius * angle_radians.cos(),
        center.y + radius * angle_radians.sin(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    Arc { radius: f32, large_arc: bool, sweep: bool, to: Vec2 },
    Close,
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) => write!(f, "M {} {}", p.x, p.y),
            PathCommand::LineTo(p) => write!(f, "L {} {}", p.x, p.y),
            PathCommand::Arc { radius, large_arc, sweep, to } => write!(
                f,
                "A {radius} {radius} 0 {} {} {} {}",
                u8::from(*large_arc),
                u8::from(*sweep),
                to.x,
                to.y
            ),
            PathCommand::Close => f.write_str("Z"),
        }
    }
}

/// One filled sector, `start_degrees..end_degrees` going clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub start_degrees: f32,
    pub end_degrees: f32,
}

impl Sector {
    pub fn span(&self) -> f32 {
        self.end_degrees - self.start_degrees
    }
}

/// A closed wedge outline made of one or two sectors.
#[derive(Debug, Clone, PartialEq)]
pub struct WedgePath {
    pub center: Vec2,
    pub radius: f32,
    pub sectors: Vec<Sector>,
    pub commands: Vec<PathCommand>,
}

impl WedgePath {
    /// Number of closed sub-paths.
    pub fn segment_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, PathCommand::Close)).count()
    }

    /// Triangle list covering every sector, `steps_per_degree` arc samples per degree.
    pub fn tessellate(&self, steps_per_degree: f32) -> Vec<Vec2> {
        self.sectors
            .iter()
            .flat_map(|sector| tessellate_sector(self.center, self.radius, *sector, steps_per_degree))
            .collect()
    }
}

impl fmt::Display for WedgePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

fn sector_commands(center: Vec2, radius: f32, sector: Sector) -> [PathCommand; 4] {
    let arc_from = polar_to_cartesian(center, radius, sector.end_degrees);
    let arc_to = polar_to_cartesian(center, radius, sector.start_degrees);
    [
        PathCommand::MoveTo(center),
        PathCommand::LineTo(arc_from),
        PathCommand::Arc { radius, large_arc: sector.span() > 180.0, sweep: false, to: arc_to },
        PathCommand::Close,
    ]
}

/// The sweep beam starting at `start_angle` and `sweep_width_degrees` wide.
///
/// A beam that crosses 0° is split into `[start, 360)` and `[0, end)`, since a
/// single arc cannot wrap around.
pub fn sweep_wedge_path(center: Vec2, radius: f32, start_angle: f32, sweep_width_degrees: f32) -> WedgePath {
    let start = start_angle.rem_euclid(360.0);
    let end = (start + sweep_width_degrees).rem_euclid(360.0);

    let sectors = if end > start {
        vec![Sector { start_degrees: start, end_degrees: end }]
    } else if end == 0.0 {
        vec![Sector { start_degrees: start, end_degrees: 360.0 }]
    } else {
        vec![
            Sector { start_degrees: start, end_degrees: 360.0 },
            Sector { start_degrees: 0.0, end_degrees: end },
        ]
    };

    let commands = sectors
        .iter()
        .flat_map(|sector| sector_commands(center, radius, *sector))
        .collect();

    WedgePath { center, radius, sectors, commands }
}

pub fn tessellate_sector(center: Vec2, radius: f32, sector: Sector, steps_per_degree: f32) -> Vec<Vec2> {
    let steps = (sector.span() * steps_per_degree).ceil().max(1.0) as usize;
    let step = sector.span() / steps as f32;

    let mut triangles = Vec::with_capacity(steps * 3);
    for i in 0..steps {
        let a0 = sector.start_degrees + step * i as f32;
        let a1 = a0 + step;
        triangles.push(center);
        triangles.push(polar_to_cartesian(center, radius, a0));
        triangles.push(polar_to_cartesian(center, radius, a1));
    }
    triangles
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAnchor {
    Start,
    End,
}

/// Labels on the left half of the radar are anchored at their end so they
/// extend away from the circle.
pub fn label_anchor(angle_degrees: f32) -> LabelAnchor {
    if (90.0..=270.0).contains(&angle_degrees) {
        LabelAnchor::End
    } else {
        LabelAnchor::Start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    pub point: Vec2,
    /// Where the connector line from the hub starts.
    pub spoke_start: Vec2,
    pub label_position: Vec2,
    pub anchor: LabelAnchor,
}

pub fn place_marker(config: &RadarConfig, angle_degrees: f32, normalized_radius: f32) -> MarkerPlacement {
    let center = config.center();
    let point = polar_to_cartesian(center, config.outer_radius * normalized_radius, angle_degrees);
    let spoke_start = polar_to_cartesian(center, config.inner_radius + config.hub_radius, angle_degrees);

    let anchor = label_anchor(angle_degrees);
    let offset_x = match anchor {
        LabelAnchor::Start => config.label_offset,
        LabelAnchor::End => -config.label_offset,
    };

    MarkerPlacement {
        point,
        spoke_start,
        label_position: point + Vec2::new(offset_x, 4.0),
        anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn zero_degrees_points_up() {
        let p = polar_to_cartesian(Vec2::new(230.0, 230.0), 215.0, 0.0);
        assert!(approx(p, Vec2::new(230.0, 15.0)), "{p:?}");
    }

    #[test]
    fn angles_grow_clockwise() {
        let c = Vec2::new(230.0, 230.0);
        assert!(approx(polar_to_cartesian(c, 100.0, 90.0), Vec2::new(330.0, 230.0)));
        assert!(approx(polar_to_cartesian(c, 100.0, 180.0), Vec2::new(230.0, 330.0)));
        assert!(approx(polar_to_cartesian(c, 100.0, 270.0), Vec2::new(130.0, 230.0)));
    }

    #[test]
    fn wedge_within_one_turn_is_single_segment() {
        let path = sweep_wedge_path(Vec2::new(230.0, 230.0), 215.0, 10.0, 40.0);
        assert_eq!(path.segment_count(), 1);
        assert_eq!(path.sectors, vec![Sector { start_degrees: 10.0, end_degrees: 50.0 }]);
        assert_eq!(path.commands.len(), 4);
        assert!(path.to_string().starts_with("M 230 230 L "));
        assert!(path.to_string().ends_with(" Z"));
    }

    #[test]
    fn wrapping_wedge_is_split() {
        let path = sweep_wedge_path(Vec2::new(230.0, 230.0), 215.0, 350.0, 40.0);
        assert_eq!(path.segment_count(), 2);
        assert_eq!(
            path.sectors,
            vec![
                Sector { start_degrees: 350.0, end_degrees: 360.0 },
                Sector { start_degrees: 0.0, end_degrees: 30.0 },
            ]
        );
        assert_eq!(path.to_string().matches('M').count(), 2);
    }

    #[test]
    fn wedge_ending_exactly_at_zero_has_one_segment() {
        let path = sweep_wedge_path(Vec2::ZERO, 10.0, 320.0, 40.0);
        assert_eq!(path.sectors, vec![Sector { start_degrees: 320.0, end_degrees: 360.0 }]);
    }

    #[test]
    fn arc_runs_from_end_back_to_start() {
        let c = Vec2::new(230.0, 230.0);
        let path = sweep_wedge_path(c, 215.0, 0.0, 90.0);
        match (path.commands[1], path.commands[2]) {
            (PathCommand::LineTo(from), PathCommand::Arc { large_arc, sweep, to, .. }) => {
                assert!(approx(from, Vec2::new(445.0, 230.0)));
                assert!(approx(to, Vec2::new(230.0, 15.0)));
                assert!(!large_arc);
                assert!(!sweep);
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn tessellation_covers_each_sector() {
        let path = sweep_wedge_path(Vec2::ZERO, 10.0, 350.0, 40.0);
        let triangles = path.tessellate(1.0);
        assert_eq!(triangles.len(), (10 + 30) * 3);
        assert!(triangles.chunks(3).all(|t| t[0] == Vec2::ZERO));
    }

    #[test]
    fn label_flip_boundaries() {
        assert_eq!(label_anchor(89.0), LabelAnchor::Start);
        assert_eq!(label_anchor(90.0), LabelAnchor::End);
        assert_eq!(label_anchor(180.0), LabelAnchor::End);
        assert_eq!(label_anchor(270.0), LabelAnchor::End);
        assert_eq!(label_anchor(271.0), LabelAnchor::Start);
    }

    #[test]
    fn marker_labels_are_offset_outward() {
        let config = RadarConfig::default();

        let right = place_marker(&config, 20.0, 0.55);
        assert_eq!(right.anchor, LabelAnchor::Start);
        assert!(approx(right.label_position, right.point + Vec2::new(14.0, 4.0)));

        let left = place_marker(&config, 135.0, 0.40);
        assert_eq!(left.anchor, LabelAnchor::End);
        assert!(approx(left.label_position, left.point + Vec2::new(-14.0, 4.0)));

        let top = place_marker(&config, 0.0, 1.0);
        assert!(approx(top.point, Vec2::new(230.0, 15.0)));
        assert!(approx(top.spoke_start, Vec2::new(230.0, 170.0)));
    }

    #[test]
    fn ring_radii_span_inner_to_outer() {
        let radii = RadarConfig::default().ring_radii();
        assert_eq!(radii.len(), 11);
        assert_eq!(radii.first(), Some(&15.0));
        assert_eq!(radii.last(), Some(&215.0));
    }
}
