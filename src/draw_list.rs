// Turns scene state into GPU-ready primitives. Rebuilt whenever the scene changes.
use glam::Vec2;

use crate::color::Color;
use crate::models::{CircleInstance, ShapeVertex};
use crate::scene::job_search::{JobSearch, SKILL_FILTERS};
use crate::scene::radar::polar_to_cartesian;
use crate::scene::radar_view::RadarView;
use crate::scene::skill_graph::{SkillGraph, SkillStatus};
use crate::scene::text_label::{TextAlign, TextLabel};
use crate::scene::SKILL_NODE_RADIUS;

const SKILL_GLOW_RADIUS: f32 = 35.0;
const MARKER_RADIUS: f32 = 9.0;
const RING_SEGMENTS: usize = 96;

/// Layout bounds of each view, used to fit the camera.
pub const SKILL_TREE_BOUNDS: (Vec2, Vec2) = (Vec2::new(0.0, -20.0), Vec2::new(800.0, 560.0));
pub const RADAR_BOUNDS: (Vec2, Vec2) = (Vec2::new(0.0, 0.0), Vec2::new(460.0, 460.0));

const LOCKED_GREY: (u8, u8, u8) = (100, 116, 139);
const TEXT_LIGHT: [u8; 3] = [226, 232, 240];
const TEXT_MUTED: [u8; 3] = [148, 163, 184];
const STATUS_MASTERED: [u8; 3] = [74, 222, 128];
const STATUS_AVAILABLE: [u8; 3] = [96, 165, 250];
const XP_YELLOW: [u8; 3] = [250, 204, 21];
const RADAR_CYAN: [u8; 3] = [34, 219, 216];

#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub lines: Vec<ShapeVertex>,
    pub fills: Vec<ShapeVertex>,
    pub circles: Vec<CircleInstance>,
    pub labels: Vec<TextLabel>,
}

impl DrawList {
    fn line(&mut self, a: Vec2, b: Vec2, color: [f32; 4]) {
        self.lines.push(ShapeVertex { position: a.into(), color });
        self.lines.push(ShapeVertex { position: b.into(), color });
    }

    /// A line segment with real width, as two triangles.
    fn thick_line(&mut self, a: Vec2, b: Vec2, width: f32, color: [f32; 4]) {
        let dir = b - a;
        // 避免除以零或非常短的线段
        if dir.length() < f32::EPSILON {
            return;
        }
        let normal = dir.normalize().perp() * (width * 0.5);
        let quad = [a + normal, a - normal, b - normal, a + normal, b - normal, b + normal];
        self.fills.extend(quad.iter().map(|p| ShapeVertex { position: (*p).into(), color }));
    }

    fn ring(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        for i in 0..RING_SEGMENTS {
            let a0 = 360.0 * i as f32 / RING_SEGMENTS as f32;
            let a1 = 360.0 * (i + 1) as f32 / RING_SEGMENTS as f32;
            self.line(polar_to_cartesian(center, radius, a0), polar_to_cartesian(center, radius, a1), color);
        }
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        self.circles.push(CircleInstance { position: center.into(), radius_scale: radius, color });
    }
}

pub fn skill_tree_draw_list(graph: &SkillGraph) -> DrawList {
    let mut list = DrawList::default();

    for connection in graph.connections() {
        let (Some(from), Some(to)) = (graph.node(&connection.from), graph.node(&connection.to)) else {
            continue;
        };
        let a = Vec2::new(from.position.x, from.position.y);
        let b = Vec2::new(to.position.x, to.position.y);
        if connection.active {
            let color = Color::from_hex_or_grey(&from.color).with_alpha(0.9).into_linear_rgba();
            list.thick_line(a, b, 3.0, color);
        } else {
            let color = Color::from(LOCKED_GREY).with_alpha(0.09).into_linear_rgba();
            list.thick_line(a, b, 1.0, color);
        }
    }

    for node in graph.nodes() {
        let center = Vec2::new(node.position.x, node.position.y);
        let node_color = Color::from_hex_or_grey(&node.color);
        let status = graph.status(&node.id);

        if status == SkillStatus::Mastered {
            list.circle(center, SKILL_GLOW_RADIUS, node_color.with_alpha(0.25).into_linear_rgba());
        }

        // stroke ring drawn as a slightly larger disc underneath
        let (stroke_width, stroke) = match status {
            SkillStatus::Mastered => (3.0, Color::from((255, 255, 255))),
            _ => (1.0, Color::from((255, 255, 255)).with_alpha(0.3)),
        };
        list.circle(center, SKILL_NODE_RADIUS + stroke_width, stroke.into_linear_rgba());

        let fill = match status {
            SkillStatus::Locked => Color::from(LOCKED_GREY).with_alpha(0.2),
            _ => node_color,
        };
        list.circle(center, SKILL_NODE_RADIUS, fill.into_linear_rgba());

        list.labels.push(
            TextLabel::world(node.name.clone(), center + Vec2::new(0.0, 45.0), 14.0, TextAlign::Middle)
                .with_color(TEXT_LIGHT),
        );
    }

    list
}

pub fn radar_draw_list(radar: &RadarView) -> DrawList {
    let mut list = DrawList::default();
    let config = &radar.config;
    let center = config.center();

    let accent = Color::from((0x30, 0xd5, 0xc8));
    let grid = Color::from((0x3b, 0x4b, 0x61));
    for radius in config.ring_radii() {
        let is_edge = radius == config.inner_radius || radius >= config.outer_radius;
        let color = if is_edge { accent.with_alpha(0.6) } else { grid };
        list.ring(center, radius, color.into_linear_rgba());
    }

    if let Some(wedge) = radar.sweep_path() {
        let color = Color::from((0x3e, 0xe3, 0xe1)).with_alpha(0.15).into_linear_rgba();
        list.fills.extend(
            wedge
                .tessellate(1.0)
                .into_iter()
                .map(|p| ShapeVertex { position: p.into(), color }),
        );
    }

    list.ring(center, config.hub_radius, accent.into_linear_rgba());
    list.labels.push(
        TextLabel::world("You", center + Vec2::new(0.0, 8.0), 19.2, TextAlign::Middle).with_color(RADAR_CYAN),
    );

    let spoke = Color::from((0x22, 0xd3, 0xee)).with_alpha(0.4).into_linear_rgba();
    let marker_stroke = Color::from((0x14, 0xb8, 0xa6)).into_linear_rgba();
    let marker_core = Color::from((0x0f, 0x17, 0x2a)).into_linear_rgba();
    for (marker, placement) in radar.placements() {
        list.line(placement.spoke_start, placement.point, spoke);

        list.circle(placement.point, MARKER_RADIUS + 2.0, marker_stroke);
        list.circle(
            placement.point,
            MARKER_RADIUS,
            Color::from_hex_or_grey(marker.category.hex()).with_alpha(0.8).into_linear_rgba(),
        );
        list.circle(placement.point, 5.0, marker_core);

        list.labels.push(
            TextLabel::world(marker.label.clone(), placement.label_position, 12.0, placement.anchor.into())
                .with_color([203, 213, 225]),
        );
        if let Some(detail) = &marker.detail {
            list.labels.push(
                TextLabel::world(detail.clone(), placement.label_position + Vec2::new(0.0, 12.0), 8.0, placement.anchor.into())
                    .with_color([100, 116, 139]),
            );
        }
    }

    list
}

/// `12345` -> `12,345`
pub fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn status_color(status: SkillStatus) -> [u8; 3] {
    match status {
        SkillStatus::Mastered => STATUS_MASTERED,
        SkillStatus::Available => STATUS_AVAILABLE,
        SkillStatus::Locked => TEXT_MUTED,
    }
}

pub fn skill_tree_hud(graph: &SkillGraph, hovered: Option<&str>, viewport: Vec2) -> Vec<TextLabel> {
    let mut labels = vec![
        TextLabel::screen("The Constellation", Vec2::new(24.0, 40.0), 28.0).with_color([192, 132, 252]),
        TextLabel::screen(format!("Total XP  {}", format_thousands(graph.total_xp())), Vec2::new(24.0, 76.0), 18.0)
            .with_color(XP_YELLOW),
        TextLabel::screen(
            format!("Skills Mastered  {} / {}", graph.mastered_count(), graph.node_count()),
            Vec2::new(24.0, 102.0),
            18.0,
        )
        .with_color(STATUS_MASTERED),
    ];

    let column_x = (viewport.x - 260.0).max(24.0);
    labels.push(TextLabel::screen("Skills Progress", Vec2::new(column_x, 40.0), 18.0).with_color(TEXT_LIGHT));
    for (i, node) in graph.nodes().iter().enumerate() {
        let status = graph.status(&node.id);
        labels.push(
            TextLabel::screen(
                format!("{}  {}%", node.name, graph.progress_percent(&node.id)),
                Vec2::new(column_x, 68.0 + 22.0 * i as f32),
                14.0,
            )
            .with_color(status_color(status)),
        );
    }

    if let Some(node) = hovered.and_then(|id| graph.node(id)) {
        let status = graph.status(&node.id);
        labels.push(TextLabel::screen(node.name.clone(), Vec2::new(24.0, 146.0), 18.0).with_color(TEXT_LIGHT));
        labels.push(TextLabel::screen(node.description.clone(), Vec2::new(24.0, 168.0), 13.0).with_color(TEXT_MUTED));
        labels.push(
            TextLabel::screen(format!("+{} XP   {}", node.xp, status.as_str()), Vec2::new(24.0, 190.0), 14.0)
                .with_color(status_color(status)),
        );
    }

    labels.push(
        TextLabel::screen(
            "Click an available skill to master it  ·  1 skill tree  ·  2 job radar",
            Vec2::new(24.0, (viewport.y - 20.0).max(120.0)),
            13.0,
        )
        .with_color(TEXT_MUTED),
    );

    labels
}

pub fn radar_hud(search: &JobSearch, viewport: Vec2) -> Vec<TextLabel> {
    let mut labels = vec![
        TextLabel::screen("Job Radar", Vec2::new(24.0, 40.0), 24.0).with_color(RADAR_CYAN),
        TextLabel::screen(format!("Your skills: {}", search.skills().join(", ")), Vec2::new(24.0, 70.0), 14.0)
            .with_color(TEXT_MUTED),
    ];

    let column_x = (viewport.x - 320.0).max(24.0);
    labels.push(TextLabel::screen("Skill Filters", Vec2::new(column_x, 40.0), 18.0).with_color(TEXT_LIGHT));
    for (i, filter) in SKILL_FILTERS.iter().enumerate() {
        let (text, color) = if search.is_filter_active(filter) {
            (format!("[{filter}]"), RADAR_CYAN)
        } else {
            (filter.to_string(), TEXT_MUTED)
        };
        labels.push(TextLabel::screen(text, Vec2::new(column_x, 66.0 + 20.0 * i as f32), 14.0).with_color(color));
    }

    let salary_y = 66.0 + 20.0 * SKILL_FILTERS.len() as f32 + 24.0;
    labels.push(TextLabel::screen("Salary Range", Vec2::new(column_x, salary_y), 18.0).with_color(TEXT_LIGHT));
    labels.push(
        TextLabel::screen(
            format!("{}  -  {}+   ({:.0}%)", search.salary_label(), search.salary_label(), search.salary_fill_percent()),
            Vec2::new(column_x, salary_y + 24.0),
            14.0,
        )
        .with_color(TEXT_MUTED),
    );

    labels.push(
        TextLabel::screen("[ / ] salary  ·  1 skill tree  ·  2 job radar", Vec2::new(24.0, (viewport.y - 20.0).max(120.0)), 13.0)
            .with_color(TEXT_MUTED),
    );

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::FrameScheduler;

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(100), "100");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn skill_tree_draws_every_node_and_edge() {
        let graph = SkillGraph::default();
        let list = skill_tree_draw_list(&graph);
        // one glow for the mastered root, then stroke + fill per node
        assert_eq!(list.circles.len(), 1 + 2 * graph.node_count());
        assert_eq!(list.fills.len(), 6 * graph.connections().len());
        assert_eq!(list.labels.len(), graph.node_count());
        assert!(list.lines.is_empty());
    }

    #[test]
    fn radar_sweep_appears_after_first_frame() {
        let mut frames = FrameScheduler::new();
        let mut radar = RadarView::default();
        assert!(radar_draw_list(&radar).fills.is_empty());

        radar.start(&mut frames);
        frames.tick(&mut radar);
        let list = radar_draw_list(&radar);
        assert_eq!(list.fills.len(), 40 * 3);
        assert_eq!(list.circles.len(), 3 * radar.markers.len());
        // "You", one label per marker, two markers carry a detail line
        assert_eq!(list.labels.len(), 1 + radar.markers.len() + 2);
    }

    #[test]
    fn hud_shows_hovered_skill() {
        let graph = SkillGraph::default();
        let viewport = Vec2::new(1280.0, 720.0);
        let plain = skill_tree_hud(&graph, None, viewport);
        let hovered = skill_tree_hud(&graph, Some("devops"), viewport);
        assert_eq!(hovered.len(), plain.len() + 3);
        assert!(hovered.iter().any(|l| l.content == "+450 XP   locked"));
        assert!(plain.iter().any(|l| l.content == "Skills Mastered  1 / 14"));
        assert!(plain.iter().any(|l| l.content == "Total XP  100"));
    }

    #[test]
    fn radar_hud_marks_active_filters() {
        let mut search = JobSearch::default();
        search.add_skill("Rust");
        let labels = radar_hud(&search, Vec2::new(1280.0, 720.0));
        assert!(labels.iter().any(|l| l.content == "[Reactjs]"));
        assert!(labels.iter().any(|l| l.content == "Crypt"));
        assert!(labels.iter().any(|l| l.content == "Your skills: Rust"));
    }
}
