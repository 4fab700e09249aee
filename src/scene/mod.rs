pub mod job_search;
pub mod radar;
pub mod radar_view;
pub mod skill_catalog;
pub mod skill_graph;
pub mod text_label;

use glam::Vec2;

use crate::animation::FrameScheduler;
use job_search::JobSearch;
use radar_view::RadarView;
use skill_graph::SkillGraph;

/// Hit radius of a skill node, in layout units.
pub const SKILL_NODE_RADIUS: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    SkillTree,
    Radar,
}

impl ViewKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "skills" | "skill-tree" | "skilltree" => Some(ViewKind::SkillTree),
            "radar" | "job-radar" => Some(ViewKind::Radar),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewKind::SkillTree => ViewKind::Radar,
            ViewKind::Radar => ViewKind::SkillTree,
        }
    }
}

/// Everything the views show, independent of the GPU.
pub struct Scene {
    pub skill_graph: SkillGraph,
    pub radar: RadarView,
    pub radar_frames: FrameScheduler<RadarView>,
    pub job_search: JobSearch,
    pub active_view: ViewKind,
    pub hovered_skill: Option<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            skill_graph: SkillGraph::default(),
            radar: RadarView::default(),
            radar_frames: FrameScheduler::new(),
            job_search: JobSearch::default(),
            active_view: ViewKind::SkillTree,
            hovered_skill: None,
        }
    }
}

impl Scene {
    /// Switches views and returns whether the view changed. Entering the
    /// radar starts the sweep; leaving it stops the sweep and releases its
    /// frame task.
    pub fn show_view(&mut self, view: ViewKind) -> bool {
        if view == self.active_view {
            return false;
        }
        match view {
            ViewKind::Radar => {
                if !self.job_search.can_start_radar() {
                    // Seed the radar with what the user has mastered so far.
                    let names: Vec<String> = self
                        .skill_graph
                        .nodes()
                        .iter()
                        .filter(|n| self.skill_graph.is_mastered(&n.id))
                        .map(|n| n.name.clone())
                        .collect();
                    for name in names {
                        self.job_search.add_skill(&name);
                    }
                }
                if !self.job_search.can_start_radar() {
                    log::warn!("Radar needs at least one skill; staying on {:?}.", self.active_view);
                    return false;
                }
                self.radar.start(&mut self.radar_frames);
            }
            ViewKind::SkillTree => self.radar.stop(),
        }
        log::info!("Switching view {:?} -> {:?}", self.active_view, view);
        self.active_view = view;
        self.hovered_skill = None;
        true
    }

    /// Skill whose node covers `world` in the skill tree layout.
    pub fn skill_at(&self, world: Vec2) -> Option<&str> {
        self.skill_graph
            .nodes()
            .iter()
            .find(|node| world.distance(Vec2::new(node.position.x, node.position.y)) <= SKILL_NODE_RADIUS)
            .map(|node| node.id.as_str())
    }

    /// Advances per-frame tasks. Returns whether any are still running.
    pub fn tick(&mut self) -> bool {
        self.radar_frames.tick(&mut self.radar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radar_view_runs_sweep_only_while_shown() {
        let mut scene = Scene::default();
        assert!(!scene.tick());

        assert!(scene.show_view(ViewKind::Radar));
        assert!(scene.radar.is_running());
        // mastered root seeds the job search
        assert_eq!(scene.job_search.skills(), ["Foundation".to_owned()]);
        assert!(scene.tick());
        assert!(scene.tick());
        assert_eq!(scene.radar.sweep().current_angle_degrees, 2.0);

        assert!(scene.show_view(ViewKind::SkillTree));
        assert!(!scene.radar.is_running());
        assert!(!scene.tick());
        assert_eq!(scene.radar.sweep().current_angle_degrees, 2.0);

        assert!(scene.show_view(ViewKind::Radar));
        assert_eq!(scene.radar.sweep().current_angle_degrees, 0.0);
    }

    #[test]
    fn showing_current_view_is_a_no_op() {
        let mut scene = Scene::default();
        assert!(!scene.show_view(ViewKind::SkillTree));
    }

    #[test]
    fn hit_test_uses_node_radius() {
        let scene = Scene::default();
        assert_eq!(scene.skill_at(Vec2::new(400.0, 500.0)), Some("foundation"));
        assert_eq!(scene.skill_at(Vec2::new(420.0, 510.0)), Some("foundation"));
        assert_eq!(scene.skill_at(Vec2::new(400.0, 530.0)), None);
    }

    #[test]
    fn view_names() {
        assert_eq!(ViewKind::parse("Radar"), Some(ViewKind::Radar));
        assert_eq!(ViewKind::parse(" skills "), Some(ViewKind::SkillTree));
        assert_eq!(ViewKind::parse("pricing"), None);
        assert_eq!(ViewKind::SkillTree.toggled(), ViewKind::Radar);
    }
}
