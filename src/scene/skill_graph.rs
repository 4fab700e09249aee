use std::collections::{HashMap, HashSet};

use super::skill_catalog::{SkillCatalog, SkillNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillStatus {
    Mastered,
    Available,
    Locked,
}

impl SkillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillStatus::Mastered => "mastered",
            SkillStatus::Available => "available",
            SkillStatus::Locked => "locked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MasteryState {
    pub mastered: HashSet<String>,
    pub total_xp: u32,
}

/// Skill nodes plus the user's mastery progress over them.
///
/// A node becomes unlockable as soon as *any* mastered node lists it in its
/// `unlocks`; the root is always unlockable. Unknown ids are never unlocked.
#[derive(Debug, Clone)]
pub struct SkillGraph {
    catalog: SkillCatalog,
    index: HashMap<String, usize>,
    state: MasteryState,
}

impl SkillGraph {
    /// Builds the graph with the root already mastered.
    pub fn new(catalog: SkillCatalog) -> Self {
        let index = catalog
            .skills
            .iter()
            .enumerate()
            .map(|(i, skill)| (skill.id.clone(), i))
            .collect();

        let mut graph = Self { catalog, index, state: MasteryState::default() };
        let root = graph.catalog.root.clone();
        if !graph.master_skill(&root) {
            log::warn!("Root skill `{}` is not in the catalog; nothing is mastered.", root);
        }
        graph
    }

    pub fn root(&self) -> &str {
        &self.catalog.root
    }

    pub fn node(&self, id: &str) -> Option<&SkillNode> {
        self.index.get(id).map(|&i| &self.catalog.skills[i])
    }

    pub fn nodes(&self) -> &[SkillNode] {
        &self.catalog.skills
    }

    pub fn node_count(&self) -> usize {
        self.catalog.skills.len()
    }

    pub fn mastery(&self) -> &MasteryState {
        &self.state
    }

    pub fn total_xp(&self) -> u32 {
        self.state.total_xp
    }

    pub fn mastered_count(&self) -> usize {
        self.state.mastered.len()
    }

    pub fn is_mastered(&self, id: &str) -> bool {
        self.state.mastered.contains(id)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        if !self.index.contains_key(id) {
            return false;
        }
        if id == self.catalog.root {
            return true;
        }
        self.catalog
            .skills
            .iter()
            .any(|skill| self.state.mastered.contains(&skill.id) && skill.unlocks.iter().any(|u| u == id))
    }

    pub fn status(&self, id: &str) -> SkillStatus {
        if self.is_mastered(id) {
            SkillStatus::Mastered
        } else if self.is_unlocked(id) {
            SkillStatus::Available
        } else {
            SkillStatus::Locked
        }
    }

    /// Masters `id` if it is unlocked and not yet mastered. Returns whether
    /// anything changed.
    pub fn master_skill(&mut self, id: &str) -> bool {
        if self.is_mastered(id) || !self.is_unlocked(id) {
            return false;
        }
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let xp = self.catalog.skills[i].xp;
        self.state.mastered.insert(id.to_owned());
        self.state.total_xp += xp;
        log::debug!("Mastered `{}` (+{} XP, total {}).", id, xp, self.state.total_xp);
        true
    }

    /// Every unlock edge in catalog order. Edges to ids outside the catalog are skipped.
    pub fn connections(&self) -> Vec<Connection> {
        let index = &self.index;
        let mastered = &self.state.mastered;
        self.catalog
            .skills
            .iter()
            .flat_map(|skill| {
                let active = mastered.contains(&skill.id);
                skill
                    .unlocks
                    .iter()
                    .filter(move |target| index.contains_key(target.as_str()))
                    .map(move |target| Connection { from: skill.id.clone(), to: target.clone(), active })
            })
            .collect()
    }

    /// Progress bar fill: 100 mastered, 50 available, 0 locked.
    pub fn progress_percent(&self, id: &str) -> u8 {
        match self.status(id) {
            SkillStatus::Mastered => 100,
            SkillStatus::Available => 50,
            SkillStatus::Locked => 0,
        }
    }
}

impl Default for SkillGraph {
    fn default() -> Self {
        Self::new(SkillCatalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xp_sum(graph: &SkillGraph) -> u32 {
        graph.mastery().mastered.iter().map(|id| graph.node(id).unwrap().xp).sum()
    }

    #[test]
    fn root_is_mastered_on_start() {
        let graph = SkillGraph::default();
        assert!(graph.is_mastered("foundation"));
        assert_eq!(graph.total_xp(), 100);
        assert_eq!(graph.mastered_count(), 1);
        assert!(graph.is_unlocked("frontend"));
        assert!(!graph.is_unlocked("devops"));
    }

    #[test]
    fn devops_unlocks_after_backend() {
        let mut graph = SkillGraph::default();
        assert!(!graph.master_skill("devops"));
        assert_eq!(graph.status("devops"), SkillStatus::Locked);

        assert!(graph.master_skill("backend"));
        assert!(graph.is_unlocked("devops"));
        assert_eq!(graph.status("devops"), SkillStatus::Available);
        assert!(graph.master_skill("devops"));
        assert_eq!(graph.total_xp(), 100 + 300 + 450);
    }

    #[test]
    fn mastering_twice_counts_xp_once() {
        let mut graph = SkillGraph::default();
        assert!(graph.master_skill("frontend"));
        assert!(!graph.master_skill("frontend"));
        assert_eq!(graph.total_xp(), 350);
        assert!(!graph.master_skill("foundation"));
        assert_eq!(graph.total_xp(), 350);
    }

    #[test]
    fn any_single_prerequisite_unlocks() {
        let mut graph = SkillGraph::default();
        // product is unlocked by either ui-ux or branding
        graph.master_skill("design");
        graph.master_skill("branding");
        assert!(!graph.is_mastered("ui-ux"));
        assert!(graph.is_unlocked("product"));
    }

    #[test]
    fn unlocked_iff_some_mastered_node_lists_it() {
        let mut graph = SkillGraph::default();
        for id in ["frontend", "design", "ui-ux", "backend", "data"] {
            graph.master_skill(id);
        }
        for node in graph.nodes() {
            if node.id == graph.root() {
                continue;
            }
            let expected = graph
                .nodes()
                .iter()
                .any(|m| graph.is_mastered(&m.id) && m.unlocks.contains(&node.id));
            assert_eq!(graph.is_unlocked(&node.id), expected, "node {}", node.id);
        }
    }

    #[test]
    fn status_prefers_mastered() {
        let mut graph = SkillGraph::default();
        graph.master_skill("frontend");
        // frontend is both unlocked and mastered
        assert!(graph.is_unlocked("frontend"));
        assert_eq!(graph.status("frontend"), SkillStatus::Mastered);
        assert_eq!(graph.status("foundation"), SkillStatus::Mastered);
        assert_eq!(graph.progress_percent("frontend"), 100);
        assert_eq!(graph.progress_percent("mobile"), 50);
        assert_eq!(graph.progress_percent("executive"), 0);
    }

    #[test]
    fn xp_matches_mastered_set_after_every_operation() {
        let mut graph = SkillGraph::default();
        let attempts = [
            "executive", "frontend", "mobile", "native", "native", "unknown", "backend", "data", "ai-ml",
            "executive", "design", "frontend",
        ];
        for id in attempts {
            graph.master_skill(id);
            assert_eq!(graph.total_xp(), xp_sum(&graph));
        }
        assert!(graph.is_mastered("executive"));
    }

    #[test]
    fn unknown_ids_are_locked() {
        let mut graph = SkillGraph::default();
        assert!(!graph.is_unlocked("nope"));
        assert_eq!(graph.status("nope"), SkillStatus::Locked);
        assert!(!graph.master_skill("nope"));
        assert_eq!(graph.total_xp(), 100);
    }

    #[test]
    fn connections_follow_mastery() {
        let mut graph = SkillGraph::default();
        let edges = graph.connections();
        assert_eq!(edges.len(), 17);
        assert_eq!(
            edges[0],
            Connection { from: "foundation".into(), to: "frontend".into(), active: true }
        );
        assert!(edges.iter().filter(|e| e.from != "foundation").all(|e| !e.active));

        graph.master_skill("backend");
        let active: Vec<_> = graph
            .connections()
            .into_iter()
            .filter(|e| e.active)
            .map(|e| (e.from, e.to))
            .collect();
        assert!(active.contains(&("backend".to_owned(), "devops".to_owned())));
        assert!(active.contains(&("backend".to_owned(), "data".to_owned())));
        assert_eq!(active.len(), 5);
    }
}
