use std::collections::HashSet;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// 节点在技能树画布中的坐标 (800x550, y 轴向下)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    pub xp: u32,
    #[serde(default)]
    pub description: String,
    pub position: Location,
    /// sRGB hex, e.g. `#6366F1`.
    pub color: String,
    #[serde(default)]
    pub unlocks: Vec<String>,
}

/// The immutable node catalog a [`SkillGraph`](super::skill_graph::SkillGraph) is built from.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SkillCatalog {
    pub root: String,
    pub skills: Vec<SkillNode>,
}

impl SkillCatalog {
    /// Parses and validates a catalog.
    ///
    /// Duplicate ids and a root that is not part of the catalog are rejected.
    /// Unlock targets naming unknown skills are dropped with a warning.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let mut catalog: SkillCatalog =
            serde_json::from_str(json).context("failed to parse skill catalog JSON")?;

        let mut seen = HashSet::with_capacity(catalog.skills.len());
        for skill in &catalog.skills {
            if !seen.insert(skill.id.as_str()) {
                bail!("duplicate skill id `{}` in catalog", skill.id);
            }
        }
        if !seen.contains(catalog.root.as_str()) {
            bail!("root skill `{}` is not defined in the catalog", catalog.root);
        }

        let known: HashSet<String> = seen.into_iter().map(str::to_owned).collect();
        for skill in &mut catalog.skills {
            skill.unlocks.retain(|target| {
                let exists = known.contains(target);
                if !exists {
                    log::warn!("Skill `{}` unlocks non-existent skill `{}`, dropping edge.", skill.id, target);
                }
                exists
            });
        }

        log::info!("Loaded skill catalog with {} skills, root `{}`.", catalog.skills.len(), catalog.root);
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&SkillNode> {
        self.skills.iter().find(|skill| skill.id == id)
    }
}

fn skill(id: &str, name: &str, xp: u32, (x, y): (f32, f32), color: &str, description: &str, unlocks: &[&str]) -> SkillNode {
    SkillNode {
        id: id.to_owned(),
        name: name.to_owned(),
        xp,
        description: description.to_owned(),
        position: Location { x, y },
        color: color.to_owned(),
        unlocks: unlocks.iter().map(|s| (*s).to_owned()).collect(),
    }
}

impl Default for SkillCatalog {
    fn default() -> Self {
        let skills = vec![
            skill("foundation", "Foundation", 100, (400.0, 500.0), "#6366F1",
                "Your starting point - basic skills and knowledge", &["frontend", "backend", "design"]),
            skill("frontend", "Frontend Development", 250, (200.0, 350.0), "#22C55E",
                "Master React, Vue, and modern web technologies", &["ui-ux", "mobile"]),
            skill("backend", "Backend Engineering", 300, (600.0, 350.0), "#EF4444",
                "APIs, databases, and server architecture", &["devops", "data"]),
            skill("design", "Design Systems", 200, (400.0, 250.0), "#A855F7",
                "Visual design and user experience principles", &["ui-ux", "branding"]),
            skill("ui-ux", "UI/UX Mastery", 350, (250.0, 150.0), "#FB923C",
                "Advanced user interface and experience design", &["product"]),
            skill("mobile", "Mobile Development", 400, (100.0, 200.0), "#0EA5E9",
                "iOS, Android, and cross-platform development", &["native"]),
            skill("devops", "DevOps & Cloud", 450, (700.0, 200.0), "#10B981",
                "Infrastructure, CI/CD, and cloud platforms", &["architecture"]),
            skill("data", "Data Engineering", 500, (550.0, 150.0), "#F56565",
                "Big data, ML pipelines, and analytics", &["ai-ml"]),
            skill("branding", "Brand Strategy", 300, (450.0, 100.0), "#8B5CF6",
                "Brand identity and marketing strategy", &["product"]),
            skill("product", "Product Leadership", 600, (350.0, 50.0), "#FBBF24",
                "Product strategy and team leadership", &["executive"]),
            skill("native", "Native Platforms", 550, (50.0, 100.0), "#3B82F6",
                "Platform-specific optimization and APIs", &[]),
            skill("architecture", "System Architecture", 700, (650.0, 50.0), "#34D399",
                "Large-scale system design and architecture", &["executive"]),
            skill("ai-ml", "AI/ML Engineering", 800, (550.0, 50.0), "#EC4899",
                "Machine learning and artificial intelligence", &["executive"]),
            skill("executive", "Executive Leadership", 1000, (400.0, 20.0), "#F59E0B",
                "C-level leadership and strategic vision", &[]),
        ];

        Self { root: "foundation".to_owned(), skills }
    }
}
