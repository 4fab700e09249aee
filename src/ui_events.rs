use crate::app_state::State;
use crate::scene::skill_catalog::SkillCatalog;
use crate::scene::skill_graph::SkillGraph;
use crate::scene::{Scene, ViewKind};

#[allow(unused)]
#[derive(Debug)]
pub enum UserCommand {
    SetSkillCatalog(SkillCatalog),
    MasterSkill(String),
    ShowView(ViewKind),
    AddSkill(String),
    ToggleFilter(String),
    SetSalary(u32),
    StateInitialized, // Notifies App that State setup is complete
}

/// What a command did to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Unchanged,
    Content,
    View,
}

impl Scene {
    pub fn process_command(&mut self, command: UserCommand) -> SceneChange {
        match command {
            UserCommand::SetSkillCatalog(catalog) => {
                log::info!("Replacing skill catalog ({} skills, root `{}`).", catalog.skills.len(), catalog.root);
                self.skill_graph = SkillGraph::new(catalog);
                self.hovered_skill = None;
                SceneChange::Content
            }
            UserCommand::MasterSkill(id) => {
                if self.skill_graph.master_skill(&id) {
                    SceneChange::Content
                } else {
                    log::debug!("Cannot master `{}`: {}.", id, self.skill_graph.status(&id).as_str());
                    SceneChange::Unchanged
                }
            }
            UserCommand::ShowView(view) => {
                if self.show_view(view) {
                    SceneChange::View
                } else {
                    SceneChange::Unchanged
                }
            }
            UserCommand::AddSkill(skill) => {
                if self.job_search.add_skill(&skill) {
                    log::debug!("Added skill `{}` to job search.", skill.trim());
                    SceneChange::Content
                } else {
                    log::warn!("Ignoring blank or duplicate skill `{}`.", skill);
                    SceneChange::Unchanged
                }
            }
            UserCommand::ToggleFilter(filter) => {
                let active = self.job_search.toggle_filter(&filter);
                log::debug!("Filter `{}` is now {}.", filter, if active { "on" } else { "off" });
                SceneChange::Content
            }
            UserCommand::SetSalary(value) => {
                let before = self.job_search.salary();
                let salary = self.job_search.set_salary(value);
                log::debug!("Salary set to {} (requested {}).", salary, value);
                if salary == before { SceneChange::Unchanged } else { SceneChange::Content }
            }
            UserCommand::StateInitialized => {
                // This command is handled in App::user_event
                SceneChange::Unchanged
            }
        }
    }
}

impl State {
    pub fn process_command(&mut self, command: UserCommand) {
        match self.scene.process_command(command) {
            SceneChange::Unchanged => {}
            SceneChange::Content => self.scene_dirty = true,
            SceneChange::View => {
                self.fit_camera_to_view();
                self.scene_dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_command_reports_change_once() {
        let mut scene = Scene::default();
        assert_eq!(scene.process_command(UserCommand::MasterSkill("frontend".into())), SceneChange::Content);
        assert_eq!(scene.process_command(UserCommand::MasterSkill("frontend".into())), SceneChange::Unchanged);
        assert_eq!(scene.process_command(UserCommand::MasterSkill("devops".into())), SceneChange::Unchanged);
        assert_eq!(scene.skill_graph.total_xp(), 100 + scene.skill_graph.node("frontend").map_or(0, |n| n.xp));
    }

    #[test]
    fn view_command_switches_once() {
        let mut scene = Scene::default();
        assert_eq!(scene.process_command(UserCommand::ShowView(ViewKind::Radar)), SceneChange::View);
        assert_eq!(scene.process_command(UserCommand::ShowView(ViewKind::Radar)), SceneChange::Unchanged);
        assert_eq!(scene.active_view, ViewKind::Radar);
    }

    #[test]
    fn job_search_commands() {
        let mut scene = Scene::default();
        assert_eq!(scene.process_command(UserCommand::AddSkill(" Rust ".into())), SceneChange::Content);
        assert_eq!(scene.process_command(UserCommand::AddSkill("Rust".into())), SceneChange::Unchanged);
        assert_eq!(scene.process_command(UserCommand::ToggleFilter("Crypt".into())), SceneChange::Content);
        assert!(scene.job_search.is_filter_active("Crypt"));
        assert_eq!(scene.process_command(UserCommand::SetSalary(200_000)), SceneChange::Unchanged);
        assert_eq!(scene.process_command(UserCommand::SetSalary(250_400)), SceneChange::Content);
        assert_eq!(scene.job_search.salary(), 250_000);
    }

    #[test]
    fn replacing_catalog_resets_mastery() {
        let mut scene = Scene::default();
        scene.process_command(UserCommand::MasterSkill("frontend".into()));
        scene.hovered_skill = Some("frontend".into());
        let json = r##"{"root":"a","skills":[
            {"id":"a","name":"A","xp":10,"position":{"x":0,"y":0},"color":"#fff","unlocks":["b"]},
            {"id":"b","name":"B","xp":5,"position":{"x":100,"y":0},"color":"#000"}
        ]}"##;
        let catalog = SkillCatalog::from_json(json).unwrap();
        assert_eq!(scene.process_command(UserCommand::SetSkillCatalog(catalog)), SceneChange::Content);
        assert_eq!(scene.skill_graph.total_xp(), 10);
        assert!(scene.skill_graph.is_unlocked("b"));
        assert_eq!(scene.hovered_skill, None);
    }
}
