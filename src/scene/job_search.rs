pub const SKILL_FILTERS: [&str; 8] = ["Reactjs", "Crypt", "Coyak", "Dopdeat", "Y6", "YX", "Seuchtdbn", "XX"];

pub const SALARY_MIN: u32 = 100_000;
pub const SALARY_MAX: u32 = 300_000;
pub const SALARY_STEP: u32 = 1_000;

/// Side panel of the job radar: entered skills, active filters and the salary slider.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSearch {
    skills: Vec<String>,
    active_filters: Vec<String>,
    salary: u32,
}

impl Default for JobSearch {
    fn default() -> Self {
        Self {
            skills: Vec::new(),
            active_filters: vec!["Reactjs".to_owned()],
            salary: 200_000,
        }
    }
}

impl JobSearch {
    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Returns `false` for blank or already entered skills.
    pub fn add_skill(&mut self, input: &str) -> bool {
        let skill = input.trim();
        if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.skills.push(skill.to_owned());
        true
    }

    pub fn remove_skill(&mut self, index: usize) -> Option<String> {
        (index < self.skills.len()).then(|| self.skills.remove(index))
    }

    pub fn can_start_radar(&self) -> bool {
        !self.skills.is_empty()
    }

    pub fn active_filters(&self) -> &[String] {
        &self.active_filters
    }

    pub fn is_filter_active(&self, filter: &str) -> bool {
        self.active_filters.iter().any(|f| f == filter)
    }

    /// Returns whether the filter is active afterwards.
    pub fn toggle_filter(&mut self, filter: &str) -> bool {
        if let Some(pos) = self.active_filters.iter().position(|f| f == filter) {
            self.active_filters.remove(pos);
            false
        } else {
            self.active_filters.push(filter.to_owned());
            true
        }
    }

    pub fn salary(&self) -> u32 {
        self.salary
    }

    /// Clamps to the slider range and snaps to the nearest step.
    pub fn set_salary(&mut self, value: u32) -> u32 {
        let clamped = value.clamp(SALARY_MIN, SALARY_MAX);
        let steps = (clamped - SALARY_MIN + SALARY_STEP / 2) / SALARY_STEP;
        self.salary = (SALARY_MIN + steps * SALARY_STEP).min(SALARY_MAX);
        self.salary
    }

    pub fn salary_label(&self) -> String {
        format!("${}K", (self.salary as f32 / 1000.0).round() as u32)
    }

    pub fn salary_fill_percent(&self) -> f32 {
        (self.salary - SALARY_MIN) as f32 / ((SALARY_MAX - SALARY_MIN) as f32 / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_are_trimmed_and_unique() {
        let mut search = JobSearch::default();
        assert!(!search.can_start_radar());
        assert!(search.add_skill("  Rust "));
        assert!(!search.add_skill("Rust"));
        assert!(!search.add_skill("   "));
        assert!(search.add_skill("SQL"));
        assert_eq!(search.skills(), ["Rust".to_owned(), "SQL".to_owned()]);
        assert!(search.can_start_radar());
    }

    #[test]
    fn remove_skill_ignores_bad_index() {
        let mut search = JobSearch::default();
        search.add_skill("Rust");
        assert_eq!(search.remove_skill(3), None);
        assert_eq!(search.remove_skill(0), Some("Rust".to_owned()));
        assert!(!search.can_start_radar());
    }

    #[test]
    fn filters_toggle() {
        let mut search = JobSearch::default();
        assert!(search.is_filter_active("Reactjs"));
        assert!(!search.toggle_filter("Reactjs"));
        assert!(search.toggle_filter("Crypt"));
        assert_eq!(search.active_filters(), ["Crypt".to_owned()]);
    }

    #[test]
    fn salary_is_clamped_and_snapped() {
        let mut search = JobSearch::default();
        assert_eq!(search.salary_label(), "$200K");
        assert_eq!(search.salary_fill_percent(), 50.0);

        assert_eq!(search.set_salary(10), SALARY_MIN);
        assert_eq!(search.salary_fill_percent(), 0.0);
        assert_eq!(search.set_salary(1_000_000), SALARY_MAX);
        assert_eq!(search.set_salary(154_499), 154_000);
        assert_eq!(search.set_salary(154_500), 155_000);
        assert_eq!(search.salary_label(), "$155K");
    }
}
