use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Name used by the GraphQL filter input.
    pub fn api_name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Classifies a label as rendered by the site ("Easy", "Med.", "HARD", ...).
    pub fn classify(text: &str) -> Option<Difficulty> {
        match text.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med." | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillTier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillTier {
    pub const ALL: [SkillTier; 4] = [
        SkillTier::Beginner,
        SkillTier::Intermediate,
        SkillTier::Advanced,
        SkillTier::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillTier::Beginner => "beginner",
            SkillTier::Intermediate => "intermediate",
            SkillTier::Advanced => "advanced",
            SkillTier::Expert => "expert",
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillTier::Beginner => "Beginner",
            SkillTier::Intermediate => "Intermediate",
            SkillTier::Advanced => "Advanced",
            SkillTier::Expert => "Expert",
        };
        f.write_str(name)
    }
}

/// A single problem as extracted from the problem list or the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub topics: BTreeSet<String>,
    pub solved: bool,
    pub premium: bool,
}

/// User preferences that decide which problems are eligible for a pick.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub hide_solved: bool,
    pub hide_premium: bool,
    pub skill_based: bool,
    pub included_topics: BTreeSet<String>,
    pub excluded_topics: BTreeSet<String>,
    /// Empty means no difficulty constraint.
    pub difficulties: BTreeSet<Difficulty>,
    pub skill_level: SkillTier,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            hide_solved: false,
            hide_premium: false,
            skill_based: true,
            included_topics: BTreeSet::new(),
            excluded_topics: BTreeSet::new(),
            difficulties: Difficulty::ALL.into_iter().collect(),
            skill_level: SkillTier::Beginner,
        }
    }
}

impl FilterConfig {
    /// Brings user-entered topic names into the same shape as extracted ones.
    pub fn normalized(mut self) -> Self {
        self.included_topics = self.included_topics.iter().map(|t| normalize_topic(t)).filter(|t| !t.is_empty()).collect();
        self.excluded_topics = self.excluded_topics.iter().map(|t| normalize_topic(t)).filter(|t| !t.is_empty()).collect();
        self
    }
}

/// Canonical topic form: lower-case words separated by single spaces. Punctuation
/// is dropped and slug separators become spaces, so `Heap (Priority Queue)`,
/// `heap-priority-queue` and `heap priority queue` all compare equal.
pub fn normalize_topic(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Inverse of [`normalize_topic`], as used in tag URLs and API filters.
pub fn topic_slug(topic: &str) -> String {
    normalize_topic(topic).replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rendered_labels() {
        assert_eq!(Difficulty::classify(" Easy "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::classify("Med."), Some(Difficulty::Medium));
        assert_eq!(Difficulty::classify("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::classify("Acceptance"), None);
        assert_eq!(Difficulty::classify(""), None);
    }

    #[test]
    fn topics_normalize_and_slug() {
        assert_eq!(normalize_topic("Dynamic-Programming"), "dynamic programming");
        assert_eq!(topic_slug("dynamic programming"), "dynamic-programming");
        assert_eq!(topic_slug(&normalize_topic("hash-table")), "hash-table");
    }

    #[test]
    fn topic_spellings_share_one_form() {
        let from_text = normalize_topic("Heap (Priority Queue)");
        let from_href = normalize_topic("heap-priority-queue");
        let typed = normalize_topic("  heap   priority queue ");
        assert_eq!(from_text, "heap priority queue");
        assert_eq!(from_href, from_text);
        assert_eq!(typed, from_text);
        assert_eq!(topic_slug("Heap (Priority Queue)"), "heap-priority-queue");
        assert_eq!(normalize_topic("Depth-First Search"), "depth first search");
    }

    #[test]
    fn punctuated_topic_setting_matches_scraped_tag() {
        let config = FilterConfig {
            skill_based: false,
            included_topics: ["Heap (Priority Queue)".to_string()].into_iter().collect(),
            ..FilterConfig::default()
        }
        .normalized();
        let scraped = Problem {
            id: "kth-largest-element-in-an-array".to_string(),
            title: "Kth Largest Element in an Array".to_string(),
            url: "https://leetcode.com/problems/kth-largest-element-in-an-array/".to_string(),
            difficulty: Difficulty::Medium,
            topics: [normalize_topic("heap-priority-queue")].into_iter().collect(),
            solved: false,
            premium: false,
        };
        assert_eq!(crate::filter::filter_problems(&[scraped], &config).len(), 1);
    }

    #[test]
    fn problem_serializes_for_json_output() {
        let problem = Problem {
            id: "two-sum".to_string(),
            title: "Two Sum".to_string(),
            url: "https://leetcode.com/problems/two-sum/".to_string(),
            difficulty: Difficulty::Easy,
            topics: ["array".to_string(), "hash table".to_string()].into_iter().collect(),
            solved: true,
            premium: false,
        };
        assert_eq!(
            serde_json::to_value(&problem).unwrap(),
            serde_json::json!({
                "id": "two-sum",
                "title": "Two Sum",
                "url": "https://leetcode.com/problems/two-sum/",
                "difficulty": "easy",
                "topics": ["array", "hash table"],
                "solved": true,
                "premium": false
            })
        );
    }

    #[test]
    fn default_config_matches_stored_defaults() {
        let config = FilterConfig::default();
        assert!(!config.hide_solved);
        assert!(!config.hide_premium);
        assert!(config.skill_based);
        assert_eq!(config.difficulties.len(), 3);
        assert_eq!(config.skill_level, SkillTier::Beginner);
    }

    #[test]
    fn config_deserializes_from_settings_shape() {
        let json = serde_json::json!({
            "hideSolved": true,
            "difficulties": ["easy", "hard"],
            "includedTopics": ["Two-Pointers"],
            "skillLevel": "advanced"
        });
        let config: FilterConfig = serde_json::from_value(json).unwrap();
        let config = config.normalized();
        assert!(config.hide_solved);
        assert!(config.skill_based, "missing keys fall back to defaults");
        assert_eq!(config.skill_level, SkillTier::Advanced);
        assert!(config.included_topics.contains("two pointers"));
        assert!(!config.difficulties.contains(&Difficulty::Medium));
    }
}
