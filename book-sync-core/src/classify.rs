//! Buckets code samples by framework using ordered filename rules.
//!
//! Rules are evaluated top to bottom against the lowercased filename and the
//! first match wins, so the order of the rule list is the priority. A sample
//! matching no rule falls back to the configured default category.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Framework bucket a code sample is listed under.
///
/// Declaration order is the order categories appear in a rendered appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Langchain,
    Crewai,
    GoogleAdk,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Langchain, Category::Crewai, Category::GoogleAdk];

    pub fn heading(self) -> &'static str {
        match self {
            Category::Langchain => "LangChain Implementation",
            Category::Crewai => "CrewAI Implementation",
            Category::GoogleAdk => "Google ADK Implementation",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Langchain => "langchain",
            Category::Crewai => "crewai",
            Category::GoogleAdk => "google_adk",
        }
    }
}

/// One `(substring, category)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassificationRule {
    pub contains: String,
    pub category: Category,
}

impl ClassificationRule {
    pub fn new(contains: &str, category: Category) -> Self {
        Self {
            contains: contains.to_lowercase(),
            category,
        }
    }

    /// `filename_lower` must already be lowercased.
    pub fn matches(&self, filename_lower: &str) -> bool {
        filename_lower.contains(&self.contains.to_lowercase())
    }

    /// crewai is checked before the google/adk markers, langchain last.
    pub fn defaults() -> Vec<ClassificationRule> {
        vec![
            ClassificationRule::new("crewai", Category::Crewai),
            ClassificationRule::new("google", Category::GoogleAdk),
            ClassificationRule::new("adk", Category::GoogleAdk),
            ClassificationRule::new("langchain", Category::Langchain),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
    default: Category,
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>, default: Category) -> Self {
        Self { rules, default }
    }

    pub fn from_config(config: &crate::config::SampleConfig) -> Self {
        Self::new(config.rules.clone(), config.default_category)
    }

    pub fn classify(&self, filename: &str) -> Category {
        let lower = filename.to_lowercase();
        let category = self
            .rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.category)
            .unwrap_or(self.default);
        debug!(filename, category = category.as_str(), "Classified code sample");
        category
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassificationRule::defaults(), Category::Langchain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crewai_marker_beats_google_marker() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify("crewai_google_adk_example.py"),
            Category::Crewai
        );
    }

    #[test]
    fn each_default_rule_in_isolation() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("CrewAI_agents.py"), Category::Crewai);
        assert_eq!(classifier.classify("google_search.py"), Category::GoogleAdk);
        assert_eq!(classifier.classify("ADK_tools.py"), Category::GoogleAdk);
        assert_eq!(classifier.classify("langchain_chain.py"), Category::Langchain);
    }

    #[test]
    fn unmatched_falls_back_to_default() {
        let classifier = Classifier::new(ClassificationRule::defaults(), Category::GoogleAdk);
        assert_eq!(classifier.classify("prompt_chaining.py"), Category::GoogleAdk);
    }

    #[test]
    fn rule_order_is_priority() {
        let classifier = Classifier::new(
            vec![
                ClassificationRule::new("google", Category::GoogleAdk),
                ClassificationRule::new("crewai", Category::Crewai),
            ],
            Category::Langchain,
        );
        assert_eq!(
            classifier.classify("crewai_google_adk_example.py"),
            Category::GoogleAdk
        );
    }

    #[test]
    fn category_order_is_fixed() {
        let mut shuffled = vec![Category::GoogleAdk, Category::Langchain, Category::Crewai];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
    }
}
