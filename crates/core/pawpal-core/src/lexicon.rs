//! Keyword lexicon
//!
//! Intent classification, positive-affect detection and tool triggering are
//! all table lookups over lower-cased substrings. The tables are data: the
//! built-in [`Lexicon::default`] mirrors the stock Chinese/English vocabulary,
//! and a localized table can be loaded from JSON.

use crate::{PawpalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Coarse category of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// Hello and friends
    Greeting,
    /// Petting, hugging
    PhysicalInteraction,
    /// Expressions of affection or joy
    Emotional,
    /// Goodbyes
    Farewell,
    /// Anything else
    General,
}

impl IntentCategory {
    /// Stable snake_case tag
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Greeting => "greeting",
            IntentCategory::PhysicalInteraction => "physical_interaction",
            IntentCategory::Emotional => "emotional",
            IntentCategory::Farewell => "farewell",
            IntentCategory::General => "general",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword group that fires a capability during a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTrigger {
    /// Asks for the time
    Time,
    /// Asks about the weather
    Weather,
    /// Asks how the pet is doing
    Health,
    /// Asks about reminders
    Reminders,
    /// Feeds the pet
    Feeding,
    /// Plays with the pet
    Play,
}

impl ToolTrigger {
    /// Capability invoked for this group
    pub fn capability(&self) -> &'static str {
        match self {
            ToolTrigger::Time => "get_time",
            ToolTrigger::Weather => "get_weather",
            ToolTrigger::Health => "get_health",
            ToolTrigger::Reminders => "get_reminders",
            ToolTrigger::Feeding => "feed_pet",
            ToolTrigger::Play => "play_with_pet",
        }
    }
}

/// A tag and the substrings that select it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule<T> {
    /// What a match resolves to
    pub tag: T,
    /// Substrings, any of which matches
    pub keywords: Vec<String>,
}

impl<T> KeywordRule<T> {
    /// Create a rule
    pub fn new(tag: T, keywords: &[&str]) -> Self {
        Self {
            tag,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Whether any keyword occurs in already lower-cased `text`
    fn matches(&self, text: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(&k.to_lowercase()))
    }
}

/// All keyword tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    /// Intent rules in priority order; first match wins
    pub intents: Vec<KeywordRule<IntentCategory>>,

    /// Fine-grained intent tags in priority order
    pub user_intents: Vec<KeywordRule<String>>,

    /// Tag used when no fine-grained rule matches
    pub default_user_intent: String,

    /// Positive-affect keywords used by the mood update
    pub positive: Vec<String>,

    /// Tool trigger groups; keyword sets must be disjoint
    pub tool_triggers: Vec<KeywordRule<ToolTrigger>>,

    /// City names recognised in weather requests
    pub cities: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            intents: vec![
                KeywordRule::new(IntentCategory::Greeting, &["你好", "hello", "hi", "嗨"]),
                KeywordRule::new(
                    IntentCategory::PhysicalInteraction,
                    &["摸摸", "抱抱", "摸摸头"],
                ),
                KeywordRule::new(IntentCategory::Emotional, &["开心", "高兴", "喜欢", "爱"]),
                KeywordRule::new(IntentCategory::Farewell, &["再见", "拜拜", "走了"]),
            ],
            user_intents: vec![
                KeywordRule::new("want_physical_contact".to_string(), &["摸摸"]),
                KeywordRule::new("want_hug".to_string(), &["抱抱"]),
                KeywordRule::new("check_mood".to_string(), &["开心", "高兴"]),
                KeywordRule::new("saying_goodbye".to_string(), &["再见", "拜拜"]),
            ],
            default_user_intent: "general_chat".to_string(),
            positive: ["摸摸", "抱抱", "喜欢", "爱", "好"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tool_triggers: vec![
                KeywordRule::new(ToolTrigger::Time, &["几点", "时间", "what time"]),
                KeywordRule::new(ToolTrigger::Weather, &["天气", "weather"]),
                KeywordRule::new(ToolTrigger::Health, &["健康", "状态", "health"]),
                KeywordRule::new(ToolTrigger::Reminders, &["提醒", "reminder"]),
                KeywordRule::new(ToolTrigger::Feeding, &["饿", "吃", "喂", "feed", "hungry"]),
                KeywordRule::new(ToolTrigger::Play, &["玩", "play"]),
            ],
            cities: ["北京", "上海", "深圳", "杭州"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Lexicon {
    /// Parse and validate a JSON lexicon
    pub fn from_json_str(json: &str) -> Result<Self> {
        let lexicon: Lexicon = serde_json::from_str(json)?;
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// Load and validate a JSON lexicon file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Tool groups must not share keywords, or one phrase would fire two tools
    /// for the same reason.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.tool_triggers {
            for keyword in &rule.keywords {
                if !seen.insert(keyword.to_lowercase()) {
                    return Err(PawpalError::config(format!(
                        "tool trigger keyword '{}' appears in more than one group",
                        keyword
                    )));
                }
            }
        }
        if self.default_user_intent.trim().is_empty() {
            return Err(PawpalError::config("default_user_intent must not be empty"));
        }
        Ok(())
    }

    /// Intent of `text`; first matching rule wins, else `General`
    pub fn classify_intent(&self, text: &str) -> IntentCategory {
        let text = text.to_lowercase();
        self.intents
            .iter()
            .find(|rule| rule.matches(&text))
            .map(|rule| rule.tag)
            .unwrap_or(IntentCategory::General)
    }

    /// Fine-grained intent tag of `text`
    pub fn classify_user_intent(&self, text: &str) -> &str {
        let text = text.to_lowercase();
        self.user_intents
            .iter()
            .find(|rule| rule.matches(&text))
            .map(|rule| rule.tag.as_str())
            .unwrap_or(self.default_user_intent.as_str())
    }

    /// Whether `text` contains any positive-affect keyword
    pub fn is_positive(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.positive
            .iter()
            .any(|k| !k.is_empty() && text.contains(&k.to_lowercase()))
    }

    /// Every tool group whose keywords occur in `text`, in table order
    pub fn matching_tools(&self, text: &str) -> Vec<ToolTrigger> {
        let text = text.to_lowercase();
        self.tool_triggers
            .iter()
            .filter(|rule| rule.matches(&text))
            .map(|rule| rule.tag)
            .collect()
    }

    /// First known city named in `text`
    pub fn find_city(&self, text: &str) -> Option<&str> {
        self.cities
            .iter()
            .find(|city| text.contains(city.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_priority_order() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.classify_intent("你好"), IntentCategory::Greeting);
        // greeting outranks physical interaction
        assert_eq!(lexicon.classify_intent("你好，摸摸"), IntentCategory::Greeting);
        assert_eq!(lexicon.classify_intent("摸摸头"), IntentCategory::PhysicalInteraction);
        assert_eq!(lexicon.classify_intent("好开心"), IntentCategory::Emotional);
        assert_eq!(lexicon.classify_intent("我走了"), IntentCategory::Farewell);
        assert_eq!(lexicon.classify_intent("今天下雨"), IntentCategory::General);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.classify_intent("HELLO there"), IntentCategory::Greeting);
        assert_eq!(lexicon.matching_tools("What Time is it"), vec![ToolTrigger::Time]);
    }

    #[test]
    fn test_user_intent() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.classify_user_intent("摸摸我"), "want_physical_contact");
        assert_eq!(lexicon.classify_user_intent("抱抱"), "want_hug");
        assert_eq!(lexicon.classify_user_intent("你高兴吗"), "check_mood");
        assert_eq!(lexicon.classify_user_intent("拜拜"), "saying_goodbye");
        assert_eq!(lexicon.classify_user_intent("随便聊聊"), "general_chat");
    }

    #[test]
    fn test_positive_keywords() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_positive("我喜欢你"));
        assert!(lexicon.is_positive("你好"));
        assert!(!lexicon.is_positive("下雨了"));
    }

    #[test]
    fn test_multiple_tool_groups() {
        let lexicon = Lexicon::default();
        let tools = lexicon.matching_tools("我饿了，现在几点？想玩一会儿");
        assert_eq!(
            tools,
            vec![ToolTrigger::Time, ToolTrigger::Feeding, ToolTrigger::Play]
        );
        assert!(lexicon.matching_tools("随便聊聊").is_empty());
    }

    #[test]
    fn test_default_tables_are_disjoint() {
        assert!(Lexicon::default().validate().is_ok());
    }

    #[test]
    fn test_overlapping_tool_groups_rejected() {
        let mut lexicon = Lexicon::default();
        lexicon.tool_triggers.push(KeywordRule::new(ToolTrigger::Play, &["天气"]));
        assert!(matches!(lexicon.validate(), Err(PawpalError::Config(_))));
    }

    #[test]
    fn test_json_round_trip_and_file_load() {
        let json = serde_json::to_string(&Lexicon::default()).unwrap();
        let parsed = Lexicon::from_json_str(&json).unwrap();
        assert_eq!(parsed, Lexicon::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, json).unwrap();
        assert_eq!(Lexicon::from_path(&path).unwrap(), Lexicon::default());
    }

    #[test]
    fn test_find_city() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.find_city("上海天气怎么样"), Some("上海"));
        assert_eq!(lexicon.find_city("天气怎么样"), None);
    }
}
