//! Selection criteria shared by the fetch and search paths.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Record, SourceTag};

/// Logical research topic. Each maps to a small fixed set of arXiv category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Llms,
    ComputerVision,
    ReinforcementLearning,
    AiSafety,
    Nlp,
    GenerativeAi,
    Multimodal,
    Other,
}

impl Topic {
    pub fn arxiv_categories(&self) -> &'static [&'static str] {
        match self {
            Topic::Llms                  => &["cs.CL", "cs.LG"],
            Topic::ComputerVision        => &["cs.CV"],
            Topic::ReinforcementLearning => &["cs.LG", "cs.AI"],
            Topic::AiSafety              => &["cs.AI", "cs.CY"],
            Topic::Nlp                   => &["cs.CL"],
            Topic::GenerativeAi          => &["cs.LG", "cs.AI"],
            Topic::Multimodal            => &["cs.CV", "cs.CL"],
            Topic::Other                 => &[],
        }
    }
}

/// Categories searched when no topic maps to anything.
pub const DEFAULT_ARXIV_CATEGORIES: [&str; 3] = ["cs.AI", "cs.LG", "cs.CL"];

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days ending at `end`.
    pub fn trailing_days(days: u32, end: DateTime<Utc>) -> Self {
        Self { start: end - Duration::days(i64::from(days)), end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Query/selection criteria for fetching and searching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFilter {
    /// Lookback window in days; resolved to absolute bounds at evaluation time.
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub min_engagement: u64,
    /// Empty means every registered source.
    #[serde(default)]
    pub sources: Vec<SourceTag>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_days_back() -> u32 { 30 }

impl Default for FetchFilter {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            topics: Vec::new(),
            min_engagement: 0,
            sources: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

impl FetchFilter {
    pub fn days(days_back: u32) -> Self {
        Self { days_back, ..Self::default() }
    }

    /// Resolve the lookback to `[now - days_back, now)`.
    pub fn window_at(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::trailing_days(self.days_back, now)
    }

    pub fn window(&self) -> TimeWindow {
        self.window_at(Utc::now())
    }

    /// arXiv category codes implied by `topics`, falling back to the broad defaults.
    pub fn arxiv_categories(&self) -> BTreeSet<&'static str> {
        let mut cats: BTreeSet<&'static str> = self
            .topics
            .iter()
            .flat_map(|t| t.arxiv_categories().iter().copied())
            .collect();
        if cats.is_empty() {
            cats.extend(DEFAULT_ARXIV_CATEGORIES);
        }
        cats
    }

    /// Whether any keyword occurs in the record's title or abstract.
    /// No keywords means everything matches.
    pub fn matches_keywords(&self, record: &Record) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let title = record.title.to_lowercase();
        let abstract_ = record.abstract_text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|kw| title.contains(&kw) || abstract_.contains(&kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_categories_when_no_topics() {
        let f = FetchFilter::default();
        let cats: Vec<_> = f.arxiv_categories().into_iter().collect();
        assert_eq!(cats, vec!["cs.AI", "cs.CL", "cs.LG"]);
    }

    #[test]
    fn test_topics_union_their_categories() {
        let f = FetchFilter {
            topics: vec![Topic::Llms, Topic::AiSafety],
            ..FetchFilter::default()
        };
        let cats: Vec<_> = f.arxiv_categories().into_iter().collect();
        assert_eq!(cats, vec!["cs.AI", "cs.CL", "cs.CY", "cs.LG"]);
    }

    #[test]
    fn test_other_topic_alone_falls_back_to_defaults() {
        let f = FetchFilter { topics: vec![Topic::Other], ..FetchFilter::default() };
        assert_eq!(f.arxiv_categories().len(), 3);
    }

    #[test]
    fn test_window_is_half_open() {
        let end = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let w = TimeWindow::trailing_days(7, end);
        assert!(w.contains(w.start));
        assert!(!w.contains(end));
        assert!(!w.contains(w.start - Duration::seconds(1)));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let mut rec = Record::new("hf_1", "Sparse Mixture of Experts", SourceTag::HuggingFace, Utc::now());
        rec.abstract_text = "We study routing.".into();
        let f = FetchFilter { keywords: vec!["ROUTING".into()], ..FetchFilter::default() };
        assert!(f.matches_keywords(&rec));
        let f = FetchFilter { keywords: vec!["diffusion".into()], ..FetchFilter::default() };
        assert!(!f.matches_keywords(&rec));
    }
}
