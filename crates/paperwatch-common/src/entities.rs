//! Core entity types shared by the fetchers, the store and the digest.
//! Storage rows in paperwatch-db decode into exactly these shapes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ---------------------------------------------------------------------------
// Source tag
// ---------------------------------------------------------------------------

/// Upstream a record was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Arxiv,
    PapersWithCode,
    HuggingFace,
}

impl SourceTag {
    /// Every registered source, in default fetch order.
    pub const ALL: [SourceTag; 3] = [
        SourceTag::Arxiv,
        SourceTag::PapersWithCode,
        SourceTag::HuggingFace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Arxiv          => "arxiv",
            SourceTag::PapersWithCode => "papers_with_code",
            SourceTag::HuggingFace    => "hugging_face",
        }
    }

    /// Prefix applied to upstream-local identifiers so two sources that
    /// happen to share a numbering scheme never collide in the store.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            SourceTag::Arxiv          => "arxiv_",
            SourceTag::PapersWithCode => "pwc_",
            SourceTag::HuggingFace    => "hf_",
        }
    }

    /// Build the store key for an upstream-local identifier.
    pub fn qualify(&self, local_id: &str) -> String {
        format!("{}{}", self.id_prefix(), local_id.trim())
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arxiv"            => Ok(SourceTag::Arxiv),
            "papers_with_code" => Ok(SourceTag::PapersWithCode),
            "hugging_face"     => Ok(SourceTag::HuggingFace),
            other => Err(CommonError::UnknownVariant { kind: "source", value: other.to_string() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single publication reference, normalised from any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source-qualified key, e.g. `arxiv_2401.00001` or `hf_2401.00001`.
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published_at: DateTime<Utc>,
    pub source: SourceTag,
    pub url: String,
    pub pdf_url: Option<String>,
    /// Citation count, upvotes, … depending on `source`.
    pub engagement: u64,
    pub categories: BTreeSet<String>,

    // Populated by downstream enrichment only.
    pub key_findings: Option<String>,
    pub methodology: Option<String>,
    pub practical_applications: Option<String>,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source: SourceTag,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            published_at,
            source,
            url: String::new(),
            pdf_url: None,
            engagement: 0,
            categories: BTreeSet::new(),
            key_findings: None,
            methodology: None,
            practical_applications: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary categorisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationArea {
    Healthcare,
    Finance,
    Education,
    Robotics,
    AutonomousVehicles,
    NaturalLanguage,
    ComputerVision,
    General,
}

impl ApplicationArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationArea::Healthcare         => "healthcare",
            ApplicationArea::Finance            => "finance",
            ApplicationArea::Education          => "education",
            ApplicationArea::Robotics           => "robotics",
            ApplicationArea::AutonomousVehicles => "autonomous_vehicles",
            ApplicationArea::NaturalLanguage    => "natural_language",
            ApplicationArea::ComputerVision     => "computer_vision",
            ApplicationArea::General            => "general",
        }
    }
}

impl FromStr for ApplicationArea {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthcare"          => Ok(ApplicationArea::Healthcare),
            "finance"             => Ok(ApplicationArea::Finance),
            "education"           => Ok(ApplicationArea::Education),
            "robotics"            => Ok(ApplicationArea::Robotics),
            "autonomous_vehicles" => Ok(ApplicationArea::AutonomousVehicles),
            "natural_language"    => Ok(ApplicationArea::NaturalLanguage),
            "computer_vision"     => Ok(ApplicationArea::ComputerVision),
            "general"             => Ok(ApplicationArea::General),
            other => Err(CommonError::UnknownVariant { kind: "application area", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalDifficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl TechnicalDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalDifficulty::Beginner     => "beginner",
            TechnicalDifficulty::Intermediate => "intermediate",
            TechnicalDifficulty::Advanced     => "advanced",
            TechnicalDifficulty::Expert       => "expert",
        }
    }
}

impl FromStr for TechnicalDifficulty {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner"     => Ok(TechnicalDifficulty::Beginner),
            "intermediate" => Ok(TechnicalDifficulty::Intermediate),
            "advanced"     => Ok(TechnicalDifficulty::Advanced),
            "expert"       => Ok(TechnicalDifficulty::Expert),
            other => Err(CommonError::UnknownVariant { kind: "technical difficulty", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionReadiness {
    Theoretical,
    Experimental,
    Prototype,
    ProductionReady,
}

impl ProductionReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionReadiness::Theoretical     => "theoretical",
            ProductionReadiness::Experimental    => "experimental",
            ProductionReadiness::Prototype       => "prototype",
            ProductionReadiness::ProductionReady => "production_ready",
        }
    }
}

impl FromStr for ProductionReadiness {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "theoretical"      => Ok(ProductionReadiness::Theoretical),
            "experimental"     => Ok(ProductionReadiness::Experimental),
            "prototype"        => Ok(ProductionReadiness::Prototype),
            "production_ready" => Ok(ProductionReadiness::ProductionReady),
            other => Err(CommonError::UnknownVariant { kind: "production readiness", value: other.to_string() }),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Structured annotation of one record. Summaries are append-only; the
/// most recently stored one for a record id is its current summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub record_id: String,
    pub synopsis: String,
    pub main_contribution: String,
    pub methodology: String,
    pub results: String,
    pub relevance: String,
    pub application_area: ApplicationArea,
    pub technical_difficulty: TechnicalDifficulty,
    pub production_readiness: ProductionReadiness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tag_round_trips_through_str() {
        for tag in SourceTag::ALL {
            assert_eq!(tag.as_str().parse::<SourceTag>().unwrap(), tag);
        }
        assert!("google_scholar".parse::<SourceTag>().is_err());
    }

    #[test]
    fn test_qualify_prefixes_local_id() {
        assert_eq!(SourceTag::Arxiv.qualify("2401.00001"), "arxiv_2401.00001");
        assert_eq!(SourceTag::PapersWithCode.qualify(" 42 "), "pwc_42");
        assert_eq!(SourceTag::HuggingFace.qualify("2401.00001"), "hf_2401.00001");
    }

    #[test]
    fn test_enums_serialize_snake_case() {
        let json = serde_json::to_string(&ProductionReadiness::ProductionReady).unwrap();
        assert_eq!(json, "\"production_ready\"");
        let json = serde_json::to_string(&ApplicationArea::AutonomousVehicles).unwrap();
        assert_eq!(json, "\"autonomous_vehicles\"");
        assert_eq!(
            "natural_language".parse::<ApplicationArea>().unwrap(),
            ApplicationArea::NaturalLanguage
        );
    }

    #[test]
    fn test_record_serializes_abstract_field_name() {
        let rec = Record::new("arxiv_1", "T", SourceTag::Arxiv, Utc::now());
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("abstract").is_some());
        assert_eq!(v["source"], "arxiv");
    }
}
