//! Summarization prompt and the parser for its sectioned reply.

use std::str::FromStr;

use paperwatch_common::{ApplicationArea, ProductionReadiness, Record, Summary, TechnicalDifficulty};

pub const SYSTEM_PROMPT: &str = "You are an expert AI/ML researcher and product manager who \
specializes in summarizing technical research papers for a product management audience. You \
provide concise, actionable summaries that highlight practical applications and production readiness.";

/// Placeholder for a text section the model left empty.
pub const MISSING_SECTION: &str = "Summary not available.";

const SYNOPSIS: &str = "CONCISE SUMMARY:";
const CONTRIBUTION: &str = "MAIN CONTRIBUTION:";
const METHODOLOGY: &str = "METHODOLOGY:";
const RESULTS: &str = "RESULTS:";
const RELEVANCE: &str = "PRODUCT RELEVANCE:";
const AREA: &str = "APPLICATION AREA:";
const DIFFICULTY: &str = "TECHNICAL DIFFICULTY:";
const READINESS: &str = "PRODUCTION READINESS:";

/// Build the user message for one record.
pub fn build_prompt(record: &Record) -> String {
    let categories = if record.categories.is_empty() {
        "Not specified".to_string()
    } else {
        record.categories.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    format!(
        "Analyze and summarize the following research paper for a product management audience:

Title: {title}

Authors: {authors}

Abstract: {abstract_text}

Categories: {categories}

Please provide a comprehensive analysis in the following format:

{SYNOPSIS}
[Write a 2-3 paragraph summary that explains what the paper is about, its significance, and potential impact.
Make it accessible to someone with general tech knowledge but not deep ML expertise.]

{CONTRIBUTION}
[One paragraph describing the key innovation or contribution of this paper]

{METHODOLOGY}
[One paragraph summarizing the approach/methods used in the research]

{RESULTS}
[One paragraph highlighting the key findings and performance metrics]

{RELEVANCE}
[One paragraph explaining how this could be relevant to product managers, including potential applications,
business value, and considerations for product development]

{AREA}
[Choose ONE: healthcare, finance, education, robotics, autonomous_vehicles, natural_language,
computer_vision, or general]

{DIFFICULTY}
[Choose ONE: beginner, intermediate, advanced, or expert - based on the complexity of implementation]

{READINESS}
[Choose ONE: theoretical, experimental, prototype, or production_ready - based on how ready this is
for real-world deployment]

Make sure to use clear section headers exactly as shown above.",
        title = record.title,
        authors = record.authors.join(", "),
        abstract_text = record.abstract_text,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Synopsis,
    Contribution,
    Methodology,
    Results,
    Relevance,
    Area,
    Difficulty,
    Readiness,
}

const HEADERS: [(&str, Section); 8] = [
    (SYNOPSIS, Section::Synopsis),
    (CONTRIBUTION, Section::Contribution),
    (METHODOLOGY, Section::Methodology),
    (RESULTS, Section::Results),
    (RELEVANCE, Section::Relevance),
    (AREA, Section::Area),
    (DIFFICULTY, Section::Difficulty),
    (READINESS, Section::Readiness),
];

/// Split a reply on its section headers. Never fails: missing text sections
/// become [`MISSING_SECTION`] and unknown categorical values fall back to
/// `general` / `intermediate` / `experimental`.
pub fn parse_summary_response(record_id: &str, reply: &str) -> Summary {
    let mut text: [String; 5] = Default::default();
    let mut area: Option<ApplicationArea> = None;
    let mut difficulty: Option<TechnicalDifficulty> = None;
    let mut readiness: Option<ProductionReadiness> = None;
    let mut current: Option<Section> = None;

    for raw in reply.lines() {
        // Tolerate markdown emphasis around headers ("**RESULTS:**", "## RESULTS:")
        let line = raw.trim().trim_start_matches(['#', '*']).trim();

        let mut body = line;
        if let Some((header, section)) = HEADERS.iter().find(|(h, _)| line.starts_with(h)) {
            current = Some(*section);
            body = line[header.len()..].trim_matches(['*', ' ']);
        }

        let Some(section) = current else { continue };
        if body.is_empty() {
            continue;
        }

        match section {
            Section::Area => {
                if area.is_none() {
                    area = parse_choice(body);
                }
            }
            Section::Difficulty => {
                if difficulty.is_none() {
                    difficulty = parse_choice(body);
                }
            }
            Section::Readiness => {
                if readiness.is_none() {
                    readiness = parse_choice(body);
                }
            }
            text_section => {
                let slot = &mut text[text_section as usize];
                if !slot.is_empty() {
                    slot.push(' ');
                }
                slot.push_str(body);
            }
        }
    }

    let [synopsis, main_contribution, methodology, results, relevance] =
        text.map(|s| if s.is_empty() { MISSING_SECTION.to_string() } else { s });

    Summary {
        record_id: record_id.to_string(),
        synopsis,
        main_contribution,
        methodology,
        results,
        relevance,
        application_area: area.unwrap_or(ApplicationArea::General),
        technical_difficulty: difficulty.unwrap_or(TechnicalDifficulty::Intermediate),
        production_readiness: readiness.unwrap_or(ProductionReadiness::Experimental),
    }
}

/// Normalise "Production Ready." or "[autonomous vehicles]" to a snake_case variant.
fn parse_choice<T: FromStr>(raw: &str) -> Option<T> {
    let value = raw
        .trim_matches(|c: char| c == '[' || c == ']' || c == '.' || c == '*' || c.is_whitespace())
        .to_lowercase()
        .replace([' ', '-'], "_");
    value.parse().ok()
}
