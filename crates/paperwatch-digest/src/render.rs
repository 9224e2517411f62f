//! Digest renderers. Each one is a pure function of the [`Digest`].

use std::fmt;
use std::str::FromStr;

use html_escape::{encode_double_quoted_attribute, encode_text};
use paperwatch_common::{Digest, Record, Summary};
use serde::{Deserialize, Serialize};

use crate::wrap::{wrap_text, WRAP_WIDTH};

const RULE_WIDTH: usize = 80;
const TEXT_AUTHORS: usize = 3;
const HTML_AUTHORS: usize = 5;
pub const EMPTY_NOTICE: &str = "No records found for this period.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFormat {
    Json,
    Text,
    Html,
}

impl DigestFormat {
    pub const ALL: [DigestFormat; 3] = [DigestFormat::Json, DigestFormat::Text, DigestFormat::Html];

    pub fn extension(&self) -> &'static str {
        match self {
            DigestFormat::Json => "json",
            DigestFormat::Text => "txt",
            DigestFormat::Html => "html",
        }
    }
}

impl fmt::Display for DigestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DigestFormat::Json => "json",
            DigestFormat::Text => "text",
            DigestFormat::Html => "html",
        })
    }
}

impl FromStr for DigestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(DigestFormat::Json),
            "text" | "txt" => Ok(DigestFormat::Text),
            "html" => Ok(DigestFormat::Html),
            other => Err(format!("unknown digest format: {other}")),
        }
    }
}

pub fn render(digest: &Digest, format: DigestFormat) -> Result<String, serde_json::Error> {
    match format {
        DigestFormat::Json => render_json(digest),
        DigestFormat::Text => Ok(render_text(digest)),
        DigestFormat::Html => Ok(render_html(digest)),
    }
}

/// Field-for-field JSON mirror of the digest.
pub fn render_json(digest: &Digest) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(digest)
}

// ── Text ──────────────────────────────────────────────────────────────────────

pub fn render_text(digest: &Digest) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let hash = "#".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(heavy.clone());
    lines.push("RESEARCH PAPER DIGEST".into());
    lines.push(heavy.clone());
    lines.push(format!(
        "Period: {} to {}",
        digest.window.start.format("%Y-%m-%d"),
        digest.window.end.format("%Y-%m-%d")
    ));
    lines.push(format!("Total records reviewed: {}", digest.total_reviewed));
    lines.push(format!("Top records: {}", digest.records.len()));
    lines.push(heavy.clone());
    lines.push(String::new());

    if digest.is_empty() {
        lines.push(EMPTY_NOTICE.into());
        lines.push(String::new());
    }

    for (i, rec) in digest.records.iter().enumerate() {
        lines.push(hash.clone());
        lines.push(format!("#{:2}. {}", i + 1, rec.title));
        lines.push(hash.clone());
        lines.push(String::new());

        if rec.authors.is_empty() {
            lines.push("Authors: unknown".into());
        } else {
            let shown = &rec.authors[..rec.authors.len().min(TEXT_AUTHORS)];
            lines.push(format!("Authors: {}", shown.join(", ")));
            if rec.authors.len() > TEXT_AUTHORS {
                lines.push(format!("         (and {} others)", rec.authors.len() - TEXT_AUTHORS));
            }
        }
        lines.push(String::new());

        lines.push(format!("Published: {}", rec.published_at.format("%Y-%m-%d")));
        lines.push(format!("Source: {}", rec.source));
        lines.push(format!("Engagement: {}", rec.engagement));
        lines.push(format!("URL: {}", rec.url));
        if let Some(pdf) = &rec.pdf_url {
            lines.push(format!("PDF: {pdf}"));
        }
        lines.push(String::new());

        match digest.summary_for(rec) {
            Some(summary) => push_summary(&mut lines, summary),
            None => {
                lines.push("ABSTRACT:".into());
                lines.push(wrap_text(&rec.abstract_text, WRAP_WIDTH));
            }
        }
        lines.push(String::new());
    }

    lines.push(heavy.clone());
    lines.push("End of Digest".into());
    lines.push(heavy);
    lines.join("\n")
}

fn push_summary(lines: &mut Vec<String>, summary: &Summary) {
    let sections = [
        ("SUMMARY:", &summary.synopsis),
        ("Main Contribution:", &summary.main_contribution),
        ("Methodology:", &summary.methodology),
        ("Key Results:", &summary.results),
        ("Product Relevance:", &summary.relevance),
    ];
    for (label, body) in sections {
        lines.push(label.into());
        lines.push(wrap_text(body, WRAP_WIDTH));
        lines.push(String::new());
    }
    lines.push(format!("Application Area: {}", summary.application_area.as_str()));
    lines.push(format!("Technical Difficulty: {}", summary.technical_difficulty.as_str()));
    lines.push(format!("Production Readiness: {}", summary.production_readiness.as_str()));
}

// ── HTML ──────────────────────────────────────────────────────────────────────

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
h2 { color: #34495e; margin-top: 30px; }
.record { background: #f8f9fa; border-left: 4px solid #3498db; padding: 15px; margin: 20px 0; }
.metadata { color: #7f8c8d; font-size: 0.9em; }
.section { margin: 15px 0; }
.label { font-weight: bold; color: #2c3e50; }
.tag { display: inline-block; background: #ecf0f1; padding: 5px 10px; margin: 2px; border-radius: 3px; font-size: 0.85em; }
.notice { font-style: italic; color: #7f8c8d; }";

/// Self-contained HTML page. Every record-supplied string is escaped.
pub fn render_html(digest: &Digest) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Research Paper Digest</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");

    html.push_str("<h1>Research Paper Digest</h1>\n");
    html.push_str(&format!(
        "<p class=\"metadata\">Period: {} to {}<br>Total records reviewed: {}<br>Top records: {}</p>\n",
        digest.window.start.format("%Y-%m-%d"),
        digest.window.end.format("%Y-%m-%d"),
        digest.total_reviewed,
        digest.records.len()
    ));

    if digest.is_empty() {
        html.push_str(&format!("<p class=\"notice\">{EMPTY_NOTICE}</p>\n"));
    }
    for (i, rec) in digest.records.iter().enumerate() {
        html.push_str(&record_block(i + 1, rec, digest.summary_for(rec)));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn record_block(rank: usize, rec: &Record, summary: Option<&Summary>) -> String {
    let mut out = String::from("<div class=\"record\">\n");
    out.push_str(&format!("<h2>{}. {}</h2>\n", rank, encode_text(&rec.title)));

    let mut authors = rec.authors[..rec.authors.len().min(HTML_AUTHORS)].join(", ");
    if rec.authors.len() > HTML_AUTHORS {
        authors.push_str(" et al.");
    }
    out.push_str(&format!(
        "<p class=\"metadata\"><strong>Authors:</strong> {}<br>\
         <strong>Published:</strong> {} | <strong>Source:</strong> {} | <strong>Engagement:</strong> {}<br>\
         <strong>URL:</strong> <a href=\"{}\">{}</a></p>\n",
        encode_text(&authors),
        rec.published_at.format("%Y-%m-%d"),
        rec.source,
        rec.engagement,
        encode_double_quoted_attribute(&rec.url),
        encode_text(&rec.url),
    ));

    match summary {
        Some(s) => {
            for (label, body) in [
                ("Summary", &s.synopsis),
                ("Main Contribution", &s.main_contribution),
                ("Product Relevance", &s.relevance),
            ] {
                out.push_str(&format!(
                    "<div class=\"section\"><p><span class=\"label\">{label}:</span> {}</p></div>\n",
                    encode_text(body)
                ));
            }
            out.push_str(&format!(
                "<div><span class=\"tag\">{}</span><span class=\"tag\">{}</span><span class=\"tag\">{}</span></div>\n",
                s.application_area.as_str(),
                s.technical_difficulty.as_str(),
                s.production_readiness.as_str(),
            ));
        }
        None => out.push_str(&format!(
            "<div class=\"section\"><p><span class=\"label\">Abstract:</span> {}</p></div>\n",
            encode_text(&rec.abstract_text)
        )),
    }

    out.push_str("</div>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use paperwatch_common::{
        ApplicationArea, ProductionReadiness, SourceTag, TechnicalDifficulty, TimeWindow,
    };
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap(),
        )
    }

    fn record(id: &str, title: &str) -> Record {
        let mut r = Record::new(id, title, SourceTag::Arxiv, Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap());
        r.url = format!("https://arxiv.org/abs/{id}");
        r
    }

    fn summary(record_id: &str) -> Summary {
        Summary {
            record_id: record_id.into(),
            synopsis: "Short synopsis.".into(),
            main_contribution: "A new method.".into(),
            methodology: "Experiments.".into(),
            results: "It works.".into(),
            relevance: "Useful for search.".into(),
            application_area: ApplicationArea::NaturalLanguage,
            technical_difficulty: TechnicalDifficulty::Advanced,
            production_readiness: ProductionReadiness::Prototype,
        }
    }

    fn digest(records: Vec<Record>, summaries: Vec<Summary>) -> Digest {
        Digest {
            window: window(),
            total_reviewed: records.len() + 5,
            records,
            summaries: summaries.into_iter().map(|s| (s.record_id.clone(), s)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_format_names_and_extensions() {
        assert_eq!("TXT".parse::<DigestFormat>().unwrap(), DigestFormat::Text);
        assert_eq!(DigestFormat::Text.extension(), "txt");
        assert!("csv".parse::<DigestFormat>().is_err());
        assert_eq!(serde_json::to_string(&DigestFormat::Html).unwrap(), "\"html\"");
    }

    #[test]
    fn test_json_mirrors_digest() {
        let d = digest(vec![record("arxiv_1", "One")], vec![summary("arxiv_1")]);
        let json = render_json(&d).unwrap();
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_text_header_and_summary_sections() {
        let mut rec = record("arxiv_1", "Sparse Attention");
        rec.authors = vec!["A".into(), "B".into(), "C".into(), "D".into(), "E".into()];
        let text = render_text(&digest(vec![rec], vec![summary("arxiv_1")]));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(80));
        assert!(text.contains("Period: 2026-03-01 to 2026-03-08"));
        assert!(text.contains("Total records reviewed: 6"));
        assert!(text.contains("# 1. Sparse Attention"));
        assert!(text.contains("Authors: A, B, C\n         (and 2 others)"));
        assert!(text.contains("SUMMARY:\nShort synopsis."));
        assert!(text.contains("Production Readiness: prototype"));
        assert!(!text.contains("ABSTRACT:"));
    }

    #[test]
    fn test_text_wraps_long_abstract_without_summary() {
        let mut rec = record("arxiv_2", "Long Abstract");
        let sentence = "Transformers scale predictably with compute, data and parameters. ";
        rec.abstract_text = sentence.repeat(9);
        assert!(rec.abstract_text.len() > 500);

        let text = render_text(&digest(vec![rec.clone()], vec![]));
        let body: Vec<&str> = text
            .lines()
            .skip_while(|l| *l != "ABSTRACT:")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .collect();

        assert!(body.len() > 1);
        assert!(body.iter().all(|l| l.chars().count() <= 78), "{body:#?}");
        // No word is broken across lines
        let rejoined = body.join(" ");
        assert_eq!(rejoined, rec.abstract_text.trim_end());
    }

    #[test]
    fn test_empty_digest_says_so() {
        let d = digest(vec![], vec![]);
        assert!(render_text(&d).contains(EMPTY_NOTICE));
        let html = render_html(&d);
        assert!(html.contains("<p class=\"notice\">No records found for this period.</p>"));
        assert!(!html.contains("class=\"record\""));
    }

    #[test]
    fn test_html_one_block_per_record_and_escaped() {
        let mut evil = record("arxiv_3", "<script>alert(1)</script> & friends");
        evil.url = "https://arxiv.org/abs/3?a=\"x\"".into();
        let d = digest(vec![evil, record("arxiv_4", "Plain")], vec![summary("arxiv_4")]);
        let html = render_html(&d);

        assert_eq!(html.matches("<div class=\"record\">").count(), 2);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; friends"));
        assert!(html.contains("href=\"https://arxiv.org/abs/3?a=&quot;x&quot;\""));
        assert!(html.contains("<span class=\"tag\">natural_language</span>"));
    }
}
