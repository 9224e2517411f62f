//! Behavioural tests for the record store: upsert, windows, ranking, search.

use std::sync::Arc;

use chrono::{Duration, Utc};
use paperwatch_common::{
    ApplicationArea, FetchFilter, ProductionReadiness, Record, SourceTag, Summary,
    TechnicalDifficulty, TimeWindow,
};
use paperwatch_db::{Database, RecordRepository, SummaryRepository};
use pretty_assertions::assert_eq;

fn store() -> (Arc<Database>, RecordRepository, SummaryRepository) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    (db.clone(), RecordRepository::new(db.clone()), SummaryRepository::new(db))
}

fn record(id: &str, title: &str, days_ago: i64, engagement: u64) -> Record {
    let mut rec = Record::new(id, title, SourceTag::Arxiv, Utc::now() - Duration::days(days_ago));
    rec.authors = vec!["Ada Lovelace".into(), "Alan Turing".into()];
    rec.abstract_text = format!("Abstract for {title}.");
    rec.url = format!("https://arxiv.org/abs/{id}");
    rec.engagement = engagement;
    rec
}

fn summary(record_id: &str, synopsis: &str) -> Summary {
    Summary {
        record_id: record_id.into(),
        synopsis: synopsis.into(),
        main_contribution: "A new method.".into(),
        methodology: "Experiments.".into(),
        results: "It works.".into(),
        relevance: "Useful.".into(),
        application_area: ApplicationArea::NaturalLanguage,
        technical_difficulty: TechnicalDifficulty::Advanced,
        production_readiness: ProductionReadiness::Experimental,
    }
}

#[test]
fn test_upsert_is_last_write_wins_without_new_rows() {
    let (db, records, _) = store();

    let first = record("arxiv_1", "Original title", 1, 5);
    assert!(records.save(&first).unwrap());

    let mut second = record("arxiv_1", "Replacement title", 2, 9);
    second.categories.insert("cs.CL".into());
    assert!(!records.save(&second).unwrap());

    assert_eq!(records.count().unwrap(), 1);
    assert_eq!(db.stats().unwrap().total_records, 1);
    assert_eq!(records.get("arxiv_1").unwrap(), Some(second));
}

#[test]
fn test_get_absent_id_is_none() {
    let (_, records, summaries) = store();
    assert_eq!(records.get("nope").unwrap(), None);
    assert_eq!(summaries.latest("nope").unwrap(), None);
}

#[test]
fn test_recent_and_top_respect_window() {
    let (_, records, _) = store();
    records.save(&record("arxiv_new", "Two days old", 2, 1)).unwrap();
    records.save(&record("arxiv_old", "Ten days old", 10, 99)).unwrap();

    let recent: Vec<_> = records.recent(7, 10).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(recent, vec!["arxiv_new"]);

    let top: Vec<_> = records.top(30, 10).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(top, vec!["arxiv_old", "arxiv_new"]);
}

#[test]
fn test_explicit_window_excludes_end_bound() {
    let (_, records, _) = store();
    let end = Utc::now() - Duration::days(3);
    let mut at_end = record("arxiv_end", "At end", 0, 1);
    at_end.published_at = end;
    let mut at_start = record("arxiv_start", "At start", 0, 1);
    at_start.published_at = end - Duration::days(7);
    records.save_batch(&[at_end, at_start]).unwrap();

    let window = TimeWindow::trailing_days(7, end);
    let ids: Vec<_> = records.recent_in(window, 10).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["arxiv_start"]);
}

#[test]
fn test_top_orders_by_engagement_regardless_of_insert_order() {
    let (_, records, _) = store();
    records.save(&record("arxiv_b", "Thirty", 3, 30)).unwrap();
    records.save(&record("arxiv_c", "Twenty", 1, 20)).unwrap();
    records.save(&record("arxiv_a", "Forty", 5, 40)).unwrap();

    let counts: Vec<_> = records.top(7, 3).unwrap().into_iter().map(|r| r.engagement).collect();
    assert_eq!(counts, vec![40, 30, 20]);
}

#[test]
fn test_top_ties_break_by_date_then_id() {
    let (_, records, _) = store();
    let when = Utc::now() - Duration::days(1);
    for id in ["arxiv_z", "arxiv_y"] {
        let mut r = record(id, id, 0, 10);
        r.published_at = when;
        records.save(&r).unwrap();
    }
    records.save(&record("arxiv_x", "older", 4, 10)).unwrap();

    let ids: Vec<_> = records.top(7, 10).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["arxiv_y", "arxiv_z", "arxiv_x"]);
}

#[test]
fn test_title_substring_is_searchable() {
    let (_, records, _) = store();
    records.save(&record("arxiv_1", "Attention Is All You Need", 1, 0)).unwrap();
    records.save(&record("arxiv_2", "Diffusion Models Beat GANs", 1, 0)).unwrap();

    for q in ["ttention Is All", "attention", "You Need", "Is"] {
        let ids: Vec<_> = records.search(q, None, 10, 0).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["arxiv_1"], "query {q:?}");
    }

    let by_author = records.search("Lovelace", None, 10, 0).unwrap();
    assert_eq!(by_author.len(), 2);
}

#[test]
fn test_quoted_title_text_is_searchable() {
    let (_, records, _) = store();
    records.save(&record("arxiv_1", "Say \"hello\"! world", 1, 0)).unwrap();
    records.save(&record("arxiv_2", "Say hello world", 1, 0)).unwrap();

    for q in ["hello\"!", "\"hello\"!", "Say \"hello\"! world", "o\"! wo"] {
        let ids: Vec<_> = records.search(q, None, 10, 0).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["arxiv_1"], "query {q:?}");
    }
}

#[test]
fn test_search_ties_order_by_date_then_id_across_pages() {
    let (_, records, _) = store();
    let base = Utc::now() - Duration::days(1);
    // Identical indexed text, so every match scores the same
    let at = |id: &str, hours_ago: i64| {
        let mut rec = record(id, "Mixture of experts routing", 0, 0);
        rec.published_at = base - Duration::hours(hours_ago);
        rec
    };
    for rec in [at("arxiv_e", 48), at("arxiv_d", 96), at("arxiv_b", 48), at("arxiv_a", 0), at("arxiv_c", 48)] {
        records.save(&rec).unwrap();
    }

    let all: Vec<_> = records.search("experts", None, 10, 0).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(all, vec!["arxiv_a", "arxiv_b", "arxiv_c", "arxiv_e", "arxiv_d"]);

    let mut paged = Vec::new();
    for offset in [0, 2, 4] {
        paged.extend(records.search("experts", None, 2, offset).unwrap().into_iter().map(|r| r.id));
    }
    assert_eq!(paged, all);
}

#[test]
fn test_replaced_text_is_no_longer_matchable() {
    let (_, records, _) = store();
    records.save(&record("arxiv_1", "Quantum annealing schedules", 1, 0)).unwrap();
    assert_eq!(records.search("annealing", None, 10, 0).unwrap().len(), 1);

    records.save(&record("arxiv_1", "Protein folding at scale", 1, 0)).unwrap();
    assert!(records.search("annealing", None, 10, 0).unwrap().is_empty());
    assert_eq!(records.search("folding", None, 10, 0).unwrap().len(), 1);
}

#[test]
fn test_delete_removes_row_index_entry_and_summaries() {
    let (db, records, summaries) = store();
    records.save(&record("arxiv_1", "Graph neural operators", 1, 0)).unwrap();
    summaries.save(&summary("arxiv_1", "s")).unwrap();

    assert!(records.delete("arxiv_1").unwrap());
    assert!(!records.delete("arxiv_1").unwrap());
    assert_eq!(records.get("arxiv_1").unwrap(), None);
    assert!(records.search("operators", None, 10, 0).unwrap().is_empty());
    assert_eq!(db.stats().unwrap().total_summaries, 0);
}

#[test]
fn test_search_applies_filter_and_pagination() {
    let (_, records, _) = store();
    let mut hf = record("hf_1", "Scaling laws revisited", 1, 50);
    hf.source = SourceTag::HuggingFace;
    records.save(&hf).unwrap();
    records.save(&record("arxiv_1", "Scaling laws for robots", 2, 3)).unwrap();
    records.save(&record("arxiv_2", "Scaling laws, old", 40, 80)).unwrap();

    let filter = FetchFilter { days_back: 30, ..FetchFilter::default() };
    let ids: Vec<_> = records
        .search("scaling", Some(&filter), 10, 0)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"arxiv_2".to_string()));

    let filter = FetchFilter {
        days_back: 0,
        min_engagement: 10,
        sources: vec![SourceTag::Arxiv],
        ..FetchFilter::default()
    };
    let ids: Vec<_> = records.search("", Some(&filter), 10, 0).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["arxiv_2"]);

    // Plain scan pages newest first
    let page1: Vec<_> = records.search("", None, 2, 0).unwrap().into_iter().map(|r| r.id).collect();
    let page2: Vec<_> = records.search("", None, 2, 2).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(page1, vec!["hf_1", "arxiv_1"]);
    assert_eq!(page2, vec!["arxiv_2"]);
}

#[test]
fn test_latest_summary_is_most_recent_insert() {
    let (db, records, summaries) = store();
    records.save(&record("arxiv_1", "Some paper", 1, 0)).unwrap();
    summaries.save(&summary("arxiv_1", "first")).unwrap();
    summaries.save(&summary("arxiv_1", "second")).unwrap();

    assert_eq!(summaries.latest("arxiv_1").unwrap().unwrap().synopsis, "second");
    assert_eq!(summaries.count().unwrap(), 2);
    assert_eq!(db.stats().unwrap().total_summaries, 2);
}

#[test]
fn test_summary_for_unknown_record_is_a_store_error() {
    let (_, _, summaries) = store();
    assert!(summaries.save(&summary("missing", "x")).is_err());
}

#[test]
fn test_stats_group_by_source() {
    let (db, records, _) = store();
    let mut pwc = record("pwc_1", "Code paper", 1, 0);
    pwc.source = SourceTag::PapersWithCode;
    records.save_batch(&[record("arxiv_1", "A", 1, 0), record("arxiv_2", "B", 1, 0), pwc]).unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.records_by_source.get(&SourceTag::Arxiv), Some(&2));
    assert_eq!(stats.records_by_source.get(&SourceTag::PapersWithCode), Some(&1));
    assert_eq!(stats.records_by_source.get(&SourceTag::HuggingFace), None);
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("papers.db");
    {
        let db = Arc::new(Database::open(&path).unwrap());
        RecordRepository::new(db).save(&record("arxiv_1", "Persistent", 1, 0)).unwrap();
    }
    let db = Arc::new(Database::open(&path).unwrap());
    let records = RecordRepository::new(db);
    assert_eq!(records.get("arxiv_1").unwrap().unwrap().title, "Persistent");
    assert_eq!(records.search("Persistent", None, 5, 0).unwrap().len(), 1);
}
