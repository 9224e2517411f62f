//! Live fetches against the real upstreams.
//!
//! Run with: cargo test --package paperwatch-ingestion --test test_live_sources -- --ignored --nocapture

use std::time::Duration;

use paperwatch_common::{FetchFilter, Topic};
use paperwatch_ingestion::{ArxivClient, HuggingFaceClient, RateLimiter, RecordSource};

#[tokio::test]
#[ignore] // Requires network access
async fn test_arxiv_recent_llm_papers() {
    let client = ArxivClient::new(RateLimiter::new(0.33), Duration::from_secs(30))
        .unwrap()
        .with_paging(25, 25);
    let filter = FetchFilter { topics: vec![Topic::Llms], ..FetchFilter::days(7) };

    let records = client.fetch(&filter).await.expect("arXiv fetch failed");
    println!("Found {} records", records.len());
    for rec in records.iter().take(5) {
        println!("{}  {}  {}", rec.published_at, rec.id, rec.title);
    }
    assert!(!records.is_empty(), "Should find at least one recent cs.CL/cs.LG paper");
    assert!(records.iter().all(|r| r.id.starts_with("arxiv_")));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_hugging_face_daily_papers() {
    let client = HuggingFaceClient::new(RateLimiter::new(1.0), Duration::from_secs(30)).unwrap();
    let records = client.fetch(&FetchFilter::days(7)).await.expect("Hugging Face fetch failed");
    println!("Found {} records", records.len());
    for rec in records.iter().take(5) {
        println!("{:>4} upvotes  {}  {}", rec.engagement, rec.id, rec.title);
    }
}
