//! Paperwatch — research publication monitor.
//! Entry point: one ingestion run followed by a digest export.

mod config;

use std::sync::Arc;

use paperwatch_common::SourceTag;
use paperwatch_db::{Database, RecordRepository, SummaryRepository};
use paperwatch_digest::{export, DigestBuilder};
use paperwatch_ingestion::{
    run_ingestion, ArxivClient, FetchCoordinator, HuggingFaceClient, IngestionJob, PapersWithCodeClient,
    RateLimiter, RecordSource,
};
use paperwatch_llm::{LlmSummarizer, OpenAiCompatibleBackend, Summarizer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn build_coordinator(config: &config::IngestionConfig) -> anyhow::Result<FetchCoordinator> {
    let mut coordinator = FetchCoordinator::new(config.source_timeout()).concurrent(config.concurrent);

    for tag in &config.sources {
        if coordinator.registered().contains(tag) {
            continue;
        }
        let source: Arc<dyn RecordSource> = match tag {
            SourceTag::Arxiv => Arc::new(
                ArxivClient::new(RateLimiter::new(config.arxiv.requests_per_second), config.timeout())?
                    .with_paging(config.arxiv.page_size, config.arxiv.max_results),
            ),
            SourceTag::PapersWithCode => Arc::new(
                PapersWithCodeClient::new(
                    RateLimiter::new(config.papers_with_code.requests_per_second),
                    config.timeout(),
                )?
                .with_page_size(config.papers_with_code.page_size),
            ),
            SourceTag::HuggingFace => Arc::new(HuggingFaceClient::new(
                RateLimiter::new(config.hugging_face.requests_per_second),
                config.timeout(),
            )?),
        };
        coordinator.register(source);
    }

    Ok(coordinator)
}

fn build_summarizer(config: &config::Config) -> anyhow::Result<Option<LlmSummarizer>> {
    let Some(llm) = config.llm.as_ref().filter(|l| l.summarize) else {
        info!("No [llm] section or summarize = false; records will be stored without summaries.");
        return Ok(None);
    };

    let api_key = llm.resolved_api_key();
    if api_key.is_none() {
        warn!(
            "No LLM API key found (set llm.api_key or {}); continuing unauthenticated",
            config::API_KEY_ENV
        );
    }
    let backend = OpenAiCompatibleBackend::new(&llm.base_url, &llm.model, api_key)?;
    info!(model = %llm.model, base_url = %llm.base_url, "Summarizer ready");
    Ok(Some(LlmSummarizer::new(Arc::new(backend))))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("paperwatch=debug,info")),
        )
        .init();

    info!("Paperwatch starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load()?;
    info!(
        days_back = config.ingestion.days_back,
        sources = ?config.ingestion.sources,
        "Configuration loaded"
    );

    let db = Arc::new(Database::open(&config.database.path)?);
    info!(path = %db.path(), "Database ready");
    let records = RecordRepository::new(db.clone());
    let summaries = SummaryRepository::new(db.clone());

    let coordinator = build_coordinator(&config.ingestion)?;
    let summarizer = build_summarizer(&config)?;

    // ── Ingest ────────────────────────────────────────────────────────────────
    let job = IngestionJob {
        filter: config.ingestion.filter(),
        max_summaries: config.ingestion.max_summaries,
    };
    let report = run_ingestion(
        &job,
        &coordinator,
        &records,
        &summaries,
        summarizer.as_ref().map(|s| s as &dyn Summarizer),
    )
    .await?;

    for (source, error) in &report.source_errors {
        warn!(%source, %error, "Source unavailable this run; fewer records than usual");
    }
    info!(
        fetched = report.fetched,
        duplicates = report.duplicates,
        inserted = report.inserted,
        updated = report.updated,
        summarized = report.summarized,
        summary_failures = report.summary_failures,
        "Ingestion finished"
    );

    // ── Digest ────────────────────────────────────────────────────────────────
    let digest = DigestBuilder::new(db.clone()).build(None, None, config.digest.top_n)?;
    if digest.is_empty() {
        info!("No records found for this period.");
    }
    let written = export(&digest, &config.digest.output_dir, &config.digest.formats)?;
    for path in &written {
        info!(path = %path.display(), "Digest exported");
    }

    let stats = db.stats()?;
    info!(
        total_records = stats.total_records,
        total_summaries = stats.total_summaries,
        by_source = ?stats.records_by_source,
        "Store totals"
    );

    Ok(())
}
