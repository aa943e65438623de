//! Command handlers for hotel listing and review analysis.

use std::sync::Arc;

use hotelcheck_analysis::{
    AnalysisResult, Analyzer, AnalyzerConfig, Classification, EmbeddingCache,
    EmbeddingClientConfig, OpenAiEmbeddingClient, ReviewOutcome,
};
use hotelcheck_core::{AppConfig, Catalog, Hotel};

/// clap value parser for `--threshold`.
pub(crate) fn parse_threshold(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(format!("{value} is outside [-1, 1]"));
    }
    Ok(value)
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<Catalog> {
    match &config.catalog_path {
        Some(path) => Ok(hotelcheck_core::load_catalog(path)?),
        None => Ok(Catalog::sample()),
    }
}

fn find_hotel<'a>(catalog: &'a Catalog, hotel_id: &str) -> anyhow::Result<&'a Hotel> {
    catalog
        .hotel(hotel_id)
        .ok_or_else(|| anyhow::anyhow!("hotel '{hotel_id}' not found"))
}

fn build_analyzer(
    config: &AppConfig,
    threshold: Option<f32>,
) -> anyhow::Result<Analyzer<OpenAiEmbeddingClient>> {
    let client = OpenAiEmbeddingClient::new(EmbeddingClientConfig::from_app_config(config))?;
    let cache = match config.embedding_dimensions {
        Some(dimensions) => EmbeddingCache::with_expected_dimensions(dimensions),
        None => EmbeddingCache::new(),
    };
    let mut analyzer_config = AnalyzerConfig::from_app_config(config);
    if let Some(threshold) = threshold {
        analyzer_config.threshold = threshold;
    }
    tracing::debug!(
        model = %config.embedding_model,
        threshold = analyzer_config.threshold,
        "analyzer configured"
    );
    Ok(Analyzer::new(client, Arc::new(cache), analyzer_config))
}

/// Print every hotel in the catalog with its review count.
pub(crate) fn run_hotels(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    for hotel in catalog.hotels() {
        println!(
            "{:<12} {} ({} reviews)",
            hotel.id,
            hotel.name,
            catalog.reviews_for(&hotel.id).len()
        );
    }
    Ok(())
}

/// Score all reviews of one hotel and print the verdicts.
///
/// # Errors
///
/// Returns an error if the hotel is unknown or its parameter embedding is
/// unavailable. Individual review failures are printed, not returned.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    hotel_id: &str,
    threshold: Option<f32>,
    json: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let hotel = find_hotel(&catalog, hotel_id)?;
    let analyzer = build_analyzer(config, threshold)?;

    let analysis = analyzer
        .analyze_hotel(hotel, &catalog.reviews_for(&hotel.id))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("{} ({})", hotel.name, hotel.id);
    println!("parameters: {}", analysis.parameter_text);
    println!("threshold:  {:.2}", analysis.threshold);
    println!();
    for result in &analysis.results {
        println!("{}", format_result(result));
    }
    println!();
    println!(
        "{} reviews, {} flagged for verification, {} failed, {} seeded anomalies",
        analysis.results.len(),
        analysis.flagged_count(),
        analysis.failed_count(),
        analysis.seeded_anomalous_count()
    );
    Ok(())
}

/// Score one piece of text against a hotel.
pub(crate) async fn run_review(
    config: &AppConfig,
    hotel_id: &str,
    text: &str,
    threshold: Option<f32>,
) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let hotel = find_hotel(&catalog, hotel_id)?;
    let analyzer = build_analyzer(config, threshold)?;

    let analysis = analyzer.analyze_custom_review(hotel, text).await?;
    println!(
        "{} similarity {:.4} ({:.1}%) threshold {:.2}",
        verdict(&analysis.classification),
        analysis.classification.similarity,
        analysis.classification.score_percent,
        analysis.threshold
    );
    Ok(())
}

fn verdict(classification: &Classification) -> &'static str {
    if classification.requires_verification {
        "VERIFY"
    } else {
        "ok"
    }
}

pub(crate) fn format_result(result: &AnalysisResult) -> String {
    let line = match &result.outcome {
        ReviewOutcome::Scored(c) => format!(
            "{:<6} {:>5.1}%  {:<12} {}",
            verdict(c),
            c.score_percent,
            result.review_id,
            result.review_text
        ),
        ReviewOutcome::Failed { error } => format!(
            "{:<6} {:>6}  {:<12} {}",
            "ERROR", "-", result.review_id, error
        ),
    };
    if result.is_anomalous {
        format!("{line}  [seeded anomaly]")
    } else {
        line
    }
}
