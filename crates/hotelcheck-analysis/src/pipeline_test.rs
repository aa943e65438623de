use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::*;
use crate::error::EmbeddingFailure;

/// In-memory provider: fixed vectors per text, a set of texts that fail, and
/// a per-text call counter.
#[derive(Default)]
struct FakeProvider {
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    calls: Mutex<HashMap<String, u32>>,
    total_calls: AtomicU32,
}

impl FakeProvider {
    fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    fn failing(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    fn calls_for(&self, text: &str) -> u32 {
        self.calls
            .lock()
            .unwrap()
            .get(text)
            .copied()
            .unwrap_or_default()
    }
}

impl EmbeddingProvider for FakeProvider {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, AnalysisError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(text.to_string())
            .or_default() += 1;

        if self.failing.contains(text) {
            return Err(AnalysisError::EmbeddingUnavailable(
                EmbeddingFailure::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                },
            ));
        }
        self.vectors
            .get(text)
            .map(|v| EmbeddingVector::new(v.clone()))
            .ok_or_else(|| {
                AnalysisError::EmbeddingUnavailable(EmbeddingFailure::Malformed(format!(
                    "no fake vector for {text:?}"
                )))
            })
    }
}

fn no_retry_config() -> AnalyzerConfig {
    AnalyzerConfig {
        threshold: 0.75,
        max_retries: 0,
        retry_backoff_ms: 0,
    }
}

fn analyzer(provider: FakeProvider, config: AnalyzerConfig) -> Analyzer<FakeProvider> {
    Analyzer::new(provider, Arc::new(EmbeddingCache::new()), config)
}

fn hotel(id: &str, name: &str, description: &str, features: &[&str]) -> Hotel {
    Hotel {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        features: features.iter().map(|f| (*f).to_string()).collect(),
    }
}

fn review(id: &str, hotel_id: &str, text: &str) -> Review {
    Review {
        id: id.to_string(),
        hotel_id: hotel_id.to_string(),
        text: text.to_string(),
        is_anomalous: false,
    }
}

fn luxury_suite() -> Hotel {
    hotel(
        "lux",
        "Luxury Suite",
        "Five-star luxury with marble bathrooms and butler service.",
        &["5 stars", "Spa", "Panoramic view"],
    )
}

const NORMAL: &str = "Exceptional service, plush rooms, stunning view";
const ANOMALOUS: &str = "Dirty rooms, rude staff, broken AC";

#[test]
fn parameter_text_joins_name_description_and_features_in_order() {
    let h = hotel("h", "Sea Breeze", "Beachfront resort.", &["Beach", "Pool", "Bar"]);
    assert_eq!(
        parameter_text(&h),
        "Sea Breeze. Beachfront resort. Features: Beach, Pool, Bar"
    );
}

#[test]
fn parameter_text_without_features() {
    let h = hotel("h", "Inn", "A small inn.", &[]);
    assert_eq!(parameter_text(&h), "Inn. A small inn.");
}

#[test]
fn parameter_text_is_deterministic() {
    let h = luxury_suite();
    assert_eq!(parameter_text(&h), parameter_text(&h.clone()));
}

#[tokio::test]
async fn luxury_suite_normal_review_outscores_anomalous_review() {
    let lux = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&lux), &[0.9, 0.1, 0.4])
        .with(NORMAL, &[0.85, 0.15, 0.45])
        .with(ANOMALOUS, &[-0.2, 0.9, 0.1]);
    let analyzer = analyzer(provider, no_retry_config());

    let r1 = review("lux-1", "lux", NORMAL);
    let r2 = review("lux-2", "lux", ANOMALOUS);
    let analysis = analyzer
        .analyze_hotel(&lux, &[&r1, &r2])
        .await
        .expect("analysis succeeds");

    assert_eq!(analysis.results.len(), 2);
    let normal = &analysis.results[0];
    let anomalous = &analysis.results[1];
    assert_eq!(normal.review_id, "lux-1");
    assert_eq!(anomalous.review_id, "lux-2");

    let normal_sim = normal.similarity().expect("scored");
    let anomalous_sim = anomalous.similarity().expect("scored");
    assert!(normal_sim >= 0.75, "normal review similarity {normal_sim}");
    assert!(anomalous_sim < 0.75, "anomalous review similarity {anomalous_sim}");
    assert!(normal_sim > anomalous_sim);

    assert_eq!(normal.requires_verification(), Some(false));
    assert_eq!(anomalous.requires_verification(), Some(true));
    assert_eq!(analysis.flagged_count(), 1);
    assert_eq!(analysis.failed_count(), 0);
    assert_eq!(analysis.parameter_text, parameter_text(&lux));
}

#[tokio::test]
async fn failed_review_is_isolated() {
    let h = hotel("h", "Harbor Hotel", "By the docks.", &["Harbor view"]);
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .with("first", &[1.0, 0.1])
        .failing("second")
        .with("third", &[0.2, 1.0])
        .with("fourth", &[1.0, 0.0]);
    let analyzer = analyzer(provider, no_retry_config());

    let reviews = [
        review("r1", "h", "first"),
        review("r2", "h", "second"),
        review("r3", "h", "third"),
        review("r4", "h", "fourth"),
    ];
    let refs: Vec<&Review> = reviews.iter().collect();
    let analysis = analyzer
        .analyze_hotel(&h, &refs)
        .await
        .expect("one failing review must not abort the hotel");

    assert_eq!(analysis.results.len(), 4);
    let ids: Vec<&str> = analysis.results.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3", "r4"]);

    let errors: Vec<&AnalysisResult> = analysis.results.iter().filter(|r| r.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].review_id, "r2");
    assert!(matches!(
        &errors[0].outcome,
        ReviewOutcome::Failed { error } if error.contains("503")
    ));
    assert_eq!(
        analysis
            .results
            .iter()
            .filter(|r| r.similarity().is_some())
            .count(),
        3
    );
    assert_eq!(analysis.failed_count(), 1);
}

#[tokio::test]
async fn baseline_failure_makes_analysis_unavailable() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .failing(&parameter_text(&h))
        .with(NORMAL, &[1.0, 0.0, 0.0]);
    let analyzer = analyzer(provider, no_retry_config());

    let r = review("lux-1", "lux", NORMAL);
    let err = analyzer.analyze_hotel(&h, &[&r]).await.unwrap_err();

    match err {
        AnalysisError::AnalysisUnavailable { hotel_id, source } => {
            assert_eq!(hotel_id, "lux");
            assert!(matches!(*source, AnalysisError::EmbeddingUnavailable(_)));
        }
        other => panic!("expected AnalysisUnavailable, got {other:?}"),
    }
    assert_eq!(
        analyzer.provider().calls_for(NORMAL),
        0,
        "reviews are not embedded without a baseline"
    );
}

#[tokio::test]
async fn baseline_configuration_error_is_wrapped() {
    struct NoKey;
    impl EmbeddingProvider for NoKey {
        async fn embed(&self, _text: &str) -> Result<EmbeddingVector, AnalysisError> {
            Err(AnalysisError::Configuration("OPENAI_API_KEY is not set".to_string()))
        }
    }

    let analyzer = Analyzer::new(NoKey, Arc::new(EmbeddingCache::new()), no_retry_config());
    let err = analyzer
        .analyze_custom_review(&luxury_suite(), NORMAL)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::AnalysisUnavailable { ref source, .. }
            if matches!(**source, AnalysisError::Configuration(_))
    ));
}

#[tokio::test]
async fn dimension_mismatch_is_surfaced() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0, 0.0])
        .with("short", &[1.0, 0.0, 0.0, 0.0, 0.0]);
    let analyzer = analyzer(provider, no_retry_config());

    let r = review("lux-1", "lux", "short");
    let err = analyzer.analyze_hotel(&h, &[&r]).await.unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DimensionMismatch { left: 3, right: 5 }
    ));
}

#[tokio::test]
async fn degenerate_review_vector_is_surfaced() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .with("zero", &[0.0, 0.0]);
    let analyzer = analyzer(provider, no_retry_config());

    let err = analyzer
        .analyze_custom_review(&h, "zero")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateVector));
}

#[tokio::test]
async fn embeddings_are_cached_across_analyses() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.2])
        .with(NORMAL, &[0.9, 0.3]);
    let analyzer = analyzer(provider, no_retry_config());
    let r = review("lux-1", "lux", NORMAL);

    let first = analyzer.analyze_hotel(&h, &[&r]).await.unwrap();
    let second = analyzer.analyze_hotel(&h, &[&r]).await.unwrap();
    let custom = analyzer.analyze_custom_review(&h, NORMAL).await.unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(
        custom.classification.similarity,
        first.results[0].similarity().unwrap()
    );
    assert_eq!(analyzer.provider().total_calls.load(Ordering::SeqCst), 2);
    assert_eq!(analyzer.cache().len(), 2);
}

#[tokio::test]
async fn shared_cache_serves_other_analyzers() {
    let h = luxury_suite();
    let cache = Arc::new(EmbeddingCache::new());
    let first = Analyzer::new(
        FakeProvider::default().with(&parameter_text(&h), &[1.0, 0.0]),
        Arc::clone(&cache),
        no_retry_config(),
    );
    first.analyze_hotel(&h, &[]).await.unwrap();

    // This provider knows nothing; the baseline must come from the cache.
    let second = Analyzer::new(FakeProvider::default(), cache, no_retry_config());
    let analysis = second.analyze_hotel(&h, &[]).await.unwrap();
    assert!(analysis.results.is_empty());
    assert_eq!(second.provider().total_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transient_review_failures_are_retried() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .failing("flaky");
    let config = AnalyzerConfig {
        max_retries: 2,
        ..no_retry_config()
    };
    let analyzer = analyzer(provider, config);
    let r = review("lux-1", "lux", "flaky");

    let analysis = analyzer.analyze_hotel(&h, &[&r]).await.unwrap();
    assert!(analysis.results[0].is_error());
    assert_eq!(analyzer.provider().calls_for("flaky"), 3, "1 try + 2 retries");
}

#[tokio::test]
async fn failed_reviews_are_not_negatively_cached() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .failing("flaky");
    let analyzer = analyzer(provider, no_retry_config());
    let r = review("lux-1", "lux", "flaky");

    analyzer.analyze_hotel(&h, &[&r]).await.unwrap();
    analyzer.analyze_hotel(&h, &[&r]).await.unwrap();
    assert_eq!(analyzer.provider().calls_for("flaky"), 2);
}

#[tokio::test]
async fn reviews_of_other_hotels_are_skipped() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .with(NORMAL, &[1.0, 0.1]);
    let analyzer = analyzer(provider, no_retry_config());

    let mine = review("lux-1", "lux", NORMAL);
    let theirs = review("other-1", "other", ANOMALOUS);
    let analysis = analyzer
        .analyze_hotel(&h, &[&mine, &theirs])
        .await
        .unwrap();
    assert_eq!(analysis.results.len(), 1);
    assert_eq!(analyzer.provider().calls_for(ANOMALOUS), 0);
}

#[tokio::test]
async fn custom_review_rejects_blank_text() {
    let analyzer = analyzer(FakeProvider::default(), no_retry_config());
    let err = analyzer
        .analyze_custom_review(&luxury_suite(), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyText));
    assert_eq!(analyzer.provider().total_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn custom_review_reports_threshold_and_classification() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .with("meh", &[1.0, 1.0]);
    let config = AnalyzerConfig {
        threshold: 0.8,
        ..no_retry_config()
    };
    let analyzer = analyzer(provider, config);

    let result = analyzer.analyze_custom_review(&h, "meh").await.unwrap();
    // cos 45° ≈ 0.7071
    assert!((result.classification.similarity - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    assert!(result.classification.requires_verification);
    assert!((result.threshold - 0.8).abs() < f32::EPSILON);
    assert_eq!(result.hotel_id, "lux");
}

#[tokio::test]
async fn custom_review_embedding_failure_is_not_wrapped() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .failing("down");
    let analyzer = analyzer(provider, no_retry_config());

    let err = analyzer.analyze_custom_review(&h, "down").await.unwrap_err();
    assert!(matches!(err, AnalysisError::EmbeddingUnavailable(_)));
}

#[test]
fn analysis_result_serializes_status_tag() {
    let scored = AnalysisResult {
        review_id: "r1".to_string(),
        hotel_id: "h".to_string(),
        review_text: "ok".to_string(),
        is_anomalous: false,
        outcome: ReviewOutcome::Scored(classify(0.5, 0.75)),
    };
    let json = serde_json::to_value(&scored).unwrap();
    assert_eq!(json["status"], "scored");
    assert_eq!(json["requires_verification"], true);

    let failed = AnalysisResult {
        outcome: ReviewOutcome::Failed {
            error: "boom".to_string(),
        },
        ..scored
    };
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["error"], "boom");
    assert!(json.get("similarity").is_none());
}

#[tokio::test]
async fn seed_label_is_carried_but_not_scored() {
    let h = luxury_suite();
    let provider = FakeProvider::default()
        .with(&parameter_text(&h), &[1.0, 0.0])
        .with(NORMAL, &[1.0, 0.1]);
    let analyzer = analyzer(provider, no_retry_config());

    let plain = review("lux-1", "lux", NORMAL);
    let seeded = Review {
        is_anomalous: true,
        ..review("lux-a1", "lux", NORMAL)
    };
    let analysis = analyzer
        .analyze_hotel(&h, &[&plain, &seeded])
        .await
        .unwrap();

    assert!(!analysis.results[0].is_anomalous);
    assert!(analysis.results[1].is_anomalous);
    assert_eq!(analysis.seeded_anomalous_count(), 1);
    // Same text, same verdict: the label never influences scoring.
    assert_eq!(analysis.results[0].outcome, analysis.results[1].outcome);

    let json = serde_json::to_value(&analysis.results[1]).unwrap();
    assert_eq!(json["is_anomalous"], true);
}
