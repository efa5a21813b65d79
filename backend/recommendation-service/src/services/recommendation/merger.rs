use super::ScoredJob;
use crate::config::JobFusionConfig;
use crate::models::{JobRecommendation, JobRecommendationSource, RecommendationType};
use std::collections::HashMap;
use uuid::Uuid;

/// Weighted fusion of the feeder outputs into one deduplicated list.
///
/// A feeder that did not return a job contributes 0 for its term; the weights
/// are deliberately NOT renormalized by which sources fired, so single-source
/// jobs are structurally capped below multi-source agreement. Grouping is in
/// first-seen order, which keeps the descending sort stable.
pub fn merge_job_recommendations(
    per_source: &[(JobRecommendationSource, Vec<ScoredJob>)],
    config: &JobFusionConfig,
    limit: usize,
) -> Vec<JobRecommendation> {
    struct Fused {
        score: f64,
        sources: Vec<JobRecommendationSource>,
        reasons: Vec<String>,
    }

    let mut order: Vec<Uuid> = Vec::new();
    let mut fused: HashMap<Uuid, Fused> = HashMap::new();

    for (source, entries) in per_source {
        let weight = match source {
            JobRecommendationSource::Content => config.content_weight,
            JobRecommendationSource::Collaborative => config.collaborative_weight,
            JobRecommendationSource::Popularity => config.popularity_weight,
        };

        for entry in entries {
            let slot = fused.entry(entry.job_id).or_insert_with(|| {
                order.push(entry.job_id);
                Fused {
                    score: 0.0,
                    sources: Vec::new(),
                    reasons: Vec::new(),
                }
            });
            slot.score += weight * entry.score;
            if !slot.sources.contains(source) {
                slot.sources.push(*source);
            }
            if slot.reasons.len() < config.max_reasons && !slot.reasons.contains(&entry.reason) {
                slot.reasons.push(entry.reason.clone());
            }
        }
    }

    let mut merged: Vec<JobRecommendation> = order
        .into_iter()
        .filter_map(|job_id| {
            fused.remove(&job_id).map(|entry| JobRecommendation {
                job_id,
                score: entry.score,
                recommendation_type: classify(&entry.sources),
                sources: entry.sources,
                reasons: entry.reasons,
            })
        })
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged.truncate(limit);
    merged
}

/// First matching source decides the dominant type.
fn classify(sources: &[JobRecommendationSource]) -> RecommendationType {
    if sources.contains(&JobRecommendationSource::Content) {
        RecommendationType::ContentBased
    } else if sources.contains(&JobRecommendationSource::Collaborative) {
        RecommendationType::Collaborative
    } else if sources.contains(&JobRecommendationSource::Popularity) {
        RecommendationType::Trending
    } else {
        RecommendationType::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(job_id: Uuid, score: f64, reason: &str) -> ScoredJob {
        ScoredJob {
            job_id,
            score,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn fuses_with_fixed_weights_and_deduplicates() {
        let shared = Uuid::new_v4();
        let content_only = Uuid::new_v4();

        let per_source = vec![
            (
                JobRecommendationSource::Content,
                vec![
                    scored(shared, 0.8, "skills"),
                    scored(content_only, 1.0, "skills"),
                ],
            ),
            (
                JobRecommendationSource::Collaborative,
                vec![scored(shared, 1.0, "similar profiles")],
            ),
            (
                JobRecommendationSource::Popularity,
                vec![scored(shared, 0.5, "trending")],
            ),
        ];

        let merged =
            merge_job_recommendations(&per_source, &JobFusionConfig::default(), 10);

        assert_eq!(merged.len(), 2);
        // 0.5·0.8 + 0.3·1.0 + 0.2·0.5 = 0.8 beats the single-source 0.5·1.0.
        assert_eq!(merged[0].job_id, shared);
        assert!((merged[0].score - 0.8).abs() < 1e-9);
        assert_eq!(merged[0].sources.len(), 3);
        assert_eq!(merged[1].job_id, content_only);
        assert!((merged[1].score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_source_jobs_are_not_renormalized() {
        let job_id = Uuid::new_v4();
        let per_source = vec![(
            JobRecommendationSource::Popularity,
            vec![scored(job_id, 1.0, "trending")],
        )];

        let merged =
            merge_job_recommendations(&per_source, &JobFusionConfig::default(), 10);
        // A perfect popularity score still caps at its 0.2 weight.
        assert!((merged[0].score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn sorted_non_increasing_and_truncated() {
        let per_source = vec![(
            JobRecommendationSource::Content,
            vec![
                scored(Uuid::new_v4(), 0.4, "a"),
                scored(Uuid::new_v4(), 0.9, "b"),
                scored(Uuid::new_v4(), 0.6, "c"),
            ],
        )];

        let merged = merge_job_recommendations(&per_source, &JobFusionConfig::default(), 2);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].score >= merged[1].score);
    }

    #[test]
    fn classification_prefers_content_then_collaborative_then_trending() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let per_source = vec![
            (JobRecommendationSource::Content, vec![scored(a, 0.9, "r")]),
            (
                JobRecommendationSource::Collaborative,
                vec![scored(a, 0.9, "r2"), scored(b, 0.8, "r3")],
            ),
            (
                JobRecommendationSource::Popularity,
                vec![scored(b, 0.7, "r4"), scored(c, 0.6, "r5")],
            ),
        ];

        let merged =
            merge_job_recommendations(&per_source, &JobFusionConfig::default(), 10);
        let by_id: HashMap<Uuid, RecommendationType> = merged
            .iter()
            .map(|m| (m.job_id, m.recommendation_type))
            .collect();

        assert_eq!(by_id[&a], RecommendationType::ContentBased);
        assert_eq!(by_id[&b], RecommendationType::Collaborative);
        assert_eq!(by_id[&c], RecommendationType::Trending);
    }

    #[test]
    fn keeps_at_most_two_distinct_reasons() {
        let job_id = Uuid::new_v4();
        let per_source = vec![
            (
                JobRecommendationSource::Content,
                vec![scored(job_id, 0.9, "skills")],
            ),
            (
                JobRecommendationSource::Collaborative,
                vec![scored(job_id, 0.9, "similar profiles")],
            ),
            (
                JobRecommendationSource::Popularity,
                vec![scored(job_id, 0.9, "trending")],
            ),
        ];

        let merged =
            merge_job_recommendations(&per_source, &JobFusionConfig::default(), 10);
        assert_eq!(merged[0].reasons, vec!["skills", "similar profiles"]);
    }
}
