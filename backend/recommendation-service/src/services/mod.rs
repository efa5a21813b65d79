pub mod candidate_recommendation;
pub mod recommendation;
pub mod search;
pub mod similarity;

pub use candidate_recommendation::CandidateRecommendationEngine;
pub use recommendation::JobRecommendationEngine;
pub use search::SearchRanker;
pub use similarity::SimilarityEngine;
