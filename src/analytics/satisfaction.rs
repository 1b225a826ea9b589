use crate::analytics::types::CategoryScore;

/// Supplies guest satisfaction scores per category.
pub trait SatisfactionSource: Send + Sync {
    fn category_scores(&self) -> Vec<CategoryScore>;
}

/// Fixed category scores, used until survey data is collected.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSatisfaction;

const STATIC_SCORES: [(&str, f64); 5] = [
    ("Service", 4.5),
    ("Cleanliness", 4.7),
    ("Amenities", 4.2),
    ("Location", 4.8),
    ("Value", 4.3),
];

impl SatisfactionSource for StaticSatisfaction {
    fn category_scores(&self) -> Vec<CategoryScore> {
        STATIC_SCORES
            .iter()
            .map(|&(category, score)| CategoryScore {
                category: category.to_string(),
                score,
            })
            .collect()
    }
}
