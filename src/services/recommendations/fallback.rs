use crate::{
    error::AppResult,
    models::{Category, Difficulty, ItemType, RecommendationItem, UserProfile},
    services::recommendations::RecommendationStrategy,
};

struct StaticEntry {
    title: &'static str,
    description: &'static str,
    item_type: ItemType,
    relevance_score: f64,
    tags: &'static [&'static str],
    source: &'static str,
}

const FOOD: &[StaticEntry] = &[
    StaticEntry {
        title: "Start Your Day with Protein",
        description: "Include 20-30g of protein in breakfast to maintain stable energy levels throughout the day",
        item_type: ItemType::Tip,
        relevance_score: 0.8,
        tags: &["nutrition", "breakfast", "protein"],
        source: "Nutrition Science",
    },
    StaticEntry {
        title: "Rainbow Plant Life",
        description: "Vibrant plant-based recipes and nutrition education for healthy eating",
        item_type: ItemType::Channel,
        relevance_score: 0.9,
        tags: &["plant-based", "recipes", "nutrition"],
        source: "YouTube Channel",
    },
];

const HEALTH: &[StaticEntry] = &[StaticEntry {
    title: "Daily Gratitude Practice",
    description: "Write down 3 things you're grateful for each day to improve mood and life satisfaction",
    item_type: ItemType::Tip,
    relevance_score: 0.85,
    tags: &["mental-health", "gratitude", "wellness"],
    source: "Psychology Research",
}];

const WORKOUT: &[StaticEntry] = &[StaticEntry {
    title: "10-Minute Movement Rule",
    description: "Start with just 10 minutes of daily movement - consistency matters more than duration",
    item_type: ItemType::Tip,
    relevance_score: 0.9,
    tags: &["exercise", "beginner", "consistency"],
    source: "Fitness Science",
}];

const YOGA: &[StaticEntry] = &[StaticEntry {
    title: "Box Breathing Technique",
    description: "Breathe in for 4, hold for 4, out for 4, hold for 4. Repeat to reduce anxiety instantly",
    item_type: ItemType::Tip,
    relevance_score: 0.95,
    tags: &["breathing", "mindfulness", "anxiety"],
    source: "Mindfulness Practice",
}];

fn entries(category: Category) -> &'static [StaticEntry] {
    match category {
        Category::Food => FOOD,
        Category::Health => HEALTH,
        Category::Workout => WORKOUT,
        Category::Yoga => YOGA,
    }
}

fn to_item(category: Category, entry: &StaticEntry) -> RecommendationItem {
    RecommendationItem {
        id: None,
        title: entry.title.to_string(),
        description: entry.description.to_string(),
        category,
        item_type: entry.item_type,
        relevance_score: entry.relevance_score,
        tags: entry.tags.iter().map(|t| t.to_string()).collect(),
        difficulty: Difficulty::Beginner,
        source: entry.source.to_string(),
    }
}

/// Hand-authored suggestions served when nothing better is available
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticStrategy;

impl StaticStrategy {
    /// The category's entries, or every category's in canonical order
    pub fn items(&self, category: Option<Category>, limit: usize) -> Vec<RecommendationItem> {
        let categories: Vec<Category> = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };

        categories
            .into_iter()
            .flat_map(|category| entries(category).iter().map(move |e| to_item(category, e)))
            .take(limit)
            .collect()
    }
}

#[async_trait::async_trait]
impl RecommendationStrategy for StaticStrategy {
    async fn select(
        &self,
        _profile: &UserProfile,
        category: Option<Category>,
        limit: usize,
    ) -> AppResult<Vec<RecommendationItem>> {
        Ok(self.items(category, limit))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
