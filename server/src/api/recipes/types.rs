use larder_core::RecipeInput;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::ingredients::list::IngredientItem;
use crate::api::tags::list::TagItem;
use crate::media::MediaStorage;
use crate::models::RecipeWithLinks;

/// Writable recipe fields. Which ones are required depends on the method:
/// POST needs `title`, PUT needs `title`, `time_minutes` and `price`, PATCH
/// needs none.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    /// Decimal with at most two fraction digits, e.g. `"5.50"`.
    #[schema(value_type = Option<String>, example = "5.50")]
    pub price: Option<Decimal>,
    pub link: Option<String>,
    /// Ids of the caller's own tags.
    pub tags: Option<Vec<i64>>,
    /// Ids of the caller's own ingredients.
    pub ingredients: Option<Vec<i64>>,
}

impl From<RecipeRequest> for RecipeInput {
    fn from(req: RecipeRequest) -> Self {
        RecipeInput {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            link: req.link,
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}

/// List view of a recipe: linked tags and ingredients as ids.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl From<&RecipeWithLinks> for RecipeSummary {
    fn from(record: &RecipeWithLinks) -> Self {
        let recipe = &record.recipe;
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            tags: record.tags.iter().map(|t| t.id).collect(),
            ingredients: record.ingredients.iter().map(|i| i.id).collect(),
        }
    }
}

/// Detail view of a recipe: nested tags and ingredients plus the image URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<TagItem>,
    pub ingredients: Vec<IngredientItem>,
    pub image: Option<String>,
}

impl RecipeDetail {
    pub fn new(record: &RecipeWithLinks, media: &MediaStorage) -> Self {
        let recipe = &record.recipe;
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.clone(),
            tags: record.tags.iter().map(TagItem::from).collect(),
            ingredients: record.ingredients.iter().map(IngredientItem::from).collect(),
            image: recipe.image.as_deref().map(|path| media.url(path)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i64,
    /// URL of the stored image.
    pub image: String,
}
