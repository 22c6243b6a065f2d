//! Persistence behind an owner-scoped repository interface.
//!
//! Every method on tags, ingredients and recipes takes the id of the
//! requesting user and only ever sees rows owned by that user. A row owned by
//! someone else is reported as [`StoreError::NotFound`], exactly like a row
//! that does not exist.

mod pg;

#[cfg(test)]
pub mod memory;

pub use pg::PgStore;

use crate::models::{Ingredient, NewUser, Recipe, RecipeWithLinks, Tag, User, UserChanges};
use larder_core::{NewRecipeFields, RecipePatch};
use thiserror::Error;

/// Tokens kept per user; issuing another drops the oldest.
pub const MAX_TOKENS_PER_USER: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,

    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Ids supplied for an association that do not name a row owned by the
    /// requesting user.
    #[error("Unknown {field} ids: {ids:?}")]
    UnknownIds { field: &'static str, ids: Vec<i64> },

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Database error: {0}")]
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => StoreError::NotFound,
            e => StoreError::Database(e),
        }
    }
}

/// Restricts a recipe listing. Within one axis a recipe matches if it is
/// linked to any of the ids; both axes must match when both are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

pub trait Store: Send + Sync {
    fn create_user(&self, new_user: &NewUser<'_>) -> Result<User, StoreError>;

    /// Look up a user by an already-normalized email.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn update_user(&self, user_id: i64, changes: &UserChanges) -> Result<User, StoreError>;

    /// Store a new token hash, keeping only the user's newest
    /// [`MAX_TOKENS_PER_USER`] tokens.
    fn create_token(&self, user_id: i64, token_hash: &str) -> Result<(), StoreError>;

    /// Active user owning the token with this hash.
    fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>, StoreError>;

    /// Tags owned by `owner`, by name descending. With `assigned_only`, only
    /// tags linked to at least one recipe.
    fn list_tags(&self, owner: i64, assigned_only: bool) -> Result<Vec<Tag>, StoreError>;

    fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError>;

    fn list_ingredients(&self, owner: i64, assigned_only: bool)
        -> Result<Vec<Ingredient>, StoreError>;

    fn create_ingredient(&self, owner: i64, name: &str) -> Result<Ingredient, StoreError>;

    /// Recipes owned by `owner`, newest id first.
    fn list_recipes(
        &self,
        owner: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeWithLinks>, StoreError>;

    fn get_recipe(&self, owner: i64, id: i64) -> Result<RecipeWithLinks, StoreError>;

    fn create_recipe(
        &self,
        owner: i64,
        fields: &NewRecipeFields,
    ) -> Result<RecipeWithLinks, StoreError>;

    fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        patch: &RecipePatch,
    ) -> Result<RecipeWithLinks, StoreError>;

    /// Delete a recipe and its links, returning the deleted row.
    fn delete_recipe(&self, owner: i64, id: i64) -> Result<Recipe, StoreError>;

    /// Point the recipe at a new stored image, returning the previous path.
    fn set_recipe_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> Result<Option<String>, StoreError>;
}
