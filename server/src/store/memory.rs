//! In-process store used by the router tests, so they run without Postgres.

use std::sync::Mutex;

use chrono::Utc;
use larder_core::{NewRecipeFields, RecipePatch};

use super::{RecipeFilter, Store, StoreError, MAX_TOKENS_PER_USER};
use crate::models::{Ingredient, NewUser, Recipe, RecipeWithLinks, Tag, User, UserChanges};

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<User>,
    /// `(token_hash, user_id)`, oldest first.
    tokens: Vec<(String, i64)>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_tags: Vec<(i64, i64)>,
    recipe_ingredients: Vec<(i64, i64)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_owned_tags(&self, owner: i64, ids: &[i64]) -> Result<(), StoreError> {
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !self.tags.iter().any(|t| t.id == *id && t.user_id == owner))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::UnknownIds {
                field: "tags",
                ids: missing,
            })
        }
    }

    fn check_owned_ingredients(&self, owner: i64, ids: &[i64]) -> Result<(), StoreError> {
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| {
                !self
                    .ingredients
                    .iter()
                    .any(|i| i.id == *id && i.user_id == owner)
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::UnknownIds {
                field: "ingredients",
                ids: missing,
            })
        }
    }

    fn with_links(&self, recipe: &Recipe) -> RecipeWithLinks {
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| self.recipe_tags.contains(&(recipe.id, t.id)))
            .cloned()
            .collect();
        tags.sort_by_key(|t| t.id);

        let mut ingredients: Vec<Ingredient> = self
            .ingredients
            .iter()
            .filter(|i| self.recipe_ingredients.contains(&(recipe.id, i.id)))
            .cloned()
            .collect();
        ingredients.sort_by_key(|i| i.id);

        RecipeWithLinks {
            recipe: recipe.clone(),
            tags,
            ingredients,
        }
    }

    fn owned_recipe_index(&self, owner: i64, id: i64) -> Result<usize, StoreError> {
        self.recipes
            .iter()
            .position(|r| r.id == id && r.user_id == owner)
            .ok_or(StoreError::NotFound)
    }

    fn replace_tags(&mut self, recipe_id: i64, ids: &[i64]) {
        self.recipe_tags.retain(|(r, _)| *r != recipe_id);
        self.recipe_tags
            .extend(ids.iter().map(|&tag_id| (recipe_id, tag_id)));
    }

    fn replace_ingredients(&mut self, recipe_id: i64, ids: &[i64]) {
        self.recipe_ingredients.retain(|(r, _)| *r != recipe_id);
        self.recipe_ingredients
            .extend(ids.iter().map(|&ingredient_id| (recipe_id, ingredient_id)));
    }
}

fn matches_filter(filter: &RecipeFilter, record: &RecipeWithLinks) -> bool {
    let tags_match = filter
        .tags
        .as_ref()
        .map_or(true, |ids| record.tags.iter().any(|t| ids.contains(&t.id)));
    let ingredients_match = filter.ingredients.as_ref().map_or(true, |ids| {
        record.ingredients.iter().any(|i| ids.contains(&i.id))
    });
    tags_match && ingredients_match
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deactivate an account, as an administrator would.
    pub fn deactivate_user(&self, user_id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = false;
        }
    }

    pub fn token_count(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }
}

impl Store for MemoryStore {
    fn create_user(&self, new_user: &NewUser<'_>) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();

        if state.users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: state.next_id(),
            email: new_user.email.to_string(),
            name: new_user.name.to_string(),
            password_hash: new_user.password_hash.to_string(),
            is_active: true,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    fn update_user(&self, user_id: i64, changes: &UserChanges) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();

        if let Some(email) = &changes.email {
            if state
                .users
                .iter()
                .any(|u| u.id != user_id && &u.email == email)
            {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound)?;

        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(password_hash) = &changes.password_hash {
            user.password_hash = password_hash.clone();
        }
        if !changes.is_empty() {
            user.updated_at = Utc::now();
        }

        Ok(user.clone())
    }

    fn create_token(&self, user_id: i64, token_hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.tokens.push((token_hash.to_string(), user_id));

        let owned = state.tokens.iter().filter(|(_, id)| *id == user_id).count();
        let mut excess = owned.saturating_sub(MAX_TOKENS_PER_USER);
        state.tokens.retain(|(_, id)| {
            if *id == user_id && excess > 0 {
                excess -= 1;
                false
            } else {
                true
            }
        });
        Ok(())
    }

    fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().unwrap();
        let Some((_, user_id)) = state.tokens.iter().find(|(hash, _)| hash == token_hash) else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|u| u.id == *user_id && u.is_active)
            .cloned())
    }

    fn list_tags(&self, owner: i64, assigned_only: bool) -> Result<Vec<Tag>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| t.user_id == owner)
            .filter(|t| !assigned_only || state.recipe_tags.iter().any(|(_, id)| *id == t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| b.name.cmp(&a.name).then(a.id.cmp(&b.id)));
        Ok(tags)
    }

    fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError> {
        let mut state = self.state.lock().unwrap();
        let tag = Tag {
            id: state.next_id(),
            user_id: owner,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    fn list_ingredients(
        &self,
        owner: i64,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut ingredients: Vec<Ingredient> = state
            .ingredients
            .iter()
            .filter(|i| i.user_id == owner)
            .filter(|i| {
                !assigned_only || state.recipe_ingredients.iter().any(|(_, id)| *id == i.id)
            })
            .cloned()
            .collect();
        ingredients.sort_by(|a, b| b.name.cmp(&a.name).then(a.id.cmp(&b.id)));
        Ok(ingredients)
    }

    fn create_ingredient(&self, owner: i64, name: &str) -> Result<Ingredient, StoreError> {
        let mut state = self.state.lock().unwrap();
        let ingredient = Ingredient {
            id: state.next_id(),
            user_id: owner,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    fn list_recipes(
        &self,
        owner: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeWithLinks>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut recipes: Vec<RecipeWithLinks> = state
            .recipes
            .iter()
            .filter(|r| r.user_id == owner)
            .map(|r| state.with_links(r))
            .filter(|r| matches_filter(filter, r))
            .collect();
        recipes.sort_by(|a, b| b.recipe.id.cmp(&a.recipe.id));
        Ok(recipes)
    }

    fn get_recipe(&self, owner: i64, id: i64) -> Result<RecipeWithLinks, StoreError> {
        let state = self.state.lock().unwrap();
        let index = state.owned_recipe_index(owner, id)?;
        Ok(state.with_links(&state.recipes[index]))
    }

    fn create_recipe(
        &self,
        owner: i64,
        fields: &NewRecipeFields,
    ) -> Result<RecipeWithLinks, StoreError> {
        let mut state = self.state.lock().unwrap();

        state.check_owned_tags(owner, &fields.tags)?;
        state.check_owned_ingredients(owner, &fields.ingredients)?;

        let now = Utc::now();
        let recipe = Recipe {
            id: state.next_id(),
            user_id: owner,
            title: fields.title.clone(),
            time_minutes: fields.time_minutes,
            price: fields.price,
            link: fields.link.clone(),
            image: None,
            created_at: now,
            updated_at: now,
        };
        state.replace_tags(recipe.id, &fields.tags);
        state.replace_ingredients(recipe.id, &fields.ingredients);
        state.recipes.push(recipe.clone());

        Ok(state.with_links(&recipe))
    }

    fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        patch: &RecipePatch,
    ) -> Result<RecipeWithLinks, StoreError> {
        let mut state = self.state.lock().unwrap();

        let index = state.owned_recipe_index(owner, id)?;
        if let Some(tag_ids) = patch.tags.ids() {
            state.check_owned_tags(owner, tag_ids)?;
        }
        if let Some(ingredient_ids) = patch.ingredients.ids() {
            state.check_owned_ingredients(owner, ingredient_ids)?;
        }

        let recipe = &mut state.recipes[index];
        if let Some(title) = &patch.title {
            recipe.title = title.clone();
        }
        if let Some(time_minutes) = patch.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = patch.price {
            recipe.price = price;
        }
        if let Some(link) = &patch.link {
            recipe.link = link.clone();
        }
        if patch.has_scalar_changes() {
            recipe.updated_at = Utc::now();
        }
        let recipe = recipe.clone();

        if let Some(tag_ids) = patch.tags.ids() {
            state.replace_tags(recipe.id, tag_ids);
        }
        if let Some(ingredient_ids) = patch.ingredients.ids() {
            state.replace_ingredients(recipe.id, ingredient_ids);
        }

        Ok(state.with_links(&recipe))
    }

    fn delete_recipe(&self, owner: i64, id: i64) -> Result<Recipe, StoreError> {
        let mut state = self.state.lock().unwrap();
        let index = state.owned_recipe_index(owner, id)?;
        let recipe = state.recipes.remove(index);
        state.recipe_tags.retain(|(r, _)| *r != id);
        state.recipe_ingredients.retain(|(r, _)| *r != id);
        Ok(recipe)
    }

    fn set_recipe_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let index = state.owned_recipe_index(owner, id)?;
        Ok(state.recipes[index].image.replace(image.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::{AssociationUpdate, RecipeInput, UpdateMode};
    use rust_decimal::Decimal;

    fn store_with_user(email: &str) -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&NewUser {
                email,
                name: "",
                password_hash: "x",
                is_staff: false,
                is_superuser: false,
            })
            .unwrap();
        (store, user.id)
    }

    fn new_recipe(title: &str, tags: Vec<i64>) -> NewRecipeFields {
        RecipeInput {
            title: Some(title.to_string()),
            tags: Some(tags),
            ..Default::default()
        }
        .into_new()
        .unwrap()
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (store, _) = store_with_user("a@x.com");
        let err = store
            .create_user(&NewUser {
                email: "a@x.com",
                name: "",
                password_hash: "y",
                is_staff: false,
                is_superuser: false,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[test]
    fn test_tags_ordered_by_name_desc() {
        let (store, owner) = store_with_user("a@x.com");
        store.create_tag(owner, "Dessert").unwrap();
        store.create_tag(owner, "Vegan").unwrap();
        let names: Vec<String> = store
            .list_tags(owner, false)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Vegan", "Dessert"]);
    }

    #[test]
    fn test_recipe_rejects_foreign_tag() {
        let (store, owner) = store_with_user("a@x.com");
        let foreign = store.create_tag(owner + 100, "Theirs").unwrap();

        let err = store
            .create_recipe(owner, &new_recipe("Soup", vec![foreign.id]))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownIds { field: "tags", .. }));
        assert!(store.list_recipes(owner, &RecipeFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_update_keeps_links_when_absent() {
        let (store, owner) = store_with_user("a@x.com");
        let tag = store.create_tag(owner, "Vegan").unwrap();
        let recipe = store
            .create_recipe(owner, &new_recipe("Soup", vec![tag.id]))
            .unwrap();

        let patch = RecipeInput {
            price: Some(Decimal::new(250, 2)),
            ..Default::default()
        }
        .into_patch(UpdateMode::Partial)
        .unwrap();
        assert_eq!(patch.tags, AssociationUpdate::Keep);

        let updated = store.update_recipe(owner, recipe.recipe.id, &patch).unwrap();
        assert_eq!(updated.tags, vec![tag]);
        assert_eq!(updated.recipe.price.to_string(), "2.50");
    }

    #[test]
    fn test_set_image_returns_previous() {
        let (store, owner) = store_with_user("a@x.com");
        let recipe = store.create_recipe(owner, &new_recipe("Soup", vec![])).unwrap();
        let id = recipe.recipe.id;

        assert_eq!(store.set_recipe_image(owner, id, "a.png").unwrap(), None);
        assert_eq!(
            store.set_recipe_image(owner, id, "b.png").unwrap().as_deref(),
            Some("a.png")
        );
        assert!(matches!(
            store.set_recipe_image(owner + 1, id, "c.png"),
            Err(StoreError::NotFound)
        ));
    }
}
