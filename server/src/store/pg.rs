use std::collections::HashMap;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use larder_core::{NewRecipeFields, RecipePatch};

use super::{RecipeFilter, Store, StoreError, MAX_TOKENS_PER_USER};
use crate::db::DbPool;
use crate::models::{
    Ingredient, NewAuthToken, NewIngredient, NewRecipe, NewTag, NewUser, Recipe,
    RecipeChangeset, RecipeIngredient, RecipeTag, RecipeWithLinks, Tag, User, UserChanges,
};
use crate::schema::{
    auth_tokens, ingredients, recipe_ingredients, recipe_tags, recipes, tags, users,
};

type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Diesel-backed store on a Postgres connection pool.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PgPooledConnection, StoreError> {
        Ok(self.pool.get()?)
    }
}

fn user_write_error(e: DieselError) -> StoreError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::DuplicateEmail
        }
        e => e.into(),
    }
}

/// Ids from `requested` that are not owned by `owner`.
fn missing_ids(requested: &[i64], found: &[i64]) -> Vec<i64> {
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

fn check_owned_tags(conn: &mut PgConnection, owner: i64, ids: &[i64]) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i64> = tags::table
        .filter(tags::user_id.eq(owner))
        .filter(tags::id.eq_any(ids))
        .select(tags::id)
        .load(conn)?;

    let missing = missing_ids(ids, &found);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::UnknownIds {
            field: "tags",
            ids: missing,
        })
    }
}

fn check_owned_ingredients(
    conn: &mut PgConnection,
    owner: i64,
    ids: &[i64],
) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i64> = ingredients::table
        .filter(ingredients::user_id.eq(owner))
        .filter(ingredients::id.eq_any(ids))
        .select(ingredients::id)
        .load(conn)?;

    let missing = missing_ids(ids, &found);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::UnknownIds {
            field: "ingredients",
            ids: missing,
        })
    }
}

fn replace_tags(conn: &mut PgConnection, recipe_id: i64, ids: &[i64]) -> Result<(), StoreError> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    if !ids.is_empty() {
        let rows: Vec<RecipeTag> = ids
            .iter()
            .map(|&tag_id| RecipeTag { recipe_id, tag_id })
            .collect();
        diesel::insert_into(recipe_tags::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(())
}

fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: i64,
    ids: &[i64],
) -> Result<(), StoreError> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    if !ids.is_empty() {
        let rows: Vec<RecipeIngredient> = ids
            .iter()
            .map(|&ingredient_id| RecipeIngredient {
                recipe_id,
                ingredient_id,
            })
            .collect();
        diesel::insert_into(recipe_ingredients::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(())
}

/// Load tags and ingredients for a batch of recipes in two queries.
fn attach_links(
    conn: &mut PgConnection,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeWithLinks>, StoreError> {
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

    let tag_rows: Vec<(i64, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&ids))
        .order(tags::id.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;

    let ingredient_rows: Vec<(i64, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&ids))
        .order(ingredients::id.asc())
        .select((recipe_ingredients::recipe_id, Ingredient::as_select()))
        .load(conn)?;

    let mut tags_by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut ingredients_by_recipe: HashMap<i64, Vec<Ingredient>> = HashMap::new();
    for (recipe_id, ingredient) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(ingredient);
    }

    Ok(recipes
        .into_iter()
        .map(|recipe| RecipeWithLinks {
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect())
}

fn load_owned_recipe(
    conn: &mut PgConnection,
    owner: i64,
    id: i64,
) -> Result<RecipeWithLinks, StoreError> {
    let recipe: Recipe = recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::user_id.eq(owner))
        .select(Recipe::as_select())
        .first(conn)?;

    attach_links(conn, vec![recipe])?
        .pop()
        .ok_or(StoreError::NotFound)
}

impl Store for PgStore {
    fn create_user(&self, new_user: &NewUser<'_>) -> Result<User, StoreError> {
        let mut conn = self.conn()?;

        diesel::insert_into(users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(user_write_error)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn()?;

        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn update_user(&self, user_id: i64, changes: &UserChanges) -> Result<User, StoreError> {
        let mut conn = self.conn()?;

        // An empty changeset is an error in diesel, so just reload.
        if changes.is_empty() {
            return Ok(users::table
                .find(user_id)
                .select(User::as_select())
                .first(&mut conn)?);
        }

        diesel::update(users::table.find(user_id))
            .set(changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(user_write_error)
    }

    fn create_token(&self, user_id: i64, token_hash: &str) -> Result<(), StoreError> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            diesel::insert_into(auth_tokens::table)
                .values(NewAuthToken {
                    user_id,
                    token_hash,
                })
                .execute(conn)?;

            let keep: Vec<i64> = auth_tokens::table
                .filter(auth_tokens::user_id.eq(user_id))
                .order(auth_tokens::id.desc())
                .limit(MAX_TOKENS_PER_USER as i64)
                .select(auth_tokens::id)
                .load(conn)?;

            let pruned = diesel::delete(
                auth_tokens::table
                    .filter(auth_tokens::user_id.eq(user_id))
                    .filter(auth_tokens::id.ne_all(keep)),
            )
            .execute(conn)?;

            if pruned > 0 {
                tracing::debug!(user_id, pruned, "Pruned old auth tokens");
            }
            Ok(())
        })
    }

    fn find_user_by_token(&self, token_hash: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn()?;

        Ok(auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token_hash.eq(token_hash))
            .filter(users::is_active.eq(true))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn list_tags(&self, owner: i64, assigned_only: bool) -> Result<Vec<Tag>, StoreError> {
        let mut conn = self.conn()?;

        let mut query = tags::table.filter(tags::user_id.eq(owner)).into_boxed();

        if assigned_only {
            query = query.filter(tags::id.eq_any(recipe_tags::table.select(recipe_tags::tag_id)));
        }

        Ok(query
            .order((tags::name.desc(), tags::id.asc()))
            .select(Tag::as_select())
            .load(&mut conn)?)
    }

    fn create_tag(&self, owner: i64, name: &str) -> Result<Tag, StoreError> {
        let mut conn = self.conn()?;

        Ok(diesel::insert_into(tags::table)
            .values(NewTag {
                user_id: owner,
                name,
            })
            .returning(Tag::as_returning())
            .get_result(&mut conn)?)
    }

    fn list_ingredients(
        &self,
        owner: i64,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, StoreError> {
        let mut conn = self.conn()?;

        let mut query = ingredients::table
            .filter(ingredients::user_id.eq(owner))
            .into_boxed();

        if assigned_only {
            query = query.filter(
                ingredients::id
                    .eq_any(recipe_ingredients::table.select(recipe_ingredients::ingredient_id)),
            );
        }

        Ok(query
            .order((ingredients::name.desc(), ingredients::id.asc()))
            .select(Ingredient::as_select())
            .load(&mut conn)?)
    }

    fn create_ingredient(&self, owner: i64, name: &str) -> Result<Ingredient, StoreError> {
        let mut conn = self.conn()?;

        Ok(diesel::insert_into(ingredients::table)
            .values(NewIngredient {
                user_id: owner,
                name,
            })
            .returning(Ingredient::as_returning())
            .get_result(&mut conn)?)
    }

    fn list_recipes(
        &self,
        owner: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeWithLinks>, StoreError> {
        let mut conn = self.conn()?;

        let mut query = recipes::table
            .filter(recipes::user_id.eq(owner))
            .into_boxed();

        if let Some(tag_ids) = &filter.tags {
            query = query.filter(
                recipes::id.eq_any(
                    recipe_tags::table
                        .filter(recipe_tags::tag_id.eq_any(tag_ids.clone()))
                        .select(recipe_tags::recipe_id),
                ),
            );
        }

        if let Some(ingredient_ids) = &filter.ingredients {
            query = query.filter(
                recipes::id.eq_any(
                    recipe_ingredients::table
                        .filter(recipe_ingredients::ingredient_id.eq_any(ingredient_ids.clone()))
                        .select(recipe_ingredients::recipe_id),
                ),
            );
        }

        let rows: Vec<Recipe> = query
            .order(recipes::id.desc())
            .select(Recipe::as_select())
            .load(&mut conn)?;

        attach_links(&mut conn, rows)
    }

    fn get_recipe(&self, owner: i64, id: i64) -> Result<RecipeWithLinks, StoreError> {
        let mut conn = self.conn()?;
        load_owned_recipe(&mut conn, owner, id)
    }

    fn create_recipe(
        &self,
        owner: i64,
        fields: &NewRecipeFields,
    ) -> Result<RecipeWithLinks, StoreError> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            check_owned_tags(conn, owner, &fields.tags)?;
            check_owned_ingredients(conn, owner, &fields.ingredients)?;

            let recipe_id: i64 = diesel::insert_into(recipes::table)
                .values(NewRecipe {
                    user_id: owner,
                    title: &fields.title,
                    time_minutes: fields.time_minutes,
                    price: fields.price,
                    link: fields.link.as_deref(),
                })
                .returning(recipes::id)
                .get_result(conn)?;

            replace_tags(conn, recipe_id, &fields.tags)?;
            replace_ingredients(conn, recipe_id, &fields.ingredients)?;

            load_owned_recipe(conn, owner, recipe_id)
        })
    }

    fn update_recipe(
        &self,
        owner: i64,
        id: i64,
        patch: &RecipePatch,
    ) -> Result<RecipeWithLinks, StoreError> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let recipe_id: i64 = recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(owner))
                .select(recipes::id)
                .for_update()
                .first(conn)?;

            if let Some(tag_ids) = patch.tags.ids() {
                check_owned_tags(conn, owner, tag_ids)?;
            }
            if let Some(ingredient_ids) = patch.ingredients.ids() {
                check_owned_ingredients(conn, owner, ingredient_ids)?;
            }

            if patch.has_scalar_changes() {
                diesel::update(recipes::table.find(recipe_id))
                    .set(RecipeChangeset {
                        title: patch.title.as_deref(),
                        time_minutes: patch.time_minutes,
                        price: patch.price,
                        link: patch.link.as_ref().map(|link| link.as_deref()),
                    })
                    .execute(conn)?;
            }

            if let Some(tag_ids) = patch.tags.ids() {
                replace_tags(conn, recipe_id, tag_ids)?;
            }
            if let Some(ingredient_ids) = patch.ingredients.ids() {
                replace_ingredients(conn, recipe_id, ingredient_ids)?;
            }

            load_owned_recipe(conn, owner, recipe_id)
        })
    }

    fn delete_recipe(&self, owner: i64, id: i64) -> Result<Recipe, StoreError> {
        let mut conn = self.conn()?;

        // Link rows go with the recipe via ON DELETE CASCADE.
        Ok(diesel::delete(
            recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(owner)),
        )
        .returning(Recipe::as_returning())
        .get_result(&mut conn)?)
    }

    fn set_recipe_image(
        &self,
        owner: i64,
        id: i64,
        image: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn()?;

        conn.transaction(|conn| {
            let previous: Option<String> = recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(owner))
                .select(recipes::image)
                .for_update()
                .first(conn)?;

            diesel::update(recipes::table.find(id))
                .set(recipes::image.eq(Some(image)))
                .execute(conn)?;

            Ok(previous)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ids() {
        assert_eq!(missing_ids(&[1, 2, 3], &[3, 1]), vec![2]);
        assert!(missing_ids(&[1], &[1]).is_empty());
    }
}
