//! Recipe write rules.
//!
//! A recipe payload is validated differently depending on how it is applied:
//!
//! - create: `title` is required, `time_minutes` and `price` default to zero,
//!   missing `tags`/`ingredients` mean "no links".
//! - partial update: only supplied fields change; a missing `tags` or
//!   `ingredients` key leaves the existing links untouched.
//! - full update: `title`, `time_minutes` and `price` are required; a missing
//!   `link` resets it and a missing `tags` or `ingredients` key clears the set.

use rust_decimal::Decimal;

use crate::error::{ValidationError, BLANK, REQUIRED};

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_LINK_LENGTH: usize = 255;
pub const PRICE_DECIMAL_PLACES: u32 = 2;
pub const PRICE_MAX_DIGITS: u32 = 5;

/// How an update payload is applied to an existing recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// PATCH: absent fields are left as they are.
    Partial,
    /// PUT: the payload replaces the writable state of the recipe.
    Full,
}

/// What to do with one association set (tags or ingredients) of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationUpdate {
    Keep,
    Replace(Vec<i64>),
}

impl AssociationUpdate {
    /// Resolve a possibly-absent id list for the given update mode.
    ///
    /// A supplied list always replaces the set (an empty list clears it). An
    /// absent list keeps the set on partial update and clears it on full update.
    pub fn resolve(mode: UpdateMode, supplied: Option<Vec<i64>>) -> Self {
        match (mode, supplied) {
            (_, Some(ids)) => AssociationUpdate::Replace(dedup_ids(ids)),
            (UpdateMode::Partial, None) => AssociationUpdate::Keep,
            (UpdateMode::Full, None) => AssociationUpdate::Replace(Vec::new()),
        }
    }

    pub fn ids(&self) -> Option<&[i64]> {
        match self {
            AssociationUpdate::Keep => None,
            AssociationUpdate::Replace(ids) => Some(ids),
        }
    }
}

/// Remove duplicates while keeping first-seen order.
fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Raw recipe fields as received from a client. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

/// Validated fields for a new recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipeFields {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

/// Validated changes to an existing recipe. `None` scalars are left as is;
/// `link: Some(None)` clears the link.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tags: AssociationUpdate,
    pub ingredients: AssociationUpdate,
}

impl RecipePatch {
    pub fn has_scalar_changes(&self) -> bool {
        self.title.is_some()
            || self.time_minutes.is_some()
            || self.price.is_some()
            || self.link.is_some()
    }
}

impl RecipeInput {
    pub fn into_new(self) -> Result<NewRecipeFields, ValidationError> {
        let mut errors = ValidationError::new();

        let title = collect(&mut errors, validate_title(self.title, true));
        let time_minutes = collect(&mut errors, check_time(self.time_minutes, false));
        let price = collect(&mut errors, check_price(self.price, false));
        let link = collect(&mut errors, validate_link(self.link));

        errors.into_result()?;

        Ok(NewRecipeFields {
            title: title.flatten().unwrap_or_default(),
            time_minutes: time_minutes.flatten().unwrap_or(0),
            price: price.flatten().unwrap_or_else(zero_price),
            link: link.flatten(),
            tags: dedup_ids(self.tags.unwrap_or_default()),
            ingredients: dedup_ids(self.ingredients.unwrap_or_default()),
        })
    }

    pub fn into_patch(self, mode: UpdateMode) -> Result<RecipePatch, ValidationError> {
        let required = mode == UpdateMode::Full;
        let mut errors = ValidationError::new();

        let title = collect(&mut errors, validate_title(self.title, required));
        let time_minutes = collect(&mut errors, check_time(self.time_minutes, required));
        let price = collect(&mut errors, check_price(self.price, required));
        let link = match (mode, self.link) {
            (UpdateMode::Partial, None) => None,
            (_, link) => collect(&mut errors, validate_link(link)),
        };

        errors.into_result()?;

        Ok(RecipePatch {
            title: title.flatten(),
            time_minutes: time_minutes.flatten(),
            price: price.flatten(),
            link,
            tags: AssociationUpdate::resolve(mode, self.tags),
            ingredients: AssociationUpdate::resolve(mode, self.ingredients),
        })
    }
}

fn collect<T>(errors: &mut ValidationError, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.merge(e);
            None
        }
    }
}

fn zero_price() -> Decimal {
    Decimal::new(0, PRICE_DECIMAL_PLACES)
}

fn validate_title(
    title: Option<String>,
    required: bool,
) -> Result<Option<String>, ValidationError> {
    let Some(title) = title else {
        return if required {
            Err(ValidationError::field("title", REQUIRED))
        } else {
            Ok(None)
        };
    };

    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::field("title", BLANK));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::field(
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_LENGTH} characters."),
        ));
    }

    Ok(Some(title.to_string()))
}

fn check_time(time: Option<i32>, required: bool) -> Result<Option<i32>, ValidationError> {
    match time {
        None if required => Err(ValidationError::field("time_minutes", REQUIRED)),
        None => Ok(None),
        Some(minutes) if minutes < 0 => Err(ValidationError::field(
            "time_minutes",
            "Ensure this value is greater than or equal to 0.",
        )),
        Some(minutes) => Ok(Some(minutes)),
    }
}

fn check_price(price: Option<Decimal>, required: bool) -> Result<Option<Decimal>, ValidationError> {
    match price {
        None if required => Err(ValidationError::field("price", REQUIRED)),
        None => Ok(None),
        Some(price) => validate_price(price).map(Some),
    }
}

/// Check a price fits `NUMERIC(5, 2)` and return it with exactly two
/// fraction digits.
pub fn validate_price(price: Decimal) -> Result<Decimal, ValidationError> {
    let mut price = price.normalize();

    if price.scale() > PRICE_DECIMAL_PLACES {
        return Err(ValidationError::field(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        ));
    }

    price.rescale(PRICE_DECIMAL_PLACES);

    let limit = Decimal::from(10i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if price.abs() >= limit {
        return Err(ValidationError::field(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        ));
    }

    Ok(price)
}

fn validate_link(link: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(link) = link else {
        return Ok(None);
    };

    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(ValidationError::field(
            "link",
            format!("Ensure this field has no more than {MAX_LINK_LENGTH} characters."),
        ));
    }

    Ok(Some(link.to_string()))
}

/// Validate the name of a new tag or ingredient.
pub fn validate_item_name(name: Option<&str>) -> Result<String, ValidationError> {
    let name = name
        .map(str::trim)
        .ok_or_else(|| ValidationError::field("name", REQUIRED))?;

    if name.is_empty() {
        return Err(ValidationError::field("name", BLANK));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::field(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        ));
    }

    Ok(name.to_string())
}

/// Parse a comma-separated id list such as `"1,2, 3"` from a query string.
///
/// Empty segments are ignored and duplicates removed, so `""` yields an empty
/// list.
pub fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i64>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment.parse::<i64>().map_err(|_| {
                ValidationError::field(field, format!("\"{segment}\" is not a valid id."))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(dedup_ids)
}
