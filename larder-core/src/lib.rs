pub mod account;
pub mod error;
pub mod image;
pub mod recipe;

pub use account::{normalize_email, validate_email, validate_password, ProfileChanges, Signup};
pub use error::ValidationError;
pub use image::{recipe_image_path, validate_image, ImageError, ValidatedImage, MAX_FILE_SIZE};
pub use recipe::{
    parse_id_list, validate_item_name, AssociationUpdate, NewRecipeFields, RecipeInput,
    RecipePatch, UpdateMode,
};
