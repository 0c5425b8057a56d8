//! # JustRecipes
//!
//! Core of a French recipe assistant: a free-text ingredient matching engine
//! that ranks recipes for the ingredients a user types, and a shopping-list
//! engine that merges the ingredients of selected recipes into one
//! quantity-summed list.

pub mod config;
pub mod errors;
pub mod filters;
pub mod ingredient_parser;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod random_source;
pub mod recipe;
pub mod search;
pub mod shopping_list;
pub mod text_processing;

// Re-export types for easier access
pub use errors::{AppError, AppResult};
pub use filters::{Diet, DietaryFilter, RecipeFilter, SeasonalFilter};
pub use ingredient_parser::{parse_ingredient, IngredientParser, ParsedIngredient};
pub use random_source::{RandomSource, RngSource};
pub use recipe::{Recipe, RecipeKind, RecipeRepository};
pub use search::{
    featured_recipes, parse_query, search, RecipeSearchScorer, ScoredRecipe, SearchLimit,
    SearchTerm,
};
pub use shopping_list::{aggregate, export_plain_text, format_item, ShoppingListItem};
pub use text_processing::normalize;
