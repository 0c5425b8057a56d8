//! # Recipe Model and Repository
//!
//! Recipes are read-only inputs owned by an external repository. The engines
//! receive their corpus as an explicit argument; nothing here caches recipes.

use crate::errors::{error_logging, AppError, AppResult};
use crate::ingredient_parser::split_clauses;
use crate::text_processing::normalize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Normalized vocabulary identifying sweet recipe types ("sucré", "sucrée", "dessert")
const SWEET_TYPE_WORDS: [&str; 3] = ["sucre", "dessert", "sweet"];
/// Normalized vocabulary identifying savory recipe types ("salé", "salée", "plat")
const SAVORY_TYPE_WORDS: [&str; 4] = ["sale", "savory", "savoury", "plat"];

/// A recipe record as stored by the recipe repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// Clauses joined by `;`
    pub ingredients_text: String,
    /// Free text, e.g. "sucré", "Salée", "dessert"
    #[serde(rename = "type", default)]
    pub recipe_type: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub prep_time_minutes: u32,
    #[serde(default)]
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Recipe {
    /// Minimal recipe with only the fields the engines read
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ingredients_text: impl Into<String>,
        recipe_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ingredients_text: ingredients_text.into(),
            recipe_type: recipe_type.into(),
            difficulty: String::new(),
            prep_time_minutes: 0,
            servings: 0,
            calories: None,
            image_ref: None,
        }
    }

    /// Sweet, savory or other, from the free-text type
    pub fn kind(&self) -> RecipeKind {
        RecipeKind::from_type_text(&self.recipe_type)
    }

    /// Raw ingredient clauses
    pub fn clauses(&self) -> Vec<&str> {
        split_clauses(&self.ingredients_text)
    }

    /// Validate a record coming from an external source
    pub fn validate(&self) -> AppResult<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("recipe id cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "recipe '{}' has an empty name",
                self.id
            )));
        }
        Ok(())
    }
}

/// Coarse recipe category used by the type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
    Sweet,
    Savory,
    Other,
}

impl RecipeKind {
    /// Classify a free-text type by substring match on its normalized form
    pub fn from_type_text(type_text: &str) -> Self {
        let normalized = normalize(type_text);
        if SWEET_TYPE_WORDS.iter().any(|w| normalized.contains(w)) {
            RecipeKind::Sweet
        } else if SAVORY_TYPE_WORDS.iter().any(|w| normalized.contains(w)) {
            RecipeKind::Savory
        } else {
            RecipeKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeKind::Sweet => "sweet",
            RecipeKind::Savory => "savory",
            RecipeKind::Other => "other",
        }
    }
}

impl std::str::FromStr for RecipeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match RecipeKind::from_type_text(s) {
            RecipeKind::Other => Err(AppError::Validation(format!(
                "unknown recipe type '{}', expected sweet or savory",
                s
            ))),
            kind => Ok(kind),
        }
    }
}

/// Source of the recipe corpus. No ordering guarantee.
pub trait RecipeRepository {
    fn list_all(&self) -> AppResult<Vec<Recipe>>;
}

/// Repository over recipes already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeRepository {
    recipes: Vec<Recipe>,
}

impl InMemoryRecipeRepository {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

impl RecipeRepository for InMemoryRecipeRepository {
    fn list_all(&self) -> AppResult<Vec<Recipe>> {
        Ok(self.recipes.clone())
    }
}

/// Repository reading a JSON array of recipes from disk on every call
#[derive(Debug, Clone)]
pub struct JsonRecipeRepository {
    path: PathBuf,
}

impl JsonRecipeRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecipeRepository for JsonRecipeRepository {
    fn list_all(&self) -> AppResult<Vec<Recipe>> {
        let path_str = self.path.display().to_string();
        debug!(path = %path_str, "Reading recipe corpus");

        let content = fs::read_to_string(&self.path).map_err(|e| {
            error_logging::log_filesystem_error(&e, "read_recipes", Some(&path_str), None);
            AppError::FileSystem(format!("cannot read recipes from '{}': {}", path_str, e))
        })?;

        let recipes: Vec<Recipe> = serde_json::from_str(&content).map_err(|e| {
            error_logging::log_repository_error(&e, "parse_recipes", Some(&path_str), None);
            AppError::Repository(format!("invalid recipe file '{}': {}", path_str, e))
        })?;

        for recipe in &recipes {
            recipe.validate().map_err(|e| {
                error_logging::log_validation_error(
                    &e,
                    "validate_recipe",
                    "recipe",
                    Some(&recipe.id),
                );
                e
            })?;
        }

        info!(path = %path_str, recipes = recipes.len(), "Loaded recipe corpus");
        Ok(recipes)
    }
}

/// Select recipes by id, keeping the order of `ids`; unknown ids are skipped
pub fn select_by_ids(corpus: &[Recipe], ids: &[String]) -> Vec<Recipe> {
    ids.iter()
        .filter_map(|id| corpus.iter().find(|recipe| &recipe.id == id).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_recipe_kind_from_free_text() {
        assert_eq!(RecipeKind::from_type_text("sucré"), RecipeKind::Sweet);
        assert_eq!(RecipeKind::from_type_text("Sucrée"), RecipeKind::Sweet);
        assert_eq!(RecipeKind::from_type_text("Dessert"), RecipeKind::Sweet);
        assert_eq!(RecipeKind::from_type_text("salé"), RecipeKind::Savory);
        assert_eq!(RecipeKind::from_type_text("Plat principal"), RecipeKind::Savory);
        assert_eq!(RecipeKind::from_type_text("boisson"), RecipeKind::Other);
        assert_eq!(RecipeKind::from_type_text(""), RecipeKind::Other);
    }

    #[test]
    fn test_recipe_kind_from_str() {
        assert_eq!("sweet".parse::<RecipeKind>().unwrap(), RecipeKind::Sweet);
        assert_eq!("savory".parse::<RecipeKind>().unwrap(), RecipeKind::Savory);
        assert!("boisson".parse::<RecipeKind>().is_err());
    }

    #[test]
    fn test_recipe_json_wire_names() {
        let json = r#"{
            "id": "r1",
            "name": "Salade de tomates",
            "ingredientsText": "2 tomates;sel",
            "type": "salé",
            "prepTimeMinutes": 10,
            "servings": 2
        }"#;
        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.ingredients_text, "2 tomates;sel");
        assert_eq!(recipe.kind(), RecipeKind::Savory);
        assert_eq!(recipe.prep_time_minutes, 10);
        assert_eq!(recipe.calories, None);
        assert_eq!(recipe.clauses(), vec!["2 tomates", "sel"]);
    }

    #[test]
    fn test_json_repository() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"a","name":"Crêpes","ingredientsText":"250 g farine;4 œufs","type":"sucré"}}]"#
        )
        .unwrap();

        let repository = JsonRecipeRepository::new(file.path());
        let recipes = repository.list_all().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].name, "Crêpes");
    }

    #[test]
    fn test_json_repository_errors() {
        let missing = JsonRecipeRepository::new("/nonexistent/recipes.json");
        assert!(matches!(missing.list_all(), Err(AppError::FileSystem(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let broken = JsonRecipeRepository::new(file.path());
        assert!(matches!(broken.list_all(), Err(AppError::Repository(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id":"","name":"x","ingredientsText":""}}]"#).unwrap();
        let invalid = JsonRecipeRepository::new(file.path());
        assert!(matches!(invalid.list_all(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_select_by_ids() {
        let corpus = vec![
            Recipe::new("a", "A", "", ""),
            Recipe::new("b", "B", "", ""),
        ];
        let ids = ["b".to_string(), "zz".to_string(), "a".to_string()];
        let selected = select_by_ids(&corpus, &ids);
        let names: Vec<&str> = selected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
