//! # Recipe Pre-filters
//!
//! Caller-side filters applied to the corpus before it reaches the search
//! engine. The scorer itself never filters on diet or season.
//!
//! Both filters look for ingredients with the same whole-word, plural-tolerant
//! matching as recipe search, so `"lardon"` excludes a recipe listing
//! `"200 g lardons"` but `"lard"` does not.

use crate::errors::{AppError, AppResult};
use crate::ingredient_parser::split_clauses;
use crate::recipe::Recipe;
use crate::search::RecipeSearchScorer;
use crate::text_processing::normalize;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Filter applied to a recipe list before searching
pub trait RecipeFilter {
    /// Whether a recipe is kept
    fn accepts(&self, recipe: &Recipe) -> bool;

    /// Short label for logs
    fn label(&self) -> String;

    /// Keep the accepted recipes, preserving order
    fn filter(&self, recipes: Vec<Recipe>) -> Vec<Recipe> {
        let before = recipes.len();
        let kept: Vec<Recipe> = recipes
            .into_iter()
            .filter(|recipe| self.accepts(recipe))
            .collect();
        debug!(
            filter = %self.label(),
            before,
            after = kept.len(),
            "Recipe filter applied"
        );
        kept
    }
}

/// Meat and fish
const MEAT_AND_FISH: &[&str] = &[
    "viande", "poulet", "boeuf", "veau", "porc", "agneau", "canard", "dinde", "lapin", "lardons",
    "jambon", "bacon", "saucisse", "chorizo", "poisson", "saumon", "thon", "cabillaud",
    "crevette", "moule", "anchois", "gelatine", "meat", "chicken", "beef", "pork", "lamb",
    "turkey", "fish", "salmon", "tuna", "shrimp", "ham", "sausage",
];

/// Animal products other than meat and fish
const ANIMAL_PRODUCTS: &[&str] = &[
    "lait", "beurre", "creme", "fromage", "oeuf", "yaourt", "miel", "gruyere", "parmesan",
    "mozzarella", "emmental", "mascarpone", "milk", "butter", "cream", "cheese", "egg",
    "yogurt", "honey",
];

/// Gluten sources
const GLUTEN_SOURCES: &[&str] = &[
    "farine", "ble", "pain", "pates", "spaghetti", "semoule", "couscous", "chapelure", "orge",
    "seigle", "biscuit", "pate brisee", "pate feuilletee", "pate sablee", "flour", "wheat",
    "bread", "pasta", "noodle", "barley", "rye", "breadcrumb",
];

/// Clause markers that exempt a clause from the gluten check
const GLUTEN_FREE_MARKERS: &[&str] = &["sans gluten", "gluten free"];

/// Supported diets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diet {
    Vegetarian,
    Vegan,
    GlutenFree,
}

impl Diet {
    /// Ingredients that rule a recipe out for this diet
    pub fn excluded_ingredients(&self) -> Vec<&'static str> {
        match self {
            Diet::Vegetarian => MEAT_AND_FISH.to_vec(),
            Diet::Vegan => MEAT_AND_FISH
                .iter()
                .chain(ANIMAL_PRODUCTS.iter())
                .copied()
                .collect(),
            Diet::GlutenFree => GLUTEN_SOURCES.to_vec(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Vegetarian => "vegetarian",
            Diet::Vegan => "vegan",
            Diet::GlutenFree => "gluten-free",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Diet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "vegetarian" | "vegetarien" | "vegetarienne" => Ok(Diet::Vegetarian),
            "vegan" | "vegane" | "vegetalien" => Ok(Diet::Vegan),
            "gluten free" | "glutenfree" | "sans gluten" => Ok(Diet::GlutenFree),
            _ => Err(AppError::Validation(format!(
                "unknown diet '{}', expected vegetarian, vegan or gluten-free",
                s
            ))),
        }
    }
}

/// Excludes recipes containing ingredients incompatible with any of its diets
#[derive(Debug, Clone)]
pub struct DietaryFilter<'p> {
    diets: Vec<Diet>,
    scorer: RecipeSearchScorer<'p>,
}

impl DietaryFilter<'static> {
    pub fn new(diets: Vec<Diet>) -> Self {
        Self {
            diets,
            scorer: RecipeSearchScorer::default(),
        }
    }
}

impl<'p> DietaryFilter<'p> {
    /// Filter sharing a scorer compiled for a custom vocabulary
    pub fn with_scorer(diets: Vec<Diet>, scorer: RecipeSearchScorer<'p>) -> Self {
        Self { diets, scorer }
    }

    pub fn diets(&self) -> &[Diet] {
        &self.diets
    }

    fn violates(&self, diet: Diet, recipe: &Recipe) -> bool {
        let checked = match diet {
            Diet::GlutenFree => without_gluten_free_clauses(recipe),
            _ => recipe.clone(),
        };
        diet.excluded_ingredients()
            .iter()
            .any(|ingredient| self.scorer.recipe_mentions(&checked, ingredient))
    }
}

/// Copy of a recipe without the clauses explicitly marked gluten-free
fn without_gluten_free_clauses(recipe: &Recipe) -> Recipe {
    let kept: Vec<&str> = split_clauses(&recipe.ingredients_text)
        .into_iter()
        .filter(|clause| {
            let normalized = normalize(clause);
            !GLUTEN_FREE_MARKERS
                .iter()
                .any(|marker| normalized.contains(marker))
        })
        .collect();

    let mut checked = recipe.clone();
    checked.ingredients_text = kept.join(";");
    checked
}

impl RecipeFilter for DietaryFilter<'_> {
    fn accepts(&self, recipe: &Recipe) -> bool {
        self.diets.iter().all(|diet| !self.violates(*diet, recipe))
    }

    fn label(&self) -> String {
        let diets: Vec<&str> = self.diets.iter().map(Diet::as_str).collect();
        format!("diet[{}]", diets.join(","))
    }
}

/// Produce with its months in season (1 = January)
const PRODUCE_CALENDAR: &[(&str, &[u32])] = &[
    ("asperge", &[4, 5, 6]),
    ("rhubarbe", &[4, 5, 6]),
    ("petits pois", &[5, 6, 7]),
    ("fraise", &[5, 6, 7]),
    ("cerise", &[6, 7]),
    ("abricot", &[6, 7, 8]),
    ("framboise", &[6, 7, 8, 9]),
    ("tomate", &[6, 7, 8, 9]),
    ("courgette", &[6, 7, 8, 9]),
    ("aubergine", &[6, 7, 8, 9]),
    ("peche", &[6, 7, 8, 9]),
    ("melon", &[6, 7, 8, 9]),
    ("poivron", &[7, 8, 9]),
    ("figue", &[8, 9, 10]),
    ("potiron", &[9, 10, 11, 12, 1]),
    ("potimarron", &[9, 10, 11, 12, 1]),
    ("chataigne", &[10, 11, 12]),
    ("clementine", &[11, 12, 1, 2]),
    ("endive", &[10, 11, 12, 1, 2, 3, 4]),
    ("poireau", &[9, 10, 11, 12, 1, 2, 3, 4]),
    ("asparagus", &[4, 5, 6]),
    ("strawberry", &[5, 6, 7]),
    ("tomato", &[6, 7, 8, 9]),
    ("zucchini", &[6, 7, 8, 9]),
    ("pumpkin", &[9, 10, 11, 12, 1]),
];

/// Excludes recipes using produce that is out of season in a given month
#[derive(Debug, Clone)]
pub struct SeasonalFilter<'p> {
    month: u32,
    scorer: RecipeSearchScorer<'p>,
}

impl SeasonalFilter<'static> {
    /// Filter for a month in `1..=12`
    pub fn for_month(month: u32) -> AppResult<Self> {
        SeasonalFilter::with_scorer(month, RecipeSearchScorer::default())
    }

    /// Filter for the current local month
    pub fn current() -> Self {
        Self {
            month: Local::now().month(),
            scorer: RecipeSearchScorer::default(),
        }
    }
}

impl<'p> SeasonalFilter<'p> {
    /// Filter sharing a scorer compiled for a custom vocabulary
    pub fn with_scorer(month: u32, scorer: RecipeSearchScorer<'p>) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { month, scorer })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Produce out of season this month
    pub fn out_of_season(&self) -> Vec<&'static str> {
        PRODUCE_CALENDAR
            .iter()
            .filter(|(_, months)| !months.contains(&self.month))
            .map(|(produce, _)| *produce)
            .collect()
    }
}

impl RecipeFilter for SeasonalFilter<'_> {
    fn accepts(&self, recipe: &Recipe) -> bool {
        !self
            .out_of_season()
            .iter()
            .any(|produce| self.scorer.recipe_mentions(recipe, produce))
    }

    fn label(&self) -> String {
        format!("season[month={}]", self.month)
    }
}
