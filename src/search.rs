//! # Recipe Search Module
//!
//! Ranks recipes against a list of free-text ingredient terms.
//!
//! ## Matching
//!
//! For each term, a recipe matches when, in order:
//!
//! 1. the term appears as an exact whole-word phrase in the recipe's full
//!    normalized ingredient text;
//! 2. the term appears, allowing a plural suffix on each word, in a clause's
//!    core name or full normalized clause (`"tomate"` finds `"2 tomates"`, but
//!    `"pomme"` does not find `"pommes de terre"`);
//! 3. for multi-word terms, every content word appears in the same clause.
//!
//! ## Scoring
//!
//! With `m` matched terms out of `n`:
//!
//! ```text
//! score = m + (m > 1 ? 0.5 * m : 0) + (m == n && n > 1 ? 5 : 0)
//! ```
//!
//! Results are ordered by score, then number of matched terms, then name
//! (case-insensitive), then id.

use crate::errors::{AppError, AppResult};
use crate::ingredient_parser::{default_parser, split_clauses, IngredientParser};
use crate::random_source::{sample, shuffle, RandomSource};
use crate::recipe::{Recipe, RecipeKind};
use crate::text_processing::{
    contains_exact_phrase, match_key, matches_all_words, matches_inflected_phrase,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Default cap on returned results
pub const DEFAULT_MAX_RESULTS: usize = 8;
/// Default size of a type-only browse sample
pub const DEFAULT_BROWSE_SAMPLE_SIZE: usize = 8;

lazy_static! {
    static ref QUERY_SEPARATORS: Regex =
        Regex::new(r"(?i)[,;+/\n]|\b(?:et|and)\b")
            .expect("Query separator pattern should be valid");
}

/// A normalized ingredient term from user input.
///
/// Stored in matching form: hyphenated compounds are joined (`"chou-fleur"`
/// becomes `"choufleur"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Normalize raw input; `None` when nothing is left
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = match_key(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_multi_word(&self) -> bool {
        self.0.contains(' ')
    }

    /// Multi-word term written as one compound ("chou fleur" -> "choufleur")
    fn joined(&self) -> Option<String> {
        self.is_multi_word().then(|| self.0.replace(' ', ""))
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn raw user input into an ordered, de-duplicated term list.
///
/// ```rust
/// use just_recipes::search::parse_query;
///
/// let terms = parse_query("Riz, poulet et Épinards");
/// let terms: Vec<&str> = terms.iter().map(|t| t.as_str()).collect();
/// assert_eq!(terms, vec!["riz", "poulet", "epinards"]);
/// ```
pub fn parse_query(raw: &str) -> Vec<SearchTerm> {
    let terms: Vec<SearchTerm> = QUERY_SEPARATORS
        .split(raw)
        .filter_map(SearchTerm::new)
        .collect();
    dedup_terms(&terms)
}

/// Build terms from already separated strings (one term per entry)
pub fn terms_from<S: AsRef<str>>(raw_terms: &[S]) -> Vec<SearchTerm> {
    let terms: Vec<SearchTerm> = raw_terms
        .iter()
        .filter_map(|t| SearchTerm::new(t.as_ref()))
        .collect();
    dedup_terms(&terms)
}

fn dedup_terms(terms: &[SearchTerm]) -> Vec<SearchTerm> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .filter(|term| seen.insert(term.as_str().to_string()))
        .cloned()
        .collect()
}

/// A recipe with its relevance for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecipe {
    pub recipe: Recipe,
    pub score: f64,
    pub matched_terms: Vec<SearchTerm>,
}

/// How many results a search returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    /// At most this many results
    Capped(usize),
    /// "See all"
    Unbounded,
}

impl SearchLimit {
    fn apply<T>(&self, items: &mut Vec<T>) {
        if let SearchLimit::Capped(max) = self {
            items.truncate(*max);
        }
    }
}

/// Configuration options for recipe search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cap applied by [`SearchLimit::Capped`] searches built from this config
    pub max_results: usize,
    /// Number of recipes returned by a type-only browse
    pub browse_sample_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            browse_sample_size: DEFAULT_BROWSE_SAMPLE_SIZE,
        }
    }
}

impl SearchConfig {
    /// Validate search configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.max_results == 0 {
            return Err(AppError::Config(
                "max_results must be greater than 0".to_string(),
            ));
        }
        if self.max_results > 500 {
            return Err(AppError::Config(
                "max_results cannot be greater than 500".to_string(),
            ));
        }
        if self.browse_sample_size == 0 {
            return Err(AppError::Config(
                "browse_sample_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The default capped limit for this configuration
    pub fn default_limit(&self) -> SearchLimit {
        SearchLimit::Capped(self.max_results)
    }
}

/// Relevance of a recipe matching `matched` of `total` distinct terms
pub fn relevance_score(matched: usize, total: usize) -> f64 {
    if matched == 0 {
        return 0.0;
    }
    let m = matched as f64;
    let mut score = m;
    if matched > 1 {
        score += 0.5 * m;
    }
    if matched == total && total > 1 {
        score += 5.0;
    }
    score
}

/// Normalized views of one recipe's ingredient text, computed once per search
struct IngredientIndex {
    full_text: String,
    clauses: Vec<ClauseText>,
}

struct ClauseText {
    core_name: String,
    full: String,
}

impl IngredientIndex {
    fn build(parser: &IngredientParser, ingredients_text: &str) -> Self {
        let clauses = split_clauses(ingredients_text)
            .into_iter()
            .map(|clause| ClauseText {
                core_name: match_key(&parser.core_name(clause)),
                full: match_key(clause),
            })
            .collect();

        Self {
            full_text: match_key(ingredients_text),
            clauses,
        }
    }

    fn matches(&self, term: &SearchTerm) -> bool {
        let term = term.as_str();

        if contains_exact_phrase(&self.full_text, term) {
            return true;
        }

        if self.clauses.iter().any(|clause| {
            matches_inflected_phrase(&clause.core_name, term)
                || matches_inflected_phrase(&clause.full, term)
        }) {
            return true;
        }

        false
    }

    fn matches_joined(&self, term: &SearchTerm) -> bool {
        term.joined().is_some_and(|joined| {
            self.clauses
                .iter()
                .any(|clause| matches_inflected_phrase(&clause.full, &joined))
        })
    }

    fn matches_word_by_word(&self, term: &SearchTerm) -> bool {
        if !term.is_multi_word() {
            return false;
        }
        self.matches_joined(term)
            || self
                .clauses
                .iter()
                .any(|clause| matches_all_words(&clause.full, term.as_str()))
    }
}

/// Scores and ranks recipes for ingredient queries
#[derive(Debug, Clone)]
pub struct RecipeSearchScorer<'p> {
    parser: &'p IngredientParser,
    config: SearchConfig,
}

impl RecipeSearchScorer<'static> {
    /// Scorer using the built-in unit vocabulary
    pub fn new(config: SearchConfig) -> Self {
        Self {
            parser: default_parser(),
            config,
        }
    }
}

impl Default for RecipeSearchScorer<'static> {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl<'p> RecipeSearchScorer<'p> {
    /// Scorer using a parser compiled for a custom vocabulary
    pub fn with_parser(parser: &'p IngredientParser, config: SearchConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rank `corpus` against `terms`.
    ///
    /// - `type_filter` keeps only recipes of that kind;
    /// - no terms with a type filter returns a random browse sample, each with score 1;
    /// - no terms and no type filter returns nothing.
    pub fn search(
        &self,
        terms: &[SearchTerm],
        corpus: &[Recipe],
        type_filter: Option<RecipeKind>,
        limit: SearchLimit,
        rng: &mut dyn RandomSource,
    ) -> Vec<ScoredRecipe> {
        let start_time = std::time::Instant::now();
        let terms = dedup_terms(terms);

        let candidates: Vec<&Recipe> = corpus
            .iter()
            .filter(|recipe| type_filter.map_or(true, |kind| recipe.kind() == kind))
            .collect();

        debug!(
            terms = terms.len(),
            corpus = corpus.len(),
            candidates = candidates.len(),
            type_filter = ?type_filter.map(|k| k.as_str()),
            "Searching recipes"
        );

        let results = if terms.is_empty() {
            match type_filter {
                Some(kind) => self.browse(&candidates, kind, limit, rng),
                None => {
                    warn!("Search called without terms nor type filter; returning no results");
                    Vec::new()
                }
            }
        } else {
            let mut scored: Vec<ScoredRecipe> = candidates
                .iter()
                .filter_map(|recipe| self.score_recipe(&terms, recipe))
                .collect();
            rank(&mut scored);
            limit.apply(&mut scored);
            scored
        };

        crate::observability::record_search_metrics(
            if terms.is_empty() { "browse" } else { "terms" },
            start_time.elapsed(),
            terms.len(),
            candidates.len(),
            results.len(),
        );

        info!(
            terms = terms.len(),
            results = results.len(),
            "Recipe search completed"
        );
        results
    }

    /// Random sample of the filtered corpus for category browsing
    fn browse(
        &self,
        candidates: &[&Recipe],
        kind: RecipeKind,
        limit: SearchLimit,
        rng: &mut dyn RandomSource,
    ) -> Vec<ScoredRecipe> {
        let mut pool: Vec<&Recipe> = candidates.to_vec();
        shuffle(&mut pool, rng);
        if let SearchLimit::Capped(_) = limit {
            pool.truncate(self.config.browse_sample_size);
        }

        debug!(kind = kind.as_str(), sampled = pool.len(), "Type-only browse");

        pool.into_iter()
            .map(|recipe| ScoredRecipe {
                recipe: recipe.clone(),
                score: 1.0,
                matched_terms: Vec::new(),
            })
            .collect()
    }

    /// Score one recipe; `None` when no term matches
    pub fn score_recipe(&self, terms: &[SearchTerm], recipe: &Recipe) -> Option<ScoredRecipe> {
        let index = IngredientIndex::build(self.parser, &recipe.ingredients_text);

        let matched_terms: Vec<SearchTerm> = terms
            .iter()
            .filter(|term| index.matches(term) || index.matches_word_by_word(term))
            .cloned()
            .collect();

        if matched_terms.is_empty() {
            trace!(recipe = %recipe.id, "No term matched");
            return None;
        }

        let score = relevance_score(matched_terms.len(), terms.len());
        trace!(
            recipe = %recipe.id,
            matched = matched_terms.len(),
            score,
            "Recipe matched"
        );

        Some(ScoredRecipe {
            recipe: recipe.clone(),
            score,
            matched_terms,
        })
    }

    /// Whether a recipe mentions an ingredient, with the search matching rules
    pub fn recipe_mentions(&self, recipe: &Recipe, ingredient: &str) -> bool {
        match SearchTerm::new(ingredient) {
            Some(term) => {
                let index = IngredientIndex::build(self.parser, &recipe.ingredients_text);
                index.matches(&term) || index.matches_word_by_word(&term)
            }
            None => false,
        }
    }
}

/// Deterministic ordering: score desc, matched terms desc, name asc, id asc
pub fn rank(results: &mut [ScoredRecipe]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.matched_terms.len().cmp(&a.matched_terms.len()))
            .then_with(|| {
                a.recipe
                    .name
                    .to_lowercase()
                    .cmp(&b.recipe.name.to_lowercase())
            })
            .then_with(|| a.recipe.id.cmp(&b.recipe.id))
    });
}

/// Search with the built-in vocabulary and default configuration
pub fn search(
    terms: &[SearchTerm],
    corpus: &[Recipe],
    type_filter: Option<RecipeKind>,
    rng: &mut dyn RandomSource,
) -> Vec<ScoredRecipe> {
    let scorer = RecipeSearchScorer::default();
    let limit = scorer.config().default_limit();
    scorer.search(terms, corpus, type_filter, limit, rng)
}

/// `count` uniformly random recipes for a "featured" section
pub fn featured_recipes(
    corpus: &[Recipe],
    count: usize,
    rng: &mut dyn RandomSource,
) -> Vec<Recipe> {
    let featured = sample(corpus, count, rng);
    debug!(requested = count, returned = featured.len(), "Featured recipes selected");
    featured
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random_source::RngSource;

    fn recipe(id: &str, name: &str, ingredients: &str, kind: &str) -> Recipe {
        Recipe::new(id, name, ingredients, kind)
    }

    fn names(results: &[ScoredRecipe]) -> Vec<&str> {
        results.iter().map(|r| r.recipe.name.as_str()).collect()
    }

    #[test]
    fn test_relevance_score() {
        assert_eq!(relevance_score(0, 3), 0.0);
        assert_eq!(relevance_score(1, 1), 1.0);
        assert_eq!(relevance_score(1, 2), 1.0);
        assert_eq!(relevance_score(2, 2), 8.0);
        assert_eq!(relevance_score(2, 3), 3.0);
        assert_eq!(relevance_score(3, 3), 9.5);
    }

    #[test]
    fn test_parse_query() {
        let terms = parse_query("pomme de terre; Lardons + crème");
        let terms: Vec<&str> = terms.iter().map(|t| t.as_str()).collect();
        assert_eq!(terms, vec!["pomme de terre", "lardons", "creme"]);

        assert!(parse_query("  , ;  ").is_empty());
        assert_eq!(parse_query("riz, RIZ, riz").len(), 1);
    }

    #[test]
    fn test_terms_from_keeps_phrases() {
        let terms = terms_from(&["Sel et poivre", "", "riz"]);
        let terms: Vec<&str> = terms.iter().map(|t| t.as_str()).collect();
        assert_eq!(terms, vec!["sel et poivre", "riz"]);
    }

    #[test]
    fn test_word_boundary_and_plurals() {
        let corpus = vec![recipe("1", "Gratin", "1 kg pommes de terre;crème", "salé")];
        let mut rng = RngSource::seeded(0);

        assert!(search(&terms_from(&["pomme"]), &corpus, None, &mut rng).is_empty());
        assert_eq!(search(&terms_from(&["pommes"]), &corpus, None, &mut rng).len(), 1);
        assert_eq!(
            search(&terms_from(&["pomme de terre"]), &corpus, None, &mut rng).len(),
            1
        );
    }

    #[test]
    fn test_plural_with_complement_matches() {
        let corpus = vec![
            recipe("1", "Poêlée", "250 g champignons de Paris;1 échalote", "salé"),
            recipe("2", "Tomates farcies", "4 tomates à farcir;300 g chair à saucisse", "salé"),
        ];
        let mut rng = RngSource::seeded(0);

        let mushrooms = search(&terms_from(&["champignon"]), &corpus, None, &mut rng);
        assert_eq!(names(&mushrooms), vec!["Poêlée"]);
        let tomatoes = search(&terms_from(&["tomate"]), &corpus, None, &mut rng);
        assert_eq!(names(&tomatoes), vec!["Tomates farcies"]);
    }

    #[test]
    fn test_compound_word_not_matched() {
        let corpus = vec![recipe("1", "Soupe", "1 pear-shaped-squash", "salé")];
        let mut rng = RngSource::seeded(0);
        assert!(search(&terms_from(&["pea"]), &corpus, None, &mut rng).is_empty());
        assert!(search(&terms_from(&["pear"]), &corpus, None, &mut rng).is_empty());
        assert!(search(&terms_from(&["squash"]), &corpus, None, &mut rng).is_empty());
        assert_eq!(
            search(&terms_from(&["pear-shaped-squash"]), &corpus, None, &mut rng).len(),
            1
        );
    }

    #[test]
    fn test_hyphenated_compound_written_with_spaces() {
        let corpus = vec![recipe("1", "Gratin", "1 chou-fleur;50 g gruyère", "salé")];
        let mut rng = RngSource::seeded(0);
        assert!(search(&terms_from(&["chou"]), &corpus, None, &mut rng).is_empty());
        assert_eq!(search(&terms_from(&["chou fleur"]), &corpus, None, &mut rng).len(), 1);
        assert_eq!(search(&terms_from(&["Chou-Fleur"]), &corpus, None, &mut rng).len(), 1);
    }

    #[test]
    fn test_word_by_word_fallback() {
        let corpus = vec![recipe("1", "Purée", "1 kg terre de pommes nouvelles", "salé")];
        let scorer = RecipeSearchScorer::default();
        let scored = scorer.score_recipe(&terms_from(&["nouvelle pomme"]), &corpus[0]);
        assert!(scored.is_some());
    }

    #[test]
    fn test_ranking_prefers_all_terms() {
        let a = recipe("a", "Riz au poulet", "200 g riz;1 poulet", "salé");
        let b = recipe("b", "Riz cantonais", "200 g riz;2 œufs", "salé");
        let mut rng = RngSource::seeded(0);

        let results = search(&terms_from(&["riz", "poulet"]), &[b, a], None, &mut rng);
        assert_eq!(names(&results), vec!["Riz au poulet", "Riz cantonais"]);
        assert_eq!(results[0].score, 8.0);
        assert_eq!(results[1].score, 1.0);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let corpus = vec![
            recipe("1", "tarte", "3 pommes", "sucré"),
            recipe("2", "Compote", "4 pommes", "sucré"),
            recipe("3", "beignets", "2 pommes", "sucré"),
        ];
        let mut rng = RngSource::seeded(0);
        let results = search(&terms_from(&["pomme"]), &corpus, None, &mut rng);
        assert_eq!(names(&results), vec!["beignets", "Compote", "tarte"]);
    }

    #[test]
    fn test_limit() {
        let corpus: Vec<Recipe> = (0..12)
            .map(|i| recipe(&i.to_string(), &format!("Riz {:02}", i), "100 g riz", "salé"))
            .collect();
        let scorer = RecipeSearchScorer::default();
        let terms = terms_from(&["riz"]);
        let mut rng = RngSource::seeded(0);

        let capped = scorer.search(&terms, &corpus, None, SearchLimit::Capped(8), &mut rng);
        assert_eq!(capped.len(), 8);
        let all = scorer.search(&terms, &corpus, None, SearchLimit::Unbounded, &mut rng);
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn test_type_filter() {
        let corpus = vec![
            recipe("1", "Tarte aux pommes", "4 pommes;200 g farine", "sucré"),
            recipe("2", "Quiche", "200 g farine;3 œufs", "Salée"),
        ];
        let mut rng = RngSource::seeded(0);
        let results = search(
            &terms_from(&["farine"]),
            &corpus,
            Some(RecipeKind::Savory),
            &mut rng,
        );
        assert_eq!(names(&results), vec!["Quiche"]);
    }

    #[test]
    fn test_type_only_browse() {
        let mut corpus: Vec<Recipe> = (0..10)
            .map(|i| recipe(&i.to_string(), &format!("Gâteau {}", i), "sucre", "sucrée"))
            .collect();
        corpus.push(recipe("x", "Quiche", "3 œufs", "salé"));

        let scorer = RecipeSearchScorer::default();
        let first = scorer.search(
            &[],
            &corpus,
            Some(RecipeKind::Sweet),
            SearchLimit::Capped(8),
            &mut RngSource::seeded(7),
        );
        let second = scorer.search(
            &[],
            &corpus,
            Some(RecipeKind::Sweet),
            SearchLimit::Capped(8),
            &mut RngSource::seeded(7),
        );

        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.score == 1.0 && r.matched_terms.is_empty()));
        assert!(first.iter().all(|r| r.recipe.kind() == RecipeKind::Sweet));
    }

    #[test]
    fn test_no_terms_no_filter() {
        let corpus = vec![recipe("1", "Quiche", "3 œufs", "salé")];
        let mut rng = RngSource::seeded(0);
        assert!(search(&[], &corpus, None, &mut rng).is_empty());
        assert!(search(&terms_from(&["riz"]), &[], None, &mut rng).is_empty());
    }

    #[test]
    fn test_scored_results_always_have_matches() {
        let corpus = vec![
            recipe("1", "A", "2 tomates;sel", "salé"),
            recipe("2", "B", "1 poulet", "salé"),
        ];
        let mut rng = RngSource::seeded(0);
        let results = search(&terms_from(&["tomate", "poulet"]), &corpus, None, &mut rng);
        assert!(results.iter().all(|r| r.score > 0.0 && !r.matched_terms.is_empty()));
    }

    #[test]
    fn test_recipe_mentions() {
        let scorer = RecipeSearchScorer::default();
        let quiche = recipe("1", "Quiche", "200 g lardons;3 œufs", "salé");
        assert!(scorer.recipe_mentions(&quiche, "oeuf"));
        assert!(scorer.recipe_mentions(&quiche, "Lardon"));
        assert!(!scorer.recipe_mentions(&quiche, "lard"));
        assert!(!scorer.recipe_mentions(&quiche, ""));
    }

    #[test]
    fn test_featured_recipes() {
        let corpus: Vec<Recipe> = (0..5)
            .map(|i| recipe(&i.to_string(), &i.to_string(), "", ""))
            .collect();
        let featured = featured_recipes(&corpus, 3, &mut RngSource::seeded(3));
        assert_eq!(featured.len(), 3);
        assert_eq!(featured, featured_recipes(&corpus, 3, &mut RngSource::seeded(3)));
        assert_eq!(featured_recipes(&corpus, 10, &mut RngSource::seeded(3)).len(), 5);
    }

    #[test]
    fn test_search_config_validation() {
        let mut config = SearchConfig::default();
        assert!(config.validate().is_ok());

        config.max_results = 0;
        assert!(config.validate().is_err());
        config.max_results = 501;
        assert!(config.validate().is_err());
        config.max_results = 8;

        config.browse_sample_size = 0;
        assert!(config.validate().is_err());
    }
}
