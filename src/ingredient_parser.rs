//! # Ingredient Parser Module
//!
//! Recovers structured `{name, quantity, unit}` triples from the free-form
//! ingredient clauses stored in recipe ingredient text.
//!
//! ## Wire format
//!
//! A recipe's ingredient text is a single string of clauses joined by `;`,
//! each clause optionally starting with a quantity and a unit:
//!
//! ```text
//! 200 g farine;4 œufs;1 c. à soupe d'huile d'olive;sel
//! ```
//!
//! ## Parsing pipeline
//!
//! 1. Empty clauses are reported as [`ClauseOutcome::Empty`]
//! 2. Quantity-less staples (salt, pepper, oil, herbs, condiments) short-circuit
//!    to a name-only ingredient even when a quantity is written
//! 3. The ordered [`ClauseRule`] list is tried against the raw clause; the first
//!    rule that extracts a quantity wins
//! 4. Unit words are mapped to a canonical unit; an integer quantity without a
//!    unit word becomes a `count`
//! 5. Anything else degrades to a name-only ingredient
//!
//! Parsing never fails.

use crate::errors::{AppError, AppResult};
use crate::text_processing::{normalize, STOP_WORDS};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Separator between clauses in recipe ingredient text
pub const CLAUSE_DELIMITER: char = ';';

/// Canonical unit assigned to integer quantities without a unit word
pub const COUNT_UNIT: &str = "count";

/// Ingredients that never carry a quantity on a shopping list
pub const QUANTITYLESS_STAPLES: &[&str] = &[
    // Seasoning
    "sel",
    "fleur de sel",
    "poivre",
    "salt",
    "black pepper",
    // Oils and vinegars
    "huile",
    "oil",
    "vinaigre",
    "vinegar",
    // Herbs
    "persil",
    "ciboulette",
    "thym",
    "laurier",
    "basilic",
    "coriandre",
    "romarin",
    "origan",
    "estragon",
    "menthe",
    "aneth",
    "herbes de provence",
    // Spices
    "cannelle",
    "muscade",
    "cumin",
    "paprika",
    "curry",
    "piment",
    "gingembre en poudre",
    // Condiments
    "moutarde",
    "ketchup",
    "mayonnaise",
    "sauce soja",
];

const QUANTITY_PATTERN: &str =
    r"\d+\s+\d+\s*/\s*\d+|\d+\s*/\s*\d+|\d+[.,]\d+|\d+\s*[½⅓⅔¼¾⅛]|[½⅓⅔¼¾⅛]|\d+";
const FRACTIONAL_PATTERN: &str =
    r"\d+\s+\d+\s*/\s*\d+|\d+\s*/\s*\d+|\d+[.,]\d+|\d+\s*[½⅓⅔¼¾⅛]|[½⅓⅔¼¾⅛]";
const PARTITIVE_PATTERN: &str = r"(?:de\s+|d['’]\s*)?";

lazy_static! {
    static ref SLASH_SPACING: Regex =
        Regex::new(r"\s*/\s*").expect("Slash spacing pattern should be valid");
    static ref NORMALIZED_STAPLES: Vec<String> =
        QUANTITYLESS_STAPLES.iter().map(|s| normalize(s)).collect();
    static ref DEFAULT_PARSER: IngredientParser =
        IngredientParser::with_vocabulary(UnitVocabulary::builtin())
            .expect("Built-in unit vocabulary should compile");
}

/// One canonical unit and the words that spell it in recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    /// Canonical unit stored on parsed ingredients (e.g. "g", "tablespoon", "count")
    pub canonical: String,
    /// Spellings recognized in clauses (e.g. "c. à soupe", "cuillères à soupe")
    pub aliases: Vec<String>,
}

/// The unit vocabulary recognized by the parser.
///
/// Loadable from a JSON file:
///
/// ```json
/// { "units": [ { "canonical": "g", "aliases": ["g", "gr", "grammes"] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitVocabulary {
    pub units: Vec<UnitDefinition>,
}

fn unit(canonical: &str, aliases: &[&str]) -> UnitDefinition {
    UnitDefinition {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

impl UnitVocabulary {
    /// Built-in French/English vocabulary
    pub fn builtin() -> Self {
        Self {
            units: vec![
                unit("g", &["g", "gr", "gramme", "grammes", "gram", "grams"]),
                unit(
                    "kg",
                    &["kg", "kilo", "kilos", "kilogramme", "kilogrammes"],
                ),
                unit("ml", &["ml", "millilitre", "millilitres"]),
                unit("cl", &["cl", "centilitre", "centilitres"]),
                unit(
                    "dl",
                    &["dl", "décilitre", "décilitres", "decilitre", "decilitres"],
                ),
                unit("l", &["l", "litre", "litres", "liter", "liters"]),
                unit(
                    "tablespoon",
                    &[
                        "cuillère à soupe",
                        "cuillères à soupe",
                        "cuillere a soupe",
                        "cuilleres a soupe",
                        "c. à soupe",
                        "c. a soupe",
                        "c.à.s.",
                        "c.à.s",
                        "c.a.s",
                        "càs",
                        "cs",
                        "tablespoon",
                        "tablespoons",
                        "tbsp",
                    ],
                ),
                unit(
                    "teaspoon",
                    &[
                        "cuillère à café",
                        "cuillères à café",
                        "cuillere a cafe",
                        "cuilleres a cafe",
                        "c. à café",
                        "c. a cafe",
                        "c.à.c.",
                        "c.à.c",
                        "c.a.c",
                        "càc",
                        "cc",
                        "teaspoon",
                        "teaspoons",
                        "tsp",
                    ],
                ),
                unit("cup", &["tasse", "tasses", "verre", "verres", "cup", "cups"]),
                unit(
                    COUNT_UNIT,
                    &[
                        "pièce", "pièces", "piece", "pieces", "tranche", "tranches", "slice",
                        "slices", "gousse", "gousses", "clove", "cloves", "branche", "branches",
                        "brin", "brins", "branch", "feuille", "feuilles", "leaf", "leaves",
                        "botte", "bottes", "bouquet", "bouquets", "bunch", "tête", "têtes",
                        "tete", "tetes", "head", "heads", "sachet", "sachets", "pincée",
                        "pincées", "pincee", "pincees",
                    ],
                ),
            ],
        }
    }

    /// Load a vocabulary from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::FileSystem(format!(
                "cannot read unit vocabulary '{}': {}",
                path.display(),
                e
            ))
        })?;
        let vocabulary: UnitVocabulary = serde_json::from_str(&content)?;
        vocabulary.validate()?;
        info!(
            path = %path.display(),
            units = vocabulary.units.len(),
            "Loaded unit vocabulary"
        );
        Ok(vocabulary)
    }

    /// Validate unit vocabulary entries
    pub fn validate(&self) -> AppResult<()> {
        if self.units.is_empty() {
            return Err(AppError::Validation(
                "unit vocabulary cannot be empty".to_string(),
            ));
        }

        for (i, definition) in self.units.iter().enumerate() {
            if definition.canonical.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "units[{}] canonical name cannot be empty",
                    i
                )));
            }
            if definition.aliases.is_empty() {
                return Err(AppError::Validation(format!(
                    "units[{}] '{}' has no aliases",
                    i, definition.canonical
                )));
            }
            for alias in &definition.aliases {
                if alias.chars().any(|c| c.is_control()) {
                    return Err(AppError::Validation(format!(
                        "units[{}] alias '{}' contains control characters",
                        i, alias
                    )));
                }
                if normalize(alias).is_empty() {
                    return Err(AppError::Validation(format!(
                        "units[{}] alias '{}' is empty once normalized",
                        i, alias
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Load the unit vocabulary from an optional path, falling back to the built-in one
pub fn load_unit_vocabulary(path: Option<&str>) -> UnitVocabulary {
    match path {
        Some(path) => match UnitVocabulary::from_json_file(path) {
            Ok(vocabulary) => vocabulary,
            Err(e) => {
                warn!(
                    "Failed to load unit vocabulary from '{}': {}. Using built-in vocabulary.",
                    path, e
                );
                UnitVocabulary::builtin()
            }
        },
        None => UnitVocabulary::builtin(),
    }
}

/// Result of parsing one ingredient clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

impl ParsedIngredient {
    /// An ingredient without quantity nor unit
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
            unit: None,
        }
    }

    /// Empty results are discarded by callers
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Extraction rules, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseRule {
    /// `<number|fraction> <unit> [de|d'] <name>`
    QuantityUnitName,
    /// `<fraction|decimal> [de|d'] <name>`
    FractionName,
    /// `<integer> [de|d'] <name>`
    IntegerName,
}

/// Rule order used by [`IngredientParser::classify`]
pub const CLAUSE_RULES: [ClauseRule; 3] = [
    ClauseRule::QuantityUnitName,
    ClauseRule::FractionName,
    ClauseRule::IntegerName,
];

impl ClauseRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseRule::QuantityUnitName => "quantity_unit_name",
            ClauseRule::FractionName => "fraction_name",
            ClauseRule::IntegerName => "integer_name",
        }
    }
}

/// What a rule pulled out of a clause
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub quantity: f64,
    pub unit_text: Option<String>,
    pub name: String,
}

/// Classification of a clause before it becomes a [`ParsedIngredient`]
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseOutcome {
    Empty,
    Staple { name: String },
    Extracted { rule: ClauseRule, extraction: Extraction },
    Unparsed { name: String },
}

impl ClauseOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            ClauseOutcome::Empty => "empty",
            ClauseOutcome::Staple { .. } => "staple",
            ClauseOutcome::Extracted { rule, .. } => rule.as_str(),
            ClauseOutcome::Unparsed { .. } => "unparsed",
        }
    }
}

/// Ingredient clause parser compiled for one unit vocabulary
#[derive(Debug, Clone)]
pub struct IngredientParser {
    vocabulary: UnitVocabulary,
    /// normalized alias -> canonical unit
    canonical_units: HashMap<String, String>,
    quantity_unit_name: Regex,
    fraction_name: Regex,
    integer_name: Regex,
    leading_measure: Regex,
}

/// Build the unit alternation, longest aliases first so "cuillères à soupe"
/// wins over "cs" and "tranches" over "tranche"
fn build_units_pattern(vocabulary: &UnitVocabulary) -> String {
    let mut aliases: Vec<&str> = vocabulary
        .units
        .iter()
        .flat_map(|u| u.aliases.iter().map(|a| a.trim()))
        .filter(|a| !a.is_empty())
        .collect();
    aliases.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    aliases.dedup();

    aliases
        .iter()
        .map(|alias| {
            alias
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<String>>()
                .join(r"\s+")
        })
        .collect::<Vec<String>>()
        .join("|")
}

impl IngredientParser {
    /// Parser for the built-in vocabulary
    pub fn new() -> Self {
        DEFAULT_PARSER.clone()
    }

    /// Compile a parser for a custom unit vocabulary
    pub fn with_vocabulary(vocabulary: UnitVocabulary) -> AppResult<Self> {
        vocabulary.validate()?;

        let units = build_units_pattern(&vocabulary);
        let quantity_unit_name = Regex::new(&format!(
            r"(?i)^(?P<quantity>{q})\s*(?P<unit>{u})\.?(?:\s+|$){p}(?P<name>.+)$",
            q = QUANTITY_PATTERN,
            u = units,
            p = PARTITIVE_PATTERN
        ))?;
        let fraction_name = Regex::new(&format!(
            r"(?i)^(?P<quantity>{q})\s*{p}(?P<name>.+)$",
            q = FRACTIONAL_PATTERN,
            p = PARTITIVE_PATTERN
        ))?;
        let integer_name = Regex::new(&format!(
            r"(?i)^(?P<quantity>\d+)\s+{p}(?P<name>.+)$",
            p = PARTITIVE_PATTERN
        ))?;
        let leading_measure = Regex::new(&format!(
            r"(?i)^(?:{q})\s*(?:(?:{u})\.?(?:\s+|$))?\s*{p}",
            q = QUANTITY_PATTERN,
            u = units,
            p = PARTITIVE_PATTERN
        ))?;

        let mut canonical_units = HashMap::new();
        for definition in &vocabulary.units {
            for alias in &definition.aliases {
                canonical_units
                    .entry(normalize(alias))
                    .or_insert_with(|| definition.canonical.clone());
            }
        }

        debug!(
            units = vocabulary.units.len(),
            aliases = canonical_units.len(),
            "Compiled ingredient parser"
        );

        Ok(Self {
            vocabulary,
            canonical_units,
            quantity_unit_name,
            fraction_name,
            integer_name,
            leading_measure,
        })
    }

    pub fn vocabulary(&self) -> &UnitVocabulary {
        &self.vocabulary
    }

    /// Canonical unit for a unit word, if the word belongs to the vocabulary
    pub fn canonical_unit(&self, unit_text: &str) -> Option<&str> {
        self.canonical_units
            .get(&normalize(unit_text))
            .map(String::as_str)
    }

    /// Parse one clause into a [`ParsedIngredient`]
    ///
    /// ```rust
    /// use just_recipes::ingredient_parser::IngredientParser;
    ///
    /// let parser = IngredientParser::new();
    /// let parsed = parser.parse("200 g farine");
    /// assert_eq!(parsed.name, "farine");
    /// assert_eq!(parsed.quantity, Some(200.0));
    /// assert_eq!(parsed.unit.as_deref(), Some("g"));
    /// ```
    pub fn parse(&self, clause: &str) -> ParsedIngredient {
        let outcome = self.classify(clause);
        metrics::counter!("ingredient_parse_total", "rule" => outcome.metric_label())
            .increment(1);

        match outcome {
            ClauseOutcome::Empty => ParsedIngredient::name_only(""),
            ClauseOutcome::Staple { name } | ClauseOutcome::Unparsed { name } => {
                ParsedIngredient::name_only(name)
            }
            ClauseOutcome::Extracted { extraction, .. } => self.assemble(extraction),
        }
    }

    /// Decide how a clause is parsed without building the final ingredient
    pub fn classify(&self, clause: &str) -> ClauseOutcome {
        let trimmed = clause.trim();
        if trimmed.is_empty() {
            return ClauseOutcome::Empty;
        }

        if is_staple(trimmed) {
            let name = self.core_name(trimmed);
            trace!("Staple clause '{}' -> '{}'", trimmed, name);
            return ClauseOutcome::Staple { name };
        }

        if self.is_bare_measure(trimmed) {
            debug!("Clause '{}' has a measure but no ingredient name", trimmed);
            return ClauseOutcome::Unparsed {
                name: trimmed.to_string(),
            };
        }

        for rule in CLAUSE_RULES {
            if let Some(extraction) = self.apply_rule(rule, trimmed) {
                trace!(
                    rule = rule.as_str(),
                    "Clause '{}' -> quantity={} unit={:?} name='{}'",
                    trimmed,
                    extraction.quantity,
                    extraction.unit_text,
                    extraction.name
                );
                return ClauseOutcome::Extracted { rule, extraction };
            }
        }

        debug!("No quantity pattern matched clause '{}'", trimmed);
        ClauseOutcome::Unparsed {
            name: trimmed.to_string(),
        }
    }

    /// "200 g", "200 g de": a quantity/unit run followed by nothing but partitives
    fn is_bare_measure(&self, clause: &str) -> bool {
        self.leading_measure
            .find(clause)
            .is_some_and(|measure| is_only_stop_words(&clause[measure.end()..]))
    }

    fn apply_rule(&self, rule: ClauseRule, clause: &str) -> Option<Extraction> {
        let pattern = match rule {
            ClauseRule::QuantityUnitName => &self.quantity_unit_name,
            ClauseRule::FractionName => &self.fraction_name,
            ClauseRule::IntegerName => &self.integer_name,
        };

        let captures = pattern.captures(clause)?;
        let quantity = parse_quantity(captures.name("quantity")?.as_str())?;
        let name = captures.name("name")?.as_str().trim();
        if is_only_stop_words(name) {
            return None;
        }

        let unit_text = captures.name("unit").map(|m| m.as_str().to_string());

        // "200 g" alone: the "name" is only a unit word
        if unit_text.is_none() && self.canonical_unit(name).is_some() {
            return None;
        }

        Some(Extraction {
            quantity,
            unit_text,
            name: name.to_string(),
        })
    }

    fn assemble(&self, extraction: Extraction) -> ParsedIngredient {
        let quantity = round_quantity(extraction.quantity);
        let unit = match extraction.unit_text {
            Some(text) => Some(
                self.canonical_unit(&text)
                    .map(str::to_string)
                    .unwrap_or_else(|| text.to_lowercase()),
            ),
            None if quantity.fract() == 0.0 => Some(COUNT_UNIT.to_string()),
            None => None,
        };

        ParsedIngredient {
            name: extraction.name,
            quantity: Some(quantity),
            unit,
        }
    }

    /// Strip a leading quantity/unit run (and a following `de`/`d'`) from a clause.
    ///
    /// The rest of the clause is kept verbatim; if nothing would remain the
    /// trimmed clause is returned unchanged.
    ///
    /// ```rust
    /// use just_recipes::ingredient_parser::IngredientParser;
    ///
    /// let parser = IngredientParser::new();
    /// assert_eq!(parser.core_name("2 gousses d'ail"), "ail");
    /// assert_eq!(parser.core_name("pommes de terre"), "pommes de terre");
    /// ```
    pub fn core_name(&self, clause: &str) -> String {
        let trimmed = clause.trim();
        match self.leading_measure.find(trimmed) {
            Some(measure) => {
                let rest = trimmed[measure.end()..].trim();
                if is_only_stop_words(rest) {
                    trimmed.to_string()
                } else {
                    rest.to_string()
                }
            }
            None => trimmed.to_string(),
        }
    }
}

impl Default for IngredientParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared parser compiled for the built-in vocabulary
pub fn default_parser() -> &'static IngredientParser {
    &DEFAULT_PARSER
}

/// Parse one clause with the built-in vocabulary
///
/// ```rust
/// use just_recipes::ingredient_parser::parse_ingredient;
///
/// let eggs = parse_ingredient("4 œufs");
/// assert_eq!(eggs.name, "œufs");
/// assert_eq!(eggs.quantity, Some(4.0));
/// assert_eq!(eggs.unit.as_deref(), Some("count"));
///
/// let salt = parse_ingredient("sel");
/// assert_eq!(salt.quantity, None);
/// ```
pub fn parse_ingredient(clause: &str) -> ParsedIngredient {
    DEFAULT_PARSER.parse(clause)
}

/// Empty, or nothing but partitives and articles ("de", "d'", "la")
fn is_only_stop_words(name: &str) -> bool {
    normalize(name)
        .split(' ')
        .all(|word| word.is_empty() || STOP_WORDS.contains(&word))
}

/// Split recipe ingredient text into trimmed, non-empty clauses
pub fn split_clauses(ingredients_text: &str) -> Vec<&str> {
    ingredients_text
        .split(CLAUSE_DELIMITER)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Whether a clause names a quantity-less staple.
///
/// Substring containment on normalized text, in either direction.
pub fn is_staple(clause: &str) -> bool {
    let normalized = normalize(clause);
    if normalized.is_empty() {
        return false;
    }
    NORMALIZED_STAPLES
        .iter()
        .any(|staple| normalized.contains(staple.as_str()) || staple.contains(&normalized))
}

/// Evaluate a quantity: integers, decimals (point or comma), fractions,
/// mixed numbers and unicode vulgar fractions
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let compact = raw.trim().replace(',', ".");
    let compact = SLASH_SPACING.replace_all(&compact, "/");

    let mut total = 0.0;
    let mut parts = 0;
    for part in compact.split_whitespace() {
        total += parse_quantity_part(part)?;
        parts += 1;
    }

    if parts == 0 || !total.is_finite() {
        return None;
    }
    Some(total)
}

fn parse_quantity_part(part: &str) -> Option<f64> {
    if let Some((numerator, denominator)) = part.split_once('/') {
        let numerator: f64 = numerator.parse().ok()?;
        let denominator: f64 = denominator.parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    let mut value = 0.0;
    let mut digits = String::new();
    for ch in part.chars() {
        match vulgar_fraction_value(ch) {
            Some(fraction) => value += fraction,
            None => digits.push(ch),
        }
    }
    if !digits.is_empty() {
        value += digits.parse::<f64>().ok()?;
    }
    Some(value)
}

fn vulgar_fraction_value(ch: char) -> Option<f64> {
    match ch {
        '½' => Some(0.5),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        '¼' => Some(0.25),
        '¾' => Some(0.75),
        '⅛' => Some(0.125),
        _ => None,
    }
}

/// Round to two decimals to drop floating-point artifacts
pub fn round_quantity(quantity: f64) -> f64 {
    (quantity * 100.0).round() / 100.0
}
