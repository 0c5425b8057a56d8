//! # Shopping List Module
//!
//! Collapses the ingredient lists of several recipes into one deduplicated,
//! quantity-summed shopping list.
//!
//! ## Merge policy
//!
//! Ingredients are grouped by normalized name and folded in one at a time:
//!
//! - a mention without quantity turns the whole group into a bare name, and
//!   the group stays that way for the rest of the aggregation;
//! - quantities whose units are compatible (equal, or one unit string
//!   contains the other, a missing unit counting as `""`) are summed;
//! - quantities with incompatible units are kept as separate entries under the
//!   same name.
//!
//! Unit compatibility is a loose substring test: `"kg"` and `"g"` are summed
//! as if they were the same unit. No unit conversion is attempted.

use crate::errors::AppResult;
use crate::ingredient_parser::{
    default_parser, round_quantity, split_clauses, IngredientParser, ParsedIngredient, COUNT_UNIT,
};
use crate::recipe::Recipe;
use crate::text_processing::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace};

/// One line of the consolidated shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub has_at_home: bool,
}

impl ShoppingListItem {
    fn from_parsed(display_name: &str, parsed: &ParsedIngredient) -> Self {
        Self {
            name: display_name.to_string(),
            quantity: parsed.quantity,
            unit: parsed.unit.clone(),
            has_at_home: false,
        }
    }

    fn bare(display_name: &str) -> Self {
        Self {
            name: display_name.to_string(),
            quantity: None,
            unit: None,
            has_at_home: false,
        }
    }
}

/// Loose unit compatibility: equal, or one contains the other
pub fn units_compatible(left: Option<&str>, right: Option<&str>) -> bool {
    let left = left.unwrap_or("");
    let right = right.unwrap_or("");
    left == right || left.contains(right) || right.contains(left)
}

/// All contributions sharing one normalized name
#[derive(Debug)]
struct IngredientGroup {
    display_name: String,
    poisoned: bool,
    entries: Vec<ShoppingListItem>,
}

impl IngredientGroup {
    fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            poisoned: false,
            entries: Vec::new(),
        }
    }

    fn fold(&mut self, parsed: &ParsedIngredient) {
        if self.poisoned {
            return;
        }

        let quantity = match parsed.quantity {
            Some(quantity) => quantity,
            None => {
                trace!(name = %self.display_name, "Quantity-less mention, dropping quantities");
                self.poisoned = true;
                self.entries = vec![ShoppingListItem::bare(&self.display_name)];
                return;
            }
        };

        let compatible = self.entries.iter_mut().find(|entry| {
            entry.quantity.is_some()
                && units_compatible(entry.unit.as_deref(), parsed.unit.as_deref())
        });

        match compatible {
            Some(entry) => {
                let total = entry.quantity.unwrap_or(0.0) + quantity;
                entry.quantity = Some(round_quantity(total));
                if entry.unit.is_none() {
                    entry.unit = parsed.unit.clone();
                }
            }
            None => self
                .entries
                .push(ShoppingListItem::from_parsed(&self.display_name, parsed)),
        }
    }
}

/// Builds shopping lists with a given ingredient parser
#[derive(Debug, Clone)]
pub struct ShoppingListAggregator<'p> {
    parser: &'p IngredientParser,
}

impl ShoppingListAggregator<'static> {
    /// Aggregator using the built-in unit vocabulary
    pub fn new() -> Self {
        Self {
            parser: default_parser(),
        }
    }
}

impl Default for ShoppingListAggregator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> ShoppingListAggregator<'p> {
    pub fn with_parser(parser: &'p IngredientParser) -> Self {
        Self { parser }
    }

    /// Merge the ingredients of `recipes` into a sorted shopping list
    pub fn aggregate(&self, recipes: &[Recipe]) -> Vec<ShoppingListItem> {
        let start_time = std::time::Instant::now();

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, IngredientGroup> = HashMap::new();
        let mut clause_count = 0;

        for recipe in recipes {
            for clause in split_clauses(&recipe.ingredients_text) {
                let parsed = self.parser.parse(clause);
                if parsed.is_empty() {
                    continue;
                }
                clause_count += 1;

                let key = normalize(&parsed.name);
                let group = groups.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    IngredientGroup::new(&parsed.name)
                });
                group.fold(&parsed);
            }
        }

        let mut items: Vec<ShoppingListItem> = order
            .iter()
            .filter_map(|key| groups.remove(key))
            .flat_map(|group| group.entries)
            .collect();
        sort_items(&mut items);

        debug!(
            recipes = recipes.len(),
            clauses = clause_count,
            groups = order.len(),
            "Ingredients grouped"
        );
        crate::observability::record_aggregation_metrics(
            start_time.elapsed(),
            recipes.len(),
            clause_count,
            items.len(),
        );
        info!(
            recipes = recipes.len(),
            items = items.len(),
            "Shopping list aggregated"
        );

        items
    }
}

/// Order by normalized name, then raw name, then unit
fn sort_items(items: &mut [ShoppingListItem]) {
    items.sort_by(|a, b| {
        normalize(&a.name)
            .cmp(&normalize(&b.name))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.unit.cmp(&b.unit))
    });
}

/// Aggregate with the built-in vocabulary
///
/// ```rust
/// use just_recipes::recipe::Recipe;
/// use just_recipes::shopping_list::aggregate;
///
/// let recipes = vec![
///     Recipe::new("1", "Omelette", "2 œufs", "salé"),
///     Recipe::new("2", "Crêpes", "2 œufs", "sucré"),
/// ];
/// let items = aggregate(&recipes);
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].quantity, Some(4.0));
/// ```
pub fn aggregate(recipes: &[Recipe]) -> Vec<ShoppingListItem> {
    ShoppingListAggregator::new().aggregate(recipes)
}

/// At most one decimal, trailing `.0` stripped.
///
/// Small non-zero quantities that one decimal would show as `0` keep two
/// decimals (`0.04`).
pub fn format_quantity(quantity: f64) -> String {
    let rendered = format!("{:.1}", quantity);
    if quantity != 0.0 && rendered.trim_start_matches('-') == "0.0" {
        let precise = format!("{:.2}", quantity);
        return precise.trim_end_matches('0').to_string();
    }
    match rendered.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => rendered,
    }
}

/// Render one item as a shopping-list line
///
/// ```rust
/// use just_recipes::shopping_list::{format_item, ShoppingListItem};
///
/// let flour = ShoppingListItem {
///     name: "farine".to_string(),
///     quantity: Some(250.0),
///     unit: Some("g".to_string()),
///     has_at_home: false,
/// };
/// assert_eq!(format_item(&flour), "250 g farine");
/// ```
pub fn format_item(item: &ShoppingListItem) -> String {
    let quantity = match item.quantity {
        Some(quantity) => quantity,
        None => return item.name.clone(),
    };

    match item.unit.as_deref() {
        Some(COUNT_UNIT) if quantity == 1.0 => item.name.clone(),
        Some(COUNT_UNIT) => format!("{} {}", format_quantity(quantity), item.name),
        Some(unit) => format!("{} {} {}", format_quantity(quantity), unit, item.name),
        None => format!("{} {}", format_quantity(quantity), item.name),
    }
}

/// Plain-text export: one formatted line per item
pub fn export_plain_text(items: &[ShoppingListItem]) -> String {
    items.iter().map(format_item).collect::<Vec<_>>().join("\n")
}

/// Write the plain-text export to `path`, newline-terminated
pub fn save_plain_text(items: &[ShoppingListItem], path: impl AsRef<Path>) -> AppResult<()> {
    let path = path.as_ref();
    fs::write(path, format!("{}\n", export_plain_text(items)))?;
    info!(path = %path.display(), items = items.len(), "Shopping list saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: &str, ingredients: &str) -> Recipe {
        Recipe::new(id, format!("Recette {}", id), ingredients, "salé")
    }

    fn item(name: &str, quantity: Option<f64>, unit: Option<&str>) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            quantity,
            unit: unit.map(str::to_string),
            has_at_home: false,
        }
    }

    #[test]
    fn test_sums_same_ingredient() {
        let items = aggregate(&[recipe("1", "2 œufs"), recipe("2", "2 œufs")]);
        assert_eq!(items, vec![item("œufs", Some(4.0), Some("count"))]);
    }

    #[test]
    fn test_quantityless_mention_poisons_group() {
        let items = aggregate(&[recipe("1", "sel"), recipe("2", "200 g sel")]);
        assert_eq!(items, vec![item("sel", None, None)]);

        let items = aggregate(&[
            recipe("1", "2 citrons"),
            recipe("2", "citrons"),
            recipe("3", "3 citrons"),
        ]);
        assert_eq!(items, vec![item("citrons", None, None)]);
    }

    #[test]
    fn test_incompatible_units_kept_apart() {
        let items = aggregate(&[recipe("1", "200 g beurre"), recipe("2", "10 cl beurre")]);
        assert_eq!(
            items,
            vec![
                item("beurre", Some(10.0), Some("cl")),
                item("beurre", Some(200.0), Some("g")),
            ]
        );
    }

    #[test]
    fn test_substring_units_are_summed() {
        let items = aggregate(&[recipe("1", "1 kg farine"), recipe("2", "200 g farine")]);
        assert_eq!(items, vec![item("farine", Some(201.0), Some("kg"))]);
    }

    #[test]
    fn test_grouping_ignores_case_and_accents() {
        let items = aggregate(&[
            recipe("1", "100 g Crème fraîche"),
            recipe("2", "50 g creme fraiche"),
        ]);
        assert_eq!(items, vec![item("Crème fraîche", Some(150.0), Some("g"))]);
    }

    #[test]
    fn test_missing_unit_adopts_other() {
        let mut group = IngredientGroup::new("sucre");
        group.fold(&ParsedIngredient {
            name: "sucre".to_string(),
            quantity: Some(0.5),
            unit: None,
        });
        group.fold(&ParsedIngredient {
            name: "sucre".to_string(),
            quantity: Some(100.0),
            unit: Some("g".to_string()),
        });
        assert_eq!(group.entries, vec![item("sucre", Some(100.5), Some("g"))]);
    }

    #[test]
    fn test_sums_rounded_to_two_decimals() {
        let items = aggregate(&[
            recipe("1", "0,1 l lait"),
            recipe("2", "0,2 l lait"),
        ]);
        assert_eq!(items, vec![item("lait", Some(0.3), Some("l"))]);
    }

    #[test]
    fn test_sorted_and_has_at_home_false() {
        let items = aggregate(&[recipe("1", "2 tomates;1 avocat;Échalote;200 g riz")]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["avocat", "Échalote", "riz", "tomates"]);
        assert!(items.iter().all(|i| !i.has_at_home));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(aggregate(&[]).is_empty());
        assert!(aggregate(&[recipe("1", " ; ;")]).is_empty());
    }

    #[test]
    fn test_format_item() {
        assert_eq!(format_item(&item("sel", None, None)), "sel");
        assert_eq!(format_item(&item("poulet", Some(1.0), Some("count"))), "poulet");
        assert_eq!(format_item(&item("œufs", Some(4.0), Some("count"))), "4 œufs");
        assert_eq!(format_item(&item("farine", Some(250.0), Some("g"))), "250 g farine");
        assert_eq!(format_item(&item("lait", Some(1.5), Some("l"))), "1.5 l lait");
        assert_eq!(format_item(&item("sucre", Some(0.5), None)), "0.5 sucre");
        assert_eq!(
            format_item(&item("safran", Some(0.04), Some("g"))),
            "0.04 g safran"
        );
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(4.0), "4");
        assert_eq!(format_quantity(1.5), "1.5");
        assert_eq!(format_quantity(0.33), "0.3");
        assert_eq!(format_quantity(2.96), "3");
        assert_eq!(format_quantity(0.04), "0.04");
        assert_eq!(format_quantity(0.06), "0.1");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn test_save_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.txt");
        let items = vec![
            item("farine", Some(250.0), Some("g")),
            item("sel", None, None),
        ];

        save_plain_text(&items, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "250 g farine\nsel\n"
        );

        let missing_dir = dir.path().join("absent").join("courses.txt");
        assert!(matches!(
            save_plain_text(&items, &missing_dir),
            Err(crate::errors::AppError::FileSystem(_))
        ));
    }

    #[test]
    fn test_export_plain_text() {
        let items = vec![
            item("œufs", Some(4.0), Some("count")),
            item("sel", None, None),
        ];
        assert_eq!(export_plain_text(&items), "4 œufs\nsel");
        assert_eq!(export_plain_text(&[]), "");
    }

    #[test]
    fn test_units_compatible() {
        assert!(units_compatible(Some("g"), Some("g")));
        assert!(units_compatible(Some("kg"), Some("g")));
        assert!(units_compatible(None, Some("ml")));
        assert!(!units_compatible(Some("g"), Some("ml")));
        assert!(!units_compatible(Some("count"), Some("cl")));
    }
}
