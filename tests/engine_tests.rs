//! # Engine Integration Tests
//!
//! End-to-end behavior of the public entry points: query parsing, search,
//! filters, repositories and shopping-list aggregation working together.


use just_recipes::filters::{Diet, DietaryFilter, RecipeFilter};
use just_recipes::ingredient_parser::{IngredientParser, UnitVocabulary};
use just_recipes::recipe::{InMemoryRecipeRepository, RecipeKind, RecipeRepository};
use just_recipes::search::{terms_from, RecipeSearchScorer, SearchConfig, SearchLimit};
use just_recipes::shopping_list::ShoppingListAggregator;
use just_recipes::{
    aggregate, export_plain_text, normalize, parse_ingredient, parse_query, search,
    ShoppingListItem,
};
use std::io::Write;
use test_helpers::{
    json_repository, mixed_corpus, recipe, salad_and_chicken, seeded, SequenceSource,
};

fn item(name: &str, quantity: Option<f64>, unit: Option<&str>) -> ShoppingListItem {
    ShoppingListItem {
        name: name.to_string(),
        quantity,
        unit: unit.map(str::to_string),
        has_at_home: false,
    }
}

#[test]
fn test_end_to_end_search_and_shopping_list() {
    let corpus = salad_and_chicken();

    let results = search(&terms_from(&["tomate"]), &corpus, None, &mut seeded(1));
    let names: Vec<&str> = results.iter().map(|r| r.recipe.name.as_str()).collect();
    assert_eq!(names, vec!["Salade de tomates"]);

    let items = aggregate(&corpus);
    assert_eq!(
        items,
        vec![
            item("huile d'olive", None, None),
            item("pommes de terre", Some(2.0), Some("count")),
            item("poulet", Some(1.0), Some("count")),
            item("sel", None, None),
            item("tomates", Some(2.0), Some("count")),
        ]
    );

    assert_eq!(
        export_plain_text(&items),
        "huile d'olive\n2 pommes de terre\npoulet\nsel\n2 tomates"
    );
}

#[test]
fn test_normalize_properties() {
    for text in ["Épinards", "CRÈME fraîche", "  œufs  durs ", "pâte-à-choux"] {
        let once = normalize(text);
        assert_eq!(normalize(&once), once);
        assert_eq!(normalize(&text.to_uppercase()), once);
    }
    assert_eq!(normalize("Épinards"), normalize("epinards"));
}

#[test]
fn test_parse_ingredient_examples() {
    let flour = parse_ingredient("200 g farine");
    assert_eq!(
        (flour.name.as_str(), flour.quantity, flour.unit.as_deref()),
        ("farine", Some(200.0), Some("g"))
    );

    let salt = parse_ingredient("sel");
    assert_eq!(
        (salt.name.as_str(), salt.quantity, salt.unit.as_deref()),
        ("sel", None, None)
    );

    let eggs = parse_ingredient("4 œufs");
    assert_eq!(
        (eggs.name.as_str(), eggs.quantity, eggs.unit.as_deref()),
        ("œufs", Some(4.0), Some("count"))
    );
}

#[test]
fn test_compound_noun_is_not_a_plural() {
    let corpus = vec![recipe("1", "Purée", "1 kg pommes de terre;20 cl lait", "salé")];
    let mut rng = seeded(0);

    assert!(search(&terms_from(&["pomme"]), &corpus, None, &mut rng).is_empty());
    assert_eq!(search(&terms_from(&["pomme de terre"]), &corpus, None, &mut rng).len(), 1);
    assert_eq!(search(&terms_from(&["pommes"]), &corpus, None, &mut rng).len(), 1);
}

#[test]
fn test_recipe_with_all_terms_ranks_first() {
    let a = recipe("a", "Riz au poulet", "200 g riz;1 poulet;1 oignon", "salé");
    let b = recipe("b", "Riz pilaf", "200 g riz;1 oignon", "salé");

    let results = search(&terms_from(&["riz", "poulet"]), &[b, a.clone()], None, &mut seeded(0));
    assert_eq!(results[0].recipe, a);
}

#[test]
fn test_all_terms_bonus_dominates_partial_matches() {
    let corpus = vec![
        recipe("partial", "Aaa", "riz;poulet;oignon;curry;ail", "salé"),
        recipe("full", "Zzz", "riz;poulet;oignon;carotte", "salé"),
    ];
    let terms = terms_from(&["riz", "poulet", "oignon", "carotte"]);
    let results = search(&terms, &corpus, None, &mut seeded(0));

    assert_eq!(results[0].recipe.id, "full");
    assert_eq!(results[0].score, 4.0 + 2.0 + 5.0);
    assert_eq!(results[1].score, 3.0 + 1.5);
}

#[test]
fn test_parse_query_feeds_search() {
    let corpus = mixed_corpus();
    let terms = parse_query("Œufs et crème, lardons");
    let results = search(&terms, &corpus, None, &mut seeded(0));

    assert_eq!(results[0].recipe.id, "quiche");
    assert_eq!(results[0].matched_terms.len(), 3);
    assert!(results.iter().all(|r| !r.matched_terms.is_empty()));
}

#[test]
fn test_type_only_browse_with_fixed_sequence() {
    let corpus = mixed_corpus();
    let scorer = RecipeSearchScorer::default();
    let mut rng = SequenceSource::new(vec![]);

    let results = scorer.search(
        &[],
        &corpus,
        Some(RecipeKind::Sweet),
        SearchLimit::Capped(8),
        &mut rng,
    );
    let ids: Vec<&str> = results.iter().map(|r| r.recipe.id.as_str()).collect();
    assert_eq!(ids, vec!["tarte", "mousse", "crepes"]);
    assert!(results.iter().all(|r| r.score == 1.0));
}

#[test]
fn test_browse_sample_size_from_config() {
    let corpus = mixed_corpus();
    let config = SearchConfig {
        max_results: 8,
        browse_sample_size: 2,
    };
    let scorer = RecipeSearchScorer::new(config);

    let sweet = Some(RecipeKind::Sweet);

    let sample = scorer.search(&[], &corpus, sweet, SearchLimit::Capped(8), &mut seeded(4));
    assert_eq!(sample.len(), 2);
    let all = scorer.search(&[], &corpus, sweet, SearchLimit::Unbounded, &mut seeded(4));
    assert_eq!(all.len(), 3);
}

#[test]
fn test_dietary_filter_before_search() {
    let corpus = DietaryFilter::new(vec![Diet::Vegetarian]).filter(mixed_corpus());
    let results = search(&terms_from(&["crème"]), &corpus, None, &mut seeded(0));
    let ids: Vec<&str> = results.iter().map(|r| r.recipe.id.as_str()).collect();
    assert_eq!(ids, vec!["gratin"]);
}

#[test]
fn test_json_repository_feeds_engines() {
    let (_file, repository) = json_repository(&mixed_corpus());
    let corpus = repository.list_all().unwrap();
    assert_eq!(corpus.len(), 5);

    let sweet: Vec<_> = corpus
        .iter()
        .filter(|r| r.kind() == RecipeKind::Sweet)
        .collect();
    assert_eq!(sweet.len(), 3);

    let items = aggregate(&corpus[2..]);
    let eggs = items.iter().find(|i| i.name == "œufs").unwrap();
    assert_eq!(eggs.quantity, Some(10.0));
    assert_eq!(eggs.unit.as_deref(), Some("count"));

    let butter = items.iter().find(|i| i.name == "beurre").unwrap();
    assert_eq!(butter.quantity, Some(80.0));
    assert_eq!(butter.unit.as_deref(), Some("g"));

    // "1 pincée de sel" is a staple: no quantity
    let salt = items.iter().find(|i| i.name == "sel").unwrap();
    assert_eq!(salt.quantity, None);
}

#[test]
fn test_plurals_with_complements_through_repository() {
    let repository: Box<dyn RecipeRepository> = Box::new(InMemoryRecipeRepository::new(vec![
        recipe(
            "poelee",
            "Poêlée forestière",
            "250 g champignons de Paris;1 échalote",
            "salé",
        ),
        recipe(
            "farcies",
            "Tomates farcies",
            "4 tomates à farcir;300 g chair à saucisse",
            "salé",
        ),
        recipe("mimosa", "Œufs mimosa", "12 oeufs de caille;mayonnaise", "salé"),
        recipe("puree", "Purée", "1 kg pommes de terre;20 cl lait", "salé"),
    ]));
    let corpus = repository.list_all().unwrap();
    let mut rng = seeded(0);

    let mushrooms = search(&terms_from(&["champignon"]), &corpus, None, &mut rng);
    assert_eq!(mushrooms.len(), 1);
    assert_eq!(mushrooms[0].recipe.id, "poelee");

    let tomatoes = search(&terms_from(&["tomate"]), &corpus, None, &mut rng);
    assert_eq!(tomatoes.len(), 1);
    assert_eq!(tomatoes[0].recipe.id, "farcies");

    assert!(search(&terms_from(&["pomme"]), &corpus, None, &mut rng).is_empty());

    let vegan = DietaryFilter::new(vec![Diet::Vegan]).filter(corpus);
    let ids: Vec<&str> = vegan.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["poelee"]);
}

#[test]
fn test_custom_vocabulary_parser() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "units": [
            {{ "canonical": "g", "aliases": ["g", "grammes"] }},
            {{ "canonical": "handful", "aliases": ["poignée", "poignées"] }}
        ] }}"#
    )
    .unwrap();

    let vocabulary = UnitVocabulary::from_json_file(file.path()).unwrap();
    let parser = IngredientParser::with_vocabulary(vocabulary).unwrap();

    let spinach = parser.parse("2 poignées d'épinards");
    assert_eq!(spinach.name, "épinards");
    assert_eq!(spinach.quantity, Some(2.0));
    assert_eq!(spinach.unit.as_deref(), Some("handful"));

    let recipes = vec![
        recipe("1", "Salade", "1 poignée d'épinards", "salé"),
        recipe("2", "Soupe", "2 poignées d'épinards", "salé"),
    ];
    let items = ShoppingListAggregator::with_parser(&parser).aggregate(&recipes);
    assert_eq!(items, vec![item("épinards", Some(3.0), Some("handful"))]);

    let scorer = RecipeSearchScorer::with_parser(&parser, SearchConfig::default());
    assert!(scorer.recipe_mentions(&recipes[0], "épinard"));
}

#[test]
fn test_empty_inputs_never_panic() {
    let mut rng = seeded(0);
    assert!(search(&[], &[], None, &mut rng).is_empty());
    assert!(search(&terms_from(&["riz"]), &[], Some(RecipeKind::Savory), &mut rng).is_empty());
    assert!(aggregate(&[]).is_empty());
    assert_eq!(export_plain_text(&[]), "");
    assert!(parse_query("").is_empty());
}
