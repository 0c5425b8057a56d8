use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use just_recipes::config::AppConfig;
use just_recipes::filters::{Diet, DietaryFilter, RecipeFilter, SeasonalFilter};
use just_recipes::ingredient_parser::{load_unit_vocabulary, IngredientParser};
use just_recipes::localization::LocalizationManager;
use just_recipes::observability;
use just_recipes::random_source::{RandomSource, RngSource};
use just_recipes::recipe::{
    select_by_ids, JsonRecipeRepository, Recipe, RecipeKind, RecipeRepository,
};
use just_recipes::search::{
    featured_recipes, parse_query, RecipeSearchScorer, ScoredRecipe, SearchLimit,
};
use just_recipes::shopping_list::{export_plain_text, save_plain_text, ShoppingListAggregator};
use std::path::PathBuf;
use tracing::{info, warn};

/// Find recipes from the ingredients you have and build shopping lists
#[derive(Parser, Debug)]
#[command(name = "just-recipes", author, version, about, long_about = None)]
struct Cli {
    /// Recipe corpus (JSON array); overrides RECIPES_PATH
    #[arg(long, global = true)]
    recipes: Option<String>,

    /// Message language, e.g. "fr" or "en-US"; defaults to $LANG
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Print the Prometheus exposition of the run's metrics
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank recipes containing the given ingredients
    Search {
        /// Ingredients, separated by spaces between arguments or by , ; + / et and
        query: Vec<String>,
        /// Only sweet or savory recipes
        #[arg(long = "type")]
        kind: Option<RecipeKind>,
        /// Return every match instead of the capped list
        #[arg(long)]
        all: bool,
        /// Seed for the random browse order
        #[arg(long)]
        seed: Option<u64>,
        /// Exclude recipes incompatible with these diets (vegetarian, vegan, gluten-free)
        #[arg(long, value_delimiter = ',')]
        diet: Vec<Diet>,
        /// Exclude recipes using produce out of season this month
        #[arg(long)]
        seasonal: bool,
    },
    /// Random recipes of one type
    Browse {
        #[arg(long = "type")]
        kind: RecipeKind,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// A few random recipes
    Featured {
        #[arg(long, default_value_t = 3)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Merge the ingredients of the given recipes into one shopping list
    ShoppingList {
        /// Recipe ids
        ids: Vec<String>,
        /// Write the plain-text list to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Parse one ingredient clause and print it as JSON
    Parse { clause: String },
}

fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::thread()),
    }
}

/// Localized output for one run
struct Messages {
    manager: LocalizationManager,
    language: String,
}

impl Messages {
    fn get(&self, key: &str) -> String {
        self.manager.get_message_in_language(key, &self.language, None)
    }

    fn get_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.manager
            .get_message_with_args_in_language(key, &self.language, args)
    }
}

fn load_corpus(config: &AppConfig) -> Result<Vec<Recipe>> {
    let repository = JsonRecipeRepository::new(&config.repository.recipes_path);
    repository
        .list_all()
        .with_context(|| format!("Failed to load recipes from {}", config.repository.recipes_path))
}

fn print_results(messages: &Messages, results: &[ScoredRecipe]) {
    for result in results {
        let matched: Vec<&str> = result.matched_terms.iter().map(|t| t.as_str()).collect();
        let score = result.score.to_string();
        let matched = matched.join(", ");
        println!(
            "  [{}] {}",
            result.recipe.id,
            messages.get_with(
                "search-result-line",
                &[
                    ("name", result.recipe.name.as_str()),
                    ("score", score.as_str()),
                    ("matched", matched.as_str()),
                ],
            )
        );
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = &cli.recipes {
        config.repository.recipes_path = path.clone();
    }
    config.validate().context("Invalid configuration")?;

    observability::init_tracing(&config.observability)?;
    info!("{}", config.summary());

    let metrics_handle = if config.observability.enable_metrics || cli.print_metrics {
        Some(observability::install_metrics_recorder(&config.observability)?)
    } else {
        None
    };

    let manager = LocalizationManager::new().context("Failed to load messages")?;
    let requested = cli.lang.clone().or_else(|| std::env::var("LANG").ok());
    let language = manager.detect_language(requested.as_deref());
    let messages = Messages { manager, language };

    let vocabulary = load_unit_vocabulary(config.parser.unit_vocabulary_path.as_deref());
    let parser = IngredientParser::with_vocabulary(vocabulary)
        .context("Failed to compile the unit vocabulary")?;
    let scorer = RecipeSearchScorer::with_parser(&parser, config.search.clone());

    match cli.command {
        Command::Search {
            query,
            kind,
            all,
            seed,
            diet,
            seasonal,
        } => {
            let _span = observability::engine_span("search").entered();
            let terms = parse_query(&query.join(","));
            if terms.is_empty() && kind.is_none() {
                println!("{}", messages.get("search-empty-query"));
                return Ok(());
            }

            let mut corpus = load_corpus(&config)?;
            if !diet.is_empty() {
                corpus = DietaryFilter::with_scorer(diet, scorer.clone()).filter(corpus);
            }
            if seasonal {
                let month = chrono::Local::now().month();
                corpus = SeasonalFilter::with_scorer(month, scorer.clone())?.filter(corpus);
            }

            let limit = if all {
                SearchLimit::Unbounded
            } else {
                config.search.default_limit()
            };
            let mut rng = random_source(seed);
            let results = scorer.search(&terms, &corpus, kind, limit, &mut *rng);

            if results.is_empty() {
                println!("{}", messages.get("search-no-results"));
            } else {
                let count = results.len().to_string();
                let joined: Vec<&str> = terms.iter().map(|t| t.as_str()).collect();
                let joined = joined.join(", ");
                println!(
                    "{}",
                    messages.get_with(
                        "search-results-header",
                        &[("count", count.as_str()), ("terms", joined.as_str())],
                    )
                );
                print_results(&messages, &results);
            }
        }
        Command::Browse { kind, seed } => {
            let _span = observability::engine_span("browse").entered();
            let corpus = load_corpus(&config)?;
            let mut rng = random_source(seed);
            let results = scorer.search(
                &[],
                &corpus,
                Some(kind),
                config.search.default_limit(),
                &mut *rng,
            );
            println!(
                "{}",
                messages.get_with("browse-header", &[("kind", kind.as_str())])
            );
            for result in &results {
                println!("  [{}] {}", result.recipe.id, result.recipe.name);
            }
        }
        Command::Featured { count, seed } => {
            let _span = observability::engine_span("featured").entered();
            let corpus = load_corpus(&config)?;
            let mut rng = random_source(seed);
            println!("{}", messages.get("featured-header"));
            for recipe in featured_recipes(&corpus, count, &mut *rng) {
                println!("  [{}] {}", recipe.id, recipe.name);
            }
        }
        Command::ShoppingList { ids, output } => {
            let _span = observability::engine_span("shopping_list").entered();
            if ids.is_empty() {
                println!("{}", messages.get("shopping-list-empty-selection"));
                return Ok(());
            }

            let corpus = load_corpus(&config)?;
            let selected = select_by_ids(&corpus, &ids);
            let unknown: Vec<&str> = ids
                .iter()
                .filter(|id| !selected.iter().any(|recipe| &recipe.id == *id))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() {
                warn!(unknown = ?unknown, "Unknown recipe ids in selection");
                let unknown = unknown.join(", ");
                eprintln!(
                    "{}",
                    messages.get_with("shopping-list-unknown-ids", &[("ids", unknown.as_str())])
                );
            }
            if selected.is_empty() {
                println!("{}", messages.get("shopping-list-empty-selection"));
                return Ok(());
            }

            let items = ShoppingListAggregator::with_parser(&parser).aggregate(&selected);

            match output {
                Some(path) => {
                    save_plain_text(&items, &path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    let path = path.display().to_string();
                    println!(
                        "{}",
                        messages.get_with("shopping-list-saved", &[("path", path.as_str())])
                    );
                }
                None => {
                    let count = selected.len().to_string();
                    println!(
                        "{}",
                        messages.get_with("shopping-list-header", &[("count", count.as_str())])
                    );
                    println!("{}", export_plain_text(&items));
                }
            }
        }
        Command::Parse { clause } => {
            let parsed = parser.parse(&clause);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
    }

    if cli.print_metrics {
        if let Some(handle) = metrics_handle {
            println!("{}", handle.render());
        }
    }

    Ok(())
}
