//! # Localization
//!
//! Fluent message bundles for the user-facing strings of the command-line
//! front end. Bundles are compiled into the binary from `locales/<lang>/main.ftl`.

use anyhow::Result;
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Language used when a requested one is missing
pub const DEFAULT_LANGUAGE: &str = "en";

const LOCALE_SOURCES: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en/main.ftl")),
    ("fr", include_str!("../locales/fr/main.ftl")),
];

/// Localization manager for the recipe assistant
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled locale
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (locale_str, source) in LOCALE_SOURCES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    fn create_bundle(
        locale: &LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new(vec![locale.clone()]);
        // Plain output, no Unicode isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid {} messages: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {} messages: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {}", key),
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                // Numeric strings become numbers so plural selectors apply
                fluent_args.set(*name, FluentValue::try_number(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key, language, errors = ?errors, "Message formatted with errors");
        }
        value.into_owned()
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Supported language for a locale tag (`"fr-FR"` -> `"fr"`), English otherwise
    pub fn detect_language(&self, language_code: Option<&str>) -> String {
        detect_language(language_code, |lang| self.is_language_supported(lang))
    }
}

/// Extract the primary language subtag and keep it when `is_supported` accepts it
pub fn detect_language(language_code: Option<&str>, is_supported: impl Fn(&str) -> bool) -> String {
    if let Some(code) = language_code {
        let lang = code
            .split(['-', '_'])
            .next()
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_lowercase();

        if is_supported(&lang) {
            return lang;
        }
    }

    DEFAULT_LANGUAGE.to_string()
}
