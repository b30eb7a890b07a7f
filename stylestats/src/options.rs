//! Analysis options
//!
//! Options are read from JSON with camelCase keys. Every metric has its own
//! switch; keys missing from the file keep their default value.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Error, Result};

/// Default pattern for selectors used as JavaScript hooks (`.js-foo`, `#js-bar`)
pub const DEFAULT_JAVASCRIPT_PATTERN: &str = "[#.]js-";

/// Default number of entries kept in `propertiesCount`
pub const DEFAULT_PROPERTIES_COUNT: usize = 10;

/// The set of enabled metrics plus request configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub published: bool,
    pub paths: bool,
    pub stylesheets: bool,
    pub style_elements: bool,
    pub size: bool,
    pub data_uri_size: bool,
    pub ratio_of_data_uri_size: bool,
    pub gzipped_size: bool,
    pub rules: bool,
    pub selectors: bool,
    pub simplicity: bool,
    pub most_identifier: bool,
    pub most_identifier_selector: bool,
    pub lowest_cohesion: bool,
    pub lowest_cohesion_selector: bool,
    pub total_unique_font_sizes: bool,
    pub unique_font_sizes: bool,
    pub total_unique_font_families: bool,
    pub unique_font_families: bool,
    pub total_unique_colors: bool,
    pub unique_colors: bool,
    pub id_selectors: bool,
    pub universal_selectors: bool,
    pub unqualified_attribute_selectors: bool,
    /// Regex for JavaScript hook selectors; `None` disables the metric
    #[serde(deserialize_with = "toggle")]
    pub javascript_specific_selectors: Option<String>,
    /// Regex for user-specified hook selectors; `None` disables the metric
    #[serde(deserialize_with = "toggle")]
    pub user_specified_selectors: Option<String>,
    pub important_keywords: bool,
    pub float_properties: bool,
    /// Keep only the N most used properties; `None` disables the metric
    #[serde(deserialize_with = "toggle")]
    pub properties_count: Option<usize>,
    pub media_queries: bool,
    pub request_options: RequestOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            published: true,
            paths: true,
            stylesheets: true,
            style_elements: true,
            size: true,
            data_uri_size: true,
            ratio_of_data_uri_size: true,
            gzipped_size: true,
            rules: true,
            selectors: true,
            simplicity: true,
            most_identifier: true,
            most_identifier_selector: true,
            lowest_cohesion: true,
            lowest_cohesion_selector: true,
            total_unique_font_sizes: true,
            unique_font_sizes: true,
            total_unique_font_families: true,
            unique_font_families: true,
            total_unique_colors: true,
            unique_colors: true,
            id_selectors: true,
            universal_selectors: true,
            unqualified_attribute_selectors: true,
            javascript_specific_selectors: Some(DEFAULT_JAVASCRIPT_PATTERN.to_string()),
            user_specified_selectors: None,
            important_keywords: true,
            float_properties: true,
            properties_count: Some(DEFAULT_PROPERTIES_COUNT),
            media_queries: true,
            request_options: RequestOptions::default(),
        }
    }
}

impl Options {
    /// Load options from a JSON file, filling unspecified keys with defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_error = |source: ConfigError| Error::Config {
            path: path.to_path_buf(),
            source,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_error(e.into()))?;
        Self::from_json(&text).map_err(|e| config_error(e.into()))
    }

    /// Parse options from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Settings handed to the HTTP client untouched by the analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    /// Total request timeout in milliseconds
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

/// Selector patterns compiled once per run
#[derive(Debug, Clone, Default)]
pub struct Patterns {
    pub javascript: Option<Regex>,
    pub user: Option<Regex>,
}

impl Patterns {
    pub fn compile(options: &Options) -> Result<Self> {
        Ok(Self {
            javascript: compile_pattern(
                "javascriptSpecificSelectors",
                options.javascript_specific_selectors.as_deref(),
            )?,
            user: compile_pattern(
                "userSpecifiedSelectors",
                options.user_specified_selectors.as_deref(),
            )?,
        })
    }
}

fn compile_pattern(option: &'static str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).map_err(|source| Error::Pattern { option, source }))
        .transpose()
}

/// Accepts a value or a boolean. A bare boolean carries no pattern or limit,
/// so both `false` and `true` leave the option disabled.
fn toggle<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Toggle<T> {
        Flag(bool),
        Value(T),
    }

    Ok(match Option::<Toggle<T>>::deserialize(deserializer)? {
        Some(Toggle::Value(value)) => Some(value),
        Some(Toggle::Flag(enabled)) => {
            if enabled {
                tracing::warn!("Option set to true without a value; leaving it disabled");
            }
            None
        }
        None => None,
    })
}
