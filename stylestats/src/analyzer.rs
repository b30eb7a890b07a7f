//! Statistics over rules, selectors and declarations
//!
//! Each analysis is a pure function of the extracted collections, so running
//! it twice over the same input yields identical results.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::extract::ExtractedRules;
use crate::options::Patterns;
use crate::parser::Declaration;

static UNQUALIFIED_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.+\]$").expect("valid attribute pattern"));

static COMBINATOR_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?([>+~])\s?").expect("valid combinator pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static IDENTIFIER_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s|>|\+|~|:|[\w\]]\.|[\w\]]#|\[").expect("valid identifier pattern")
});

static DATA_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:image/[A-Za-z0-9;,+=/]+").expect("valid data URI pattern"));

static SHORT_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-F])([0-9A-F])([0-9A-F])$").expect("valid hex pattern"));

const IMPORTANT: &str = "!important";

/// Number of declarations held by one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDensity {
    pub selector: String,
    pub count: usize,
}

/// Identifier count of one selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorComplexity {
    pub selector: String,
    pub count: usize,
}

/// How often a property is declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyCount {
    pub property: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleAnalysis {
    /// Sorted by descending count; ties keep source order
    pub densities: Vec<RuleDensity>,
}

impl RuleAnalysis {
    /// The rule with the most declarations, first occurrence on ties
    pub fn lowest_cohesion(&self) -> Option<&RuleDensity> {
        self.densities.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorAnalysis {
    pub id_selectors: usize,
    pub universal_selectors: usize,
    pub unqualified_attribute_selectors: usize,
    pub javascript_specific_selectors: usize,
    pub user_specified_selectors: usize,
    /// Sorted by descending count; ties keep source order
    pub identifiers: Vec<SelectorComplexity>,
}

impl SelectorAnalysis {
    /// The selector with the highest identifier count, first occurrence on ties
    pub fn most_identifier(&self) -> Option<&SelectorComplexity> {
        self.identifiers.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationAnalysis {
    pub data_uri_size: usize,
    pub important_keywords: usize,
    pub float_properties: usize,
    pub unique_font_sizes: Vec<String>,
    pub unique_font_families: Vec<String>,
    pub unique_colors: Vec<String>,
    /// Sorted by descending count; ties keep first-declared order
    pub properties: Vec<PropertyCount>,
}

/// The three analyses computed over one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub rules: RuleAnalysis,
    pub selectors: SelectorAnalysis,
    pub declarations: DeclarationAnalysis,
}

impl Analysis {
    pub fn new(extracted: &ExtractedRules, patterns: &Patterns) -> Self {
        Self {
            rules: analyze_rules(extracted),
            selectors: analyze_selectors(&extracted.selectors, patterns),
            declarations: analyze_declarations(&extracted.declarations),
        }
    }
}

pub fn analyze_rules(extracted: &ExtractedRules) -> RuleAnalysis {
    let mut densities: Vec<RuleDensity> = extracted
        .rules
        .iter()
        .filter(|rule| !rule.declarations.is_empty())
        .map(|rule| RuleDensity {
            selector: rule.selectors.join(","),
            count: rule.declarations.len(),
        })
        .collect();
    densities.sort_by(|a, b| b.count.cmp(&a.count));
    RuleAnalysis { densities }
}

pub fn analyze_selectors(selectors: &[String], patterns: &Patterns) -> SelectorAnalysis {
    let mut analysis = SelectorAnalysis::default();

    for selector in selectors {
        let trimmed = selector.trim();

        if selector.contains('#') {
            analysis.id_selectors += 1;
        }
        if selector.contains('*') {
            analysis.universal_selectors += 1;
        }
        if UNQUALIFIED_ATTRIBUTE.is_match(trimmed) {
            analysis.unqualified_attribute_selectors += 1;
        }
        if patterns.javascript.as_ref().is_some_and(|re| re.is_match(trimmed)) {
            analysis.javascript_specific_selectors += 1;
        }
        if patterns.user.as_ref().is_some_and(|re| re.is_match(trimmed)) {
            analysis.user_specified_selectors += 1;
        }

        analysis.identifiers.push(SelectorComplexity {
            selector: selector.clone(),
            count: identifier_count(selector),
        });
    }

    analysis.identifiers.sort_by(|a, b| b.count.cmp(&a.count));
    analysis
}

/// Collapse whitespace around `>`, `+`, `~` and squeeze the rest to single spaces
pub fn normalize_selector(selector: &str) -> String {
    let collapsed = COMBINATOR_SPACING.replace_all(selector, "$1");
    WHITESPACE.replace_all(&collapsed, " ").into_owned()
}

/// Heuristic depth of a selector's combinator and qualifier chain
pub fn identifier_count(selector: &str) -> usize {
    IDENTIFIER_BOUNDARY
        .split(&normalize_selector(selector))
        .count()
}

pub fn analyze_declarations(declarations: &[Declaration]) -> DeclarationAnalysis {
    let mut analysis = DeclarationAnalysis::default();
    let mut font_sizes = Vec::new();
    let mut font_families = Vec::new();
    let mut colors = Vec::new();
    let mut properties: IndexMap<&str, usize> = IndexMap::new();

    for Declaration { property, value } in declarations {
        analysis.data_uri_size += DATA_URI
            .find_iter(value)
            .map(|data_uri| data_uri.as_str().len())
            .sum::<usize>();

        if value.contains(IMPORTANT) {
            analysis.important_keywords += 1;
        }
        if property.contains("float") {
            analysis.float_properties += 1;
        }
        if property.contains("font-family") {
            font_families.push(value.replace(IMPORTANT, "").trim().to_string());
        }
        if property.contains("font-size") {
            font_sizes.push(value.replacen(IMPORTANT, "", 1).trim().to_string());
        }
        if property == "color" {
            colors.push(value.replacen(IMPORTANT, "", 1).to_uppercase().trim().to_string());
        }

        *properties.entry(property.as_str()).or_default() += 1;
    }

    font_families.sort();
    font_families.dedup();
    analysis.unique_font_families = font_families;

    analysis.unique_font_sizes = unique_in_order(font_sizes);
    analysis
        .unique_font_sizes
        .sort_by(|a, b| font_size_magnitude(a).total_cmp(&font_size_magnitude(b)));

    let mut colors: Vec<String> = colors
        .into_iter()
        .filter(|color| color != "TRANSPARENT" && color != "INHERIT")
        .map(|color| expand_short_hex(&color))
        .collect();
    colors.sort();
    colors.dedup();
    analysis.unique_colors = colors;

    let mut properties: Vec<PropertyCount> = properties
        .into_iter()
        .map(|(property, count)| PropertyCount {
            property: property.to_string(),
            count,
        })
        .collect();
    properties.sort_by(|a, b| b.count.cmp(&a.count));
    analysis.properties = properties;

    analysis
}

/// `#ABC` becomes `#AABBCC`; anything else is returned unchanged
pub fn expand_short_hex(color: &str) -> String {
    SHORT_HEX.replace(color, "#$1$1$2$2$3$3").into_owned()
}

/// Numeric sort key of a font size: digits and dots only, 0 if that is not a number
fn font_size_magnitude(size: &str) -> f64 {
    let digits: String = size
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

fn unique_in_order(values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn declaration(property: &str, value: &str) -> Declaration {
        Declaration {
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_normalize_selector() {
        assert_eq!(normalize_selector(".a .b > .c"), ".a .b>.c");
        assert_eq!(normalize_selector("a +\nb ~ c"), "a+b~c");
        assert_eq!(normalize_selector("a  \t b"), "a b");
    }

    #[test]
    fn test_identifier_count() {
        assert_eq!(identifier_count(".a .b > .c"), 3);
        assert_eq!(identifier_count("a"), 1);
        assert_eq!(identifier_count("ul li a:hover"), 4);
        assert_eq!(identifier_count("a.b#c"), 3);
        assert_eq!(identifier_count("input[type=text]"), 2);
    }

    #[test]
    fn test_most_identifier_first_occurrence_wins() {
        let analysis = analyze_selectors(
            &selectors(&["a", ".x .y", "p span", "ul li a"]),
            &Patterns::default(),
        );
        let most = analysis.most_identifier().unwrap();
        assert_eq!(most.count, 3);
        assert_eq!(most.selector, "ul li a");
        assert!(analysis.identifiers.iter().all(|s| s.count <= most.count));

        let analysis = analyze_selectors(&selectors(&["a b", "c d"]), &Patterns::default());
        assert_eq!(analysis.most_identifier().unwrap().selector, "a b");
    }

    #[test]
    fn test_selector_classification() {
        let patterns = Patterns {
            javascript: Some(Regex::new("[#.]js-").unwrap()),
            user: Some(Regex::new(r"\.u-").unwrap()),
        };
        let analysis = analyze_selectors(
            &selectors(&["#main", "* html", "[hidden]", ".js-toggle", ".u-wide", "a"]),
            &patterns,
        );
        assert_eq!(analysis.id_selectors, 1);
        assert_eq!(analysis.universal_selectors, 1);
        assert_eq!(analysis.unqualified_attribute_selectors, 1);
        assert_eq!(analysis.javascript_specific_selectors, 1);
        assert_eq!(analysis.user_specified_selectors, 1);
    }

    #[test]
    fn test_lowest_cohesion() {
        let extracted = extract("a { top: 0 } .b, .c { top: 0; left: 0 } .d { top: 1px; left: 0 } e {}").unwrap();
        let analysis = analyze_rules(&extracted);
        assert_eq!(analysis.densities.len(), 3);
        let lowest = analysis.lowest_cohesion().unwrap();
        assert_eq!(lowest.count, 2);
        assert_eq!(lowest.selector, ".b,.c");
    }

    #[test]
    fn test_unique_colors_merge_short_hex() {
        let extracted = extract("a{color:#fff;color:#FFFFFF}").unwrap();
        let analysis = analyze_declarations(&extracted.declarations);
        assert_eq!(analysis.unique_colors, vec!["#FFFFFF"]);
    }

    #[test]
    fn test_unique_colors_filters_keywords() {
        let analysis = analyze_declarations(&[
            declaration("color", "transparent"),
            declaration("color", "inherit !important"),
            declaration("color", "red !important"),
            declaration("color", "#abc"),
            declaration("background-color", "blue"),
        ]);
        assert_eq!(analysis.unique_colors, vec!["#AABBCC", "RED"]);
    }

    #[test]
    fn test_data_uri_size_counts_only_payload() {
        let analysis = analyze_declarations(&[
            declaration("background", "url(data:image/png;base64,AAAA)"),
            declaration("color", "red"),
        ]);
        assert_eq!(analysis.data_uri_size, "data:image/png;base64,AAAA".len());
    }

    #[test]
    fn test_important_and_float() {
        let analysis = analyze_declarations(&[
            declaration("float", "left !important"),
            declaration("css-float", "none"),
            declaration("color", "red"),
        ]);
        assert_eq!(analysis.important_keywords, 1);
        assert_eq!(analysis.float_properties, 2);
    }

    #[test]
    fn test_font_families_and_sizes() {
        let analysis = analyze_declarations(&[
            declaration("font-family", "Helvetica, sans-serif"),
            declaration("font-family", "Arial !important"),
            declaration("font-family", "Arial"),
            declaration("font-size", "2em"),
            declaration("font-size", "12px !important"),
            declaration("font-size", "1.5em"),
            declaration("font-size", "12px"),
        ]);
        assert_eq!(
            analysis.unique_font_families,
            vec!["Arial", "Helvetica, sans-serif"]
        );
        assert_eq!(analysis.unique_font_sizes, vec!["1.5em", "2em", "12px"]);
    }

    #[test]
    fn test_property_counts() {
        let analysis = analyze_declarations(&[
            declaration("top", "0"),
            declaration("color", "red"),
            declaration("color", "blue"),
            declaration("left", "0"),
        ]);
        let properties: Vec<(&str, usize)> = analysis
            .properties
            .iter()
            .map(|p| (p.property.as_str(), p.count))
            .collect();
        assert_eq!(properties, vec![("color", 2), ("top", 1), ("left", 1)]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let extracted = extract(
            ".a .b > .c { color: #abc; font-size: 12px } #x[y] { float: left; color: red !important }",
        )
        .unwrap();
        let patterns = Patterns::default();
        assert_eq!(
            Analysis::new(&extracted, &patterns),
            Analysis::new(&extracted, &patterns)
        );
    }
}
