//! Flattening of the rule tree into rule, selector and declaration lists

use crate::error::{Error, Result};
use crate::parser::{self, BodyItem, Declaration, RuleNode};

/// A style rule: its selectors and its genuine declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

/// Everything the statistics engine reads from a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRules {
    pub rules: Vec<Rule>,
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub media_queries: usize,
}

/// Parse `document` and flatten its rules
///
/// Rules directly inside a top-level `@media` block join the top-level list;
/// deeper nesting is ignored. A document without any rule is an error.
pub fn extract(document: &str) -> Result<ExtractedRules> {
    let nodes = parser::parse_stylesheet(document)?;

    let mut extracted = ExtractedRules::default();
    for node in nodes {
        match node {
            RuleNode::Style { selectors, body } => extracted.rules.push(to_rule(selectors, body)),
            RuleNode::Media { rules, .. } => {
                extracted.media_queries += 1;
                for nested in rules {
                    if let RuleNode::Style { selectors, body } = nested {
                        extracted.rules.push(to_rule(selectors, body));
                    }
                }
            }
            RuleNode::AtRule { .. } => {}
        }
    }

    if extracted.rules.is_empty() {
        return Err(Error::NoRules);
    }

    extracted.selectors = extracted
        .rules
        .iter()
        .flat_map(|rule| rule.selectors.iter().cloned())
        .collect();
    extracted.declarations = extracted
        .rules
        .iter()
        .flat_map(|rule| rule.declarations.iter().cloned())
        .collect();

    tracing::debug!(
        rules = extracted.rules.len(),
        selectors = extracted.selectors.len(),
        declarations = extracted.declarations.len(),
        media_queries = extracted.media_queries,
        "Extracted rules"
    );

    Ok(extracted)
}

fn to_rule(selectors: Vec<String>, body: Vec<BodyItem>) -> Rule {
    let declarations = body
        .into_iter()
        .filter_map(|item| match item {
            BodyItem::Declaration(declaration) => Some(declaration),
            BodyItem::AtRule(_) => None,
        })
        .collect();
    Rule {
        selectors,
        declarations,
    }
}
