//! Stylesheet grammar built on `cssparser`
//!
//! Produces a shallow rule tree: style rules keep their raw selector and
//! value text, `@media` blocks keep their nested rules, and every other
//! at-rule is recorded by name only. Unlike a browser, any syntax error
//! rejects the whole document.

use cssparser::{
    AtRuleParser, CowRcStr, Delimiter, ParseError, ParseErrorKind, Parser, ParserInput,
    ParserState, QualifiedRuleParser, SourcePosition, StyleSheetParser, Token,
};

use crate::error::SyntaxError;

/// A `property: value` pair with the value text as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// An entry of a declaration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Declaration(Declaration),
    /// A nested at-rule such as `@apply`; its body is not inspected
    AtRule(String),
}

/// A node of the parsed rule tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleNode {
    Style {
        selectors: Vec<String>,
        body: Vec<BodyItem>,
    },
    Media {
        query: String,
        rules: Vec<RuleNode>,
    },
    AtRule {
        name: String,
    },
}

/// Parse a stylesheet into its top-level rule nodes
pub fn parse_stylesheet(css: &str) -> Result<Vec<RuleNode>, SyntaxError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_rule_list(&mut parser).map_err(syntax_error)
}

/// Structural test for "this text is a stylesheet"
///
/// Markup is rejected up front; anything else must parse cleanly and hold at
/// least one style rule or media block.
pub fn looks_like_css(text: &str) -> bool {
    let trimmed = text.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return false;
    }
    parse_stylesheet(text).is_ok_and(|nodes| {
        nodes
            .iter()
            .any(|node| matches!(node, RuleNode::Style { .. } | RuleNode::Media { .. }))
    })
}

#[derive(Debug, Clone, thiserror::Error)]
enum GrammarError {
    #[error("empty selector")]
    EmptySelector,
    #[error("unexpected '{0}' before selector")]
    StrayToken(char),
    #[error("missing '}}'")]
    UnclosedBlock,
    #[error("missing value for property '{0}'")]
    EmptyValue(String),
}

fn syntax_error(error: ParseError<'_, GrammarError>) -> SyntaxError {
    let message = match error.kind {
        ParseErrorKind::Basic(kind) => format!("{kind:?}"),
        ParseErrorKind::Custom(kind) => kind.to_string(),
    };
    SyntaxError {
        message,
        // cssparser lines are 0-based, columns 1-based
        line: error.location.line + 1,
        column: error.location.column,
    }
}

fn parse_rule_list<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Vec<RuleNode>, ParseError<'i, GrammarError>> {
    let mut rule_parser = RuleListParser::default();
    let mut rules = StyleSheetParser::new(input, &mut rule_parser);
    let mut nodes = Vec::new();
    loop {
        rules.parser.block_end = None;
        let Some(result) = rules.next() else {
            break;
        };
        nodes.push(result.map_err(|(error, _slice)| error)?);

        // cssparser closes blocks silently at end of input
        if let Some(block_end) = rules.parser.block_end
            && !rules.input.slice_from(block_end).trim_start().starts_with('}')
        {
            return Err(rules.input.new_custom_error(GrammarError::UnclosedBlock));
        }
    }
    Ok(nodes)
}

fn parse_body<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<Vec<BodyItem>, ParseError<'i, GrammarError>> {
    let mut items = Vec::new();
    loop {
        input.skip_whitespace();
        let location = input.current_source_location();
        let token = match input.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let item = match token {
            Token::Semicolon => continue,
            Token::AtKeyword(name) => {
                skip_at_rule(input);
                BodyItem::AtRule(name.to_ascii_lowercase())
            }
            Token::Ident(name) => parse_declaration(name.to_string(), input)?,
            // `*zoom: 1`
            Token::Delim('*') => match input.next_including_whitespace()?.clone() {
                Token::Ident(name) => parse_declaration(format!("*{name}"), input)?,
                other => return Err(location.new_unexpected_token_error(other)),
            },
            other => return Err(location.new_unexpected_token_error(other)),
        };
        items.push(item);
    }
    Ok(items)
}

fn parse_declaration<'i>(
    property: String,
    input: &mut Parser<'i, '_>,
) -> Result<BodyItem, ParseError<'i, GrammarError>> {
    input.parse_until_after(Delimiter::Semicolon, |input| {
        input.expect_colon()?;
        let value = remaining_text(input);
        if value.is_empty() {
            return Err(input.new_custom_error(GrammarError::EmptyValue(property)));
        }
        Ok(BodyItem::Declaration(Declaration {
            property,
            value: value.to_string(),
        }))
    })
}

/// Skip a nested at-rule up to its `;` or past its block
fn skip_at_rule(input: &mut Parser<'_, '_>) {
    while let Ok(token) = input.next() {
        if matches!(token, Token::Semicolon | Token::CurlyBracketBlock) {
            break;
        }
    }
}

/// Consume the rest of the (delimited) input and return it as trimmed text
fn remaining_text<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start).trim()
}

/// Like [`remaining_text`], but a top-level `;` or `}` is left over from a
/// broken rule and is rejected.
fn selector_text<'i>(
    input: &mut Parser<'i, '_>,
) -> Result<&'i str, ParseError<'i, GrammarError>> {
    let start = input.position();
    loop {
        let location = input.current_source_location();
        match input.next_including_whitespace_and_comments() {
            Ok(Token::Semicolon) => {
                return Err(location.new_custom_error(GrammarError::StrayToken(';')));
            }
            Ok(Token::CloseCurlyBracket) => {
                return Err(location.new_custom_error(GrammarError::StrayToken('}')));
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(input.slice_from(start).trim())
}

enum AtRulePrelude {
    Media(String),
    Other(String),
}

/// Parses a list of rules, remembering where the content of the last block ended
#[derive(Default)]
struct RuleListParser {
    block_end: Option<SourcePosition>,
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = Vec<String>;
    type QualifiedRule = RuleNode;
    type Error = GrammarError;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        input.parse_comma_separated(|selector| {
            let text = selector_text(selector)?;
            if text.is_empty() {
                return Err(selector.new_custom_error(GrammarError::EmptySelector));
            }
            Ok(text.to_string())
        })
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let body = parse_body(input)?;
        self.block_end = Some(input.position());
        Ok(RuleNode::Style {
            selectors: prelude,
            body,
        })
    }
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = AtRulePrelude;
    type AtRule = RuleNode;
    type Error = GrammarError;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let query = remaining_text(input);
        if name.eq_ignore_ascii_case("media") {
            Ok(AtRulePrelude::Media(query.to_string()))
        } else {
            Ok(AtRulePrelude::Other(name.to_ascii_lowercase()))
        }
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        let name = match prelude {
            AtRulePrelude::Media(_) => "media".to_string(),
            AtRulePrelude::Other(name) => name,
        };
        Ok(RuleNode::AtRule { name })
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let node = match prelude {
            AtRulePrelude::Media(query) => RuleNode::Media {
                query,
                rules: parse_rule_list(input)?,
            },
            AtRulePrelude::Other(name) => {
                while input.next().is_ok() {}
                RuleNode::AtRule { name }
            }
        };
        self.block_end = Some(input.position());
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(property: &str, value: &str) -> BodyItem {
        BodyItem::Declaration(Declaration {
            property: property.to_string(),
            value: value.to_string(),
        })
    }

    #[test]
    fn test_parse_style_rules() {
        let nodes = parse_stylesheet("a, .b > .c { color: red; margin: 0 auto !important }").unwrap();
        assert_eq!(
            nodes,
            vec![RuleNode::Style {
                selectors: vec!["a".to_string(), ".b > .c".to_string()],
                body: vec![
                    declaration("color", "red"),
                    declaration("margin", "0 auto !important"),
                ],
            }]
        );
    }

    #[test]
    fn test_selector_commas_inside_functions_do_not_split() {
        let nodes = parse_stylesheet(":is(a, b) span, [data-x=\"1,2\"] { top: 0 }").unwrap();
        let RuleNode::Style { selectors, .. } = &nodes[0] else {
            panic!("expected a style rule, got {nodes:?}");
        };
        assert_eq!(selectors, &[":is(a, b) span", "[data-x=\"1,2\"]"]);
    }

    #[test]
    fn test_parse_media_and_other_at_rules() {
        let css = r#"
            @charset "utf-8";
            /* comment */
            @media (max-width: 600px) { a { color: blue } b { top: 1px } }
            @font-face { font-family: "X"; src: url(x.woff2) }
        "#;
        // a leading @charset is consumed by cssparser itself
        let nodes = parse_stylesheet(css).unwrap();
        assert_eq!(nodes.len(), 2);
        let RuleNode::Media { query, rules } = &nodes[0] else {
            panic!("expected a media block, got {:?}", nodes[0]);
        };
        assert_eq!(query, "(max-width: 600px)");
        assert_eq!(rules.len(), 2);
        assert_eq!(
            nodes[1],
            RuleNode::AtRule {
                name: "font-face".to_string()
            }
        );
    }

    #[test]
    fn test_nested_at_rule_in_body() {
        let nodes = parse_stylesheet(".a { @apply --mixin; color: red }").unwrap();
        let RuleNode::Style { body, .. } = &nodes[0] else {
            panic!("expected a style rule, got {nodes:?}");
        };
        assert_eq!(
            body,
            &[BodyItem::AtRule("apply".to_string()), declaration("color", "red")]
        );
    }

    #[test]
    fn test_malformed_declaration_is_an_error() {
        let err = parse_stylesheet("a {\n  color red;\n}").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_selector_is_an_error() {
        let err = parse_stylesheet("a { top: 0 }\n{ color: red }").unwrap_err();
        assert_eq!(err.message, "empty selector");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_empty_value_is_an_error() {
        let err = parse_stylesheet("a { color: ; }").unwrap_err();
        assert_eq!(err.message, "missing value for property 'color'");
    }

    #[test]
    fn test_star_hack_property() {
        let nodes = parse_stylesheet(".clearfix { *zoom: 1; *display: inline; color: red }").unwrap();
        let RuleNode::Style { body, .. } = &nodes[0] else {
            panic!("expected a style rule, got {nodes:?}");
        };
        assert_eq!(
            body,
            &[
                declaration("*zoom", "1"),
                declaration("*display", "inline"),
                declaration("color", "red"),
            ]
        );
    }

    #[test]
    fn test_lone_star_in_body_is_an_error() {
        assert!(parse_stylesheet("a { * zoom: 1 }").is_err());
        assert!(parse_stylesheet("a { *: 1 }").is_err());
    }

    #[test]
    fn test_stray_closing_brace_is_an_error() {
        let err = parse_stylesheet("a{top:0}}b{top:0}").unwrap_err();
        assert_eq!(err.message, "unexpected '}' before selector");
        assert_eq!(err.column, 9);
    }

    #[test]
    fn test_stray_semicolon_is_an_error() {
        let err = parse_stylesheet("a { color: red } ; b { top: 0 }").unwrap_err();
        assert_eq!(err.message, "unexpected ';' before selector");
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = parse_stylesheet("a { top: 0 }\nb { color: red").unwrap_err();
        assert_eq!(err.message, "missing '}'");
        assert_eq!(err.line, 2);

        let err = parse_stylesheet("@media print { a { color: red }").unwrap_err();
        assert_eq!(err.message, "missing '}'");

        assert!(parse_stylesheet("@media print { a { color: red } }").is_ok());
        assert!(parse_stylesheet("a { color: red } /* trailing */").is_ok());
    }

    #[test]
    fn test_looks_like_css() {
        assert!(looks_like_css("a { color: red }"));
        assert!(looks_like_css("@media print { a { color: red } }"));
        assert!(!looks_like_css("<html><style>a { color: red }</style></html>"));
        assert!(!looks_like_css("styles/*.css"));
        assert!(!looks_like_css("@charset \"utf-8\";"));
        assert!(!looks_like_css(""));
    }
}
