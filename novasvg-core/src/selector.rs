//! A small CSS selector engine for querying documents.
//!
//! Supports type, universal, `#id`, `.class` and attribute selectors
//! (`[a]`, `=`, `~=`, `^=`, `$=`, `*=`, `|=`), the `:first-child`,
//! `:last-child` and `:root` pseudo-classes, the four combinators
//! (descendant, `>`, `+`, `~`) and comma-separated lists.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{NovaError, NovaResult};
use crate::node::Element;

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq)]
struct Complex {
    /// Compounds from left to right.
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    /// Written as `*`; matches any tag.
    universal: bool,
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    FirstChild,
    LastChild,
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

impl Selector {
    /// Parse a selector list such as `g > rect.shape, #logo`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidSelector`] for empty or unsupported syntax.
    pub fn parse(text: &str) -> NovaResult<Self> {
        let mut parser = Parser {
            text,
            chars: text.char_indices().peekable(),
        };

        let mut alternatives = vec![parser.complex()?];
        while parser.eat(',') {
            alternatives.push(parser.complex()?);
        }
        parser.skip_whitespace();
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected character {c:?}")));
        }

        Ok(Self { alternatives })
    }

    /// Whether `element` matches any selector in the list.
    #[must_use]
    pub fn matches(&self, element: &Element<'_>) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(complex.compounds.len() - 1, *element))
    }
}

impl std::str::FromStr for Selector {
    type Err = NovaError;

    fn from_str(text: &str) -> NovaResult<Self> {
        Self::parse(text)
    }
}

impl Complex {
    fn matches_at(&self, index: usize, element: Element<'_>) -> bool {
        if !self.compounds[index].matches(&element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let left = index - 1;
        match self.combinators[left] {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|parent| self.matches_at(left, parent)),
            Combinator::Descendant => {
                let mut ancestor = element.parent_element();
                while let Some(candidate) = ancestor {
                    if self.matches_at(left, candidate) {
                        return true;
                    }
                    ancestor = candidate.parent_element();
                }
                false
            }
            Combinator::NextSibling => element
                .previous_element_sibling()
                .is_some_and(|sibling| self.matches_at(left, sibling)),
            Combinator::SubsequentSibling => {
                let mut sibling = element.previous_element_sibling();
                while let Some(candidate) = sibling {
                    if self.matches_at(left, candidate) {
                        return true;
                    }
                    sibling = candidate.previous_element_sibling();
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal && self.tag.is_none() && self.conditions.is_empty()
    }

    fn matches(&self, element: &Element<'_>) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag_name() != tag {
                return false;
            }
        }
        self.conditions.iter().all(|condition| condition.matches(element))
    }
}

impl Condition {
    fn matches(&self, element: &Element<'_>) -> bool {
        match self {
            Condition::Id(id) => element.attribute("id") == Some(id.as_str()),
            Condition::Class(class) => element
                .attribute("class")
                .is_some_and(|value| value.split_whitespace().any(|c| c == class)),
            Condition::Attribute { name, test } => match (element.attribute(name), test) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(value), Some((op, expected))) => op.matches(value, expected),
            },
            Condition::FirstChild => element.previous_element_sibling().is_none(),
            Condition::LastChild => element.next_element_sibling().is_none(),
            Condition::Root => element.parent_element().is_none(),
        }
    }
}

impl AttrOp {
    fn matches(self, value: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => value == expected,
            AttrOp::Includes => value.split_whitespace().any(|word| word == expected),
            AttrOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && value.contains(expected),
            AttrOp::DashMatch => {
                value == expected
                    || value
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> NovaError {
        NovaError::InvalidSelector {
            selector: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    /// Skip whitespace, then consume `expected` if it is next.
    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn complex(&mut self) -> NovaResult<Complex> {
        self.skip_whitespace();
        let first = self.compound()?;
        if first.is_empty() {
            return Err(self.error("expected a selector"));
        }

        let mut complex = Complex {
            compounds: vec![first],
            combinators: Vec::new(),
        };

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected character {c:?}"))),
            };
            if combinator != Combinator::Descendant {
                self.chars.next();
                self.skip_whitespace();
            }

            let compound = self.compound()?;
            if compound.is_empty() {
                return Err(self.error("expected a selector after combinator"));
            }
            complex.combinators.push(combinator);
            complex.compounds.push(compound);
        }

        Ok(complex)
    }

    fn compound(&mut self) -> NovaResult<Compound> {
        let mut compound = Compound::default();
        let mut universal = false;

        match self.peek() {
            Some('*') => {
                self.chars.next();
                universal = true;
            }
            Some(c) if is_ident_char(c) => compound.tag = Some(self.identifier()?),
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.chars.next();
                    compound.conditions.push(Condition::Id(self.identifier()?));
                }
                Some('.') => {
                    self.chars.next();
                    compound.conditions.push(Condition::Class(self.identifier()?));
                }
                Some('[') => {
                    self.chars.next();
                    compound.conditions.push(self.attribute()?);
                }
                Some(':') => {
                    self.chars.next();
                    let name = self.identifier()?;
                    let condition = match name.as_str() {
                        "first-child" => Condition::FirstChild,
                        "last-child" => Condition::LastChild,
                        "root" => Condition::Root,
                        other => {
                            return Err(self.error(format!("unsupported pseudo-class :{other}")))
                        }
                    };
                    compound.conditions.push(condition);
                }
                _ => break,
            }
        }

        compound.universal = universal;
        Ok(compound)
    }

    fn identifier(&mut self) -> NovaResult<String> {
        let mut ident = String::new();
        while let Some(c) = self.peek().filter(|&c| is_ident_char(c)) {
            ident.push(c);
            self.chars.next();
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    fn attribute(&mut self) -> NovaResult<Condition> {
        self.skip_whitespace();
        let name = self.identifier()?;
        self.skip_whitespace();

        let op = match self.peek() {
            Some(']') => {
                self.chars.next();
                return Ok(Condition::Attribute { name, test: None });
            }
            Some('=') => AttrOp::Equals,
            Some('~') => AttrOp::Includes,
            Some('^') => AttrOp::Prefix,
            Some('$') => AttrOp::Suffix,
            Some('*') => AttrOp::Substring,
            Some('|') => AttrOp::DashMatch,
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.chars.next();
        if op != AttrOp::Equals && self.chars.next().map(|(_, c)| c) != Some('=') {
            return Err(self.error("malformed attribute operator"));
        }

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some((_, c)) if c == quote => break,
                        Some((_, c)) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.identifier()?,
        };

        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(Condition::Attribute {
            name,
            test: Some((op, value)),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound() {
        let selector = Selector::parse("rect#a.b[fill='red']:first-child").expect("parse");
        assert_eq!(selector.alternatives.len(), 1);
        let compound = &selector.alternatives[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("rect"));
        assert_eq!(
            compound.conditions,
            vec![
                Condition::Id("a".into()),
                Condition::Class("b".into()),
                Condition::Attribute {
                    name: "fill".into(),
                    test: Some((AttrOp::Equals, "red".into())),
                },
                Condition::FirstChild,
            ]
        );
    }

    #[test]
    fn test_parse_combinators() {
        let selector = Selector::parse("svg g > rect + circle ~ path").expect("parse");
        assert_eq!(
            selector.alternatives[0].combinators,
            vec![
                Combinator::Descendant,
                Combinator::Child,
                Combinator::NextSibling,
                Combinator::SubsequentSibling,
            ]
        );
        assert_eq!(selector.alternatives[0].compounds.len(), 5);
    }

    #[test]
    fn test_parse_list_and_universal() {
        let selector = Selector::parse(" * , g>*,#x ").expect("parse");
        assert_eq!(selector.alternatives.len(), 3);
        assert!(selector.alternatives[0].compounds[0].universal);
    }

    #[test]
    fn test_attribute_operators() {
        assert!(AttrOp::Includes.matches("a b c", "b"));
        assert!(!AttrOp::Includes.matches("abc", "b"));
        assert!(AttrOp::Prefix.matches("shape-1", "shape"));
        assert!(AttrOp::Suffix.matches("shape-1", "-1"));
        assert!(AttrOp::Substring.matches("shape-1", "ape"));
        assert!(AttrOp::DashMatch.matches("en-US", "en"));
        assert!(AttrOp::DashMatch.matches("en", "en"));
        assert!(!AttrOp::DashMatch.matches("english", "en"));
        assert!(!AttrOp::Prefix.matches("anything", ""));
    }

    #[test]
    fn test_invalid_selectors() {
        for text in ["", "  ", "g >", "rect,", "#", "[fill", "[fill=]", ":hover", "a!b", "[a^b]"] {
            assert!(
                matches!(Selector::parse(text), Err(NovaError::InvalidSelector { .. })),
                "{text:?} should be rejected"
            );
        }
    }
}
