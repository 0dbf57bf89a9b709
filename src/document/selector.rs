//! Minimal selector support
//!
//! Covers what the page uses: compound selectors made of an optional tag,
//! an optional `#id`, any number of `.class` and `[attr]` parts, joined by
//! the descendant combinator (whitespace).

use crate::{Error, Result};

/// One compound selector, e.g. `img.hero[data-src]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<String>,
}

/// Parsed selector: compounds from outermost ancestor to subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub compounds: Vec<Compound>,
}

/// What a selector needs to know about an element
pub trait Matchable {
    fn tag(&self) -> &str;
    fn id(&self) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
    fn has_attribute(&self, name: &str) -> bool;
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> Option<String> {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    if *pos == start {
        None
    } else {
        Some(chars[start..*pos].iter().collect())
    }
}

impl Compound {
    fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidSelector(text.to_string());
        let chars: Vec<char> = text.chars().collect();
        let mut pos = 0;
        let mut compound = Compound {
            tag: take_ident(&chars, &mut pos).map(|t| t.to_ascii_lowercase()),
            ..Compound::default()
        };

        while pos < chars.len() {
            let marker = chars[pos];
            pos += 1;
            match marker {
                '#' => {
                    if compound.id.is_some() {
                        return Err(invalid());
                    }
                    compound.id = Some(take_ident(&chars, &mut pos).ok_or_else(invalid)?);
                }
                '.' => compound
                    .classes
                    .push(take_ident(&chars, &mut pos).ok_or_else(invalid)?),
                '[' => {
                    let name = take_ident(&chars, &mut pos).ok_or_else(invalid)?;
                    if chars.get(pos) != Some(&']') {
                        return Err(invalid());
                    }
                    pos += 1;
                    compound.attributes.push(name);
                }
                _ => return Err(invalid()),
            }
        }

        Ok(compound)
    }

    pub fn matches<M: Matchable + ?Sized>(&self, element: &M) -> bool {
        self.tag.as_deref().map_or(true, |tag| element.tag() == tag)
            && self.id.as_deref().map_or(true, |id| element.id() == Some(id))
            && self.classes.iter().all(|c| element.has_class(c))
            && self.attributes.iter().all(|a| element.has_attribute(a))
    }
}

impl Selector {
    pub fn parse(text: &str) -> Result<Self> {
        let compounds = text
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Result<Vec<_>>>()?;
        if compounds.is_empty() {
            return Err(Error::InvalidSelector(text.to_string()));
        }
        Ok(Self { compounds })
    }

    /// Whether the selector matches the subject, given its ancestors from
    /// nearest to farthest.
    ///
    /// Descendant-only chains can be matched greedily: each ancestor compound
    /// takes the nearest ancestor that satisfies it.
    pub fn matches<'a, M, I>(&self, subject: &M, ancestors: I) -> bool
    where
        M: Matchable + ?Sized + 'a,
        I: IntoIterator<Item = &'a M>,
    {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !last.matches(subject) {
            return false;
        }

        let mut pending = rest.iter().rev().peekable();
        for ancestor in ancestors {
            match pending.peek() {
                Some(compound) if compound.matches(ancestor) => {
                    pending.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        pending.peek().is_none()
    }
}
