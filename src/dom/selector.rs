//! Minimal CSS-style selectors for locating tables and mount points
//!
//! Supported: `tag`, `#id`, `.class`, `[attr]`, `[attr=value]` and compounds
//! of those (`table.report[data-paginate]`), plus `,`-separated lists.
//! Combinators are not supported.

use anyhow::{anyhow, bail, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeTest {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
}

impl Compound {
    fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        if let Some(wanted) = &self.tag {
            if !wanted.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if attributes.get("id") != Some(id) {
                return false;
            }
        }
        let classes: Vec<&str> = attributes
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        self.attributes.iter().all(|test| match test {
            AttributeTest::Present(name) => attributes.contains_key(name),
            AttributeTest::Equals(name, value) => attributes.get(name) == Some(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let alternatives = input
            .split(',')
            .map(|part| parse_compound(part.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        self.alternatives.iter().any(|c| c.matches(tag, attributes))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(input: &str) -> Result<Compound> {
    if input.is_empty() {
        bail!("Empty selector");
    }
    if input.contains(char::is_whitespace) && !input.contains('[') {
        bail!("Descendant selectors are not supported: '{}'", input);
    }

    let mut compound = Compound::default();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;

    let read_ident = |pos: &mut usize| -> String {
        let start = *pos;
        while *pos < chars.len() && is_ident_char(chars[*pos]) {
            *pos += 1;
        }
        chars[start..*pos].iter().collect()
    };

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                pos += 1;
                let id = read_ident(&mut pos);
                if id.is_empty() {
                    bail!("Missing id after '#' in '{}'", input);
                }
                compound.id = Some(id);
            }
            '.' => {
                pos += 1;
                let class = read_ident(&mut pos);
                if class.is_empty() {
                    bail!("Missing class after '.' in '{}'", input);
                }
                compound.classes.push(class);
            }
            '[' => {
                let close = chars[pos..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| pos + offset)
                    .ok_or_else(|| anyhow!("Unclosed '[' in '{}'", input))?;
                let body: String = chars[pos + 1..close].iter().collect();
                compound.attributes.push(parse_attribute(&body)?);
                pos = close + 1;
            }
            c if is_ident_char(c) && pos == 0 => {
                compound.tag = Some(read_ident(&mut pos));
            }
            c => bail!("Unexpected '{}' in selector '{}'", c, input),
        }
    }

    Ok(compound)
}

fn parse_attribute(body: &str) -> Result<AttributeTest> {
    match body.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if name.is_empty() {
                bail!("Missing attribute name in '[{}]'", body);
            }
            Ok(AttributeTest::Equals(name.to_string(), value.to_string()))
        }
        None => {
            let name = body.trim();
            if name.is_empty() {
                bail!("Empty attribute selector");
            }
            Ok(AttributeTest::Present(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_selectors() {
        let a = attrs(&[("id", "orders"), ("class", "report wide"), ("data-paginate", "")]);
        assert!(Selector::parse("table").unwrap().matches("table", &a));
        assert!(Selector::parse("#orders").unwrap().matches("table", &a));
        assert!(Selector::parse(".wide").unwrap().matches("table", &a));
        assert!(Selector::parse("[data-paginate]").unwrap().matches("table", &a));
        assert!(!Selector::parse("#users").unwrap().matches("table", &a));
        assert!(!Selector::parse("div").unwrap().matches("table", &a));
    }

    #[test]
    fn test_compound_and_list() {
        let a = attrs(&[("id", "orders"), ("class", "report"), ("data-kind", "sales")]);
        let selector = Selector::parse("table.report[data-kind=\"sales\"]").unwrap();
        assert!(selector.matches("table", &a));
        assert!(!Selector::parse("table.report.wide").unwrap().matches("table", &a));
        assert!(Selector::parse("#users, #orders").unwrap().matches("table", &a));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div table").is_err());
        assert!(Selector::parse("[data-x").is_err());
        assert!(Selector::parse("#").is_err());
    }
}
