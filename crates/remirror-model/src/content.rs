//! Content expressions describing which children a node accepts.
//!
//! Supported syntax:
//!
//! ```text
//! expr  = term*
//! term  = atom ("*" | "+" | "?")?
//! atom  = name | "(" name ("|" name)* ")"
//! ```
//!
//! A `name` is either a node type or a group; a group stands for every node
//! type that lists it.

use crate::error::{Error, Result};

/// One position in a content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTerm {
    /// Node type indices (into the schema) accepted by this term.
    pub choices: Vec<usize>,
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

/// A resolved content expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentExpr {
    terms: Vec<ContentTerm>,
}

/// Unresolved term as written in the content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTerm {
    pub names: Vec<String>,
    pub min: usize,
    pub max: Option<usize>,
}

impl ContentExpr {
    /// An expression that accepts no children.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn terms(&self) -> &[ContentTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Every node index any term can accept
    pub fn accepted(&self) -> impl Iterator<Item = usize> + '_ {
        self.terms.iter().flat_map(|t| t.choices.iter().copied())
    }

    /// Resolve raw terms against a name lookup.
    ///
    /// `lookup` maps a name to the node indices it denotes (one index for a
    /// node type, every member for a group, empty when unknown).
    pub(crate) fn resolve(
        node: &str,
        raw: Vec<RawTerm>,
        lookup: impl Fn(&str) -> Vec<usize>,
    ) -> Result<Self> {
        let mut terms = Vec::with_capacity(raw.len());
        for term in raw {
            let mut choices = Vec::new();
            for name in &term.names {
                let found = lookup(name);
                if found.is_empty() {
                    return Err(Error::UnknownContent {
                        node: node.to_string(),
                        name: name.clone(),
                    });
                }
                for index in found {
                    if !choices.contains(&index) {
                        choices.push(index);
                    }
                }
            }
            terms.push(ContentTerm {
                choices,
                min: term.min,
                max: term.max,
            });
        }
        Ok(Self { terms })
    }

    /// Check whether a sequence of child type indices satisfies the expression.
    pub fn matches(&self, children: &[usize]) -> bool {
        match_from(&self.terms, children)
    }
}

fn match_from(terms: &[ContentTerm], children: &[usize]) -> bool {
    let Some((term, rest)) = terms.split_first() else {
        return children.is_empty();
    };

    // Longest run of children this term could take.
    let mut run = 0;
    while run < children.len()
        && term.max.is_none_or(|max| run < max)
        && term.choices.contains(&children[run])
    {
        run += 1;
    }

    // Try greedy first, backtracking towards the minimum.
    (term.min..=run)
        .rev()
        .any(|taken| match_from(rest, &children[taken..]))
}

/// Parse the textual form of a content expression.
pub(crate) fn parse_expr(node: &str, source: &str) -> Result<Vec<RawTerm>> {
    let invalid = |message: String| Error::InvalidContentExpression {
        node: node.to_string(),
        message,
    };

    let tokens = tokenize(source);
    let mut terms = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let names = if tokens[i] == "(" {
            i += 1;
            let mut names = Vec::new();
            loop {
                let Some(token) = tokens.get(i) else {
                    return Err(invalid("unclosed group".into()));
                };
                match token.as_str() {
                    ")" => {
                        i += 1;
                        break;
                    }
                    "|" => i += 1,
                    "(" | "*" | "+" | "?" => {
                        return Err(invalid(format!("unexpected '{}' inside group", token)));
                    }
                    name => {
                        names.push(name.to_string());
                        i += 1;
                    }
                }
            }
            if names.is_empty() {
                return Err(invalid("empty group".into()));
            }
            names
        } else {
            let token = &tokens[i];
            if matches!(token.as_str(), ")" | "|" | "*" | "+" | "?") {
                return Err(invalid(format!("unexpected '{}'", token)));
            }
            i += 1;
            vec![token.clone()]
        };

        let (min, max) = match tokens.get(i).map(String::as_str) {
            Some("*") => (0, None),
            Some("+") => (1, None),
            Some("?") => (0, Some(1)),
            _ => (1, Some(1)),
        };
        if matches!(tokens.get(i).map(String::as_str), Some("*" | "+" | "?")) {
            i += 1;
        }

        terms.push(RawTerm { names, min, max });
    }

    Ok(terms)
}

fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in source.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            current.push(ch);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if matches!(ch, '(' | ')' | '|' | '*' | '+' | '?') {
            tokens.push(ch.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lookup(name: &str) -> Vec<usize> {
        match name {
            "paragraph" => vec![0],
            "heading" => vec![1],
            "text" => vec![2],
            "block" => vec![0, 1],
            _ => vec![],
        }
    }

    fn expr(source: &str) -> ContentExpr {
        ContentExpr::resolve("test", parse_expr("test", source).unwrap(), lookup).unwrap()
    }

    #[rstest]
    #[case("block+", &[0, 1, 0], true)]
    #[case("block+", &[], false)]
    #[case("block*", &[], true)]
    #[case("text*", &[2, 2], true)]
    #[case("heading paragraph*", &[1, 0, 0], true)]
    #[case("heading paragraph*", &[0], false)]
    #[case("(paragraph | heading)? text", &[2], true)]
    #[case("(paragraph | heading)? text", &[1, 2], true)]
    #[case("(paragraph | heading)? text", &[1, 0, 2], false)]
    #[case("paragraph* paragraph", &[0, 0], true)]
    fn test_matches(#[case] source: &str, #[case] children: &[usize], #[case] expected: bool) {
        assert_eq!(expr(source).matches(children), expected, "{source} vs {children:?}");
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let raw = parse_expr("doc", "chapter+").unwrap();
        let err = ContentExpr::resolve("doc", raw, lookup).unwrap_err();
        assert!(matches!(err, Error::UnknownContent { ref name, .. } if name == "chapter"));
    }

    #[rstest]
    #[case("(paragraph")]
    #[case("+ paragraph")]
    #[case("()")]
    fn test_malformed_expressions(#[case] source: &str) {
        assert!(matches!(
            parse_expr("doc", source),
            Err(Error::InvalidContentExpression { .. })
        ));
    }

    #[test]
    fn test_empty_expression_accepts_nothing() {
        let empty = expr("");
        assert!(empty.is_empty());
        assert!(empty.matches(&[]));
        assert!(!empty.matches(&[0]));
    }
}
