//! Input rules and paste rules.
//!
//! An input rule is a regex matched against the text of the current
//! textblock up to the cursor, including the text being typed. A paste rule
//! is matched against pasted plain text. Both hand the match to a handler
//! that edits the transaction; a handler returning `false` leaves the
//! transaction untouched and the next rule is tried.

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use remirror_model::{Attrs, Dispatch, EditorState, ResolvedPos, Transaction};

use crate::error::{Error, Result};

/// Only this many characters before the cursor are matched against
const MAX_MATCH: usize = 500;

/// Stands in for each inline leaf node so character offsets stay equal to
/// document positions
const LEAF_PLACEHOLDER: char = '\u{fffc}';

pub const INPUT_RULES_PLUGIN_KEY: &str = "inputRules";
pub const PASTE_RULES_PLUGIN_KEY: &str = "pasteRules";

/// A regex match located in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub from: usize,
    pub to: usize,
    /// Capture groups; index 0 is the whole match
    pub captures: Vec<Option<String>>,
}

impl RuleMatch {
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }

    pub fn text(&self) -> &str {
        self.capture(0).unwrap_or_default()
    }
}

/// Applies a matched rule to the transaction
pub type RuleHandler = Rc<dyn Fn(&mut Transaction, &RuleMatch) -> bool>;

/// Computes attributes from a match
pub type MatchAttrs = fn(&RuleMatch) -> Attrs;

#[derive(Clone)]
pub struct InputRule {
    pub pattern: String,
    pub handler: RuleHandler,
}

impl InputRule {
    pub fn new(pattern: impl Into<String>, handler: impl Fn(&mut Transaction, &RuleMatch) -> bool + 'static) -> Self {
        Self {
            pattern: pattern.into(),
            handler: Rc::new(handler),
        }
    }

    /// Replace the match with its first capture group, marked with `mark`
    pub fn mark(pattern: impl Into<String>, mark: &str) -> Self {
        let mark = mark.to_string();
        Self::new(pattern, move |tr, m| {
            let Some(inner) = m.capture(1).filter(|t| !t.is_empty()) else {
                return false;
            };
            let Ok(mark) = tr.schema().mark(&mark, Attrs::new()) else {
                return false;
            };
            let Ok(mut marks) = tr.marks_at(m.from) else {
                return false;
            };
            marks.push(mark);
            tr.insert_text_with_marks(inner, m.from, m.to, marks).is_ok()
        })
    }

    /// Delete the match and turn its textblock into `node`
    pub fn textblock_type(pattern: impl Into<String>, node: &str, attrs: MatchAttrs) -> Self {
        let node = node.to_string();
        Self::new(pattern, move |tr, m| {
            let result = tr
                .delete(m.from, m.to)
                .and_then(|tr| tr.set_block_type(m.from, m.from, &node, attrs(m)));
            result.is_ok()
        })
    }
}

#[derive(Clone)]
pub struct PasteRule {
    pub pattern: String,
    pub handler: RuleHandler,
}

impl PasteRule {
    pub fn new(pattern: impl Into<String>, handler: impl Fn(&mut Transaction, &RuleMatch) -> bool + 'static) -> Self {
        Self {
            pattern: pattern.into(),
            handler: Rc::new(handler),
        }
    }

    /// Add `mark` over every match, with attributes computed from the match
    pub fn mark(pattern: impl Into<String>, mark: &str, attrs: MatchAttrs) -> Self {
        let mark = mark.to_string();
        Self::new(pattern, move |tr, m| {
            match tr.schema().mark(&mark, attrs(m)) {
                Ok(mark) => tr.add_mark(m.from, m.to, mark).is_ok(),
                Err(_) => false,
            }
        })
    }
}

struct CompiledRule {
    owner: String,
    regex: Regex,
    handler: RuleHandler,
}

fn compile(owner: &str, pattern: &str, handler: RuleHandler) -> Result<CompiledRule> {
    let regex = Regex::new(pattern).map_err(|err| Error::InvalidInputRule {
        extension: owner.to_string(),
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })?;
    Ok(CompiledRule {
        owner: owner.to_string(),
        regex,
        handler,
    })
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn captures_of(caps: &regex::Captures<'_>) -> Vec<Option<String>> {
    caps.iter().map(|c| c.map(|m| m.as_str().to_string())).collect()
}

/// Runs input rules for typed text.
pub struct InputRulesPlugin {
    rules: Vec<CompiledRule>,
}

impl fmt::Debug for InputRulesPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.rules.iter().map(|r| r.regex.as_str()).collect();
        f.debug_struct("InputRulesPlugin").field("rules", &patterns).finish()
    }
}

impl InputRulesPlugin {
    /// Compile rules given in extension order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInputRule`] for the first pattern that is not a valid regex.
    pub fn new(rules: Vec<(String, Vec<InputRule>)>) -> Result<Self> {
        let mut compiled = Vec::new();
        for (owner, rules) in rules {
            for rule in rules {
                compiled.push(compile(&owner, &rule.pattern, rule.handler)?);
            }
        }
        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn try_rules(&self, state: &EditorState, from: usize, to: usize, text: &str) -> Option<Transaction> {
        let rp = ResolvedPos::resolve(state.doc(), from).ok()?;
        let parent = rp.parent();
        let depth = rp.depth();
        if !state.schema().is_textblock(parent) || to > rp.end(depth) {
            return None;
        }
        let block_start = rp.start(depth);
        let leaf = LEAF_PLACEHOLDER.to_string();
        let before = parent.text_between_with_leaves(0, from - block_start, "", &leaf);
        let skipped = char_len(&before).saturating_sub(MAX_MATCH);
        let before: String = before.chars().skip(skipped).collect();
        let haystack = format!("{before}{text}");
        let haystack_start = block_start + skipped;

        let mut tr = state.tr();
        tr.insert_text(text, from, to).ok()?;

        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(&haystack) else {
                continue;
            };
            let Some(whole) = caps.get(0).filter(|m| m.end() == haystack.len()) else {
                continue;
            };
            // A rule never replaces an inline leaf node
            if whole.as_str().contains(LEAF_PLACEHOLDER) {
                continue;
            }
            let rule_match = RuleMatch {
                from: haystack_start + char_len(&haystack[..whole.start()]),
                to: haystack_start + char_len(&haystack),
                captures: captures_of(&caps),
            };
            let checkpoint = tr.checkpoint();
            if (rule.handler)(&mut tr, &rule_match) {
                tracing::debug!(extension = %rule.owner, pattern = rule.regex.as_str(), "Input rule applied");
                return Some(tr);
            }
            tr.rollback(checkpoint);
        }
        None
    }
}

impl remirror_model::Plugin for InputRulesPlugin {
    fn key(&self) -> &str {
        INPUT_RULES_PLUGIN_KEY
    }

    fn handle_text_input(
        &self,
        state: &EditorState,
        from: usize,
        to: usize,
        text: &str,
        dispatch: Dispatch<'_>,
    ) -> bool {
        match self.try_rules(state, from, to, text) {
            Some(tr) => {
                dispatch(tr);
                true
            }
            None => false,
        }
    }
}

/// Runs paste rules over pasted plain text.
pub struct PasteRulesPlugin {
    rules: Vec<CompiledRule>,
}

impl fmt::Debug for PasteRulesPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.rules.iter().map(|r| r.regex.as_str()).collect();
        f.debug_struct("PasteRulesPlugin").field("rules", &patterns).finish()
    }
}

impl PasteRulesPlugin {
    /// Compile rules given in extension order.
    pub fn new(rules: Vec<(String, Vec<PasteRule>)>) -> Result<Self> {
        let mut compiled = Vec::new();
        for (owner, rules) in rules {
            for rule in rules {
                compiled.push(compile(&owner, &rule.pattern, rule.handler)?);
            }
        }
        Ok(Self { rules: compiled })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn paste(&self, state: &EditorState, text: &str) -> Option<Transaction> {
        if self.rules.is_empty() || text.is_empty() {
            return None;
        }
        let mut tr = state.tr();
        let start = tr.selection().from();
        tr.replace_selection_with_text(text).ok()?;
        let mut end = start + char_len(text);
        let mut matched = false;

        for rule in &self.rules {
            let pasted = tr.doc().text_between(start, end, "");
            // Later matches first so earlier positions stay valid
            let matches: Vec<RuleMatch> = rule
                .regex
                .captures_iter(&pasted)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    Some(RuleMatch {
                        from: start + char_len(&pasted[..whole.start()]),
                        to: start + char_len(&pasted[..whole.end()]),
                        captures: captures_of(&caps),
                    })
                })
                .collect();
            for rule_match in matches.iter().rev() {
                let size = tr.doc().content_size();
                let checkpoint = tr.checkpoint();
                if (rule.handler)(&mut tr, rule_match) {
                    matched = true;
                    end = (end + tr.doc().content_size()).saturating_sub(size);
                } else {
                    tr.rollback(checkpoint);
                }
            }
        }

        matched.then_some(tr)
    }
}

impl remirror_model::Plugin for PasteRulesPlugin {
    fn key(&self) -> &str {
        PASTE_RULES_PLUGIN_KEY
    }

    fn handle_paste(&self, state: &EditorState, text: &str, dispatch: Dispatch<'_>) -> bool {
        match self.paste(state, text) {
            Some(tr) => {
                dispatch(tr);
                true
            }
            None => false,
        }
    }
}
