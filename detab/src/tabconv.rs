//! Column-aware tab to space conversion.
//!
//! For a tab width of 4 the engine builds this cascade and applies it until no
//! tab is left in the text:
//!
//! ```text
//! /((?:\r\n|\r|\n|^)(?:[^\t\r\n]{4})*[^\t\r\n]{0})\t/g → "${1}    "
//! /((?:\r\n|\r|\n|^)(?:[^\t\r\n]{4})*[^\t\r\n]{1})\t/g → "${1}   "
//! /((?:\r\n|\r|\n|^)(?:[^\t\r\n]{4})*[^\t\r\n]{2})\t/g → "${1}  "
//! /((?:\r\n|\r|\n|^)(?:[^\t\r\n]{4})*[^\t\r\n]{3})\t/g → "${1} "
//! ```
//!
//! Converter `i` only matches a tab whose tab-free prefix on the current line has
//! length `i` modulo the width, and pads it to the next tab stop. Each converter
//! can only see the leftmost remaining tab of a line, so a line with `n` tabs
//! needs `n` passes. Every pass resolves at least the leftmost tab of every line
//! that still has one, which bounds the loop.
//!
//! Columns are counted in Unicode scalar values; `\r\n`, `\r` and `\n` all end a
//! line.

use std::borrow::Cow;

use regex::Regex;
use tracing::trace;

use crate::errors::{DetabError, DetabResult};

/// Widest tab accepted. The cascade grows with the width and much wider
/// converters stop compiling within the regex size limit.
pub const MAX_TAB_WIDTH: i64 = 127;

/// One pattern/replacement pair of the cascade
#[derive(Debug, Clone)]
pub struct TabConverter {
    matcher: Regex,
    replacement: String,
}

impl TabConverter {
    fn new(pattern: &str, replacement: String) -> DetabResult<Self> {
        Ok(Self {
            matcher: Regex::new(pattern)?,
            replacement,
        })
    }

    /// The regular expression this converter matches
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// The replacement template, in `regex` expansion syntax
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every non-overlapping match once. Returns `None` when nothing matched.
    fn replace_all(&self, text: &str) -> Option<String> {
        match self.matcher.replace_all(text, self.replacement.as_str()) {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(replaced),
        }
    }
}

/// The full, ordered converter cascade for one tab width
#[derive(Debug, Clone)]
pub struct TabConverters {
    tab_width: usize,
    converters: Vec<TabConverter>,
}

impl TabConverters {
    /// Builds the cascade for `tab_width`.
    ///
    /// A width of 0 deletes tab runs, a width of 1 turns every tab into a single
    /// space, and any larger width pads to the next multiple of the width.
    /// Widths outside `0..=MAX_TAB_WIDTH` are rejected.
    pub fn new(tab_width: i64) -> DetabResult<Self> {
        if tab_width < 0 {
            return Err(DetabError::invalid_argument(format!(
                "tab width must not be negative, got {}",
                tab_width
            )));
        }
        if tab_width > MAX_TAB_WIDTH {
            return Err(DetabError::invalid_argument(format!(
                "tab width must be at most {}, got {}",
                MAX_TAB_WIDTH, tab_width
            )));
        }
        let tab_width = tab_width as usize;

        let converters = match tab_width {
            0 => vec![TabConverter::new(r"\t+", String::new())?],
            1 => vec![TabConverter::new(r"\t", " ".to_string())?],
            width => (0..width)
                .map(|residue| {
                    TabConverter::new(
                        &format!(
                            r"((?:\r\n|\r|\n|^)(?:[^\t\r\n]{{{}}})*[^\t\r\n]{{{}}})\t",
                            width, residue
                        ),
                        format!("${{1}}{}", " ".repeat(width - residue)),
                    )
                })
                .collect::<DetabResult<Vec<_>>>()?,
        };

        Ok(Self {
            tab_width,
            converters,
        })
    }

    /// The tab width this cascade was built for
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabConverter> {
        self.converters.iter()
    }

    /// Rewrites every tab in `text`. Tab-free text is returned borrowed.
    ///
    /// Each pass rescans the whole text and resolves only the leftmost tab of
    /// each line, so a line with `n` tabs costs `n` passes over the text.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !text.contains('\t') {
            return Cow::Borrowed(text);
        }

        let mut text = text.to_owned();
        let mut passes = 0usize;
        while text.contains('\t') {
            for converter in &self.converters {
                let replaced = match converter.replace_all(&text) {
                    Some(replaced) => replaced,
                    None => continue,
                };
                text = replaced;
            }
            passes += 1;
        }

        trace!(
            "Converted tabs at width {} in {} passes",
            self.tab_width,
            passes
        );
        Cow::Owned(text)
    }
}

/// Converts the tabs in `text` with a freshly built cascade.
///
/// Prefer building [`TabConverters`] once when converting many texts.
pub fn convert_tabs(text: &str, tab_width: i64) -> DetabResult<String> {
    let converters = TabConverters::new(tab_width)?;
    Ok(converters.apply(text).into_owned())
}

/// Counts the tab characters in `text`
pub fn count_tabs(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\t').count()
}
