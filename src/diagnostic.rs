//! Suggestion generation and source-context enrichment shared by all passes.
//!
//! Validators never read source text themselves. Context is attached after
//! the fact through a [`SourceProvider`], so the passes stay pure functions
//! of the AST.

use std::collections::BTreeMap;

use crate::error::{Error, ErrorList};
use crate::types::Location;

/// Edit distance below which a single "did you mean" candidate is offered.
pub const SUGGESTION_THRESHOLD: usize = 5;

/// Upper bound on candidates listed in a generic suggestion.
pub const MAX_LISTED_CANDIDATES: usize = 5;

/// Source lines shown above the offending line.
pub const CONTEXT_LINES_BEFORE: usize = 2;

// ─── Suggestions ────────────────────────────────────────────────────────────

/// Levenshtein distance over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// The candidate with the smallest edit distance to `unknown`, with that
/// distance. Ties go to the first candidate in iteration order.
pub fn closest_match<'a, I>(unknown: &str, candidates: I) -> Option<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, usize)> = None;
    for candidate in candidates {
        let distance = edit_distance(unknown, candidate);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best
}

/// Build a suggestion for an unknown identifier.
///
/// Returns `Did you mean '<candidate>'?` when the closest candidate is within
/// [`SUGGESTION_THRESHOLD`], otherwise `Valid <noun> include: ...` listing up
/// to [`MAX_LISTED_CANDIDATES`] candidates. `None` when there are no
/// candidates at all.
pub fn suggest<S: AsRef<str>>(unknown: &str, candidates: &[S], noun: &str) -> Option<String> {
    let (best, distance) = closest_match(unknown, candidates.iter().map(|c| c.as_ref()))?;
    if distance < SUGGESTION_THRESHOLD {
        return Some(format!("Did you mean '{}'?", best));
    }
    let listed: Vec<&str> = candidates
        .iter()
        .take(MAX_LISTED_CANDIDATES)
        .map(|c| c.as_ref())
        .collect();
    Some(format!("Valid {} include: {}", noun, listed.join(", ")))
}

// ─── Source context ─────────────────────────────────────────────────────────

/// Read access to original source text, keyed by the file identifier used in
/// [`Location`]. Lines are 1-based.
pub trait SourceProvider {
    fn source_line(&self, file: &str, line: usize) -> Option<&str>;
}

/// In-memory provider over whole source texts.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    files: BTreeMap<String, String>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(file: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(file, text);
        map
    }

    pub fn insert(&mut self, file: impl Into<String>, text: impl Into<String>) {
        self.files.insert(file.into(), text.into());
    }
}

impl SourceProvider for SourceMap {
    fn source_line(&self, file: &str, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.files.get(file)?.lines().nth(line - 1)
    }
}

/// 1-based character column of `byte_offset` within `line`.
///
/// Offsets past the end or inside a multi-byte character count the
/// characters that start before them.
pub fn char_column(line: &str, byte_offset: usize) -> usize {
    line.char_indices().take_while(|(i, _)| *i < byte_offset).count() + 1
}

/// Render the lines around `location` with a gutter and a caret under the
/// column, clamped to one past the end of the line. `None` if the location
/// is unknown or the line is unavailable.
pub fn render_context(provider: &dyn SourceProvider, location: &Location) -> Option<String> {
    if !location.is_valid() {
        return None;
    }
    let target = provider.source_line(&location.file, location.line)?;

    let first = location.line.saturating_sub(CONTEXT_LINES_BEFORE).max(1);
    let width = location.line.to_string().len();
    let mut out = Vec::new();
    for n in first..location.line {
        if let Some(text) = provider.source_line(&location.file, n) {
            out.push(format!("{:>width$} | {}", n, text, width = width));
        }
    }
    out.push(format!("{:>width$} | {}", location.line, target, width = width));

    let pad = location.column.saturating_sub(1).min(target.chars().count());
    out.push(format!("{:>width$} | {}^", "", " ".repeat(pad), width = width));
    Some(out.join("\n"))
}

impl Error {
    /// Attach rendered source context, if the provider has the line.
    pub fn with_context(mut self, provider: &dyn SourceProvider) -> Self {
        if let Some(context) = render_context(provider, &self.location) {
            self.context = Some(context);
        }
        self
    }
}

impl ErrorList {
    /// Attach source context to every error that has a known location.
    pub fn with_context(mut self, provider: &dyn SourceProvider) -> Self {
        for error in self.errors_mut() {
            if let Some(context) = render_context(provider, &error.location) {
                error.context = Some(context);
            }
        }
        self
    }
}
