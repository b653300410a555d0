use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::enums::ErrorKind;
use crate::types::Location;

/// A single diagnostic produced by a validation pass or by ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Location,
    /// Rendered source excerpt with a caret line; see
    /// [`crate::diagnostic::SourceProvider`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: Location) -> Self {
        Error {
            kind,
            message: message.into(),
            location,
            context: None,
            suggestion: None,
        }
    }

    pub fn structural(message: impl Into<String>, location: &Location) -> Self {
        Error::new(ErrorKind::Structural, message, location.clone())
    }

    pub fn semantic(message: impl Into<String>, location: &Location) -> Self {
        Error::new(ErrorKind::Semantic, message, location.clone())
    }

    pub fn validation(message: impl Into<String>, location: &Location) -> Self {
        Error::new(ErrorKind::Validation, message, location.clone())
    }

    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Error::new(ErrorKind::Syntax, message, location)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a suggestion only when one was produced.
    pub fn with_optional_suggestion(mut self, suggestion: Option<String>) -> Self {
        if suggestion.is_some() {
            self.suggestion = suggestion;
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if self.location.is_valid() {
            write!(f, "\n  --> {}", self.location)?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n  |\n{}\n  |", context)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  = suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// Ordered, append-only collection of diagnostics from one validation call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorList {
    errors: Vec<Error>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Append every error of `other`, preserving discovery order.
    pub fn extend(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Negation of [`ErrorList::has_errors`].
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[Error] {
        &self.errors
    }

    pub fn of_kind(&self, kind: ErrorKind) -> Vec<&Error> {
        self.errors.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Empty list is success; anything else fails with the whole list.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub(crate) fn errors_mut(&mut self) -> &mut Vec<Error> {
        &mut self.errors
    }
}

impl From<Error> for ErrorList {
    fn from(error: Error) -> Self {
        ErrorList {
            errors: vec![error],
        }
    }
}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Found {} error(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n\nError {}:\n{}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}
