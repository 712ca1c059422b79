use serde::{Deserialize, Serialize};

/// The class of failure carried by a `ContextError`, so that callers can react to
/// a missing capability differently than to a record that could not be fetched.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The fonts (or another rendering prerequisite) are not available.
    MissingRenderingCapability,
    /// A student, promotion or program record could not be retrieved.
    RecordFetchFailure,
    /// The laid out content could not be converted into a bitmap.
    RasterizationFailure,
    /// The generated documents could not be bundled together.
    ArchivalFailure,
    /// The report request itself is inconsistent.
    InvalidRequest,
    /// The fragment could not be parsed or laid out.
    Layout,
    /// The configuration file could not be read.
    Configuration,
    /// The PDF document or the output files could not be written.
    Output,
    #[default]
    Other,
}

/// A struct that represents an error with a context and possibly the propagated source error.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContextError {
    pub kind: ErrorKind,
    pub context: String,
    pub source_error: Option<String>,
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_error {
            Some(source_error) => write!(
                formatter,
                "{}: {}",
                self.context,
                minimize_first_letter(source_error.to_string()),
            ),
            None => write!(formatter, "{}", self.context),
        }
    }
}

impl std::error::Error for ContextError {}

impl ContextError {
    /// Create a new `ContextError` with the given context.
    pub fn with_context<S: Into<String>>(context: S) -> ContextError {
        ContextError {
            kind: ErrorKind::default(),
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new `ContextError` with the given context and source error.
    pub fn with_error<S: Into<String>>(context: S, error: &dyn std::error::Error) -> ContextError {
        ContextError {
            kind: ErrorKind::default(),
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }

    /// Tag the error with the class of failure it belongs to.
    pub fn of_kind(mut self, kind: ErrorKind) -> ContextError {
        self.kind = kind;
        self
    }

    /// Wrap this error into a wider context while keeping its kind, the message of this
    /// error becomes the source of the new one.
    pub fn wrap<S: Into<String>>(self, context: S) -> ContextError {
        ContextError {
            kind: self.kind,
            context: context.into(),
            source_error: Some(self.to_string()),
        }
    }
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}
