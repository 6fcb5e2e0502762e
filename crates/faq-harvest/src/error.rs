//! Error types for the extraction library.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("question {index} has no text")]
    EmptyQuestion { index: usize },

    #[error("link {index} has no visible text")]
    EmptyLinkText { index: usize },

    #[error("link {index} (`{text}`) has no target")]
    MissingHref { index: usize, text: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
