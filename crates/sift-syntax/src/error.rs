//! Failures of the Tree-sitter front end.

use std::path::PathBuf;

use sift_core::{ProfileError, TreeError};
use thiserror::Error;

use crate::language::SupportedLanguage;

/// Raised while turning source text into a [`sift_core::Tree`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// The grammar could not be loaded into a parser.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInitError {
        /// Language whose grammar was rejected.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// No bundled grammar handles this extension.
    #[error("unsupported file extension: {extension}")]
    UnsupportedExtension {
        /// The offending extension, without the dot.
        extension: String,
    },

    /// The path has no extension to detect a language from.
    #[error("could not determine language for path: {}", path.display())]
    UnknownLanguage {
        /// The path as given.
        path: PathBuf,
    },

    /// Tree-sitter produced no tree.
    #[error("failed to parse {language}: {message}")]
    ParseError {
        /// Language of the rejected source.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// The Tree-sitter tree broke an arena invariant during conversion.
    #[error("failed to build syntax tree: {0}")]
    Tree(#[from] TreeError),
}

impl SyntaxError {
    /// Builds [`Self::ParserInitError`].
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInitError {
            language,
            message: message.into(),
        }
    }

    /// Builds [`Self::UnsupportedExtension`].
    #[must_use]
    pub fn unsupported_extension(extension: impl Into<String>) -> Self {
        Self::UnsupportedExtension {
            extension: extension.into(),
        }
    }

    /// Builds [`Self::UnknownLanguage`].
    #[must_use]
    pub const fn unknown_language(path: PathBuf) -> Self {
        Self::UnknownLanguage { path }
    }

    /// Builds [`Self::ParseError`].
    #[must_use]
    pub fn parse(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParseError {
            language,
            message: message.into(),
        }
    }
}

impl From<SyntaxError> for ProfileError {
    fn from(error: SyntaxError) -> Self {
        Self::new(error.to_string())
    }
}
