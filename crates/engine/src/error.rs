//! The module contains the errors the engine can throw.
//!
//! The engine never talks to the network, so every error here is a
//! validation failure on data typed by the user or read from a report:
//!
//! - [`UnknownMember`] when credentials name someone outside the household.
//! - [`UnknownCategory`] when the form holds a category missing from the catalog.
//! - [`InvalidAmount`] and [`InvalidDate`] when the form cannot be sent.
//!
//!  [`UnknownMember`]: EngineError::UnknownMember
//!  [`UnknownCategory`]: EngineError::UnknownCategory
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidDate`]: EngineError::InvalidDate
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown member \"{0}\"")]
    UnknownMember(String),
    #[error("missing API key")]
    MissingApiKey,
    #[error("不正カテゴリー: \"{0}\"")]
    UnknownCategory(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid report: {0}")]
    InvalidReport(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnknownMember(a), Self::UnknownMember(b)) => a == b,
            (Self::MissingApiKey, Self::MissingApiKey) => true,
            (Self::UnknownCategory(a), Self::UnknownCategory(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::InvalidReport(a), Self::InvalidReport(b)) => a == b,
            (Self::Csv(a), Self::Csv(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
