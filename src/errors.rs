//! Unified error type for the service.
//!
//! Every layer (core, web, bot) returns [`Result`]. The web layer maps these
//! variants onto HTTP status codes in `web::error`.

use thiserror::Error;

/// Every failure the service reports.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any sea-orm failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Missing or malformed request fields
    #[error("Invalid input: {message}")]
    Validation {
        /// Which field was rejected and why
        message: String,
    },

    /// Chat identity not in the staff table
    #[error("Staff '{staff_id}' is not registered")]
    StaffNotFound {
        /// Identity that was looked up
        staff_id: String,
    },

    /// Staff member exists but is suspended
    #[error("Staff '{staff_id}' is suspended")]
    StaffBanned {
        /// Suspended identity
        staff_id: String,
    },

    /// Registration or rename onto an existing id
    #[error("Staff id '{staff_id}' is already in use")]
    StaffIdTaken {
        /// Id that is taken
        staff_id: String,
    },

    /// Unknown product id
    #[error("Product {id} not found")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// Unknown chain id
    #[error("Chain {id} not found")]
    ChainNotFound {
        /// Requested chain id
        id: i64,
    },

    /// Unknown price log id
    #[error("Price log {id} not found")]
    LogNotFound {
        /// Requested log id
        id: i64,
    },

    /// Option deletion refused while products use the value
    #[error("Option '{name}' is still used by {count} products")]
    OptionInUse {
        /// Option value
        name: String,
        /// Products still using it
        count: u64,
    },

    /// Admin credentials or session token rejected
    #[error("Unauthorized")]
    Unauthorized,

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Public base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Discord client failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
