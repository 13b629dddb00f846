//! Error types for the season ledger
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Domain failures are raised as [`PodiumError`] and
//! recovered at the API boundary with `downcast_ref`.

use serde::{Deserialize, Serialize};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ledger scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PodiumError {
    #[error("A season with id {season_id} does not exist")]
    SeasonNotFound { season_id: String },

    #[error("No game with id {game_id} found")]
    GameNotFound { game_id: String },

    #[error("No player with id {player_id} found in season {season_id}")]
    PlayerNotFound {
        player_id: String,
        season_id: String,
    },

    #[error("Player resolution failed: {reason}")]
    PlayerResolutionFailed { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Persistence failed: {reason}")]
    PersistenceFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

/// Broad category of a failure, used to pick the transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Client,
    Server,
}

impl PodiumError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn resolution_failed(reason: impl Into<String>) -> Self {
        Self::PlayerResolutionFailed {
            reason: reason.into(),
        }
    }

    pub fn persistence_failed(reason: impl Into<String>) -> Self {
        Self::PersistenceFailed {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            PodiumError::SeasonNotFound { .. }
            | PodiumError::GameNotFound { .. }
            | PodiumError::PlayerNotFound { .. } => ErrorClass::NotFound,
            PodiumError::PlayerResolutionFailed { .. } | PodiumError::InvalidInput { .. } => {
                ErrorClass::Client
            }
            PodiumError::PersistenceFailed { .. } | PodiumError::ConfigurationError { .. } => {
                ErrorClass::Server
            }
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PodiumError::SeasonNotFound { .. } => "season_not_found",
            PodiumError::GameNotFound { .. } => "game_not_found",
            PodiumError::PlayerNotFound { .. } => "player_not_found",
            PodiumError::PlayerResolutionFailed { .. } => "player_resolution_failed",
            PodiumError::InvalidInput { .. } => "invalid_input",
            PodiumError::PersistenceFailed { .. } => "persistence_failed",
            PodiumError::ConfigurationError { .. } => "configuration_error",
        }
    }

    /// Human readable headline for error payloads
    pub fn title(&self) -> &'static str {
        match self {
            PodiumError::SeasonNotFound { .. } => "Season not found",
            PodiumError::GameNotFound { .. } => "Game not found",
            PodiumError::PlayerNotFound { .. } => "Player not found",
            PodiumError::PlayerResolutionFailed { .. } => "Players could not be resolved",
            PodiumError::InvalidInput { .. } => "Invalid request",
            PodiumError::PersistenceFailed { .. } => "Storage operation failed",
            PodiumError::ConfigurationError { .. } => "Service misconfigured",
        }
    }
}

/// Error payload returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub title: String,
    pub description: String,
}

impl ErrorBody {
    /// Build a payload from any error, classifying ledger errors by kind
    pub fn from_error(error: &anyhow::Error) -> (ErrorClass, Self) {
        match error.downcast_ref::<PodiumError>() {
            Some(podium_error) => (
                podium_error.class(),
                Self {
                    title: podium_error.title().to_string(),
                    description: podium_error.to_string(),
                },
            ),
            None => (
                ErrorClass::Server,
                Self {
                    title: "An error occurred".to_string(),
                    description: error.to_string(),
                },
            ),
        }
    }
}
