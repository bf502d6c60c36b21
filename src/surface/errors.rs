//! Control-surface error types.

use thiserror::Error;

/// Errors that can occur while loading or validating a surface configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is not valid JSON or does not match the expected shape.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The deck has no floor plans.
    #[error("configuration contains no floor plans")]
    EmptyDeck,

    /// A floor plan has no speakers.
    #[error("floor plan '{label}' has no speakers")]
    EmptyFloorPlan {
        /// Label of the offending floor plan.
        label: String,
    },

    /// A speaker id appears twice within one floor plan.
    #[error("speaker id '{id}' appears more than once in floor plan '{label}'")]
    DuplicateSpeaker {
        /// Label of the floor plan.
        label: String,
        /// The duplicated speaker id.
        id: String,
    },

    /// Hall dimensions are not positive finite numbers.
    #[error("invalid hall dimensions: {width} x {height} m")]
    InvalidHall { width: f64, height: f64 },

    /// A ratio setting is outside `[0, 0.5)`.
    #[error("{name} must be within [0, 0.5), got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    /// A pixel or meter threshold is negative or not finite.
    #[error("{name} must be a non-negative finite number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Errors produced when the hall cannot be mapped onto the viewport.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// Hall dimensions are not positive finite numbers.
    #[error("invalid hall dimensions: {width} x {height} m")]
    InvalidHall { width: f64, height: f64 },

    /// The viewport leaves no drawable area once margins are removed.
    #[error("viewport {width} x {height} px leaves no drawable area with margin ratio {margin_ratio}")]
    DegenerateViewport {
        width: f64,
        height: f64,
        margin_ratio: f64,
    },
}

/// Errors that can occur while building or reconfiguring a control surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
