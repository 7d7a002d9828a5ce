use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Frame or grid with a zero side.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Pixel buffer length does not match `width × height × 3`.
    #[error("Buffer pixel incohérent : {len} octets pour {width}×{height}")]
    BufferMismatch {
        /// Actual byte length.
        len: usize,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Grid string that cannot be parsed (expected `COLSxROWS`).
    #[error("Taille de grille invalide : {0} (attendu COLSxROWS)")]
    InvalidGrid(String),
}
