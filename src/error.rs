use thiserror::Error;

#[derive(Error, Debug)]
pub enum AndrewsError {
    /// Error returned by a REFPROP routine (ierr > 0).
    #[error("REFPROP error {code}: {message}")]
    Refprop { code: i32, message: String },

    /// The REFPROP DLL/so could not be loaded.
    #[error("REFPROP library not found: {0}")]
    LibraryNotFound(String),

    /// The fluid is unknown to the selected property backend.
    #[error("Fluid not found: {0}")]
    FluidNotFound(String),

    /// Invalid or out‑of‑range input (oracle arguments or configuration).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catch‑all for calculation failures.
    #[error("Calculation failed: {0}")]
    CalculationFailed(String),

    /// Run file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Chart rendering failed.
    #[error("Plot error: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AndrewsError>;
