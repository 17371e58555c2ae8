//! # andrews
//!
//! Andrews isotherm networks for pure fluids: pressure against specific
//! volume for a family of temperatures, optionally with the saturation
//! curve, saved as an image and optionally exported as tab-separated data.
//!
//! ## Highlights
//!
//! * **Two property backends**: NIST REFPROP (loaded at runtime) or a
//!   built-in Peng–Robinson equation of state, behind [`PropertyOracle`]
//! * **CoolProp-style queries**: `fluid.get("P", "T", 300.0, "D", 500.0)`,
//!   SI units throughout
//! * **Typed options**: [`IsothermOverrides`] keeps the classic key names
//!   (`vmin`, `Prange`, `fichier-Pv`, …) and resolves into a validated
//!   [`IsothermConfig`]
//! * **Explicit drawing context**: [`Figure`] renders PNG or SVG with
//!   plotters and is cleared after every diagram
//!
//! ## Quick example
//!
//! ```no_run
//! use andrews::{Figure, Fluid, IsothermOverrides, OutputPaths, generate};
//!
//! let co2 = Fluid::new("carbondioxide")?;
//! let overrides = IsothermOverrides {
//!     logx: Some(false),
//!     logy: Some(false),
//!     pressure_range: Some((1e6, 1e7)),
//!     vmin: Some(1e-3),
//!     vmax: Some(1e-2),
//!     temperatures: Some(vec![270.0, 290.0, 304.2, 310.0, 320.0]),
//!     saturation: Some(true),
//!     ..Default::default()
//! };
//! let mut figure = Figure::new();
//! generate(&co2, &overrides, &OutputPaths::new("PNG"), &mut figure)?;
//! # Ok::<(), andrews::AndrewsError>(())
//! ```
//!
//! ## Backends
//!
//! [`Fluid::new`] tries REFPROP first (`REFPROP_PATH`, possibly from a
//! `.env` file, then the standard install locations) and falls back to
//! Peng–Robinson. Pick one explicitly with [`Fluid::with_backend`].

// ── Internal modules ─────────────────────────────────────────────────
pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod figure;
pub mod fluid;
pub mod isotherms;
pub mod properties;
pub mod runfile;
pub mod sampling;
pub mod sys;

// ── Public re-exports ────────────────────────────────────────────────
pub use backend::PropertyOracle;
pub use config::{IsothermConfig, IsothermOverrides, OutputPaths};
pub use error::{AndrewsError, Result};
pub use figure::{Figure, Scale};
pub use fluid::{Backend, Fluid};
pub use isotherms::{GenerationReport, generate};
pub use properties::{CriticalProps, SaturationProps, StatePoint, TriplePoint};
