//! Property oracles.
//!
//! A [`PropertyOracle`] answers CoolProp-style queries
//! (`get("P", "T", 300.0, "D", 500.0)`) for one fluid, in SI units.
//! Two implementations ship with the crate:
//!
//! * [`refprop::RefpropBackend`]: NIST REFPROP through its shared library;
//! * [`peng_robinson::PengRobinsonBackend`]: a cubic equation of state
//!   with an embedded fluid table, always available.

pub mod fluids;
pub mod peng_robinson;
pub mod refprop;

use crate::error::*;
use crate::properties::*;

/// Black-box fluid property source.
///
/// All values are SI: K, Pa, kg/m³, quality as a mass vapor fraction.
pub trait PropertyOracle {
    /// Name the oracle was created with.
    fn fluid_name(&self) -> &str;

    /// Critical temperature, pressure and density.
    fn critical_point(&self) -> Result<CriticalProps>;

    /// Triple-point temperature and pressure.
    fn triple_point(&self) -> Result<TriplePoint>;

    /// Single property from two independent state variables.
    ///
    /// Supported input pairs are (T, D), (T, Q) and (P, Q) in either
    /// order; outputs are `T`, `P`, `D` and `Q`. Keys are
    /// case-insensitive.
    fn get(&self, output: &str, key1: &str, val1: f64, key2: &str, val2: f64) -> Result<f64>;
}

// ── Query parsing shared by the backends ────────────────────────────

/// Normalised input pair of a `get` query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputPair {
    /// Temperature (K) and mass density (kg/m³).
    TD { t: f64, d: f64 },
    /// Temperature (K) and quality.
    TQ { t: f64, q: f64 },
    /// Pressure (Pa) and quality.
    PQ { p: f64, q: f64 },
}

impl InputPair {
    pub fn parse(key1: &str, val1: f64, key2: &str, val2: f64) -> Result<Self> {
        validate_finite(key1, val1)?;
        validate_finite(key2, val2)?;

        let k1 = normalise_key(key1);
        let k2 = normalise_key(key2);
        match (k1.as_str(), k2.as_str()) {
            ("T", "D") => Ok(Self::TD { t: val1, d: val2 }),
            ("D", "T") => Ok(Self::TD { t: val2, d: val1 }),
            ("T", "Q") => Ok(Self::TQ { t: val1, q: val2 }),
            ("Q", "T") => Ok(Self::TQ { t: val2, q: val1 }),
            ("P", "Q") => Ok(Self::PQ { p: val1, q: val2 }),
            ("Q", "P") => Ok(Self::PQ { p: val2, q: val1 }),
            _ => Err(AndrewsError::InvalidInput(format!(
                "Unsupported input pair ({key1}, {key2}). Supported: (T,D) (T,Q) (P,Q)"
            ))),
        }
    }
}

/// Pick the requested output out of a flash result.
pub fn select_output(output: &str, state: &StatePoint) -> Result<f64> {
    match normalise_key(output).as_str() {
        "T" => Ok(state.temperature),
        "P" => Ok(state.pressure),
        "D" => Ok(state.density),
        "Q" => Ok(state.quality),
        _ => Err(AndrewsError::InvalidInput(format!(
            "Unknown output property \"{output}\". Supported: T P D Q"
        ))),
    }
}

fn normalise_key(key: &str) -> String {
    let upper = key.trim().to_uppercase();
    match upper.as_str() {
        "RHO" | "DMASS" => "D".to_string(),
        _ => upper,
    }
}

/// Ensure a value is a finite number (not NaN, not ±Infinity).
pub(crate) fn validate_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(AndrewsError::InvalidInput(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Quality must stay on the tie line.
pub(crate) fn validate_quality(q: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AndrewsError::InvalidInput(format!(
            "quality must be within [0, 1], got {q}"
        )));
    }
    Ok(())
}
