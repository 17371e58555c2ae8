use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::backend::fluids::{self, FluidConstants};
use crate::backend::{InputPair, PropertyOracle, select_output, validate_finite, validate_quality};
use crate::error::*;
use crate::properties::*;

/// Molar gas constant (J/(mol·K)).
pub const GAS_CONSTANT: f64 = 8.314_462_618;

/// Critical compressibility factor of the Peng–Robinson equation.
const Z_CRIT: f64 = 0.307_401;

const SQRT2: f64 = std::f64::consts::SQRT_2;

/// Above this fraction of Tc the dome is too thin to resolve and states
/// are treated as single phase.
const TWO_PHASE_LIMIT: f64 = 1.0 - 1e-6;

const SPINODAL_GRID: usize = 400;
const MAX_ITER: usize = 200;

// ── Backend ─────────────────────────────────────────────────────────

/// Peng–Robinson (1976) cubic equation of state for a pure fluid.
///
/// ```text
/// P = RT / (v − b) − a·α(T) / (v² + 2bv − b²)
/// ```
///
/// Vapor–liquid equilibrium is solved from equal fugacities. Inside the
/// dome a (T, D) flash returns the saturation pressure, which makes
/// isotherms flat across the two-phase region.
pub struct PengRobinsonBackend {
    name: String,
    fluid: &'static FluidConstants,
    /// Attraction parameter at Tc (Pa·m⁶/mol²).
    a_crit: f64,
    /// Co-volume (m³/mol).
    b: f64,
    kappa: f64,
    /// Last saturation state per input temperature / pressure.
    sat_t_cache: Mutex<Option<SaturationProps>>,
    sat_p_cache: Mutex<Option<SaturationProps>>,
}

impl PengRobinsonBackend {
    /// Create a backend for one of the embedded fluids
    /// (see [`fluids::FLUIDS`]).
    pub fn new(fluid_name: &str) -> Result<Self> {
        let fluid = fluids::lookup(fluid_name).ok_or_else(|| {
            AndrewsError::FluidNotFound(format!(
                "{fluid_name} (Peng–Robinson table knows: {})",
                fluids::names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(Self::from_constants(fluid_name, fluid))
    }

    pub fn from_constants(fluid_name: &str, fluid: &'static FluidConstants) -> Self {
        let (tc, pc, omega) = (fluid.critical_temperature, fluid.critical_pressure, fluid.acentric_factor);
        Self {
            name: fluid_name.to_string(),
            fluid,
            a_crit: 0.457_235_53 * (GAS_CONSTANT * tc).powi(2) / pc,
            b: 0.077_796_07 * GAS_CONSTANT * tc / pc,
            kappa: 0.374_64 + 1.542_26 * omega - 0.269_92 * omega * omega,
            sat_t_cache: Mutex::new(None),
            sat_p_cache: Mutex::new(None),
        }
    }

    pub fn constants(&self) -> &'static FluidConstants {
        self.fluid
    }

    // ================================================================
    //  Equation of state (molar volume v in m³/mol)
    // ================================================================

    fn attraction(&self, t: f64) -> f64 {
        let s = 1.0 + self.kappa * (1.0 - (t / self.fluid.critical_temperature).sqrt());
        self.a_crit * s * s
    }

    fn pressure_tv(&self, t: f64, v: f64) -> f64 {
        let b = self.b;
        GAS_CONSTANT * t / (v - b) - self.attraction(t) / (v * v + 2.0 * b * v - b * b)
    }

    fn dp_dv(&self, t: f64, v: f64) -> f64 {
        let b = self.b;
        let w = v * v + 2.0 * b * v - b * b;
        -GAS_CONSTANT * t / ((v - b) * (v - b)) + 2.0 * self.attraction(t) * (v + b) / (w * w)
    }

    /// ln φ of a phase at (T, P) with molar volume `v`.
    fn ln_fugacity_coeff(&self, t: f64, p: f64, v: f64) -> f64 {
        let rt = GAS_CONSTANT * t;
        let z = p * v / rt;
        let a = self.attraction(t) * p / (rt * rt);
        let b = self.b * p / rt;
        z - 1.0
            - (z - b).ln()
            - a / (2.0 * SQRT2 * b) * ((z + (1.0 + SQRT2) * b) / (z + (1.0 - SQRT2) * b)).ln()
    }

    fn molar_to_mass_density(&self, v: f64) -> f64 {
        self.fluid.molar_mass / v
    }

    // ================================================================
    //  Spinodals and volume roots
    // ================================================================

    /// Liquid and vapor spinodal volumes `(v_ls, v_vs)` at `t`, or `None`
    /// when the isotherm is monotonic (supercritical for the equation).
    fn spinodals(&self, t: f64) -> Option<(f64, f64)> {
        let lo = (self.b * (1.0 + 1e-6)).ln();
        let hi = (self.b * 1e7).ln();
        let step = (hi - lo) / (SPINODAL_GRID - 1) as f64;
        let slope = |x: f64| self.dp_dv(t, x.exp());

        let (mut best, mut best_val) = (0, f64::NEG_INFINITY);
        for i in 0..SPINODAL_GRID {
            let val = slope(lo + step * i as f64);
            if val > best_val {
                best = i;
                best_val = val;
            }
        }
        let left = lo + step * best.saturating_sub(1) as f64;
        let right = lo + step * (best + 1).min(SPINODAL_GRID - 1) as f64;
        let x_max = golden_section_max(&slope, left, right);
        if slope(x_max) <= 0.0 {
            return None;
        }

        let v_max = x_max.exp();
        let v_ls = bisect(|v| -self.dp_dv(t, v), self.b * (1.0 + 1e-9), v_max);
        let v_vs = bisect(|v| self.dp_dv(t, v), v_max, hi.exp());
        Some((v_ls, v_vs))
    }

    /// Liquid root of P(v) = p on (b, v_ls).
    fn liquid_volume(&self, t: f64, p: f64, v_ls: f64) -> f64 {
        bisect(|v| self.pressure_tv(t, v) - p, self.b * (1.0 + 1e-12), v_ls)
    }

    /// Vapor root of P(v) = p on (v_vs, ∞).
    fn vapor_volume(&self, t: f64, p: f64, v_vs: f64) -> f64 {
        let mut v_hi = (2.0 * GAS_CONSTANT * t / p).max(2.0 * v_vs);
        for _ in 0..MAX_ITER {
            if self.pressure_tv(t, v_hi) < p {
                break;
            }
            v_hi *= 2.0;
        }
        bisect(|v| self.pressure_tv(t, v) - p, v_vs, v_hi)
    }

    // ================================================================
    //  Vapor–liquid equilibrium
    // ================================================================

    /// Saturation state at temperature `t`, without caching.
    ///
    /// Safeguarded Newton iteration on ln P: the derivative of
    /// ln φ_L − ln φ_V with respect to ln P is Z_L − Z_V.
    fn compute_saturation_t(&self, t: f64) -> Result<SaturationProps> {
        let tc = self.fluid.critical_temperature;
        if t <= 0.0 || t >= tc * TWO_PHASE_LIMIT {
            return Err(AndrewsError::InvalidInput(format!(
                "no saturation state at T = {t} K (Tc = {tc} K)"
            )));
        }
        let (v_ls, v_vs) = self.spinodals(t).ok_or_else(|| {
            AndrewsError::CalculationFailed(format!("no spinodal found at T = {t} K"))
        })?;

        let p_top = self.pressure_tv(t, v_vs);
        let p_bottom = self.pressure_tv(t, v_ls);
        let mut x_hi = (p_top * (1.0 - 1e-12)).ln();
        let mut x_lo = if p_bottom > 0.0 {
            (p_bottom * (1.0 + 1e-12)).ln()
        } else {
            (p_top * 1e-15).ln()
        };

        let wilson = self.fluid.critical_pressure
            * (5.373 * (1.0 + self.fluid.acentric_factor) * (1.0 - tc / t)).exp();
        let mut x = wilson.ln().clamp(x_lo, x_hi);
        if x <= x_lo || x >= x_hi {
            x = 0.5 * (x_lo + x_hi);
        }

        let mut state = (x.exp(), v_ls, v_vs);
        for _ in 0..MAX_ITER {
            let p = x.exp();
            let vl = self.liquid_volume(t, p, v_ls);
            let vv = self.vapor_volume(t, p, v_vs);
            state = (p, vl, vv);

            let g = self.ln_fugacity_coeff(t, p, vl) - self.ln_fugacity_coeff(t, p, vv);
            if g.abs() < 1e-13 {
                break;
            }
            if g > 0.0 {
                x_lo = x;
            } else {
                x_hi = x;
            }
            if x_hi - x_lo < 1e-14 {
                break;
            }

            let dz = p * (vl - vv) / (GAS_CONSTANT * t);
            let newton = x - g / dz;
            x = if newton > x_lo && newton < x_hi {
                newton
            } else {
                0.5 * (x_lo + x_hi)
            };
        }

        let (p, vl, vv) = state;
        Ok(SaturationProps {
            temperature: t,
            pressure: p,
            density_liquid: self.molar_to_mass_density(vl),
            density_vapor: self.molar_to_mass_density(vv),
        })
    }

    /// Saturation state at temperature `t` (K).
    pub fn saturation_t(&self, t: f64) -> Result<SaturationProps> {
        validate_finite("temperature", t)?;
        let mut cache = lock_cache(&self.sat_t_cache)?;
        if let Some(sat) = cache.filter(|sat| sat.temperature == t) {
            return Ok(sat);
        }
        let sat = self.compute_saturation_t(t)?;
        *cache = Some(sat);
        Ok(sat)
    }

    /// Saturation state at pressure `p` (Pa).
    ///
    /// Illinois regula falsi on ln Psat(1/T) − ln p, which is close to
    /// linear in 1/T.
    pub fn saturation_p(&self, p: f64) -> Result<SaturationProps> {
        validate_finite("pressure", p)?;
        let mut cache = lock_cache(&self.sat_p_cache)?;
        if let Some(sat) = cache.filter(|sat| sat.pressure == p) {
            return Ok(sat);
        }

        let pc = self.fluid.critical_pressure;
        if p <= 0.0 || p >= pc {
            return Err(AndrewsError::InvalidInput(format!(
                "no saturation state at P = {p} Pa (Pc = {pc} Pa)"
            )));
        }

        let t_hot = self.fluid.critical_temperature * TWO_PHASE_LIMIT * (1.0 - 1e-9);
        let t_cold = 0.9 * self.fluid.triple_point_temp;
        let target = p.ln();
        let residual = |y: f64| -> Result<(f64, SaturationProps)> {
            let sat = self.compute_saturation_t(1.0 / y)?;
            Ok((sat.pressure.ln() - target, sat))
        };

        // y = 1/T: residual decreases with y.
        let (mut y_a, mut y_b) = (1.0 / t_hot, 1.0 / t_cold);
        let (mut f_a, sat_a) = residual(y_a)?;
        let (mut f_b, sat_b) = residual(y_b)?;
        if f_a < 0.0 {
            return Err(AndrewsError::CalculationFailed(format!(
                "P = {p} Pa is too close to the critical pressure (max {:.6e} Pa)",
                sat_a.pressure
            )));
        }
        if f_b > 0.0 {
            return Err(AndrewsError::InvalidInput(format!(
                "P = {p} Pa is below the saturation range (min {:.6e} Pa)",
                sat_b.pressure
            )));
        }

        let mut best = if f_a.abs() < f_b.abs() { sat_a } else { sat_b };
        let mut side = 0i8;
        for _ in 0..MAX_ITER {
            let y = (y_a * f_b - y_b * f_a) / (f_b - f_a);
            let (f, sat) = residual(y)?;
            best = sat;
            if f.abs() < 1e-12 || (y_b - y_a).abs() < 1e-15 * y_a.abs() {
                break;
            }
            if f > 0.0 {
                y_a = y;
                f_a = f;
                if side == 1 {
                    f_b *= 0.5;
                }
                side = 1;
            } else {
                y_b = y;
                f_b = f;
                if side == -1 {
                    f_a *= 0.5;
                }
                side = -1;
            }
        }

        debug!("[{}] Tsat({p:.6e} Pa) = {:.6} K", self.name, best.temperature);
        let sat = SaturationProps { pressure: p, ..best };
        *cache = Some(sat);
        Ok(sat)
    }

    // ================================================================
    //  Flashes
    // ================================================================

    /// Temperature–density flash (K, kg/m³).
    pub fn flash_td(&self, t: f64, d: f64) -> Result<StatePoint> {
        if t <= 0.0 || d <= 0.0 {
            return Err(AndrewsError::InvalidInput(format!(
                "temperature and density must be positive, got T = {t}, D = {d}"
            )));
        }
        let v = self.fluid.molar_mass / d;
        if v <= self.b {
            return Err(AndrewsError::InvalidInput(format!(
                "density {d} kg/m³ exceeds the co-volume limit {:.4} kg/m³",
                self.molar_to_mass_density(self.b)
            )));
        }

        if t < self.fluid.critical_temperature * TWO_PHASE_LIMIT {
            let sat = self.saturation_t(t)?;
            if sat.is_two_phase(d) {
                return Ok(StatePoint {
                    temperature: t,
                    pressure: sat.pressure,
                    density: d,
                    quality: sat.quality_at_density(d),
                });
            }
        }
        Ok(StatePoint {
            temperature: t,
            pressure: self.pressure_tv(t, v),
            density: d,
            quality: -1.0,
        })
    }

    /// Temperature–quality flash.
    pub fn flash_tq(&self, t: f64, q: f64) -> Result<StatePoint> {
        validate_quality(q)?;
        let sat = self.saturation_t(t)?;
        Ok(StatePoint {
            temperature: t,
            pressure: sat.pressure,
            density: sat.density_at_quality(q),
            quality: q,
        })
    }

    /// Pressure–quality flash.
    pub fn flash_pq(&self, p: f64, q: f64) -> Result<StatePoint> {
        validate_quality(q)?;
        let sat = self.saturation_p(p)?;
        Ok(StatePoint {
            temperature: sat.temperature,
            pressure: p,
            density: sat.density_at_quality(q),
            quality: q,
        })
    }
}

impl PropertyOracle for PengRobinsonBackend {
    fn fluid_name(&self) -> &str {
        &self.name
    }

    fn critical_point(&self) -> Result<CriticalProps> {
        let (tc, pc) = (self.fluid.critical_temperature, self.fluid.critical_pressure);
        Ok(CriticalProps {
            temperature: tc,
            pressure: pc,
            density: pc * self.fluid.molar_mass / (Z_CRIT * GAS_CONSTANT * tc),
        })
    }

    fn triple_point(&self) -> Result<TriplePoint> {
        let t = self.fluid.triple_point_temp;
        Ok(TriplePoint {
            temperature: t,
            pressure: self.saturation_t(t)?.pressure,
        })
    }

    fn get(&self, output: &str, key1: &str, val1: f64, key2: &str, val2: f64) -> Result<f64> {
        let state = match InputPair::parse(key1, val1, key2, val2)? {
            InputPair::TD { t, d } => self.flash_td(t, d)?,
            InputPair::TQ { t, q } => self.flash_tq(t, q)?,
            InputPair::PQ { p, q } => self.flash_pq(p, q)?,
        };
        select_output(output, &state)
    }
}

// ── Numerical helpers ───────────────────────────────────────────────

fn lock_cache(cache: &Mutex<Option<SaturationProps>>) -> Result<MutexGuard<'_, Option<SaturationProps>>> {
    cache.lock().map_err(|_| {
        AndrewsError::CalculationFailed("saturation cache lock is poisoned".into())
    })
}

/// Root of `f` on `[lo, hi]` given `f(lo) > 0 > f(hi)`.
fn bisect(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi || hi - lo <= 1e-15 * hi.abs() {
            return mid;
        }
        if f(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Maximiser of a unimodal `f` on `[a, b]`.
fn golden_section_max(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64) -> f64 {
    let ratio = 0.5 * (5f64.sqrt() - 1.0);
    let mut c = b - ratio * (b - a);
    let mut d = a + ratio * (b - a);
    let (mut fc, mut fd) = (f(c), f(d));
    for _ in 0..MAX_ITER {
        if (b - a).abs() < 1e-13 {
            break;
        }
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - ratio * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + ratio * (b - a);
            fd = f(d);
        }
    }
    0.5 * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bisect_finds_decreasing_root() {
        let root = bisect(|x| 2.0 - x, 0.0, 10.0);
        assert_relative_eq!(root, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn golden_section_locates_peak() {
        let x = golden_section_max(&|x: f64| -(x - 1.5) * (x - 1.5), 0.0, 4.0);
        assert_relative_eq!(x, 1.5, epsilon = 1e-6);
    }

    #[test]
    fn spinodals_bracket_the_unstable_branch() {
        let co2 = PengRobinsonBackend::new("CO2").unwrap();
        let (v_ls, v_vs) = co2.spinodals(250.0).unwrap();
        assert!(v_ls < v_vs);
        assert!(co2.dp_dv(250.0, 0.5 * (v_ls + v_vs)) > 0.0);
        assert!(co2.spinodals(350.0).is_none(), "no spinodal above Tc");
    }

    #[test]
    fn equal_fugacities_at_saturation() {
        let co2 = PengRobinsonBackend::new("CO2").unwrap();
        let sat = co2.saturation_t(280.0).unwrap();
        let vl = co2.fluid.molar_mass / sat.density_liquid;
        let vv = co2.fluid.molar_mass / sat.density_vapor;
        let gl = co2.ln_fugacity_coeff(280.0, sat.pressure, vl);
        let gv = co2.ln_fugacity_coeff(280.0, sat.pressure, vv);
        assert!((gl - gv).abs() < 1e-9, "ln φL − ln φV = {}", gl - gv);
        assert_relative_eq!(co2.pressure_tv(280.0, vl), sat.pressure, max_relative = 1e-9);
        assert_relative_eq!(co2.pressure_tv(280.0, vv), sat.pressure, max_relative = 1e-9);
    }
}
