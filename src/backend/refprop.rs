use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::backend::fluids;
use crate::backend::{InputPair, PropertyOracle, select_output, validate_quality};
use crate::error::*;
use crate::properties::*;
use crate::sys::*;

// ── Global lock (REFPROP is NOT thread-safe) ────────────────────────
// The lock value is the ID of the backend whose fluid is currently
// loaded, so SETUPdll only runs again when the active fluid changes.
static REFPROP_LOCK: Mutex<usize> = Mutex::new(0);
static NEXT_BACKEND_ID: AtomicUsize = AtomicUsize::new(1);

const KPA_TO_PA: f64 = 1e3;

// ── Backend ─────────────────────────────────────────────────────────

/// Pure fluid evaluated by NIST REFPROP.
///
/// REFPROP works in K, kPa and mol/L; every value crossing the
/// [`PropertyOracle`] boundary is converted to K, Pa and kg/m³.
pub struct RefpropBackend {
    id: usize,
    lib: RefpropLibrary,
    refprop_path: PathBuf,
    name: String,
    /// Fluid file passed to SETUPdll, e.g. `"CO2.FLD"`.
    hfld: String,
    z: [f64; REFPROP_NC_MAX],
    /// g/mol, which also converts mol/L to kg/m³.
    molar_mass: f64,
    triple_point_temp: f64,
}

impl RefpropBackend {
    /// Load REFPROP from `refprop_path` and set it up for `fluid_name`.
    ///
    /// The name is tried as a fluid file first (`CO2` → `fluids/CO2.FLD`),
    /// then through the aliases of the embedded fluid table, so CoolProp
    /// spellings such as `carbondioxide` resolve as well.
    pub fn new(fluid_name: &str, refprop_path: &Path) -> Result<Self> {
        if !refprop_path.exists() {
            return Err(AndrewsError::LibraryNotFound(refprop_path.display().to_string()));
        }
        let lib = RefpropLibrary::load_from_dir(refprop_path)
            .map_err(|e| AndrewsError::LibraryNotFound(e.to_string()))?;

        let hfld = Self::resolve_fluid_file(refprop_path, fluid_name).ok_or_else(|| {
            AndrewsError::FluidNotFound(format!("{fluid_name} (no matching .FLD in fluids/)"))
        })?;

        let mut z = [0.0f64; REFPROP_NC_MAX];
        z[0] = 1.0;
        let mut backend = Self {
            id: NEXT_BACKEND_ID.fetch_add(1, Ordering::Relaxed),
            lib,
            refprop_path: refprop_path.to_path_buf(),
            name: fluid_name.to_string(),
            hfld,
            z,
            molar_mass: 0.0,
            triple_point_temp: 0.0,
        };

        {
            let mut current_id = Self::lock_refprop()?;
            backend.setup_fluid_inner()?;
            *current_id = backend.id;
            let info = unsafe { backend.lib.info(1) };
            backend.molar_mass = info.molar_mass;
            backend.triple_point_temp = info.triple_point_temp;
        }
        debug!(
            "[refprop] {} loaded from {} (M = {} g/mol)",
            backend.hfld,
            backend.refprop_path.display(),
            backend.molar_mass
        );
        Ok(backend)
    }

    fn resolve_fluid_file(base: &Path, fluid_name: &str) -> Option<String> {
        let mut candidates = vec![fluid_name.to_uppercase()];
        if let Some(known) = fluids::lookup(fluid_name) {
            candidates.push(known.name.to_uppercase());
            candidates.extend(known.aliases.iter().map(|a| a.to_uppercase()));
        }
        candidates
            .into_iter()
            .map(|stem| format!("{stem}.FLD"))
            .find(|fld| base.join("fluids").join(fld).exists() || base.join("FLUIDS").join(fld).exists())
    }

    // ================================================================
    //  Lock and setup helpers
    // ================================================================

    fn lock_refprop() -> Result<MutexGuard<'static, usize>> {
        REFPROP_LOCK.lock().map_err(|_| {
            AndrewsError::CalculationFailed(
                "REFPROP global lock is poisoned (a previous call panicked)".into(),
            )
        })
    }

    /// SETPATHdll + SETUPdll. **Caller must hold REFPROP_LOCK.**
    fn setup_fluid_inner(&self) -> Result<()> {
        let (ierr, herr) = unsafe {
            self.lib.set_path(&self.refprop_path.to_string_lossy());
            self.lib.setup(1, &self.hfld)
        };
        Self::check_err(ierr, herr)
    }

    /// Make sure REFPROP holds *this* backend's fluid.
    fn ensure_setup(&self, current_id: &mut usize) -> Result<()> {
        if *current_id != self.id {
            self.setup_fluid_inner()?;
            *current_id = self.id;
        }
        Ok(())
    }

    // ================================================================
    //  Flashes (caller holds the lock and has called ensure_setup)
    // ================================================================

    fn to_molar(&self, d: f64) -> f64 {
        d / self.molar_mass
    }

    fn to_mass(&self, d: f64) -> f64 {
        d * self.molar_mass
    }

    fn flash_td_inner(&self, t: f64, d: f64) -> Result<StatePoint> {
        let (out, ierr, herr) = unsafe { self.lib.td_flash(t, self.to_molar(d), &self.z) };
        Self::check_err(ierr, herr)?;
        // Single-phase states come back as sentinel qualities (±998, 999).
        let quality = if (0.0..=1.0).contains(&out.q) { out.q } else { -1.0 };
        Ok(StatePoint {
            temperature: t,
            pressure: out.p * KPA_TO_PA,
            density: d,
            quality,
        })
    }

    /// `kph = 1` (bubble) when Q < 0.5, `kph = 2` (dew) otherwise.
    fn flash_tq_inner(&self, t: f64, q: f64) -> Result<StatePoint> {
        let kph = if q >= 0.5 { 2 } else { 1 };
        let (out, ierr, herr) = unsafe { self.lib.sat_t(t, &self.z, kph) };
        Self::check_err(ierr, herr)?;
        let sat = self.saturation(t, out.other * KPA_TO_PA, &out);
        Ok(StatePoint {
            temperature: t,
            pressure: sat.pressure,
            density: sat.density_at_quality(q),
            quality: q,
        })
    }

    fn flash_pq_inner(&self, p: f64, q: f64) -> Result<StatePoint> {
        let kph = if q >= 0.5 { 2 } else { 1 };
        let (out, ierr, herr) = unsafe { self.lib.sat_p(p / KPA_TO_PA, &self.z, kph) };
        Self::check_err(ierr, herr)?;
        let sat = self.saturation(out.other, p, &out);
        Ok(StatePoint {
            temperature: sat.temperature,
            pressure: p,
            density: sat.density_at_quality(q),
            quality: q,
        })
    }

    fn saturation(&self, t: f64, p: f64, out: &SatPoint) -> SaturationProps {
        SaturationProps {
            temperature: t,
            pressure: p,
            density_liquid: self.to_mass(out.dl),
            density_vapor: self.to_mass(out.dv),
        }
    }

    /// Check the REFPROP error code.
    ///
    /// - `ierr > 0`: hard error, returns `Err(AndrewsError::Refprop)`
    /// - `ierr < 0`: warning, logged and the result kept
    fn check_err(ierr: i32, herr: String) -> Result<()> {
        if ierr > 0 {
            return Err(AndrewsError::Refprop { code: ierr, message: herr });
        }
        if ierr < 0 {
            warn!("[refprop] warning {ierr}: {herr}");
        }
        Ok(())
    }
}

impl PropertyOracle for RefpropBackend {
    fn fluid_name(&self) -> &str {
        &self.name
    }

    fn critical_point(&self) -> Result<CriticalProps> {
        let mut cid = Self::lock_refprop()?;
        self.ensure_setup(&mut cid)?;

        let ((tc, pc, dc), ierr, herr) = unsafe { self.lib.critical_point(&self.z) };
        Self::check_err(ierr, herr)?;
        Ok(CriticalProps {
            temperature: tc,
            pressure: pc * KPA_TO_PA,
            density: self.to_mass(dc),
        })
    }

    /// Triple-point temperature from INFOdll, pressure from SATTdll.
    fn triple_point(&self) -> Result<TriplePoint> {
        let mut cid = Self::lock_refprop()?;
        self.ensure_setup(&mut cid)?;

        let t = self.triple_point_temp;
        let (out, ierr, herr) = unsafe { self.lib.sat_t(t, &self.z, 1) };
        Self::check_err(ierr, herr)?;
        Ok(TriplePoint {
            temperature: t,
            pressure: out.other * KPA_TO_PA,
        })
    }

    fn get(&self, output: &str, key1: &str, val1: f64, key2: &str, val2: f64) -> Result<f64> {
        let pair = InputPair::parse(key1, val1, key2, val2)?;

        let mut cid = Self::lock_refprop()?;
        self.ensure_setup(&mut cid)?;

        let state = match pair {
            InputPair::TD { t, d } => self.flash_td_inner(t, d)?,
            InputPair::TQ { t, q } => {
                validate_quality(q)?;
                self.flash_tq_inner(t, q)?
            }
            InputPair::PQ { p, q } => {
                validate_quality(q)?;
                self.flash_pq_inner(p, q)?
            }
        };
        select_output(output, &state)
    }
}
