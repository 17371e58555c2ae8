//! Low-level FFI bindings for the subset of NIST REFPROP used by the
//! isotherm generator.
//!
//! The shared library is loaded at runtime via [`libloading`]; every
//! symbol is resolved once when [`RefpropLibrary`] is constructed, so a
//! missing routine is reported up front rather than at call time.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_double, c_int, c_long};
use std::path::Path;

use libloading::Library;
use thiserror::Error;

// ── REFPROP constants ───────────────────────────────────────────────
pub const REFPROP_STRLEN: usize = 255;
pub const REFPROP_FILESTR: usize = 10000;
pub const REFPROP_NC_MAX: usize = 20;

#[derive(Error, Debug)]
pub enum RefpropSysError {
    /// The DLL/so could not be found or loaded.
    #[error("REFPROP library load failed: {0}")]
    LibraryLoadFailed(String),
    /// A required symbol was not found in the library.
    #[error("Symbol not found in REFPROP library: {0}")]
    SymbolNotFound(String),
}

// ── Function pointer types (Fortran calling convention) ─────────────

/// SETPATHdll(hpath, length)
type FnSetpath = unsafe extern "C" fn(*const c_char, c_long);

/// SETUPdll(nc, hfld, hfmix, hrf, ierr, herr, len...)
type FnSetup = unsafe extern "C" fn(
    *const c_int,
    *const c_char,
    *const c_char,
    *const c_char,
    *mut c_int,
    *mut c_char,
    c_long,
    c_long,
    c_long,
    c_long,
);

/// TDFLSHdll(t, d, z, p, dl, dv, x, y, q, e, h, s, cv, cp, w, ierr, herr, len)
type FnTdflsh = unsafe extern "C" fn(
    *const c_double,
    *const c_double,
    *const c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_int,
    *mut c_char,
    c_long,
);

/// SATTdll / SATPdll: (in, z, kph, out, dl, dv, x, y, ierr, herr, len)
type FnSat = unsafe extern "C" fn(
    *const c_double,
    *const c_double,
    *const c_int,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_int,
    *mut c_char,
    c_long,
);

/// CRITPdll(z, tc, pc, dc, ierr, herr, len)
type FnCritp = unsafe extern "C" fn(
    *const c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_int,
    *mut c_char,
    c_long,
);

/// INFOdll(icomp, wmm, ttrp, tnbpt, tc, pc, dc, zc, acf, dip, rgas)
type FnInfo = unsafe extern "C" fn(
    *const c_int,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
    *mut c_double,
);

/// Outputs of `TDFLSHdll` that the backend consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TdFlash {
    pub p: f64,
    pub dl: f64,
    pub dv: f64,
    pub q: f64,
}

/// Outputs of `SATTdll` / `SATPdll`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatPoint {
    /// Pressure (SATT) or temperature (SATP).
    pub other: f64,
    pub dl: f64,
    pub dv: f64,
}

/// Outputs of `INFOdll` that the backend consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentInfo {
    pub molar_mass: f64,
    pub triple_point_temp: f64,
}

/// A dynamically-loaded REFPROP library with its function pointers.
///
/// The `unsafe` methods forward raw buffers to Fortran code; the caller
/// is responsible for holding the global REFPROP lock.
pub struct RefpropLibrary {
    /// Keeps the DLL mapped so the cached pointers stay valid.
    _lib: Library,

    fn_setpath: FnSetpath,
    fn_setup: FnSetup,
    fn_tdflsh: FnTdflsh,
    fn_satt: FnSat,
    fn_satp: FnSat,
    fn_critp: FnCritp,
    fn_info: FnInfo,
}

impl RefpropLibrary {
    fn resolve<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, RefpropSysError> {
        // SAFETY: the type aliases above mirror the REFPROP signatures.
        let sym: libloading::Symbol<T> = unsafe { lib.get(name) }.map_err(|_| {
            let display = String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]).to_string();
            RefpropSysError::SymbolNotFound(display)
        })?;
        Ok(*sym)
    }

    fn resolve_all(lib: Library) -> Result<Self, RefpropSysError> {
        Ok(Self {
            fn_setpath: Self::resolve(&lib, b"SETPATHdll\0")?,
            fn_setup: Self::resolve(&lib, b"SETUPdll\0")?,
            fn_tdflsh: Self::resolve(&lib, b"TDFLSHdll\0")?,
            fn_satt: Self::resolve(&lib, b"SATTdll\0")?,
            fn_satp: Self::resolve(&lib, b"SATPdll\0")?,
            fn_critp: Self::resolve(&lib, b"CRITPdll\0")?,
            fn_info: Self::resolve(&lib, b"INFOdll\0")?,
            _lib: lib,
        })
    }

    /// Load the shared library from a REFPROP installation directory,
    /// falling back to the system search path.
    ///
    /// On 64-bit Windows `REFPRP64.DLL` is tried first. A candidate that
    /// exists but fails to load (architecture mismatch) is skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, RefpropSysError> {
        let candidates: &[&str] = if cfg!(target_os = "windows") {
            if cfg!(target_pointer_width = "64") {
                &["REFPRP64.DLL", "REFPROP.DLL", "refprop.dll"]
            } else {
                &["REFPROP.DLL", "refprop.dll", "REFPRP64.DLL"]
            }
        } else if cfg!(target_os = "macos") {
            &["librefprop.dylib", "libREFPROP.dylib"]
        } else {
            &["librefprop.so", "libREFPROP.so"]
        };

        let mut errors = Vec::new();
        for name in candidates {
            let full = dir.join(name);
            if !full.exists() {
                continue;
            }
            match unsafe { Library::new(&full) } {
                Ok(lib) => return Self::resolve_all(lib),
                Err(e) => errors.push(format!("{}: {e}", full.display())),
            }
        }

        for name in candidates {
            if let Ok(lib) = unsafe { Library::new(*name) } {
                return Self::resolve_all(lib);
            }
        }

        let detail = if errors.is_empty() {
            format!("No REFPROP library found in {} (tried: {candidates:?})", dir.display())
        } else {
            format!("REFPROP library found but could not be loaded:\n  - {}", errors.join("\n  - "))
        };
        Err(RefpropSysError::LibraryLoadFailed(detail))
    }

    // ── Wrappers ────────────────────────────────────────────────────
    //
    // Each wrapper owns the scratch buffers REFPROP writes into and
    // returns `(ierr, herr)` next to the values of interest.

    /// Point REFPROP at its installation directory.
    pub unsafe fn set_path(&self, path: &str) {
        let hpath = to_c_string(path, REFPROP_STRLEN);
        unsafe { (self.fn_setpath)(hpath.as_ptr(), path.len() as c_long) };
    }

    /// `SETUPdll` for `nc` components listed in `hfld` (pipe separated).
    pub unsafe fn setup(&self, nc: i32, hfld: &str) -> (i32, String) {
        let hfld = to_c_string(hfld, REFPROP_FILESTR);
        let hfmix = to_c_string("HMX.BNC", REFPROP_STRLEN);
        let hrf = to_c_string("DEF", REFPROP_STRLEN);
        let mut ierr: c_int = 0;
        let mut herr = [0 as c_char; REFPROP_STRLEN];
        unsafe {
            (self.fn_setup)(
                &nc,
                hfld.as_ptr(),
                hfmix.as_ptr(),
                hrf.as_ptr(),
                &mut ierr,
                herr.as_mut_ptr(),
                REFPROP_FILESTR as c_long,
                REFPROP_STRLEN as c_long,
                REFPROP_STRLEN as c_long,
                REFPROP_STRLEN as c_long,
            );
        }
        (ierr, from_c_string(&herr))
    }

    /// Temperature–density flash (K, mol/L).
    pub unsafe fn td_flash(&self, t: f64, d: f64, z: &[f64]) -> (TdFlash, i32, String) {
        let mut out = TdFlash::default();
        let mut x = [0.0f64; REFPROP_NC_MAX];
        let mut y = [0.0f64; REFPROP_NC_MAX];
        let (mut e, mut h, mut s, mut cv, mut cp, mut w) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut ierr: c_int = 0;
        let mut herr = [0 as c_char; REFPROP_STRLEN];
        unsafe {
            (self.fn_tdflsh)(
                &t,
                &d,
                z.as_ptr(),
                &mut out.p,
                &mut out.dl,
                &mut out.dv,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                &mut out.q,
                &mut e,
                &mut h,
                &mut s,
                &mut cv,
                &mut cp,
                &mut w,
                &mut ierr,
                herr.as_mut_ptr(),
                REFPROP_STRLEN as c_long,
            );
        }
        (out, ierr, from_c_string(&herr))
    }

    /// Saturation at temperature `t` (K). `kph`: 1 = bubble, 2 = dew.
    pub unsafe fn sat_t(&self, t: f64, z: &[f64], kph: i32) -> (SatPoint, i32, String) {
        unsafe { self.sat(self.fn_satt, t, z, kph) }
    }

    /// Saturation at pressure `p` (kPa). `kph`: 1 = bubble, 2 = dew.
    pub unsafe fn sat_p(&self, p: f64, z: &[f64], kph: i32) -> (SatPoint, i32, String) {
        unsafe { self.sat(self.fn_satp, p, z, kph) }
    }

    unsafe fn sat(&self, f: FnSat, input: f64, z: &[f64], kph: i32) -> (SatPoint, i32, String) {
        let mut out = SatPoint::default();
        let mut x = [0.0f64; REFPROP_NC_MAX];
        let mut y = [0.0f64; REFPROP_NC_MAX];
        let mut ierr: c_int = 0;
        let mut herr = [0 as c_char; REFPROP_STRLEN];
        unsafe {
            f(
                &input,
                z.as_ptr(),
                &kph,
                &mut out.other,
                &mut out.dl,
                &mut out.dv,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                &mut ierr,
                herr.as_mut_ptr(),
                REFPROP_STRLEN as c_long,
            );
        }
        (out, ierr, from_c_string(&herr))
    }

    /// Critical point `(tc [K], pc [kPa], dc [mol/L])`.
    pub unsafe fn critical_point(&self, z: &[f64]) -> ((f64, f64, f64), i32, String) {
        let (mut tc, mut pc, mut dc) = (0.0, 0.0, 0.0);
        let mut ierr: c_int = 0;
        let mut herr = [0 as c_char; REFPROP_STRLEN];
        unsafe {
            (self.fn_critp)(
                z.as_ptr(),
                &mut tc,
                &mut pc,
                &mut dc,
                &mut ierr,
                herr.as_mut_ptr(),
                REFPROP_STRLEN as c_long,
            );
        }
        ((tc, pc, dc), ierr, from_c_string(&herr))
    }

    /// Constants of component `icomp` (1-based). `INFOdll` never fails.
    pub unsafe fn info(&self, icomp: i32) -> ComponentInfo {
        let (mut wmm, mut ttrp, mut tnbpt) = (0.0, 0.0, 0.0);
        let (mut tc, mut pc, mut dc) = (0.0, 0.0, 0.0);
        let (mut zc, mut acf, mut dip, mut rgas) = (0.0, 0.0, 0.0, 0.0);
        unsafe {
            (self.fn_info)(
                &icomp, &mut wmm, &mut ttrp, &mut tnbpt, &mut tc, &mut pc, &mut dc, &mut zc,
                &mut acf, &mut dip, &mut rgas,
            );
        }
        ComponentInfo {
            molar_mass: wmm,
            triple_point_temp: ttrp,
        }
    }
}

// ── String helpers ──────────────────────────────────────────────────

/// Zero-padded `c_char` buffer of length `max_len` for a Fortran string
/// argument.
pub fn to_c_string(s: &str, max_len: usize) -> Vec<c_char> {
    let mut buffer = vec![0 as c_char; max_len];
    for (dst, &src) in buffer.iter_mut().zip(s.as_bytes().iter().take(max_len - 1)) {
        *dst = src as c_char;
    }
    buffer
}

/// Trimmed Rust string from a null-terminated (or full) Fortran buffer.
pub fn from_c_string(buffer: &[c_char]) -> String {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).trim().to_string()
}
