use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;

use log::{info, warn};
use serde::Deserialize;

use crate::backend::PropertyOracle;
use crate::backend::peng_robinson::PengRobinsonBackend;
use crate::backend::refprop::RefpropBackend;
use crate::error::*;
use crate::properties::*;

/// Which property backend a [`Fluid`] is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// REFPROP when it can be loaded, Peng–Robinson otherwise.
    #[default]
    Auto,
    Refprop,
    PengRobinson,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Backend::Auto => "auto",
            Backend::Refprop => "refprop",
            Backend::PengRobinson => "peng-robinson",
        })
    }
}

/// A pure fluid ready to answer property queries.
///
/// # Quick example
/// ```no_run
/// use andrews::{Backend, Fluid, PropertyOracle};
///
/// let co2 = Fluid::with_backend("carbondioxide", Backend::PengRobinson)?;
/// let p = co2.get("P", "T", 270.0, "Q", 0.0)?;
/// println!("Psat(270 K) = {:.2} bar", p / 1e5);
/// # Ok::<(), andrews::AndrewsError>(())
/// ```
pub struct Fluid {
    oracle: Box<dyn PropertyOracle>,
    backend: Backend,
}

impl Fluid {
    // ── Constructors ─────────────────────────────────────────────────

    /// REFPROP if available, the built-in equation of state otherwise.
    pub fn new(fluid_name: &str) -> Result<Self> {
        Self::with_backend(fluid_name, Backend::Auto)
    }

    pub fn with_backend(fluid_name: &str, backend: Backend) -> Result<Self> {
        match backend {
            Backend::Refprop => Self::refprop(fluid_name),
            Backend::PengRobinson => Self::peng_robinson(fluid_name),
            Backend::Auto => Self::refprop(fluid_name).or_else(|e| {
                warn!("REFPROP unavailable for {fluid_name} ({e}); using Peng–Robinson");
                Self::peng_robinson(fluid_name)
            }),
        }
    }

    fn refprop(fluid_name: &str) -> Result<Self> {
        Self::load_dotenv();
        let refprop_path = Self::find_refprop_path()?;
        let oracle = RefpropBackend::new(fluid_name, &refprop_path)?;
        info!("{fluid_name}: REFPROP from {}", refprop_path.display());
        Ok(Self {
            oracle: Box::new(oracle),
            backend: Backend::Refprop,
        })
    }

    fn peng_robinson(fluid_name: &str) -> Result<Self> {
        let oracle = PengRobinsonBackend::new(fluid_name)?;
        info!("{fluid_name}: Peng–Robinson equation of state");
        Ok(Self {
            oracle: Box::new(oracle),
            backend: Backend::PengRobinson,
        })
    }

    /// The backend actually in use (never [`Backend::Auto`]).
    pub fn backend(&self) -> Backend {
        self.backend
    }

    // ── .env loading (once) ──────────────────────────────────────────

    fn load_dotenv() {
        static DOTENV_INIT: Once = Once::new();
        DOTENV_INIT.call_once(|| {
            if dotenvy::dotenv().is_ok() {
                return;
            }
            if let Ok(exe) = env::current_exe() {
                if let Some(p) = exe.parent().map(|dir| dir.join(".env")) {
                    if p.exists() {
                        let _ = dotenvy::from_path(&p);
                    }
                }
            }
        });
    }

    // ── Path discovery ───────────────────────────────────────────────

    fn find_refprop_path() -> Result<PathBuf> {
        let mut tried = Vec::<String>::new();

        if let Ok(path) = env::var("REFPROP_PATH") {
            if Path::new(&path).exists() {
                return Ok(PathBuf::from(path));
            }
            tried.push(format!("REFPROP_PATH={path} (directory does not exist)"));
        }

        #[cfg(target_os = "windows")]
        let standard_paths = [r"C:\Program Files (x86)\REFPROP", r"C:\Program Files\REFPROP"];
        #[cfg(target_os = "macos")]
        let standard_paths = ["/Applications/REFPROP", "/opt/refprop"];
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let standard_paths = ["/opt/refprop", "/usr/local/lib/refprop"];

        for path in standard_paths {
            if Path::new(path).exists() {
                return Ok(PathBuf::from(path));
            }
            tried.push(format!("{path} (not found)"));
        }

        Err(AndrewsError::LibraryNotFound(format!(
            "REFPROP directory not found. Tried:\n  - {}\n\
             Set REFPROP_PATH to the directory containing the REFPROP library and the fluids/ folder.",
            tried.join("\n  - ")
        )))
    }
}

impl PropertyOracle for Fluid {
    fn fluid_name(&self) -> &str {
        self.oracle.fluid_name()
    }

    fn critical_point(&self) -> Result<CriticalProps> {
        self.oracle.critical_point()
    }

    fn triple_point(&self) -> Result<TriplePoint> {
        self.oracle.triple_point()
    }

    fn get(&self, output: &str, key1: &str, val1: f64, key2: &str, val2: f64) -> Result<f64> {
        self.oracle.get(output, key1, val1, key2, val2)
    }
}
