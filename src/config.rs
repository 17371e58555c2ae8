//! Generation options.
//!
//! [`IsothermOverrides`] is what a caller (or a run file) supplies: every
//! option is optional and keeps its historical key name (`vmin`, `Prange`,
//! `titre`, `fichier-Pv`, …). [`IsothermConfig`] is the resolved,
//! validated set the generator works from.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::*;
use crate::sampling::{linspace, logspace};

/// Samples per isotherm on a logarithmic volume axis.
pub const LOG_SAMPLES: usize = 600;
/// Samples per isotherm on a linear volume axis.
pub const LINEAR_SAMPLES: usize = 200;

/// Caller-supplied options; `None` keeps the default.
///
/// ```
/// use andrews::IsothermOverrides;
///
/// let o = IsothermOverrides::from_toml(r#"
///     Prange = [1e6, 1e7]
///     logx = false
///     T = [270, 290, 304.2]
///     export-points = true
/// "#)?;
/// assert_eq!(o.pressure_range, Some((1e6, 1e7)));
/// # Ok::<(), andrews::AndrewsError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IsothermOverrides {
    /// Lower specific volume bound (m³/kg).
    pub vmin: Option<f64>,
    /// Upper specific volume bound (m³/kg).
    pub vmax: Option<f64>,
    /// Displayed pressure interval (Pa).
    #[serde(rename = "Prange", alias = "pressure-range")]
    pub pressure_range: Option<(f64, f64)>,
    /// Isotherm temperatures (K), drawn in this order.
    #[serde(rename = "T", alias = "temperatures")]
    pub temperatures: Option<Vec<f64>>,
    #[serde(rename = "titre", alias = "title")]
    pub title: Option<String>,
    /// Image path; relative paths land in the output directory.
    #[serde(rename = "fichier", alias = "image")]
    pub image: Option<PathBuf>,
    pub logx: Option<bool>,
    pub logy: Option<bool>,
    pub legend: Option<bool>,
    #[serde(rename = "export-points")]
    pub export_points: Option<bool>,
    #[serde(rename = "fichier-Pv", alias = "pv-file")]
    pub pv_file: Option<PathBuf>,
    #[serde(rename = "fichier-sat", alias = "saturation-file")]
    pub saturation_file: Option<PathBuf>,
    pub saturation: Option<bool>,
}

impl IsothermOverrides {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Where generated files go.
///
/// Relative image and export paths are resolved against `output_dir`;
/// the process working directory is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    output_dir: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }

    /// Default image path for `fluid`.
    pub fn image(&self, fluid: &str) -> PathBuf {
        self.output_dir.join(format!("andrews_{fluid}.png"))
    }

    /// Default isotherm export path for `fluid`.
    pub fn pv_file(&self, fluid: &str) -> PathBuf {
        self.output_dir.join(format!("andrews_Pv_{fluid}.csv"))
    }

    /// Default saturation export path for `fluid`.
    pub fn saturation_file(&self, fluid: &str) -> PathBuf {
        self.output_dir.join(format!("andrews_sat_{fluid}.csv"))
    }

    /// Create the output directory if needed.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::new("PNG")
    }
}

/// Fully resolved options of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct IsothermConfig {
    pub vmin: f64,
    pub vmax: f64,
    pub pressure_range: Option<(f64, f64)>,
    pub temperatures: Vec<f64>,
    pub title: String,
    pub image: PathBuf,
    pub logx: bool,
    pub logy: bool,
    pub legend: bool,
    pub export_points: bool,
    pub pv_file: PathBuf,
    pub saturation_file: PathBuf,
    pub saturation: bool,
}

impl IsothermConfig {
    /// Defaults for `fluid`, given the fluid-dependent values.
    pub fn defaults(
        fluid: &str,
        vmin: f64,
        vmax: f64,
        temperatures: Vec<f64>,
        paths: &OutputPaths,
    ) -> Self {
        Self {
            vmin,
            vmax,
            pressure_range: None,
            temperatures,
            title: format!("Andrews isotherms for {fluid}"),
            image: paths.image(fluid),
            logx: true,
            logy: true,
            legend: true,
            export_points: false,
            pv_file: paths.pv_file(fluid),
            saturation_file: paths.saturation_file(fluid),
            saturation: false,
        }
    }

    /// Replace every option the overrides mention; keep the others.
    pub fn merge(mut self, overrides: &IsothermOverrides, paths: &OutputPaths) -> Self {
        let o = overrides.clone();
        if let Some(v) = o.vmin {
            self.vmin = v;
        }
        if let Some(v) = o.vmax {
            self.vmax = v;
        }
        if let Some(range) = o.pressure_range {
            self.pressure_range = Some(range);
        }
        if let Some(t) = o.temperatures {
            self.temperatures = t;
        }
        if let Some(title) = o.title {
            self.title = title;
        }
        if let Some(image) = o.image {
            self.image = paths.resolve(&image);
        }
        self.logx = o.logx.unwrap_or(self.logx);
        self.logy = o.logy.unwrap_or(self.logy);
        self.legend = o.legend.unwrap_or(self.legend);
        self.export_points = o.export_points.unwrap_or(self.export_points);
        if let Some(file) = o.pv_file {
            self.pv_file = paths.resolve(&file);
        }
        if let Some(file) = o.saturation_file {
            self.saturation_file = paths.resolve(&file);
        }
        self.saturation = o.saturation.unwrap_or(self.saturation);
        self
    }

    /// Reject option values the generator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.vmin.is_finite() || !self.vmax.is_finite() {
            return Err(AndrewsError::InvalidInput(format!(
                "vmin and vmax must be finite, got {} and {}",
                self.vmin, self.vmax
            )));
        }
        if self.vmin <= 0.0 || self.vmin >= self.vmax {
            return Err(AndrewsError::InvalidInput(format!(
                "volume bounds must satisfy 0 < vmin < vmax, got vmin = {}, vmax = {}",
                self.vmin, self.vmax
            )));
        }
        if let Some((low, high)) = self.pressure_range {
            if !low.is_finite() || !high.is_finite() || low >= high {
                return Err(AndrewsError::InvalidInput(format!(
                    "Prange must be a finite increasing interval, got ({low}, {high})"
                )));
            }
            if self.logy && low <= 0.0 {
                return Err(AndrewsError::InvalidInput(format!(
                    "Prange must be positive on a logarithmic pressure axis, got ({low}, {high})"
                )));
            }
        }
        if let Some(t) = self.temperatures.iter().find(|t| !t.is_finite() || **t <= 0.0) {
            return Err(AndrewsError::InvalidInput(format!(
                "isotherm temperatures must be finite and positive, got {t}"
            )));
        }
        Ok(())
    }

    /// Specific volumes sampled along every isotherm.
    ///
    /// 600 log-spaced points with a logarithmic volume axis, 200 linearly
    /// spaced ones otherwise; both ends are `vmin` and `vmax` exactly.
    pub fn volume_samples(&self) -> Vec<f64> {
        if self.logx {
            logspace(self.vmin, self.vmax, LOG_SAMPLES)
        } else {
            linspace(self.vmin, self.vmax, LINEAR_SAMPLES)
        }
    }
}
