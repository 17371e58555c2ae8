//! The isotherm network generator.
//!
//! ```no_run
//! use andrews::{Backend, Figure, Fluid, IsothermOverrides, OutputPaths, generate};
//!
//! let co2 = Fluid::with_backend("carbondioxide", Backend::PengRobinson)?;
//! let mut figure = Figure::new();
//! let report = generate(&co2, &IsothermOverrides::default(), &OutputPaths::new("PNG"), &mut figure)?;
//! println!("{} isotherms written to {}", report.curves, report.config.image.display());
//! # Ok::<(), andrews::AndrewsError>(())
//! ```

use std::path::{Path, PathBuf};

use log::{debug, info};
use plotters::style::BLACK;

use crate::backend::PropertyOracle;
use crate::config::{IsothermConfig, IsothermOverrides, OutputPaths};
use crate::error::*;
use crate::export::{PvExport, export_saturation};
use crate::figure::{Figure, Scale};
use crate::sampling::{arange, linspace};

/// Critical temperature and pressure are pulled inward by this factor so
/// that no query lands exactly on the critical point.
pub const CRITICAL_SCALE: f64 = 0.9999;

/// Spacing of the default isotherm temperatures (K).
pub const TEMPERATURE_STEP: f64 = 20.0;

/// Default isotherms run up to this multiple of the scaled Tc.
pub const TEMPERATURE_SPAN: f64 = 1.2;

/// Pressures sampled along the saturation curve.
pub const SATURATION_SAMPLES: usize = 600;

pub const VOLUME_LABEL: &str = "Specific volume v (m³/kg)";
pub const PRESSURE_LABEL: &str = "Pressure (Pa)";

const SATURATION_WIDTH: u32 = 3;

/// What a call to [`generate`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub fluid: String,
    pub config: IsothermConfig,
    /// Number of isotherms drawn.
    pub curves: usize,
    pub samples_per_curve: usize,
    /// Pressures sampled on the saturation curve (0 when not drawn).
    pub saturation_points: usize,
    /// Every file written, image first.
    pub files: Vec<PathBuf>,
}

/// Draw the Andrews isotherm network of `oracle`'s fluid and save it.
///
/// `figure` is cleared before returning, whether generation succeeded
/// or not.
pub fn generate<O: PropertyOracle + ?Sized>(
    oracle: &O,
    overrides: &IsothermOverrides,
    paths: &OutputPaths,
    figure: &mut Figure,
) -> Result<GenerationReport> {
    let result = draw_network(oracle, overrides, paths, figure);
    figure.clear();
    result
}

/// Resolve the options for `oracle`'s fluid without sampling any isotherm.
pub fn resolve_config<O: PropertyOracle + ?Sized>(
    oracle: &O,
    overrides: &IsothermOverrides,
    paths: &OutputPaths,
) -> Result<IsothermConfig> {
    let fluid = oracle.fluid_name();
    let critical = oracle.critical_point()?;
    let triple = oracle.triple_point()?;
    let tc = CRITICAL_SCALE * critical.temperature;

    let vmin = match overrides.vmin {
        Some(v) => v,
        None => 1.0 / oracle.get("D", "P", triple.pressure, "Q", 0.0)?,
    };
    let vmax = match overrides.vmax {
        Some(v) => v,
        None => 10.0 / oracle.get("D", "P", triple.pressure, "Q", 1.0)?,
    };
    let temperatures = arange(triple.temperature, TEMPERATURE_SPAN * tc, TEMPERATURE_STEP);

    let config = IsothermConfig::defaults(fluid, vmin, vmax, temperatures, paths).merge(overrides, paths);
    config.validate()?;
    Ok(config)
}

fn draw_network<O: PropertyOracle + ?Sized>(
    oracle: &O,
    overrides: &IsothermOverrides,
    paths: &OutputPaths,
    figure: &mut Figure,
) -> Result<GenerationReport> {
    let fluid = oracle.fluid_name().to_string();
    let config = resolve_config(oracle, overrides, paths)?;
    let mut files = Vec::new();

    // ── Isotherms ────────────────────────────────────────────────────
    let volumes = config.volume_samples();
    let mut pv_export = if config.export_points {
        create_parent(&config.pv_file)?;
        Some(PvExport::create(&config.pv_file)?)
    } else {
        None
    };

    for &t in &config.temperatures {
        let pressures = volumes
            .iter()
            .map(|&v| oracle.get("P", "T", t, "D", 1.0 / v))
            .collect::<Result<Vec<f64>>>()?;
        debug!("{fluid}: isotherm T = {t} K, {} samples", pressures.len());

        if let Some(export) = pv_export.as_mut() {
            export.write_isotherm(&volumes, &pressures)?;
        }
        let points = volumes.iter().copied().zip(pressures).collect();
        figure.plot(points, Some(temperature_label(t)));
    }

    if let Some(export) = pv_export {
        let (path, blocks) = export.finish()?;
        info!("{fluid}: {blocks} isotherms exported to {}", path.display());
        files.push(path);
    }

    // ── Saturation curve ─────────────────────────────────────────────
    let mut saturation_points = 0;
    if config.saturation {
        let critical = oracle.critical_point()?;
        let triple = oracle.triple_point()?;
        let pressures = linspace(triple.pressure, CRITICAL_SCALE * critical.pressure, SATURATION_SAMPLES);

        let mut bubble = Vec::with_capacity(pressures.len());
        let mut dew = Vec::with_capacity(pressures.len());
        for &p in &pressures {
            bubble.push(1.0 / oracle.get("D", "P", p, "Q", 0.0)?);
            dew.push(1.0 / oracle.get("D", "P", p, "Q", 1.0)?);
        }
        debug!("{fluid}: saturation curve, {} pressures", pressures.len());

        if config.export_points {
            create_parent(&config.saturation_file)?;
            export_saturation(&config.saturation_file, &pressures, &bubble, &dew)?;
            info!("{fluid}: saturation curve exported to {}", config.saturation_file.display());
            files.push(config.saturation_file.clone());
        }

        let bubble_line = bubble.iter().copied().zip(pressures.iter().copied()).collect();
        let dew_line = dew.iter().copied().zip(pressures.iter().copied()).collect();
        figure.plot_styled(bubble_line, None, BLACK, SATURATION_WIDTH);
        figure.plot_styled(dew_line, None, BLACK, SATURATION_WIDTH);
        saturation_points = pressures.len();
    }

    // ── Styling and save ─────────────────────────────────────────────
    if let Some((low, high)) = config.pressure_range {
        figure.set_ylim(low, high);
    }
    figure.set_xlim(config.vmin, config.vmax);
    figure.set_xscale(if config.logx { Scale::Log } else { Scale::Linear });
    figure.set_yscale(if config.logy { Scale::Log } else { Scale::Linear });
    figure.set_legend(config.legend);
    figure.set_xlabel(VOLUME_LABEL);
    figure.set_ylabel(PRESSURE_LABEL);
    figure.set_title(config.title.as_str());

    create_parent(&config.image)?;
    figure.save(&config.image)?;
    info!("{fluid}: diagram saved to {}", config.image.display());
    files.insert(0, config.image.clone());

    Ok(GenerationReport {
        fluid,
        samples_per_curve: volumes.len(),
        curves: config.temperatures.len(),
        saturation_points,
        config,
        files,
    })
}

/// Legend text of an isotherm, e.g. `T = 304.2 K`.
pub fn temperature_label(t: f64) -> String {
    let fixed = format!("{t:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("T = {trimmed} K")
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
