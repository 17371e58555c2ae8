//! Batch description of several diagrams.
//!
//! ```toml
//! fluid = "carbondioxide"
//! backend = "peng-robinson"
//! output-dir = "PNG"
//!
//! [[run]]                 # default diagram
//!
//! [[run]]
//! Prange = [1e6, 1e7]
//! logx = false
//! logy = false
//! T = [270, 290, 304.2, 310, 320]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::IsothermOverrides;
use crate::error::*;
use crate::fluid::Backend;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunFile {
    pub fluid: Option<String>,
    pub backend: Option<Backend>,
    pub output_dir: Option<PathBuf>,
    /// One entry per diagram; none means a single default diagram.
    #[serde(default, rename = "run")]
    pub runs: Vec<IsothermOverrides>,
}

impl RunFile {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// The override sets to generate, in order.
    pub fn runs(&self) -> Vec<IsothermOverrides> {
        if self.runs.is_empty() {
            vec![IsothermOverrides::default()]
        } else {
            self.runs.clone()
        }
    }
}

/// The three classic classroom diagrams: the default log–log network, a
/// linear close-up around the critical isotherm with exported data, and
/// the same close-up with the saturation curve.
pub fn classroom(fluid: &str) -> Vec<IsothermOverrides> {
    let close_up = IsothermOverrides {
        pressure_range: Some((1e6, 1e7)),
        image: Some(PathBuf::from(format!("andrews_{fluid}_lin.png"))),
        logx: Some(false),
        logy: Some(false),
        vmin: Some(1e-3),
        vmax: Some(1e-2),
        temperatures: Some(vec![270.0, 290.0, 304.2, 310.0, 320.0]),
        legend: Some(false),
        export_points: Some(true),
        ..Default::default()
    };
    let with_saturation = IsothermOverrides {
        saturation: Some(true),
        image: Some(PathBuf::from(format!("andrews_{fluid}_lin_sat.png"))),
        ..close_up.clone()
    };
    vec![IsothermOverrides::default(), close_up, with_saturation]
}
