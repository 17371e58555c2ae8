//! Tab-separated exports of the sampled curves.
//!
//! Numbers use numpy's default `savetxt` format (`%.18e`), so files are
//! interchangeable with those produced by the classic Python scripts:
//!
//! ```text
//! # v(m^3/kg),P(bar)
//! 1.000000000000000021e-03	6.519425331058079339e+01
//! …
//! nan
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::*;

pub const PV_HEADER: &str = "# v(m^3/kg),P(bar)";
pub const SATURATION_HEADER: &str = "# P(bar),Veb,Vrosee(m^3/kg)";

/// Pa per bar.
pub const BAR: f64 = 1e5;

/// `%.18e` as printed by C/numpy: two-digit signed exponent, `nan`/`inf`
/// spelled out.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

fn write_row<W: Write>(out: &mut W, values: &[f64]) -> std::io::Result<()> {
    let row: Vec<String> = values.iter().map(|&v| format_value(v)).collect();
    writeln!(out, "{}", row.join("\t"))
}

/// One isotherm block: header, one `v<TAB>P[bar]` row per sample, then a
/// `nan` separator row.
pub fn write_isotherm_block<W: Write>(out: &mut W, volumes: &[f64], pressures: &[f64]) -> Result<()> {
    if volumes.len() != pressures.len() {
        return Err(AndrewsError::InvalidInput(format!(
            "{} volumes for {} pressures",
            volumes.len(),
            pressures.len()
        )));
    }
    writeln!(out, "{PV_HEADER}")?;
    for (&v, &p) in volumes.iter().zip(pressures) {
        write_row(out, &[v, p / BAR])?;
    }
    write_row(out, &[f64::NAN])?;
    Ok(())
}

/// Isotherm export file, truncated on creation and appended to once per
/// isotherm.
pub struct PvExport {
    path: PathBuf,
    out: BufWriter<File>,
    blocks: usize,
}

impl PvExport {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            blocks: 0,
        })
    }

    pub fn write_isotherm(&mut self, volumes: &[f64], pressures: &[f64]) -> Result<()> {
        write_isotherm_block(&mut self.out, volumes, pressures)?;
        self.blocks += 1;
        Ok(())
    }

    /// Flush and close; returns the path and the number of blocks written.
    pub fn finish(mut self) -> Result<(PathBuf, usize)> {
        self.out.flush()?;
        Ok((self.path, self.blocks))
    }
}

/// Saturation table: header, then `P[bar]<TAB>v_bubble<TAB>v_dew` rows.
pub fn write_saturation_table<W: Write>(
    out: &mut W,
    pressures: &[f64],
    bubble_volumes: &[f64],
    dew_volumes: &[f64],
) -> Result<()> {
    if pressures.len() != bubble_volumes.len() || pressures.len() != dew_volumes.len() {
        return Err(AndrewsError::InvalidInput(format!(
            "saturation columns differ in length: {} / {} / {}",
            pressures.len(),
            bubble_volumes.len(),
            dew_volumes.len()
        )));
    }
    writeln!(out, "{SATURATION_HEADER}")?;
    for ((&p, &vb), &vd) in pressures.iter().zip(bubble_volumes).zip(dew_volumes) {
        write_row(out, &[p / BAR, vb, vd])?;
    }
    Ok(())
}

/// Overwrite `path` with the saturation table.
pub fn export_saturation(
    path: &Path,
    pressures: &[f64],
    bubble_volumes: &[f64],
    dew_volumes: &[f64],
) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_saturation_table(&mut out, pressures, bubble_volumes, dew_volumes)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numpy_exponent_style() {
        assert_eq!(format_value(1e-3), "1.000000000000000021e-03");
        assert_eq!(format_value(65.0), "6.500000000000000000e+01");
        assert_eq!(format_value(0.0), "0.000000000000000000e+00");
        assert_eq!(format_value(-2.5e120), "-2.500000000000000093e+120");
        assert_eq!(format_value(f64::NAN), "nan");
    }

    #[test]
    fn block_has_header_rows_and_separator() {
        let mut buf = Vec::new();
        write_isotherm_block(&mut buf, &[1.0, 2.0], &[1e5, 2e5]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], PV_HEADER);
        assert_eq!(lines[1], "1.000000000000000000e+00\t1.000000000000000000e+00");
        assert_eq!(lines[3], "nan");
    }

    #[test]
    fn mismatched_columns_are_rejected() {
        let mut buf = Vec::new();
        assert!(write_isotherm_block(&mut buf, &[1.0], &[]).is_err());
        assert!(write_saturation_table(&mut buf, &[1.0], &[1.0], &[]).is_err());
    }
}
