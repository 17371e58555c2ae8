// ── State point from a flash calculation ────────────────────────────

/// Result of a (T, D), (T, Q) or (P, Q) flash.
///
/// | Field       | Unit   |
/// |-------------|--------|
/// | temperature | K      |
/// | pressure    | Pa     |
/// | density     | kg/m³  |
/// | quality     | mass vapor fraction (0–1), `-1` = single phase |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePoint {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub quality: f64,
}

impl std::fmt::Display for StatePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "T  = {:.4} K", self.temperature)?;
        writeln!(f, "P  = {:.2} Pa ({:.5} bar)", self.pressure, self.pressure / 1e5)?;
        writeln!(f, "D  = {:.6} kg/m³", self.density)?;
        write!(f, "Q  = {:.6}", self.quality)
    }
}

// ── Saturation properties ───────────────────────────────────────────

/// Both ends of a liquid–vapor tie line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationProps {
    /// Saturation temperature (K)
    pub temperature: f64,
    /// Saturation pressure (Pa)
    pub pressure: f64,
    /// Saturated-liquid density (kg/m³)
    pub density_liquid: f64,
    /// Saturated-vapor density (kg/m³)
    pub density_vapor: f64,
}

impl SaturationProps {
    /// Density on the tie line for a given vapor quality.
    pub fn density_at_quality(&self, q: f64) -> f64 {
        1.0 / ((1.0 - q) / self.density_liquid + q / self.density_vapor)
    }

    /// Whether `density` lies strictly inside the two-phase dome.
    pub fn is_two_phase(&self, density: f64) -> bool {
        density < self.density_liquid && density > self.density_vapor
    }

    /// Vapor quality of a two-phase mixture at `density`.
    pub fn quality_at_density(&self, density: f64) -> f64 {
        let v = 1.0 / density;
        let vl = 1.0 / self.density_liquid;
        let vv = 1.0 / self.density_vapor;
        (v - vl) / (vv - vl)
    }
}

impl std::fmt::Display for SaturationProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "T_sat  = {:.4} K ({:.2} °C)", self.temperature, self.temperature - 273.15)?;
        writeln!(f, "P_sat  = {:.2} Pa ({:.5} bar)", self.pressure, self.pressure / 1e5)?;
        writeln!(f, "D_liq  = {:.6} kg/m³", self.density_liquid)?;
        write!(f, "D_vap  = {:.6} kg/m³", self.density_vapor)
    }
}

// ── Critical point ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalProps {
    /// Critical temperature (K)
    pub temperature: f64,
    /// Critical pressure (Pa)
    pub pressure: f64,
    /// Critical density (kg/m³)
    pub density: f64,
}

impl std::fmt::Display for CriticalProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tc = {:.4} K ({:.2} °C)", self.temperature, self.temperature - 273.15)?;
        writeln!(f, "Pc = {:.2} Pa ({:.4} bar)", self.pressure, self.pressure / 1e5)?;
        write!(f, "Dc = {:.4} kg/m³", self.density)
    }
}

// ── Triple point ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriplePoint {
    /// Triple-point temperature (K)
    pub temperature: f64,
    /// Triple-point pressure (Pa)
    pub pressure: f64,
}

impl std::fmt::Display for TriplePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "T_trp = {:.4} K", self.temperature)?;
        write!(f, "P_trp = {:.2} Pa ({:.5} bar)", self.pressure, self.pressure / 1e5)
    }
}
