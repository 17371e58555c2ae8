//! Pure-fluid constants for the Peng–Robinson backend.
//!
//! Critical constants, acentric factors and triple-point temperatures
//! follow the reference equations of state used by REFPROP/CoolProp.

/// Constants of one pure fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidConstants {
    /// Canonical name (CoolProp spelling).
    pub name: &'static str,
    /// Accepted alternative names.
    pub aliases: &'static [&'static str],
    /// Molar mass (kg/mol)
    pub molar_mass: f64,
    /// Critical temperature (K)
    pub critical_temperature: f64,
    /// Critical pressure (Pa)
    pub critical_pressure: f64,
    /// Acentric factor
    pub acentric_factor: f64,
    /// Triple-point temperature (K)
    pub triple_point_temp: f64,
}

pub const FLUIDS: &[FluidConstants] = &[
    FluidConstants {
        name: "CarbonDioxide",
        aliases: &["CO2", "R744"],
        molar_mass: 44.0098e-3,
        critical_temperature: 304.1282,
        critical_pressure: 7.3773e6,
        acentric_factor: 0.22394,
        triple_point_temp: 216.592,
    },
    FluidConstants {
        name: "Water",
        aliases: &["H2O", "R718"],
        molar_mass: 18.015268e-3,
        critical_temperature: 647.096,
        critical_pressure: 22.064e6,
        acentric_factor: 0.3443,
        triple_point_temp: 273.16,
    },
    FluidConstants {
        name: "Nitrogen",
        aliases: &["N2", "R728"],
        molar_mass: 28.01348e-3,
        critical_temperature: 126.192,
        critical_pressure: 3.3958e6,
        acentric_factor: 0.0372,
        triple_point_temp: 63.151,
    },
    FluidConstants {
        name: "Oxygen",
        aliases: &["O2", "R732"],
        molar_mass: 31.9988e-3,
        critical_temperature: 154.581,
        critical_pressure: 5.043e6,
        acentric_factor: 0.0222,
        triple_point_temp: 54.361,
    },
    FluidConstants {
        name: "Argon",
        aliases: &["Ar", "R740"],
        molar_mass: 39.948e-3,
        critical_temperature: 150.687,
        critical_pressure: 4.863e6,
        acentric_factor: -0.00219,
        triple_point_temp: 83.8058,
    },
    FluidConstants {
        name: "Methane",
        aliases: &["CH4", "R50"],
        molar_mass: 16.04246e-3,
        critical_temperature: 190.564,
        critical_pressure: 4.5992e6,
        acentric_factor: 0.01142,
        triple_point_temp: 90.6941,
    },
    FluidConstants {
        name: "Ethane",
        aliases: &["C2H6", "R170"],
        molar_mass: 30.06904e-3,
        critical_temperature: 305.322,
        critical_pressure: 4.8722e6,
        acentric_factor: 0.0995,
        triple_point_temp: 90.368,
    },
    FluidConstants {
        name: "Propane",
        aliases: &["C3H8", "R290"],
        molar_mass: 44.09562e-3,
        critical_temperature: 369.89,
        critical_pressure: 4.2512e6,
        acentric_factor: 0.1521,
        triple_point_temp: 85.525,
    },
    FluidConstants {
        name: "Ammonia",
        aliases: &["NH3", "R717"],
        molar_mass: 17.03052e-3,
        critical_temperature: 405.40,
        critical_pressure: 11.3339e6,
        acentric_factor: 0.25601,
        triple_point_temp: 195.495,
    },
    FluidConstants {
        name: "R134a",
        aliases: &["HFC134a", "Tetrafluoroethane"],
        molar_mass: 102.032e-3,
        critical_temperature: 374.21,
        critical_pressure: 4.0593e6,
        acentric_factor: 0.32684,
        triple_point_temp: 169.85,
    },
];

/// Look a fluid up by name or alias.
///
/// Matching ignores case, spaces, `-` and `_`, so `"carbondioxide"`,
/// `"Carbon-Dioxide"` and `"co2"` all resolve to the same entry.
pub fn lookup(name: &str) -> Option<&'static FluidConstants> {
    let wanted = canonical(name);
    FLUIDS.iter().find(|fluid| {
        canonical(fluid.name) == wanted || fluid.aliases.iter().any(|a| canonical(a) == wanted)
    })
}

/// Canonical names of every embedded fluid.
pub fn names() -> impl Iterator<Item = &'static str> {
    FLUIDS.iter().map(|fluid| fluid.name)
}

fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
