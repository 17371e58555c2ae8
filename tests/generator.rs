use std::cell::Cell;
use std::fs;
use std::path::Path;

use andrews::properties::{CriticalProps, TriplePoint};
use andrews::{
    AndrewsError, Backend, Figure, Fluid, IsothermOverrides, OutputPaths, PropertyOracle, Result,
    generate,
};
use approx::assert_relative_eq;
use tempfile::tempdir;

/// Fluide fictif : dôme à densités affines en P, isothermes P = 100·ρ·T.
struct MockFluid {
    pressure_queries: Cell<usize>,
    fail_above: Option<f64>,
}

impl MockFluid {
    fn new() -> Self {
        Self { pressure_queries: Cell::new(0), fail_above: None }
    }
}

impl PropertyOracle for MockFluid {
    fn fluid_name(&self) -> &str {
        "mock"
    }

    fn critical_point(&self) -> Result<CriticalProps> {
        Ok(CriticalProps { temperature: 300.0, pressure: 7e6, density: 400.0 })
    }

    fn triple_point(&self) -> Result<TriplePoint> {
        Ok(TriplePoint { temperature: 200.0, pressure: 5e5 })
    }

    fn get(&self, output: &str, key1: &str, val1: f64, key2: &str, val2: f64) -> Result<f64> {
        match (output, key1, key2) {
            ("P", "T", "D") => {
                self.pressure_queries.set(self.pressure_queries.get() + 1);
                if self.fail_above.is_some_and(|limit| val1 > limit) {
                    return Err(AndrewsError::CalculationFailed(format!("T = {val1}")));
                }
                Ok(100.0 * val2 * val1)
            }
            ("D", "P", "Q") if val2 == 0.0 => Ok(1000.0 - val1 / 1e5),
            ("D", "P", "Q") => Ok(val1 / 1e4),
            _ => Err(AndrewsError::InvalidInput(format!("{output} from {key1},{key2}"))),
        }
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn parse_row(line: &str) -> Vec<f64> {
    line.split('\t').map(|x| x.parse::<f64>().unwrap()).collect()
}

/// Découpe un fichier Pv en blocs (en-tête + lignes) séparés par `nan`.
fn pv_blocks(lines: &[String]) -> Vec<Vec<Vec<f64>>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.starts_with('#') {
            continue;
        }
        if line == "nan" {
            blocks.push(std::mem::take(&mut current));
        } else {
            current.push(parse_row(line));
        }
    }
    assert!(current.is_empty(), "trailing rows without a nan separator");
    blocks
}

fn linear_export(temperatures: Vec<f64>) -> IsothermOverrides {
    IsothermOverrides {
        logx: Some(false),
        logy: Some(false),
        export_points: Some(true),
        temperatures: Some(temperatures),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Valeurs par défaut
// ═══════════════════════════════════════════════════════════════════

#[test]
fn defaults_come_from_triple_point() {
    let dir = tempdir().unwrap();
    let mut figure = Figure::new();
    let report = generate(
        &MockFluid::new(),
        &IsothermOverrides::default(),
        &OutputPaths::new(dir.path()),
        &mut figure,
    )
    .unwrap();

    // vmin = 1/ρL(Ptriple), vmax = 10/ρV(Ptriple)
    assert_relative_eq!(report.config.vmin, 1.0 / 995.0, max_relative = 1e-12);
    assert_relative_eq!(report.config.vmax, 10.0 / 50.0, max_relative = 1e-12);

    // arange(200, 1.2 × 0.9999 × 300, 20)
    assert_eq!(
        report.config.temperatures,
        vec![200.0, 220.0, 240.0, 260.0, 280.0, 300.0, 320.0, 340.0]
    );
    assert!(report.config.logx && report.config.logy && report.config.legend);
    assert!(!report.config.export_points && !report.config.saturation);
    assert_eq!(report.config.pressure_range, None);
    assert_eq!(report.samples_per_curve, 600);
    assert_eq!(report.curves, 8);
}

#[test]
fn default_run_writes_only_the_image() {
    let dir = tempdir().unwrap();
    let mut figure = Figure::new();
    let report = generate(
        &MockFluid::new(),
        &IsothermOverrides::default(),
        &OutputPaths::new(dir.path()),
        &mut figure,
    )
    .unwrap();

    assert_eq!(report.files, vec![report.config.image.clone()]);
    assert!(report.config.image.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no data file expected");
}

#[test]
fn overrides_replace_only_their_keys() {
    let dir = tempdir().unwrap();
    let overrides = IsothermOverrides {
        vmin: Some(2e-3),
        title: Some("Custom".into()),
        ..Default::default()
    };
    let report = generate(
        &MockFluid::new(),
        &overrides,
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    assert_eq!(report.config.vmin, 2e-3);
    assert_eq!(report.config.title, "Custom");
    assert_relative_eq!(report.config.vmax, 0.2, max_relative = 1e-12);
    assert_eq!(report.curves, 8);
}

// ═══════════════════════════════════════════════════════════════════
//  Export des isothermes
// ═══════════════════════════════════════════════════════════════════

#[test]
fn pv_export_has_one_block_per_isotherm() {
    let dir = tempdir().unwrap();
    let overrides = IsothermOverrides {
        vmin: Some(1e-3),
        vmax: Some(1e-2),
        ..linear_export(vec![250.0, 260.0, 270.0])
    };
    let report = generate(
        &MockFluid::new(),
        &overrides,
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    let lines = read_lines(&report.config.pv_file);
    let headers = lines.iter().filter(|l| *l == "# v(m^3/kg),P(bar)").count();
    assert_eq!(headers, 3, "one header per isotherm");

    let blocks = pv_blocks(&lines);
    assert_eq!(blocks.len(), 3);
    for (block, t) in blocks.iter().zip([250.0, 260.0, 270.0]) {
        assert_eq!(block.len(), 200);
        assert_eq!(block[0][0], 1e-3, "first volume is vmin exactly");
        assert_eq!(block[199][0], 1e-2, "last volume is vmax exactly");
        for row in block {
            // P = 100·ρ·T, exporté en bar
            assert_relative_eq!(row[1], 100.0 * t / row[0] / 1e5, max_relative = 1e-12);
        }
    }
}

#[test]
fn pv_export_is_truncated_between_runs() {
    let dir = tempdir().unwrap();
    let paths = OutputPaths::new(dir.path());
    let mut figure = Figure::new();
    let overrides = linear_export(vec![250.0, 260.0]);

    let first = generate(&MockFluid::new(), &overrides, &paths, &mut figure).unwrap();
    let before = fs::read(&first.config.pv_file).unwrap();
    let second = generate(&MockFluid::new(), &overrides, &paths, &mut figure).unwrap();
    let after = fs::read(&second.config.pv_file).unwrap();

    assert_eq!(before, after, "identical runs produce identical exports");
    assert_eq!(pv_blocks(&read_lines(&second.config.pv_file)).len(), 2);
}

#[test]
fn empty_temperature_list_gives_empty_export() {
    let dir = tempdir().unwrap();
    let report = generate(
        &MockFluid::new(),
        &linear_export(vec![]),
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    assert_eq!(report.curves, 0);
    assert!(report.config.image.exists());
    assert_eq!(fs::read_to_string(&report.config.pv_file).unwrap(), "");
}

// ═══════════════════════════════════════════════════════════════════
//  Courbe de saturation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn saturation_export_has_600_rows() {
    let dir = tempdir().unwrap();
    let overrides = IsothermOverrides {
        saturation: Some(true),
        ..linear_export(vec![250.0])
    };
    let report = generate(
        &MockFluid::new(),
        &overrides,
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    let lines = read_lines(&report.config.saturation_file);
    assert_eq!(lines[0], "# P(bar),Veb,Vrosee(m^3/kg)");
    let rows: Vec<Vec<f64>> = lines[1..].iter().map(|l| parse_row(l)).collect();
    assert_eq!(rows.len(), 600);
    assert_eq!(report.saturation_points, 600);

    // De Ptriple à 0.9999·Pc, linéairement
    assert_relative_eq!(rows[0][0], 5.0, max_relative = 1e-12);
    assert_relative_eq!(rows[599][0], 0.9999 * 70.0, max_relative = 1e-12);
    let step = rows[1][0] - rows[0][0];
    assert_relative_eq!(rows[300][0] - rows[299][0], step, max_relative = 1e-6);

    for row in &rows {
        let p = row[0] * 1e5;
        assert_relative_eq!(row[1], 1.0 / (1000.0 - p / 1e5), max_relative = 1e-9);
        assert_relative_eq!(row[2], 1e4 / p, max_relative = 1e-9);
    }
    assert_eq!(report.files.len(), 3, "image, Pv and saturation files");
}

#[test]
fn saturation_export_is_overwritten_between_runs() {
    let dir = tempdir().unwrap();
    let paths = OutputPaths::new(dir.path());
    let mut figure = Figure::new();
    let overrides = IsothermOverrides {
        saturation: Some(true),
        ..linear_export(vec![250.0])
    };

    let first = generate(&MockFluid::new(), &overrides, &paths, &mut figure).unwrap();
    let before = fs::read(&first.config.saturation_file).unwrap();
    let second = generate(&MockFluid::new(), &overrides, &paths, &mut figure).unwrap();
    let after = fs::read(&second.config.saturation_file).unwrap();

    assert_eq!(before, after, "identical runs produce identical saturation tables");
    let lines = read_lines(&second.config.saturation_file);
    let headers = lines.iter().filter(|l| l.starts_with('#')).count();
    assert_eq!(headers, 1, "a single header after two runs");
    assert_eq!(lines.len(), 601, "600 rows after two runs, got {}", lines.len() - 1);
}

#[test]
fn saturation_without_export_writes_no_table() {
    let dir = tempdir().unwrap();
    let overrides = IsothermOverrides {
        saturation: Some(true),
        ..Default::default()
    };
    let report = generate(
        &MockFluid::new(),
        &overrides,
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    assert_eq!(report.saturation_points, 600);
    assert!(!report.config.saturation_file.exists());
}

// ═══════════════════════════════════════════════════════════════════
//  Erreurs et état de la figure
// ═══════════════════════════════════════════════════════════════════

#[test]
fn invalid_bounds_fail_before_sampling() {
    let dir = tempdir().unwrap();
    let oracle = MockFluid::new();
    let mut figure = Figure::new();
    let overrides = IsothermOverrides {
        vmin: Some(1e-2),
        vmax: Some(1e-3),
        export_points: Some(true),
        ..Default::default()
    };

    let err = generate(&oracle, &overrides, &OutputPaths::new(dir.path()), &mut figure).unwrap_err();
    assert!(matches!(err, AndrewsError::InvalidInput(_)), "got {err:?}");
    assert_eq!(oracle.pressure_queries.get(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0, "nothing written");
    assert!(figure.is_blank());
}

#[test]
fn bad_pressure_range_is_rejected() {
    let dir = tempdir().unwrap();
    for range in [(1e7, 1e6), (0.0, 1e6), (f64::NAN, 1e6)] {
        let overrides = IsothermOverrides {
            pressure_range: Some(range),
            ..Default::default()
        };
        let result = generate(
            &MockFluid::new(),
            &overrides,
            &OutputPaths::new(dir.path()),
            &mut Figure::new(),
        );
        assert!(
            matches!(result, Err(AndrewsError::InvalidInput(_))),
            "Prange {range:?} should be rejected on a log axis"
        );
    }
}

#[test]
fn oracle_failure_propagates_and_clears_figure() {
    let dir = tempdir().unwrap();
    let oracle = MockFluid { fail_above: Some(255.0), ..MockFluid::new() };
    let mut figure = Figure::new();

    let err = generate(
        &oracle,
        &linear_export(vec![250.0, 260.0]),
        &OutputPaths::new(dir.path()),
        &mut figure,
    )
    .unwrap_err();

    assert!(matches!(err, AndrewsError::CalculationFailed(_)), "got {err:?}");
    assert!(figure.is_blank(), "figure must be cleared after a failure");
}

#[test]
fn figure_is_cleared_after_success() {
    let dir = tempdir().unwrap();
    let mut figure = Figure::new();
    generate(
        &MockFluid::new(),
        &linear_export(vec![250.0]),
        &OutputPaths::new(dir.path()),
        &mut figure,
    )
    .unwrap();
    assert!(figure.is_blank());
}

#[test]
fn relative_paths_land_in_output_dir() {
    let dir = tempdir().unwrap();
    let overrides = IsothermOverrides {
        image: Some("close-up.svg".into()),
        pv_file: Some("data/pv.txt".into()),
        ..linear_export(vec![250.0])
    };
    let report = generate(
        &MockFluid::new(),
        &overrides,
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    assert_eq!(report.config.image, dir.path().join("close-up.svg"));
    assert_eq!(report.config.pv_file, dir.path().join("data/pv.txt"));
    assert!(report.config.pv_file.exists());
    let svg = fs::read_to_string(&report.config.image).unwrap();
    assert!(svg.contains("<svg"), "SVG output expected for a .svg path");
}

// ═══════════════════════════════════════════════════════════════════
//  CO2 de bout en bout (Peng–Robinson)
// ═══════════════════════════════════════════════════════════════════

#[test]
fn co2_default_diagram() {
    let dir = tempdir().unwrap();
    let co2 = Fluid::with_backend("carbondioxide", Backend::PengRobinson).unwrap();
    let report = generate(
        &co2,
        &IsothermOverrides::default(),
        &OutputPaths::new(dir.path()),
        &mut Figure::new(),
    )
    .unwrap();

    assert!(report.config.image.exists());
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.samples_per_curve, 600);
    // 216.6, 236.6, …, 356.6 K
    assert_eq!(report.curves, 8);
    assert!(report.config.vmin < report.config.vmax);
}

#[test]
fn co2_linear_close_up_with_export() {
    let dir = tempdir().unwrap();
    let co2 = Fluid::with_backend("carbondioxide", Backend::PengRobinson).unwrap();
    let overrides = IsothermOverrides {
        pressure_range: Some((1e6, 1e7)),
        vmin: Some(1e-3),
        vmax: Some(1e-2),
        legend: Some(false),
        ..linear_export(vec![270.0, 290.0, 304.2, 310.0, 320.0])
    };
    let report = generate(&co2, &overrides, &OutputPaths::new(dir.path()), &mut Figure::new()).unwrap();

    assert!(report.config.image.exists());
    let blocks = pv_blocks(&read_lines(&report.config.pv_file));
    assert_eq!(blocks.len(), 5);
    assert!(blocks.iter().all(|b| b.len() == 200));

    // Isotherme 270 K : palier de saturation (~32 bar) à l'intérieur du dôme
    let plateau: Vec<f64> = blocks[0]
        .iter()
        .filter(|row| row[0] > 3e-3 && row[0] < 4e-3)
        .map(|row| row[1])
        .collect();
    assert!(!plateau.is_empty());
    for p in &plateau {
        assert_relative_eq!(*p, plateau[0], max_relative = 1e-9);
    }
    assert!((plateau[0] - 32.0).abs() < 1.5, "Psat(270 K) ≈ 32 bar, got {:.3}", plateau[0]);
}
