use std::fs;
use std::path::PathBuf;

use andrews::runfile::{RunFile, classroom};
use andrews::{AndrewsError, Backend, IsothermOverrides};
use tempfile::tempdir;

// ═══════════════════════════════════════════════════════════════════
//  Fichier de lancement
// ═══════════════════════════════════════════════════════════════════

#[test]
fn run_file_with_several_diagrams() {
    let run_file = RunFile::from_toml(
        r#"
        fluid = "water"
        backend = "peng-robinson"
        output-dir = "figures"

        [[run]]

        [[run]]
        Prange = [1e6, 1e7]
        logx = false
        T = [500, 600]
        "#,
    )
    .unwrap();

    assert_eq!(run_file.fluid.as_deref(), Some("water"));
    assert_eq!(run_file.backend, Some(Backend::PengRobinson));
    assert_eq!(run_file.output_dir, Some(PathBuf::from("figures")));

    let runs = run_file.runs();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0], IsothermOverrides::default());
    assert_eq!(runs[1].pressure_range, Some((1e6, 1e7)));
    assert_eq!(runs[1].logx, Some(false));
    assert_eq!(runs[1].temperatures, Some(vec![500.0, 600.0]));
}

#[test]
fn empty_run_file_draws_the_default_diagram() {
    let run_file = RunFile::from_toml("").unwrap();
    assert_eq!(run_file, RunFile::default());
    assert_eq!(run_file.runs(), vec![IsothermOverrides::default()]);
}

#[test]
fn backend_names() {
    for (text, backend) in [
        ("auto", Backend::Auto),
        ("refprop", Backend::Refprop),
        ("peng-robinson", Backend::PengRobinson),
    ] {
        let run_file = RunFile::from_toml(&format!("backend = \"{text}\"")).unwrap();
        assert_eq!(run_file.backend, Some(backend));
    }
    assert!(RunFile::from_toml("backend = \"coolprop\"").is_err());
}

#[test]
fn load_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("runs.toml");
    fs::write(&path, "fluid = \"CO2\"\n[[run]]\nsaturation = true\n").unwrap();

    let run_file = RunFile::load(&path).unwrap();
    assert_eq!(run_file.fluid.as_deref(), Some("CO2"));
    assert_eq!(run_file.runs()[0].saturation, Some(true));
}

#[test]
fn missing_run_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let result = RunFile::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(AndrewsError::Io(_))));
}

// ═══════════════════════════════════════════════════════════════════
//  Préréglage « classroom »
// ═══════════════════════════════════════════════════════════════════

#[test]
fn classroom_preset() {
    let runs = classroom("carbondioxide");
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0], IsothermOverrides::default());

    let (close_up, with_sat) = (&runs[1], &runs[2]);
    assert_eq!(close_up.pressure_range, Some((1e6, 1e7)));
    assert_eq!(close_up.vmin, Some(1e-3));
    assert_eq!(close_up.vmax, Some(1e-2));
    assert_eq!(close_up.temperatures, Some(vec![270.0, 290.0, 304.2, 310.0, 320.0]));
    assert_eq!(close_up.logx, Some(false));
    assert_eq!(close_up.legend, Some(false));
    assert_eq!(close_up.export_points, Some(true));
    assert_eq!(close_up.saturation, None);

    assert_eq!(with_sat.saturation, Some(true));
    assert_eq!(with_sat.temperatures, close_up.temperatures);
    assert_ne!(with_sat.image, close_up.image, "each diagram gets its own image");
}
