use andrews::sampling::{arange, linspace, logspace};
use approx::assert_relative_eq;

// ═══════════════════════════════════════════════════════════════════
//  linspace / logspace
// ═══════════════════════════════════════════════════════════════════

#[test]
fn linspace_hits_both_ends() {
    let v = linspace(1e-3, 1e-2, 200);
    assert_eq!(v.len(), 200);
    assert_eq!(v[0], 1e-3);
    assert_eq!(v[199], 1e-2);
    let step = v[1] - v[0];
    assert_relative_eq!(v[100] - v[99], step, max_relative = 1e-9);
}

#[test]
fn linspace_degenerate_counts() {
    assert!(linspace(0.0, 1.0, 0).is_empty());
    assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
    assert_eq!(linspace(3.0, 7.0, 2), vec![3.0, 7.0]);
}

#[test]
fn logspace_is_geometric() {
    let v = logspace(1e-3, 1.0, 600);
    assert_eq!(v.len(), 600);
    assert_eq!(v[0], 1e-3);
    assert_eq!(v[599], 1.0);
    let ratio = v[1] / v[0];
    for w in v.windows(2) {
        assert_relative_eq!(w[1] / w[0], ratio, max_relative = 1e-9);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  arange
// ═══════════════════════════════════════════════════════════════════

#[test]
fn arange_excludes_stop() {
    assert_eq!(arange(200.0, 260.0, 20.0), vec![200.0, 220.0, 240.0]);
    assert_eq!(arange(200.0, 260.5, 20.0), vec![200.0, 220.0, 240.0, 260.0]);
}

#[test]
fn arange_co2_default_temperatures() {
    // Ttriple(CO2) → 1.2 × 0.9999 × Tc
    let t = arange(216.592, 1.2 * 0.9999 * 304.1282, 20.0);
    assert_eq!(t.len(), 8);
    assert_relative_eq!(t[0], 216.592);
    assert_relative_eq!(t[7], 356.592, max_relative = 1e-12);
}

#[test]
fn arange_empty_cases() {
    assert!(arange(300.0, 200.0, 20.0).is_empty());
    assert!(arange(200.0, 200.0, 20.0).is_empty());
    assert!(arange(200.0, 300.0, 0.0).is_empty());
    assert!(arange(200.0, f64::NAN, 20.0).is_empty());
}
