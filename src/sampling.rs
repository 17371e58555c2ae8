//! Grid helpers with numpy semantics.

/// `n` evenly spaced values from `start` to `stop`, both included.
///
/// The last value is `stop` exactly.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// `n` values evenly spaced in log10 between `start` and `stop`.
///
/// Both bounds must be positive. The ends are `start` and `stop` exactly.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let mut out: Vec<f64> = linspace(start.log10(), stop.log10(), n)
        .into_iter()
        .map(|x| 10f64.powf(x))
        .collect();
    if let Some(first) = out.first_mut() {
        *first = start;
    }
    if n > 1 {
        out[n - 1] = stop;
    }
    out
}

/// `start, start + step, …` strictly below `stop`.
///
/// The count is `ceil((stop - start) / step)`, as numpy's `arange`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step == 0.0 || !((stop - start) / step).is_finite() {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil();
    if n <= 0.0 {
        return Vec::new();
    }
    (0..n as usize).map(|i| start + step * i as f64).collect()
}
