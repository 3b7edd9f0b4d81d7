/// Lp distance between two states after element-wise scaling
///
/// (Σ |(a<sub>i</sub> - b<sub>i</sub>) / scaling<sub>i</sub>|<sup>p</sup>)<sup>1/p</sup>,
/// with `p = f64::INFINITY` giving the largest scaled coordinate difference.
///
/// **Panics** if the three slices do not have the same length
pub fn metric_lp(a: &[f64], b: &[f64], p: f64, scaling: &[f64]) -> f64 {
    assert!(
        a.len() == b.len() && a.len() == scaling.len(),
        "Dimension mismatch in metric_lp: {}, {} and scaling {}",
        a.len(),
        b.len(),
        scaling.len()
    );

    let diffs = a
        .iter()
        .zip(b)
        .zip(scaling)
        .map(|((x, y), s)| ((x - y) / s).abs());

    if p == f64::INFINITY {
        return diffs.fold(0.0, f64::max);
    }
    if p == 1.0 {
        return diffs.sum();
    }
    if p == 2.0 {
        return diffs.map(|d| d * d).sum::<f64>().sqrt();
    }
    diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn metric_lp_functional() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        let ones = [1.0, 1.0];
        assert_eq!(metric_lp(&a, &b, 2.0, &ones), 5.0, "Euclidean distance");
        assert_eq!(metric_lp(&a, &b, 1.0, &ones), 7.0, "Manhattan distance");
        assert_eq!(metric_lp(&a, &b, f64::INFINITY, &ones), 4.0, "Max distance");
        assert_relative_eq!(
            metric_lp(&a, &b, 3.0, &ones),
            (27.0f64 + 64.0).powf(1.0 / 3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn metric_lp_scaling() {
        let a = [1.0, 10.0];
        let b = [0.0, 0.0];
        assert_eq!(metric_lp(&a, &b, f64::INFINITY, &[1.0, 20.0]), 1.0);
        assert_eq!(metric_lp(&a, &b, 1.0, &[2.0, 10.0]), 1.5);
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn metric_lp_shape_mismatch() {
        metric_lp(&[0.0], &[0.0, 1.0], 2.0, &[1.0, 1.0]);
    }
}
