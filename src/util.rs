/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// use kbrl::assert_interval;
///
/// let gamma = 2.0;
/// assert_interval!(gamma, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`gamma\`. Must be in the interval \[0, 1\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

/// Index of the largest value, the lowest index winning ties
///
/// Returns `None` for an empty iterator.
pub fn argmax<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, x) in values.into_iter().enumerate() {
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_functional() {
        assert_eq!(argmax([0.1, 0.5, 0.2]), Some(1));
        assert_eq!(argmax([1.0, 1.0, 0.0]), Some(0), "First index wins ties");
        assert_eq!(argmax(std::iter::empty()), None);
    }

    #[test]
    #[should_panic(expected = "Must be in the interval")]
    fn assert_interval_panics() {
        let gamma = 1.5;
        assert_interval!(gamma, 0.0, 1.0);
    }
}
