use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3};

use crate::assert_interval;

/// Solve a finite-horizon MDP by backward induction
///
/// ### Parameters
/// - `r` - Rewards `r[s, a]`
/// - `p` - Transitions `p[s, a, s']`
/// - `horizon` - Number of steps
/// - `gamma` - Discount factor in `[0, 1]`
/// - `v_max` - State values are clipped to `[0, v_max]`
///
/// **Returns** `(q, v)` of shapes `(horizon, S, A)` and `(horizon, S)`
pub fn backward_induction(
    r: ArrayView2<f64>,
    p: ArrayView3<f64>,
    horizon: usize,
    gamma: f64,
    v_max: f64,
) -> (Array3<f64>, Array2<f64>) {
    let (n_states, n_actions) = r.dim();
    let mut q = Array3::zeros((horizon, n_states, n_actions));
    let mut v = Array2::zeros((horizon, n_states));
    backward_induction_in_place(q.view_mut(), v.view_mut(), r, None, p, gamma, v_max);
    (q, v)
}

/// Backward induction writing into preallocated tables
///
/// The horizon is the length of the first axis of `q` and `v`. When `bonus` is given
/// it is added to the rewards.
///
/// Q<sub>h</sub>(s, a) = r(s, a) + b(s, a) + γ Σ<sub>s'</sub> p(s' | s, a) V<sub>h+1</sub>(s')
/// and V<sub>h</sub>(s) = max<sub>a</sub> Q<sub>h</sub>(s, a) clipped to `[0, v_max]`, with
/// V<sub>horizon</sub> = 0. Q values themselves are not clipped so that greedy
/// actions keep their ordering.
///
/// **Panics** if the table shapes disagree or `gamma` is not in `[0, 1]`
pub fn backward_induction_in_place(
    mut q: ArrayViewMut3<f64>,
    mut v: ArrayViewMut2<f64>,
    r: ArrayView2<f64>,
    bonus: Option<ArrayView2<f64>>,
    p: ArrayView3<f64>,
    gamma: f64,
    v_max: f64,
) {
    assert_interval!(gamma, 0.0, 1.0);
    let (horizon, n_states, n_actions) = q.dim();
    assert_eq!(v.dim(), (horizon, n_states), "V table shape mismatch");
    assert_eq!(r.dim(), (n_states, n_actions), "Reward table shape mismatch");
    assert_eq!(p.dim(), (n_states, n_actions, n_states), "Transition table shape mismatch");
    if let Some(b) = &bonus {
        assert_eq!(b.dim(), (n_states, n_actions), "Bonus table shape mismatch");
    }

    for hh in (0..horizon).rev() {
        for ss in 0..n_states {
            let mut max_q = f64::NEG_INFINITY;
            for aa in 0..n_actions {
                let mut q_aa = r[[ss, aa]] + bonus.as_ref().map_or(0.0, |b| b[[ss, aa]]);
                if hh + 1 < horizon {
                    q_aa += gamma * p.slice(s![ss, aa, ..]).dot(&v.row(hh + 1));
                }
                q[[hh, ss, aa]] = q_aa;
                max_q = max_q.max(q_aa);
            }
            v[[hh, ss]] = max_q.clamp(0.0, v_max);
        }
    }
}
