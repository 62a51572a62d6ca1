/// Maps a parameter vector to the statistics that get ranked.
///
/// A reduction is applied to the true parameter and to every posterior sample
/// before ranking, so both sides of the comparison go through the same
/// transform. It also receives the observation, which lets a reduction rank
/// observation-dependent quantities (for example a log-density).
pub trait Reduction<X> {
    /// Returns the number of statistics produced for a `param_dim`-dimensional
    /// parameter vector.
    fn output_dim(&self, param_dim: usize) -> usize;

    /// Writes the reduced statistics for `theta` into `out`.
    ///
    /// `out` has exactly [`output_dim`][Self::output_dim] elements.
    fn reduce_into(&self, theta: &[f64], observation: &X, out: &mut [f64]);

    /// Returns the reduced statistics for `theta` as a new vector.
    fn reduce(&self, theta: &[f64], observation: &X) -> Vec<f64> {
        let mut out = vec![0.0; self.output_dim(theta.len())];
        self.reduce_into(theta, observation, &mut out);
        out
    }
}

/// Ranks each parameter dimension independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marginals;

impl<X> Reduction<X> for Marginals {
    fn output_dim(&self, param_dim: usize) -> usize {
        param_dim
    }

    fn reduce_into(&self, theta: &[f64], _observation: &X, out: &mut [f64]) {
        out.copy_from_slice(theta);
    }
}

/// A scalar reduction backed by a closure.
///
/// Construct with [`reduce_fn`] so the closure's argument types are inferred.
#[derive(Debug, Clone, Copy)]
pub struct ScalarFn<F>(F);

/// Wraps a closure `Fn(&[f64], &X) -> f64` as a one-dimensional [`Reduction`].
///
/// # Example
///
/// ```
/// use sbc_core::{Reduction, reduce_fn};
///
/// let mean = reduce_fn(|theta: &[f64], _x: &()| theta.iter().sum::<f64>() / theta.len() as f64);
/// assert_eq!(mean.reduce(&[1.0, 3.0], &()), vec![2.0]);
/// ```
pub fn reduce_fn<X, F>(f: F) -> ScalarFn<F>
where
    F: Fn(&[f64], &X) -> f64,
{
    ScalarFn(f)
}

impl<X, F> Reduction<X> for ScalarFn<F>
where
    F: Fn(&[f64], &X) -> f64,
{
    fn output_dim(&self, _param_dim: usize) -> usize {
        1
    }

    fn reduce_into(&self, theta: &[f64], observation: &X, out: &mut [f64]) {
        out[0] = (self.0)(theta, observation);
    }
}

/// Concatenates the outputs of several reductions, in order.
impl<X, R: Reduction<X>> Reduction<X> for Vec<R> {
    fn output_dim(&self, param_dim: usize) -> usize {
        self.iter().map(|r| r.output_dim(param_dim)).sum()
    }

    fn reduce_into(&self, theta: &[f64], observation: &X, out: &mut [f64]) {
        let mut start = 0;
        for reduction in self {
            let end = start + reduction.output_dim(theta.len());
            reduction.reduce_into(theta, observation, &mut out[start..end]);
            start = end;
        }
    }
}

impl<X, R: Reduction<X> + ?Sized> Reduction<X> for &R {
    fn output_dim(&self, param_dim: usize) -> usize {
        (**self).output_dim(param_dim)
    }

    fn reduce_into(&self, theta: &[f64], observation: &X, out: &mut [f64]) {
        (**self).reduce_into(theta, observation, out);
    }
}

impl<X, R: Reduction<X> + ?Sized> Reduction<X> for Box<R> {
    fn output_dim(&self, param_dim: usize) -> usize {
        (**self).output_dim(param_dim)
    }

    fn reduce_into(&self, theta: &[f64], observation: &X, out: &mut [f64]) {
        (**self).reduce_into(theta, observation, out);
    }
}
