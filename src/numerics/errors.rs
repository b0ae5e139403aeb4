use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericsError {
    #[error("cannot normalize a zero-length vector")]
    ZeroVector,
    #[error("root finder did not converge after {iterations} iterations (last step {last_step:e})")]
    DidNotConverge { iterations: usize, last_step: f64 },
    #[error("derivative vanished or became non-finite at x = {x}")]
    ZeroDerivative { x: f64 },
    #[error("root is not bracketed: f({a}) = {fa:e}, f({b}) = {fb:e}")]
    NotBracketed { a: f64, b: f64, fa: f64, fb: f64 },
}
