use super::errors::NumericsError;

/// Settings for Newton iteration with an explicit derivative
#[derive(Debug, Clone, Copy)]
pub struct NewtonConfig {
    pub tol: f64,
    pub max_steps: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_steps: 50,
        }
    }
}

/// Settings for Newton iteration with a central finite-difference derivative
#[derive(Debug, Clone, Copy)]
pub struct FdNewtonConfig {
    pub tol: f64,
    pub max_steps: usize,
    pub diff_step: f64,
}

impl Default for FdNewtonConfig {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_steps: 200,
            diff_step: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution {
    pub root: f64,
    pub iterations: usize,
}

/// Central finite difference of a scalar function
pub fn central_difference<F, E>(f: &mut F, x: f64, dx: f64) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    Ok((f(x + dx)? - f(x - dx)?) / (2.0 * dx))
}

/// Newton's method: `x -= f(x) / f'(x)` until `|Δx| < tol`.
///
/// Residual and derivative closures may fail; their error is returned unchanged.
pub fn newton_root<F, D, E>(
    mut f: F,
    mut fp: D,
    x0: f64,
    config: &NewtonConfig,
) -> Result<RootSolution, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    D: FnMut(f64) -> Result<f64, E>,
    E: From<NumericsError>,
{
    let mut x = x0;
    let mut delta = newton_step(f(x)?, fp(x)?, x)?;

    for n in 0..config.max_steps {
        x -= delta;
        delta = newton_step(f(x)?, fp(x)?, x)?;
        if delta.abs() < config.tol {
            return Ok(RootSolution {
                root: x,
                iterations: n + 1,
            });
        }
    }

    Err(NumericsError::DidNotConverge {
        iterations: config.max_steps,
        last_step: delta,
    }
    .into())
}

/// Newton's method with the derivative replaced by a central difference.
/// Used for residuals with no closed-form derivative.
pub fn newton_root_fd<F, E>(mut f: F, x0: f64, config: &FdNewtonConfig) -> Result<RootSolution, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<NumericsError>,
{
    let mut x = x0;
    let slope = central_difference(&mut f, x, config.diff_step)?;
    let mut delta = newton_step(f(x)?, slope, x)?;

    for n in 0..config.max_steps {
        x -= delta;
        let slope = central_difference(&mut f, x, config.diff_step)?;
        delta = newton_step(f(x)?, slope, x)?;
        if delta.abs() < config.tol {
            return Ok(RootSolution {
                root: x,
                iterations: n + 1,
            });
        }
    }

    Err(NumericsError::DidNotConverge {
        iterations: config.max_steps,
        last_step: delta,
    }
    .into())
}

fn newton_step(value: f64, slope: f64, x: f64) -> Result<f64, NumericsError> {
    let delta = value / slope;
    if slope == 0.0 || !delta.is_finite() {
        return Err(NumericsError::ZeroDerivative { x });
    }
    Ok(delta)
}

/// Brent's method on a bracket `[a, b]` with known end values.
///
/// Combines inverse quadratic interpolation, secant steps and bisection.
/// Converges when the bracket shrinks below `tol` or an exact zero is hit.
pub fn brent_root<F, E>(
    mut f: F,
    mut a: f64,
    mut b: f64,
    mut fa: f64,
    mut fb: f64,
    tol: f64,
    max_iter: usize,
) -> Result<RootSolution, E>
where
    F: FnMut(f64) -> Result<f64, E>,
    E: From<NumericsError>,
{
    if fa * fb > 0.0 {
        return Err(NumericsError::NotBracketed { a, b, fa, fb }.into());
    }
    if fa == 0.0 {
        return Ok(RootSolution {
            root: a,
            iterations: 0,
        });
    }

    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut bisected = true;
    let mut d = b - a;

    for iter in 0..max_iter {
        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        if fb == 0.0 || (b - a).abs() <= tol {
            return Ok(RootSolution {
                root: b,
                iterations: iter + 1,
            });
        }

        let s = if fa != fc && fb != fc && fa != fb {
            a * fb * fc / ((fa - fb) * (fa - fc))
                + b * fa * fc / ((fb - fa) * (fb - fc))
                + c * fa * fb / ((fc - fa) * (fc - fb))
        } else if fb != fa {
            b - fb * (b - a) / (fb - fa)
        } else {
            (a + b) / 2.0
        };

        let use_bisection = (s - (3.0 * a + b) / 4.0) * (s - b) > 0.0
            || (bisected && (s - b).abs() >= (b - c).abs() / 2.0)
            || (!bisected && (s - b).abs() >= (c - d).abs() / 2.0)
            || (bisected && (b - c).abs() < tol)
            || (!bisected && (c - d).abs() < tol);

        let s = if use_bisection {
            bisected = true;
            (a + b) / 2.0
        } else {
            bisected = false;
            s
        };

        let fs = f(s)?;
        d = c;
        c = b;
        fc = fb;

        if fa * fs < 0.0 {
            b = s;
            fb = fs;
        } else {
            a = s;
            fa = fs;
        }
    }

    Err(NumericsError::DidNotConverge {
        iterations: max_iter,
        last_step: (b - a).abs(),
    }
    .into())
}
