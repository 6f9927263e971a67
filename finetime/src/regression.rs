//! regression.rs – ordinary least squares over two columns

use log::info;
use polars::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::helper_functions::column_f64;
use crate::models::LinRegress;

/// Fit `y = slope * x + intercept`.
///
/// Besides the coefficients this reports the Pearson correlation, the
/// two-sided p-value for a zero slope (Student t with `n - 2` degrees of
/// freedom) and the standard errors of slope and intercept.
pub fn linregress(x: &[f64], y: &[f64]) -> PolarsResult<LinRegress> {
    if x.len() != y.len() {
        return Err(PolarsError::ShapeMismatch(
            format!("x has {} values, y has {}", x.len(), y.len()).into(),
        ));
    }
    let n = x.len();
    if n < 2 {
        return Err(PolarsError::ComputeError(
            format!("linear regression needs at least 2 points, got {}", n).into(),
        ));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    // Biased (1/n) second moments
    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        ssxm += dx * dx;
        ssym += dy * dy;
        ssxym += dx * dy;
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(PolarsError::ComputeError(
            "cannot fit a line: all x values are identical".into(),
        ));
    }

    let rvalue = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    if n == 2 {
        let pvalue = if rvalue.abs() == 1.0 { 0.0 } else { 1.0 };
        return Ok(LinRegress {
            slope,
            intercept,
            rvalue,
            pvalue,
            stderr: 0.0,
            intercept_stderr: 0.0,
        });
    }

    let df = nf - 2.0;
    let one_minus_r2 = (1.0 - rvalue) * (1.0 + rvalue);
    let pvalue = if one_minus_r2 <= 0.0 {
        0.0
    } else {
        let t = rvalue * (df / one_minus_r2).sqrt();
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| PolarsError::ComputeError(e.to_string().into()))?;
        2.0 * (1.0 - dist.cdf(t.abs()))
    };

    let stderr = (one_minus_r2.max(0.0) * ssym / ssxm / df).sqrt();
    let intercept_stderr = stderr * (ssxm + x_mean * x_mean).sqrt();

    info!("Fitted {} points: slope {:.6}, intercept {:.6}, r {:.4}", n, slope, intercept, rvalue);

    Ok(LinRegress {
        slope,
        intercept,
        rvalue,
        pvalue,
        stderr,
        intercept_stderr,
    })
}

/// [`linregress`] over two columns of a frame.
pub fn linregress_columns(df: &DataFrame, x_col: &str, y_col: &str) -> PolarsResult<LinRegress> {
    let x = column_f64(df, x_col)?;
    let y = column_f64(df, y_col)?;
    linregress(&x, &y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn perfect_line() {
        let res = linregress(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((res.slope - 2.0).abs() < 1e-12);
        assert!(res.intercept.abs() < 1e-12);
        assert!((res.rvalue - 1.0).abs() < 1e-12);
        assert_eq!(res.pvalue, 0.0);
        assert!(res.stderr.abs() < 1e-12);
    }

    #[test]
    fn noisy_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.1, 1.9, 3.2, 3.8, 5.1];
        let res = linregress(&x, &y).unwrap();
        // slope = Sxy / Sxx = 9.9 / 10
        assert!((res.slope - 0.99).abs() < 1e-9);
        assert!((res.intercept - 0.05).abs() < 1e-9);
        assert!(res.rvalue > 0.99);
        assert!(res.pvalue > 0.0 && res.pvalue < 0.001);
        assert!(res.stderr > 0.0);
        assert!(res.intercept_stderr > res.stderr);
    }

    #[test]
    fn two_points() {
        let res = linregress(&[0.0, 1.0], &[1.0, 3.0]).unwrap();
        assert!((res.slope - 2.0).abs() < 1e-12);
        assert!((res.intercept - 1.0).abs() < 1e-12);
        assert_eq!(res.pvalue, 0.0);
        assert_eq!(res.stderr, 0.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(linregress(&[1.0], &[1.0]).is_err());
        assert!(linregress(&[1.0, 2.0], &[1.0]).is_err());
        assert!(linregress(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn fits_frame_columns() {
        let df = df![
            "sample_size" => &[10i64, 20, 30, 40],
            "stderr" => &[1.5, 2.5, 3.5, 4.5],
        ]
        .unwrap();
        let res = linregress_columns(&df, "sample_size", "stderr").unwrap();
        assert!((res.slope - 0.1).abs() < 1e-12);
        assert!((res.intercept - 0.5).abs() < 1e-12);
    }
}
