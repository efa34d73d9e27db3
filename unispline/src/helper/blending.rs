//! Compile-time construction of the uniform B-spline matrices.
//!
//! All tables are `[[f64; N]; N]` indexed `[row][column]` and built by
//! `const fn`s, so every spline order gets its matrices baked into the
//! binary with no runtime initialization.

/// Binomial coefficient `n choose k`.
pub(crate) const fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let mut res: u64 = 1;
    let mut i = 1;
    while i <= k {
        res = res * (n - k + i) as u64 / i as u64;
        i += 1;
    }
    res as f64
}

/// `base^exp` with `0^0 = 1`.
const fn powu(base: f64, exp: usize) -> f64 {
    let mut res = 1.0;
    let mut i = 0;
    while i < exp {
        res *= base;
        i += 1;
    }
    res
}

/// Coefficients of the `n`-th derivative of the monomial basis.
///
/// Row `n`, column `i` holds `d^n/du^n u^i` divided by `u^(i-n)`, i.e. the
/// falling factorial `i (i-1) ... (i-n+1)` (zero for `i < n`).
pub(crate) const fn base_coefficients<const N: usize>() -> [[f64; N]; N] {
    let mut m = [[0.0; N]; N];
    let mut n = 0;
    while n < N {
        let mut i = n;
        while i < N {
            let mut factor = 1.0;
            let mut k = 0;
            while k < n {
                factor *= (i - k) as f64;
                k += 1;
            }
            m[n][i] = factor;
            i += 1;
        }
        n += 1;
    }
    m
}

/// Uniform B-spline blending matrix of order `N`.
///
/// Row `j` gives the polynomial (in the monomial basis `1, u, u², …`) that
/// weights knot `j` of the segment. With `cumulative` set, row `j` is the
/// sum of rows `j..N`, which weights the increment between knots `j-1` and
/// `j` in the cumulative formulation.
pub(crate) const fn blending_matrix<const N: usize>(cumulative: bool) -> [[f64; N]; N] {
    let mut m = [[0.0; N]; N];

    let mut i = 0;
    while i < N {
        let mut j = 0;
        while j < N {
            let mut sum = 0.0;
            let mut s = j;
            while s < N {
                let sign = if (s - j) % 2 == 0 { 1.0 } else { -1.0 };
                sum += sign * binomial(N, s - j) * powu((N - s - 1) as f64, N - 1 - i);
                s += 1;
            }
            m[j][i] = binomial(N - 1, N - 1 - i) * sum;
            j += 1;
        }
        i += 1;
    }

    if cumulative {
        let mut i = 0;
        while i < N {
            let mut j = i + 1;
            while j < N {
                let mut c = 0;
                while c < N {
                    m[i][c] += m[j][c];
                    c += 1;
                }
                j += 1;
            }
            i += 1;
        }
    }

    let mut factorial = 1.0;
    let mut k = 2;
    while k < N {
        factorial *= k as f64;
        k += 1;
    }

    let mut r = 0;
    while r < N {
        let mut c = 0;
        while c < N {
            m[r][c] /= factorial;
            c += 1;
        }
        r += 1;
    }

    m
}
