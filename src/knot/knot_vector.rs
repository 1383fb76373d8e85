use std::ops::Index;

use crate::misc::FloatingPoint;

/// Non-decreasing knot vector of a NURBS curve.
///
/// The vector only partitions the parameter axis; the degree of the curve it
/// belongs to decides which part of it is actually evaluable (see
/// [`KnotVector::domain`]).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.0.iter()
    }

    /// Whether the knots are sorted in non-decreasing order.
    pub fn is_sorted(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// The valid evaluation domain for a curve of the given degree:
    /// `[knots[degree], knots[len - 1 - degree]]`.
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    /// Find the index of the knot span containing `u`, i.e. the `k` with
    /// `knots[k] <= u < knots[k + 1]`, by binary search.
    ///
    /// `n` is the highest control point index (`knots.len() - degree - 2`).
    /// A parameter at the end of the domain is assigned to the last valid
    /// span so that the basis functions stay well defined there.
    ///
    /// # Example
    /// ```
    /// use nurbs_eval::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 2.5), 4);
    /// assert_eq!(knots.find_knot_span_index(4, 2, 3.0), 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        if u > self[n + 1] - T::default_epsilon() {
            return n;
        }
        if u < self[degree] + T::default_epsilon() {
            return degree;
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if next == mid {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Compute the `degree + 1` non-vanishing basis function values at `u`
    /// on the given knot span, using the triangular Cox-de Boor recurrence.
    ///
    /// The returned values always sum to one (partition of unity).
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = basis[r] / (right[r + 1] + left[j - r]);
                basis[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis[j] = saved;
        }

        basis
    }

    /// Compute the non-vanishing basis functions and their derivatives up to
    /// order `n` at `u`, localized to the given knot span.
    ///
    /// Returns an `(n + 1) x (degree + 1)` table: row 0 holds the basis
    /// function values, row `k` the `k`-th derivatives. Derivative orders
    /// above the degree are identically zero and are left out; the caller
    /// must pass `n <= degree`.
    pub fn derivative_basis_functions(
        &self,
        knot_span_index: usize,
        u: T,
        degree: usize,
        n: usize,
    ) -> Vec<Vec<T>> {
        // ndu stores the basis functions (upper triangle) together with the
        // knot differences (lower triangle) needed by the derivative pass.
        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); degree + 1]; n + 1];
        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        // Two alternating rows of difference coefficients.
        let mut a = vec![vec![T::zero(); degree + 1]; 2];

        let p = degree as isize;
        let n = n as isize;

        for r in 0..=p {
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            for k in 1..=n {
                let mut d = T::zero();
                let rk = r - k;
                let pk = p - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { p - r };

                for j in j1..=j2 {
                    a[s2][j as usize] = (a[s1][j as usize] - a[s1][j as usize - 1])
                        / ndu[(pk + 1) as usize][(rk + j) as usize];
                    d += a[s2][j as usize] * ndu[(rk + j) as usize][pk as usize];
                }

                if r <= pk {
                    a[s2][k as usize] = -a[s1][(k - 1) as usize] / ndu[(pk + 1) as usize][r as usize];
                    d += a[s2][k as usize] * ndu[r as usize][pk as usize];
                }

                ders[k as usize][r as usize] = d;
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // Multiply through by the factor p! / (p - k)!.
        let mut acc = p;
        for k in 1..=n {
            for j in 0..=degree {
                ders[k as usize][j] *= T::from_isize(acc).unwrap();
            }
            acc *= p - k;
        }

        ders
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::KnotVector;

    #[test]
    fn knot_span_index() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
        assert_eq!(knots.find_knot_span_index(4, 2, 0.0), 2);
        assert_eq!(knots.find_knot_span_index(4, 2, 0.5), 2);
        assert_eq!(knots.find_knot_span_index(4, 2, 1.5), 3);
        assert_eq!(knots.find_knot_span_index(4, 2, 2.5), 4);
        // domain end falls into the last valid span
        assert_eq!(knots.find_knot_span_index(4, 2, 3.0), 4);
    }

    #[test]
    fn partition_of_unity() {
        let knots = KnotVector::new(vec![0., 0., 0., 0.5, 1.2, 3., 3., 3.]);
        let degree = 2;
        let n = knots.len() - degree - 2;
        for i in 0..=10 {
            let u = 3.0 * (i as f64) / 10.0;
            let span = knots.find_knot_span_index(n, degree, u);
            let basis = knots.basis_functions(span, u, degree);
            let sum: f64 = basis.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn derivative_basis_row_zero_matches_basis() {
        let knots = KnotVector::new(vec![0., 0., 0., 0., 1., 2., 2., 2., 2.]);
        let degree = 3;
        let n = knots.len() - degree - 2;
        let u = 0.7;
        let span = knots.find_knot_span_index(n, degree, u);
        let basis = knots.basis_functions(span, u, degree);
        let ders = knots.derivative_basis_functions(span, u, degree, degree);
        for (a, b) in basis.iter().zip(ders[0].iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        // each derivative row sums to zero since the basis sums to one
        for k in 1..=degree {
            let sum: f64 = ders[k].iter().sum();
            assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
        }
    }
}
