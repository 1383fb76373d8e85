use nalgebra::RealField;

/// Binomial coefficients memoized as rows of Pascal's triangle.
///
/// The rational derivative recursion asks for the same small coefficients
/// over and over, so rows are grown once and then indexed.
pub struct Binomial<T> {
    rows: Vec<Vec<T>>,
}

impl<T: RealField + Copy> Binomial<T> {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![T::one()]],
        }
    }

    /// Returns `n` choose `k`.
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k > n {
            return T::zero();
        }

        while self.rows.len() <= n {
            let prev = self.rows.last().unwrap();
            let len = prev.len();
            let mut row = vec![T::one(); len + 1];
            for i in 1..len {
                row[i] = prev[i - 1] + prev[i];
            }
            self.rows.push(row);
        }

        self.rows[n][k]
    }
}

impl<T: RealField + Copy> Default for Binomial<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Binomial;

    #[test]
    fn pascal_rows() {
        let mut binomial = Binomial::<f64>::new();
        assert_eq!(binomial.get(0, 0), 1.);
        assert_eq!(binomial.get(5, 0), 1.);
        assert_eq!(binomial.get(5, 1), 5.);
        assert_eq!(binomial.get(5, 2), 10.);
        assert_eq!(binomial.get(5, 3), 10.);
        assert_eq!(binomial.get(5, 4), 5.);
        assert_eq!(binomial.get(5, 5), 1.);
        assert_eq!(binomial.get(5, 6), 0.);
    }

    #[test]
    fn out_of_order_queries() {
        let mut binomial = Binomial::<f64>::new();
        assert_eq!(binomial.get(8, 4), 70.);
        assert_eq!(binomial.get(3, 2), 3.);
        assert_eq!(binomial.get(10, 5), 252.);
    }
}
