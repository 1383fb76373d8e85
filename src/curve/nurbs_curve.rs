use nalgebra::{Point3, Vector3, Vector4};

use crate::curve::ParametricCurve;
use crate::error::CurveError;
use crate::knot::KnotVector;
use crate::misc::{Binomial, FloatingPoint, FrenetFrame};

/// NURBS curve representation in 3D space.
///
/// Control points are stored in homogeneous coordinates `(wx, wy, wz, w)`
/// where the last component is the rational weight; `w = 1` everywhere gives
/// an ordinary B-spline. The curve is an immutable value and every evaluation
/// is a pure function of it, so sharing one curve across threads is safe.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NurbsCurve<T: FloatingPoint> {
    /// control points with homogeneous coordinates
    /// the last element of the vector is the `weight`
    control_points: Vec<Vector4<T>>,
    degree: usize,
    /// knot vector for the NURBS curve
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
    /// index of the first externally visible knot
    start_knot: usize,
    /// index of the last externally visible knot
    end_knot: usize,
}

impl<T: FloatingPoint> NurbsCurve<T> {
    /// Create a new NURBS curve whose span window covers the whole knot
    /// vector.
    ///
    /// # Failures
    /// Returns [`CurveError::InvalidCurveDefinition`] if
    /// - the number of control points is less than `degree + 1`,
    /// - the number of knots is not `# of control points + degree + 1`,
    /// - the knot vector is not non-decreasing,
    /// - any control point carries a zero weight.
    ///
    /// # Example
    /// ```
    /// use nurbs_eval::prelude::*;
    /// use nalgebra::Vector4;
    ///
    /// let w = 1.; // weight for each control point
    /// let control_points: Vec<Vector4<f64>> = vec![
    ///     Vector4::new(50., 50., 0., w),
    ///     Vector4::new(30., 370., 0., w),
    ///     Vector4::new(180., 350., 0., w),
    ///     Vector4::new(150., 100., 0., w),
    ///     Vector4::new(250., 50., 0., w),
    /// ];
    /// let degree = 2;
    /// // a clamped knot vector with degree + 1 multiplicity at both ends
    /// let knots = vec![0., 0., 0., 1., 2., 3., 3., 3.];
    /// let nurbs = NurbsCurve::try_new(degree, control_points, knots);
    /// assert!(nurbs.is_ok());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<Vector4<T>>,
        knots: Vec<T>,
    ) -> Result<Self, CurveError> {
        let end = knots.len().saturating_sub(1);
        Self::try_new_with_window(degree, control_points, knots, 0, end)
    }

    /// Create a new NURBS curve with an explicit span window.
    ///
    /// `start_knot` and `end_knot` are indices into the knot vector bounding
    /// the externally visible parameter range of [`NurbsCurve::point_at`].
    /// Periodic curves use the window to hide the duplicated spans at both
    /// ends of their knot vector.
    pub fn try_new_with_window(
        degree: usize,
        control_points: Vec<Vector4<T>>,
        knots: Vec<T>,
        start_knot: usize,
        end_knot: usize,
    ) -> Result<Self, CurveError> {
        if control_points.len() <= degree {
            return Err(CurveError::InvalidCurveDefinition(format!(
                "too few control points for a degree {} curve: {}",
                degree,
                control_points.len()
            )));
        }
        if knots.len() != control_points.len() + degree + 1 {
            return Err(CurveError::InvalidCurveDefinition(format!(
                "invalid number of knots, got {}, expected {}",
                knots.len(),
                control_points.len() + degree + 1
            )));
        }

        let knots = KnotVector::new(knots);
        if !knots.is_sorted() {
            return Err(CurveError::InvalidCurveDefinition(
                "knot vector must be non-decreasing".into(),
            ));
        }

        if control_points
            .iter()
            .any(|p| p.w.abs() <= T::default_epsilon())
        {
            return Err(CurveError::InvalidCurveDefinition(
                "control point with zero weight".into(),
            ));
        }

        if start_knot >= end_knot || end_knot >= knots.len() {
            return Err(CurveError::InvalidCurveDefinition(format!(
                "invalid span window {}..{} for {} knots",
                start_knot,
                end_knot,
                knots.len()
            )));
        }
        if knots[start_knot] >= knots[end_knot] {
            return Err(CurveError::InvalidCurveDefinition(
                "span window covers an empty knot range".into(),
            ));
        }

        Ok(Self {
            control_points,
            degree,
            knots,
            start_knot,
            end_knot,
        })
    }

    /// Create a new NURBS curve from Euclidean points and per-point weights,
    /// premultiplying the weights into homogeneous form.
    ///
    /// # Example
    /// ```
    /// use nurbs_eval::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// // quarter of the unit circle as a rational quadratic arc
    /// let arc = NurbsCurve::try_from_euclidean(
    ///     2,
    ///     &[
    ///         Point3::new(1., 0., 0.),
    ///         Point3::new(1., 1., 0.),
    ///         Point3::new(0., 1., 0.),
    ///     ],
    ///     &[1., std::f64::consts::FRAC_1_SQRT_2, 1.],
    ///     vec![0., 0., 0., 1., 1., 1.],
    /// ).unwrap();
    /// let mid = arc.point_at(0.5).unwrap();
    /// assert_relative_eq!(mid.coords.norm(), 1., epsilon = 1e-12);
    /// ```
    pub fn try_from_euclidean(
        degree: usize,
        points: &[Point3<T>],
        weights: &[T],
        knots: Vec<T>,
    ) -> Result<Self, CurveError> {
        if points.len() != weights.len() {
            return Err(CurveError::InvalidCurveDefinition(format!(
                "got {} control points but {} weights",
                points.len(),
                weights.len()
            )));
        }
        let control_points = points
            .iter()
            .zip(weights)
            .map(|(p, &w)| Vector4::new(p.x * w, p.y * w, p.z * w, w))
            .collect();
        Self::try_new(degree, control_points, knots)
    }

    /// Evaluate the curve at a normalized parameter `t` to get a point in
    /// Euclidean space.
    ///
    /// `t` is mapped linearly from `[0, 1]` onto the span window
    /// `[knots[start_knot], knots[end_knot]]`; the homogeneous result is
    /// projected by dividing through its weight. A `t` outside `[0, 1]`
    /// extrapolates through the same linear map and fails with
    /// [`CurveError::DomainError`] once the mapped parameter leaves the
    /// evaluable knot range.
    pub fn point_at(&self, t: T) -> Result<Point3<T>, CurveError> {
        let u = self.knots[self.start_knot]
            + t * (self.knots[self.end_knot] - self.knots[self.start_knot]);
        self.check_domain(u)?;
        let hpoint = self.point(u);
        dehomogenize(&hpoint).ok_or(CurveError::DegenerateGeometry(
            "zero weight at evaluation point",
        ))
    }

    /// Evaluate the unit tangent of the curve at a normalized parameter `t`.
    ///
    /// Unlike [`NurbsCurve::point_at`], `t` is mapped over the FULL knot
    /// range `[knots.first(), knots.last()]` and ignores the span window.
    /// Both entry points agree for the common non-periodic case where the
    /// window covers the whole knot vector; the asymmetry is kept so that
    /// windowed (periodic) curves keep their historical tangent
    /// parameterization.
    ///
    /// Fails with [`CurveError::DegenerateGeometry`] at a cusp, where the
    /// first derivative has no direction to normalize.
    pub fn tangent_at(&self, t: T) -> Result<Vector3<T>, CurveError> {
        let u = self.knots.first() + t * (self.knots.last() - self.knots.first());
        let ders = self.rational_derivatives(u, 1)?;
        let tangent = ders[1];
        if tangent.norm_squared() <= T::default_epsilon() {
            return Err(CurveError::DegenerateGeometry("zero-length tangent"));
        }
        Ok(tangent.normalize())
    }

    /// Compute the Frenet frame at a knot-domain parameter `u`.
    ///
    /// This entry point takes a raw parameter within
    /// [`NurbsCurve::knots_domain`] and bypasses the normalized `[0, 1]`
    /// mapping of the other evaluators. The tangent follows the first
    /// derivative, the binormal the cross product of the first and second
    /// derivatives, and the normal completes the right-handed triple.
    ///
    /// Fails with [`CurveError::DegenerateGeometry`] where the frame is
    /// undefined: at cusps, and wherever the first and second derivatives
    /// are collinear (straight segments, inflection points).
    pub fn frenet_frame_at(&self, u: T) -> Result<FrenetFrame<T>, CurveError> {
        let ders = self.rational_derivatives(u, 2)?;
        let d1 = ders[1];
        let d2 = ders[2];

        if d1.norm_squared() <= T::default_epsilon() {
            return Err(CurveError::DegenerateGeometry("zero-length tangent"));
        }
        let cross = d1.cross(&d2);
        if cross.norm_squared() <= T::default_epsilon() {
            return Err(CurveError::DegenerateGeometry(
                "collinear first and second derivatives",
            ));
        }

        let tangent = d1.normalize();
        let binormal = cross.normalize();
        // unit length already, binormal and tangent are orthonormal
        let normal = binormal.cross(&tangent);

        Ok(FrenetFrame::new(
            Point3::from(ders[0]),
            tangent,
            normal,
            binormal,
        ))
    }

    /// Sample the curve at a given number of evenly spaced parameters over
    /// the normalized `[0, 1]` range.
    pub fn sample_regular(&self, samples: usize) -> Result<Vec<Point3<T>>, CurveError> {
        let div = T::from_usize(samples.saturating_sub(1).max(1)).unwrap();
        (0..samples)
            .map(|i| self.point_at(T::from_usize(i).unwrap() / div))
            .collect()
    }

    /// Evaluate the rational derivatives at a knot-domain parameter, in
    /// increasing order up to `order`.
    ///
    /// Index 0 holds the curve point itself, index `k` the `k`-th derivative
    /// in Euclidean space. The homogeneous derivatives are converted with the
    /// NURBS quotient rule, bottom-up so that every order only depends on the
    /// lower ones already computed.
    pub fn rational_derivatives(&self, u: T, order: usize) -> Result<Vec<Vector3<T>>, CurveError> {
        self.check_domain(u)?;

        let ders = self.derivatives(u, order);
        let a_ders: Vec<Vector3<T>> = ders.iter().map(|d| d.xyz()).collect();
        let w_ders: Vec<T> = ders.iter().map(|d| d.w).collect();
        if w_ders[0].abs() <= T::default_epsilon() {
            return Err(CurveError::DegenerateGeometry(
                "zero weight at evaluation point",
            ));
        }

        let mut ck: Vec<Vector3<T>> = Vec::with_capacity(order + 1);
        let mut binomial = Binomial::<T>::new();
        for k in 0..=order {
            let mut v = a_ders[k];
            for i in 1..=k {
                v -= ck[k - i] * (binomial.get(k, i) * w_ders[i]);
            }
            ck.push(v / w_ders[0]);
        }
        Ok(ck)
    }

    /// Evaluate the curve at a knot-domain parameter to get a homogeneous
    /// point, summing the active control points weighted by the nonzero
    /// basis functions. No projection is performed here.
    pub(crate) fn point(&self, u: T) -> Vector4<T> {
        let n = self.knots.len() - self.degree - 2;
        let knot_span_index = self.knots.find_knot_span_index(n, self.degree, u);
        let basis = self.knots.basis_functions(knot_span_index, u, self.degree);
        let mut position = Vector4::zeros();
        for i in 0..=self.degree {
            position += self.control_points[knot_span_index - self.degree + i] * basis[i];
        }
        position
    }

    /// Evaluate the homogeneous derivatives at a knot-domain parameter.
    /// Derivative orders above the degree stay zero vectors.
    fn derivatives(&self, u: T, order: usize) -> Vec<Vector4<T>> {
        let n = self.knots.len() - self.degree - 2;
        let du = order.min(self.degree);

        let mut derivatives = vec![Vector4::zeros(); order + 1];
        let knot_span_index = self.knots.find_knot_span_index(n, self.degree, u);
        let nders = self
            .knots
            .derivative_basis_functions(knot_span_index, u, self.degree, du);
        for k in 0..=du {
            for j in 0..=self.degree {
                derivatives[k] +=
                    self.control_points[knot_span_index - self.degree + j] * nders[k][j];
            }
        }

        derivatives
    }

    fn check_domain(&self, u: T) -> Result<(), CurveError> {
        let (min, max) = self.knots.domain(self.degree);
        let eps = T::default_epsilon() * (T::one() + min.abs().max(max.abs()));
        if u < min - eps || u > max + eps {
            return Err(CurveError::DomainError {
                parameter: u.to_f64().unwrap_or(f64::NAN),
                min: min.to_f64().unwrap_or(f64::NAN),
                max: max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &[Vector4<T>] {
        &self.control_points
    }

    pub fn start_knot(&self) -> usize {
        self.start_knot
    }

    pub fn end_knot(&self) -> usize {
        self.end_knot
    }

    pub fn weights(&self) -> Vec<T> {
        self.control_points.iter().map(|p| p.w).collect()
    }

    /// Return the control points projected back to Euclidean space.
    pub fn dehomogenized_control_points(&self) -> Vec<Point3<T>> {
        // construction rejects zero weights, so the projection is total
        self.control_points
            .iter()
            .map(|p| Point3::from(p.xyz() / p.w))
            .collect()
    }

    /// Get the valid evaluation domain of the knot vector:
    /// `[knots[degree], knots[len - 1 - degree]]`.
    pub fn knots_domain(&self) -> (T, T) {
        self.knots.domain(self.degree)
    }
}

impl<T: FloatingPoint> ParametricCurve<T> for NurbsCurve<T> {
    fn evaluate(&self, t: T) -> Result<Point3<T>, CurveError> {
        self.point_at(t)
    }

    fn tangent(&self, t: T) -> Result<Vector3<T>, CurveError> {
        self.tangent_at(t)
    }
}

/// Dehomogenize a point: `(wx, wy, wz, w) -> (x, y, z)`.
/// Returns `None` for a zero weight.
pub fn dehomogenize<T: FloatingPoint>(point: &Vector4<T>) -> Option<Point3<T>> {
    let w = point.w;
    if w.abs() <= T::default_epsilon() {
        None
    } else {
        Some(Point3::from(point.xyz() / w))
    }
}
