use nalgebra::{Point3, Vector3};

use crate::error::CurveError;
use crate::misc::FloatingPoint;

/// Contract shared by parametric curves over a normalized `[0, 1]` domain.
///
/// Consumers that sample arbitrary curves (tessellators, path planners)
/// depend on this trait instead of a concrete curve type.
pub trait ParametricCurve<T: FloatingPoint> {
    /// Evaluate the curve position at `t` in `[0, 1]`.
    fn evaluate(&self, t: T) -> Result<Point3<T>, CurveError>;

    /// Evaluate the unit tangent at `t` in `[0, 1]`.
    fn tangent(&self, t: T) -> Result<Vector3<T>, CurveError>;
}
