pub mod nurbs_curve;
pub mod parametric_curve;
pub use nurbs_curve::*;
pub use parametric_curve::*;
