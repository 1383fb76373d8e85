pub mod binomial;
pub mod floating_point;
pub mod frenet_frame;

pub use binomial::*;
pub use floating_point::*;
pub use frenet_frame::*;
