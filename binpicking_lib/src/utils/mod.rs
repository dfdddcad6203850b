pub mod kinematics;
pub mod tracing;

pub use self::kinematics::*;
pub use self::tracing::*;
