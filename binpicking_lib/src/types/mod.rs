pub mod config;
pub mod joint_state;
pub mod marker;
pub mod operation;
pub mod planning;
pub mod pose;
pub mod services;

pub use config::*;
pub use joint_state::*;
pub use marker::*;
pub use operation::*;
pub use planning::*;
pub use pose::*;
pub use services::*;
