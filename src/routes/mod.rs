pub mod check;
pub mod health_checks;

pub use check::*;
pub use health_checks::*;
