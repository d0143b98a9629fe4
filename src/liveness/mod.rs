mod checker;
mod models;

pub use checker::{validate, CheckerError, HttpLivenessChecker, LivenessProbe};
pub use models::{CheckInput, CheckParams, CheckResult};
