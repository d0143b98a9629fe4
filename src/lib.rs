pub mod configuration;
pub mod liveness;
mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
