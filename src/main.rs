use anyhow::Context;
use is_it_down::configuration::get_configuration;
use is_it_down::startup::run;
use is_it_down::telemetry::{get_subscriber, init_subscriber, init_tracer, shutdown_tracer};
use std::net::TcpListener;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().context("Failed to read configuration.")?;

    let tracer = if settings.tracing {
        Some(init_tracer(&settings.service_name).context("Failed to set up span exporter.")?)
    } else {
        None
    };

    let subscriber = get_subscriber(
        settings.service_name.clone(),
        settings.log_filter(),
        settings.log_span_events,
        tracer,
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let address = settings.address();
    tracing::info!(
        service = %settings.service_name,
        timeout_secs = settings.checker.timeout_secs,
        tracing = settings.tracing,
        "Start server at {:?}",
        &address
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("failed to bind to {}", address))?;

    let served = run(listener, settings)?.await;
    shutdown_tracer();
    served?;
    Ok(())
}
