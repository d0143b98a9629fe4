use anyhow::Context as _;
use opentelemetry::trace::TraceError;
use opentelemetry::KeyValue;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{self as sdktrace, Tracer};
use opentelemetry_sdk::Resource;
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::set_global_default;
use tracing::{Event, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Wraps the bunyan layer so span START/END records are optional while
/// events still see every span, and with it the fields kept by `JsonStorageLayer`.
pub struct SpanEvents<L> {
    inner: L,
    enabled: bool,
}

impl<L> SpanEvents<L> {
    pub fn new(inner: L, enabled: bool) -> Self {
        Self { inner, enabled }
    }
}

impl<S, L> Layer<S> for SpanEvents<L>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    L: Layer<S>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if self.enabled {
            self.inner.on_new_span(attrs, id, ctx);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        self.inner.on_record(id, values, ctx);
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.inner.on_event(event, ctx);
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        self.inner.on_enter(id, ctx);
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        self.inner.on_exit(id, ctx);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if self.enabled {
            self.inner.on_close(id, ctx);
        }
    }
}

/// Builds the JSON subscriber used by the server.
///
/// `env_filter` is only a fallback, `RUST_LOG` wins when set. Spans are
/// exported through `tracer` when one is given.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    span_events: bool,
    tracer: Option<Tracer>,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = SpanEvents::new(BunyanFormattingLayer::new(name, sink), span_events);
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    Registry::default()
        .with(env_filter)
        .with(otel_layer)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// OTLP/gRPC span exporter with a batch processor.
///
/// Endpoint, headers and timeout come from the `OTEL_EXPORTER_OTLP_*` variables.
pub fn init_tracer(service_name: &str) -> Result<Tracer, TraceError> {
    // W3C `traceparent`, both for inbound requests and the outbound check
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic())
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .install_batch(opentelemetry_sdk::runtime::TokioCurrentThread)
}

/// Flushes spans still queued in the batch processor.
pub fn shutdown_tracer() {
    opentelemetry::global::shutdown_tracer_provider();
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    // redirect `log` records (reqwest, hyper) to the tracing subscriber
    LogTracer::init().context("Failed to set logger.")?;
    set_global_default(subscriber).context("Failed to set subscriber.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn records(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn log_inside_span(span_events: bool) -> Vec<serde_json::Value> {
        let buffer = Buffer::default();
        let subscriber = get_subscriber(
            "is-it-down".into(),
            "info".into(),
            span_events,
            None,
            buffer.clone(),
        );

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("handle", url = "https://ctx.example");
            let _entered = span.enter();
            tracing::info!("Target unreachable");
        });

        buffer.records()
    }

    #[test]
    fn events_carry_span_fields_without_span_records() {
        let records = log_inside_span(false);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["msg"], "Target unreachable");
        assert_eq!(records[0]["url"], "https://ctx.example");
        assert_eq!(records[0]["name"], "is-it-down");
    }

    #[test]
    fn span_records_are_written_when_enabled() {
        let records = log_inside_span(true);

        assert_eq!(records.len(), 3);
        assert!(records[0]["msg"].as_str().unwrap().contains("START"));
        assert_eq!(records[1]["url"], "https://ctx.example");
        assert!(records[2]["msg"].as_str().unwrap().contains("END"));
    }
}
