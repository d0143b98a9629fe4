use crate::configuration::Settings;
use crate::liveness::{HttpLivenessChecker, LivenessProbe};
use crate::middleware::RequestLog;
use crate::routes;
use actix_web::{dev::Server, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub fn run(listener: TcpListener, settings: Settings) -> Result<Server, std::io::Error> {
    let checker = HttpLivenessChecker::new(&settings.checker)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let probe: Arc<dyn LivenessProbe> = Arc::new(checker);

    run_with_probe(listener, probe)
}

/// Same server as [`run`], checking urls with the given probe.
pub fn run_with_probe(
    listener: TcpListener,
    probe: Arc<dyn LivenessProbe>,
) -> Result<Server, std::io::Error> {
    let probe = web::Data::new(probe);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLog)
            .wrap(TracingLogger::default())
            .service(web::resource("/health_check").route(web::get().to(routes::health_check)))
            .service(routes::check_query)
            .service(routes::check_body)
            .app_data(probe.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
