#![allow(dead_code)]

use is_it_down::configuration::{get_configuration, Settings};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
}

pub async fn spawn_app_with_configuration(configuration: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let server =
        is_it_down::startup::run(listener, configuration).expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    TestApp { address }
}

pub async fn spawn_app() -> TestApp {
    let mut configuration = get_configuration().expect("Failed to get configuration");
    configuration.checker.timeout_secs = 1;

    spawn_app_with_configuration(configuration).await
}

/// A local url nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    format!("http://127.0.0.1:{}/", port)
}
