use registry_api::{
    config::app_config,
    database,
    modules::{auth, vehicle::repository::PgVehicleRepository},
    server, tracer,
};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use sqlx::PgPool;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

#[tokio::main]
pub async fn main() {
    let cfg = app_config();

    tracer::init("registry_api", cfg.is_development);

    let pool = database::db::connect(&cfg.db_url).await;
    database::db::run_migrations(&pool).await;

    let jwt_public_key = auth::jwt::load_public_key(&cfg.jwt_public_key_path)
        .unwrap_or_else(|err| panic!("[CFG] {err:#}"));

    listen_to_shutdown_signals(!cfg.is_development, pool.clone());

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), cfg.http_port);
    println!("[WEB] soon listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("[WEB] failed to get address {}", addr));

    let repository = Arc::new(PgVehicleRepository::new(pool));
    let server = server::controller::new(repository, jwt_public_key);

    axum::serve(listener, server)
        .await
        .unwrap_or_else(|_| panic!("[WEB] failed to serve app on address {}", addr));
}

/// Listen to shutdown signals `SIGINT` and `SIGTERM`, on a signal gracefully shutdowns down the application
#[allow(clippy::never_loop)]
fn listen_to_shutdown_signals(gracefully_shutdown: bool, pool: PgPool) {
    let mut signals = Signals::new([SIGINT, SIGTERM]).expect("failed to setup signals hook");

    tokio::spawn(async move {
        for sig in signals.forever() {
            if gracefully_shutdown {
                println!("[APP] received signal: {}, shutting down", sig);

                println!("[APP] closing postgres connections");
                pool.close().await;
            }

            std::process::exit(sig)
        }
    });
}
