use actix_web::{web, App, HttpServer};
use clap::Parser;

use bridge_server::config::Config;
use bridge_server::connection::ConnectionCounter;
use bridge_server::handlers;
use bridge_server::server::{shutdown_server, spawn_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let srv_tx = spawn_server();
    let srv_data = web::Data::new(srv_tx.clone());
    let counter = web::Data::new(ConnectionCounter::default());

    let http = HttpServer::new(move || {
        App::new()
            .app_data(srv_data.clone())
            .app_data(counter.clone())
            .configure(handlers::root)
    })
    .bind((config.host.as_str(), config.port()))?
    .disable_signals()
    .shutdown_timeout(5)
    .run();
    log::info!("Bridge listening on ws://{}:{}", config.host, config.port());

    let handle = http.handle();
    let mut http_task = actix_web::rt::spawn(http);

    tokio::select! {
        result = &mut http_task => {
            return result.map_err(std::io::Error::other)?;
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    log::info!("Shutting down");
    shutdown_server(&srv_tx).await;
    handle.stop(true).await;
    let _ = http_task.await;
    Ok(())
}
