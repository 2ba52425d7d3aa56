use actix_web::{web, App, HttpServer};
use clap::Parser;

use whiteboard_server::config::Config;
use whiteboard_server::connection::ws_index;
use whiteboard_server::server::spawn_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Config::parse();
    let srv_tx = spawn_server(&config);
    let bind_address = config.bind_address();
    log::info!(
        "Listening on {}:{} at {} ticks per second",
        bind_address.0,
        bind_address.1,
        config.tick_rate
    );

    HttpServer::new(move || {
        App::new()
            .data(srv_tx.clone())
            .data(config.clone())
            .route("/", web::get().to(ws_index))
            .route("/ws/", web::get().to(ws_index))
    })
    .bind(bind_address)?
    .run()
    .await
}
