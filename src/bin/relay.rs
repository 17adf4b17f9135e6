use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use clap::Parser;

use chess_assistant::config::RelayArgs;
use chess_assistant::relay::{configure, RelayState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = RelayArgs::parse();
    let http = reqwest::Client::builder().timeout(args.timeout()).build()?;
    let upstream = args.upstream(http);

    log::info!("Backend: {}", upstream.name());
    log::info!("Default search depth: {}", args.depth);
    log::info!("Starting relay on {}:{}", args.host, args.port);

    let state = web::Data::new(RelayState::new(upstream, args.depth, args.timeout()));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((args.host.clone(), args.port))?
    .run()
    .await?;

    Ok(())
}
