use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use storefront_core::application::cart_sweeper::CartSweeper;
use storefront_core::infrastructure::cart_repo::DieselCartRepository;
use storefront_core::{build_server, create_pool, run_migrations, Config};
use tokio_util::sync::CancellationToken;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url, config.db_pool_size)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    run_migrations(&pool).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let shutdown = CancellationToken::new();
    let sweeper = Arc::new(CartSweeper::new(
        DieselCartRepository::new(pool.clone()),
        config.cart_timeout,
        config.cart_sweep_interval,
    ))
    .spawn(shutdown.clone());

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let result = build_server(pool, &config)?.await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        log::error!("cart sweeper did not shut down cleanly: {}", e);
    }
    result
}
