pub mod application;
pub mod cart_cookie;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::cart_service::CartService;
use application::order_service::OrderService;
use cart_cookie::CartCookieSigner;
use handlers::session::CookieSettings;
use infrastructure::cart_repo::DieselCartRepository;
use infrastructure::order_repo::DieselOrderRepository;

pub use config::Config;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type MigrationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        log::info!("applied migration {}", version);
    }
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::carts::get_cart,
        handlers::carts::add_item,
        handlers::carts::update_item,
        handlers::carts::remove_item,
        handlers::carts::merge_cart,
        handlers::orders::checkout,
        handlers::orders::get_order,
        handlers::orders::list_orders,
    ),
    components(schemas(
        handlers::carts::AddItemRequest,
        handlers::carts::UpdateItemRequest,
        handlers::carts::CartItemResponse,
        handlers::carts::CartResponse,
        handlers::orders::CheckoutRequest,
        handlers::orders::OrderLineResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags(
        (name = "cart", description = "Shopping cart"),
        (name = "checkout", description = "Order placement"),
        (name = "orders", description = "Order history"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `config.host:config.port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: &Config) -> std::io::Result<actix_web::dev::Server> {
    let signer = CartCookieSigner::new(&config.cart_cookie_secret).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("CART_COOKIE_SECRET: {e}"),
        )
    })?;
    let carts = web::Data::new(CartService::new(
        DieselCartRepository::new(pool.clone()),
        signer,
        config.max_cart_quantity,
    ));
    let orders = web::Data::new(OrderService::new(DieselOrderRepository::new(pool)));
    let cookies = web::Data::new(CookieSettings {
        secure: config.secure_cookies(),
    });
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(carts.clone())
            .app_data(orders.clone())
            .app_data(cookies.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/cart")
                    .route("", web::get().to(handlers::carts::get_cart))
                    .route("/items", web::post().to(handlers::carts::add_item))
                    .route("/items/{variant_id}", web::put().to(handlers::carts::update_item))
                    .route(
                        "/items/{variant_id}",
                        web::delete().to(handlers::carts::remove_item),
                    )
                    .route("/merge", web::post().to(handlers::carts::merge_cart)),
            )
            .route("/checkout", web::post().to(handlers::orders::checkout))
            .service(
                web::scope("/orders")
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
