use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

mod api;
mod blockchain;

use api::handlers::NodeIdentity;
use blockchain::pow::DEFAULT_DIFFICULTY;

/// Reads the proof-of-work difficulty from the environment, falling back to
/// the default on absent or unparseable values
fn configured_difficulty() -> usize {
    match std::env::var("POW_DIFFICULTY") {
        Ok(raw) => match raw.parse::<usize>() {
            Ok(difficulty) => difficulty,
            Err(_) => {
                warn!(
                    "Invalid POW_DIFFICULTY {:?}, using default {}",
                    raw, DEFAULT_DIFFICULTY
                );
                DEFAULT_DIFFICULTY
            }
        },
        Err(_) => DEFAULT_DIFFICULTY,
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_chain,
        api::handlers::get_last_block,
        api::handlers::get_pending_transactions,
        api::handlers::new_transaction,
        api::handlers::mine_block,
        api::handlers::validate_chain
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            api::handlers::ChainResponse,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger API endpoints")
    ),
    info(
        title = "Ledger API",
        version = "1.0.0",
        description = "A proof-of-work transaction ledger API",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Generate a globally unique identifier for this node
    let node_id = Uuid::new_v4().simple().to_string();
    info!("Node identifier: {}", node_id);

    let difficulty = configured_difficulty();
    info!("Proof-of-work difficulty: {} leading zero(s)", difficulty);

    // Create the ledger, owned here and shared with the handlers by handle
    let ledger = web::Data::new(blockchain::Ledger::with_difficulty(difficulty));
    let node = web::Data::new(NodeIdentity(node_id));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("Starting HTTP server at http://{}", bind_addr);

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Configure OpenAPI documentation
        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(ledger.clone())
            .app_data(node.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
