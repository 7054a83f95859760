use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use spark_parking::config::Settings;
use spark_parking::core::{load_model, Recommender};
use spark_parking::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use spark_parking::services::{
    Catalog, CsvDirectorySource, HttpRoutingBackend, OsrmClient, RoutingClientConfig,
    RoutingService,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn build_routing(settings: &Settings) -> std::io::Result<RoutingService> {
    let client_config = |base_url: &str| {
        RoutingClientConfig::new(base_url)
            .with_timeout(settings.routing.timeout())
            .with_user_agent(settings.routing.user_agent.clone())
    };

    let osrm = OsrmClient::new(client_config(&settings.routing.osrm_base_url))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let mut routing = RoutingService::new(Arc::new(osrm));

    if let Some(url) = settings.routing.alternate_url.as_deref() {
        match HttpRoutingBackend::new(client_config(url)) {
            Ok(backend) => {
                info!("Alternate router enabled at {}", url);
                routing = routing.with_alternate(Arc::new(backend));
            }
            Err(e) => warn!("Alternate router disabled: {}", e),
        }
    }

    Ok(routing)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = Settings::load();
    let settings = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&settings);

    if let Err(e) = loaded {
        error!("Failed to load configuration: {}", e);
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e));
    }

    info!("Starting Spark parking service...");

    // Catalog snapshot; an unreadable workbook leaves it empty
    let catalog = Arc::new(Catalog::load(&CsvDirectorySource::new(&settings.data.sheets_dir)));
    if catalog.is_empty() {
        warn!("No parking data loaded from {}", settings.data.sheets_dir);
    }

    let model = match load_model(&settings.model.path) {
        Ok(model) => {
            info!("Model loaded from {} ({})", settings.model.path, model.describe());
            Some(model)
        }
        Err(e) => {
            error!("Model load failed from {}: {}", settings.model.path, e);
            None
        }
    };

    let routing = build_routing(&settings)?;
    info!("Routing initialized with OSRM at {}", settings.routing.osrm_base_url);

    let app_state = AppState {
        recommender: Recommender::new(catalog, model),
        routing,
        default_top_k: settings.recommend.default_top_k,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
