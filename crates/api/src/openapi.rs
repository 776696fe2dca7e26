// OpenAPI document generation
//
// Served by the API server through Swagger UI.

use crate::api;
use pulse_core::{LogEvent, LogLevel};
use utoipa::OpenApi;

/// OpenAPI documentation for the Pulse API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::logs::create_log,
        api::logs::list_logs,
    ),
    components(
        schemas(
            LogEvent, LogLevel,
            api::logs::CreateLogRequest,
            api::health::HealthResponse,
            api::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness endpoint"),
        (name = "logs", description = "Log event ingestion and query endpoints")
    ),
    info(
        title = "Pulse API",
        version = "0.1.0",
        description = "API for ingesting and querying structured log events",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
