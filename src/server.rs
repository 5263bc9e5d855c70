use crate::{
    config::ProxyConfig,
    error::ProxyError,
    models::ErrorResponse,
    proxy::{HandlerOutcome, InboundRequest, ProxyHandler},
};
use actix_web::{
    http::{header, StatusCode},
    middleware::{DefaultHeaders, Logger},
    web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use serde_json::json;

pub const GENERATE_IMAGE_PATH: &str = "/api/generate-image";
pub const HEALTH_PATH: &str = "/health";

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        // Upstream statuses are passed through; anything unrepresentable becomes 502.
        StatusCode::from_u16(self.http_status())
            .ok()
            .filter(|status| !status.is_informational())
            .unwrap_or(StatusCode::BAD_GATEWAY)
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(ResponseError::status_code(self));
        if let ProxyError::MethodNotAllowed(_) = self {
            response.insert_header((header::ALLOW, "POST"));
        }
        response.json(ErrorResponse::new(self.client_message()))
    }
}

/// Every response carries `Access-Control-Allow-Origin: *`.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
}

/// Registers the proxy routes on an app or scope.
pub fn configure(handler: web::Data<ProxyHandler>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(handler)
            .route(HEALTH_PATH, web::get().to(health))
            .service(web::resource(GENERATE_IMAGE_PATH).route(web::route().to(generate_image)));
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn generate_image(
    handler: web::Data<ProxyHandler>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ProxyError> {
    let request = InboundRequest::new(req.method().clone(), payload)
        .with_content_length(content_length(&req));

    match handler.handle(request).await? {
        HandlerOutcome::Preflight => Ok(HttpResponse::Ok()
            .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
            .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
            .finish()),
        HandlerOutcome::Image(image) => Ok(HttpResponse::Ok().json(image)),
    }
}

fn content_length(req: &HttpRequest) -> Option<u64> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

pub async fn run(config: ProxyConfig) -> std::io::Result<()> {
    let bind = (config.host.clone(), config.port);
    let handler = ProxyHandler::from_config(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let handler = web::Data::new(handler);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
            .configure(configure(handler.clone()))
    })
    .bind(bind)?
    .run()
    .await
}
