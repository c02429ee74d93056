use actix::{Actor, System};
use actix_web::{get, web, App, Error, HttpRequest, HttpResponse, HttpServer};
use actix_web_actors::ws;
use battle_core::AbilityCatalog;
use game_server::{
    env::Settings,
    matchmaking::{matchmaker::Matchmaker, session::PlayerSession},
    provider::{HeaderIdentityProvider, LoggingResultSink},
    AppState, LoggerManager,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[get("/ws/")]
async fn battle_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    // 인증은 앞단 게이트웨이가 끝냈다고 보고 전달된 id 를 그대로 믿는다
    let Some(player_id) = state.identity.identify(&req) else {
        warn!("Websocket upgrade refused: no authenticated player id");
        return Ok(HttpResponse::Unauthorized().body("Unauthorized: missing player identity"));
    };

    let session = PlayerSession::new(
        player_id,
        state.matchmaker_addr.clone(),
        state.settings.matchmaking.heartbeat_interval(),
        state.settings.matchmaking.client_timeout(),
    );

    ws::start(session, &req, stream)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 1. 환경변수 로드
    dotenv::dotenv().ok();

    // 2. 설정 파일 로드
    let settings = Settings::new().expect("Failed to load settings");

    // 3. 로거 초기화
    let logger_manager = Arc::new(LoggerManager::setup(&settings));
    info!("Logger initialized");

    // 4. 크리처/어빌리티 카탈로그. 잘못 구성되어 있으면 시작하지 않는다
    let catalog = Arc::new(AbilityCatalog::builtin().expect("Built-in catalog is inconsistent"));
    info!(templates = catalog.templates().len(), "Ability catalog loaded");

    // 5. 전역 Shutdown Token 생성
    let shutdown_token = CancellationToken::new();

    // 6. Metrics 초기화
    let metrics_registry = prometheus::Registry::new();
    metrics::register_custom_metrics(&metrics_registry)
        .expect("Failed to register custom metrics");
    info!("Metrics initialized and registered");

    // 7. Matchmaker 시작
    let matchmaker_addr = Matchmaker::new(
        settings.matchmaking.clone(),
        settings.battle.clone(),
        catalog.clone(),
        Arc::new(LoggingResultSink),
        shutdown_token.clone(),
    )
    .start();
    info!("Matchmaker actor started");

    // 8. AppState 구성
    let app_state = AppState {
        settings: settings.clone(),
        catalog,
        matchmaker_addr,
        identity: Arc::new(HeaderIdentityProvider::new(
            settings.server.identity_header.clone(),
        )),
        logger_manager,
        metrics_registry: metrics_registry.clone(),
    };

    // 9. HTTP 서버 시작
    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        // /metrics 엔드포인트 (optional auth)
        let metrics_route = |req: HttpRequest, state: web::Data<AppState>| async move {
            if let Some(expected_token) = &state.settings.server.metrics_auth_token {
                let provided_token = req
                    .headers()
                    .get("Authorization")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "));

                if provided_token != Some(expected_token.as_str()) {
                    return HttpResponse::Unauthorized()
                        .body("Unauthorized: Invalid or missing token");
                }
            }

            let metric_families = state.metrics_registry.gather();
            let mut buffer = Vec::new();
            let encoder = TextEncoder::new();

            if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                return HttpResponse::InternalServerError()
                    .body(format!("Metrics encode error: {}", e));
            }

            HttpResponse::Ok()
                .content_type(encoder.format_type())
                .body(buffer)
        };

        // Healthcheck endpoints
        let health_route = || async { HttpResponse::Ok().body("OK") };
        let ready_route = || async { HttpResponse::Ok().body("READY") };

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(battle_ws_route)
            .route("/metrics", web::get().to(metrics_route))
            .route("/health", web::get().to(health_route))
            .route("/ready", web::get().to(ready_route))
    })
    .bind(&bind_address)?
    .run();

    info!("Game Server is running on {}", bind_address);

    // 10. 종료 신호 대기
    tokio::select! {
        res = &mut server => {
            error!("Server exited unexpectedly");
            return res;
        },

        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received. Initiating graceful shutdown...");
            shutdown_token.cancel();
            System::current().stop();
        },
    }

    info!("Waiting for all actors to shutdown...");
    server.await?;
    info!("System has shut down gracefully");

    Ok(())
}
