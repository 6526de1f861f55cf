//! HTTP transport for the decision endpoint

use std::sync::Mutex;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, web};
use serde_json::{Value, json};

use crate::InferenceBackend;
use crate::infra::ServerConfig;
use crate::planners::rl::{DecisionError, RLExecutor};
use crate::state::GameState;

pub type SharedExecutor = web::Data<Mutex<RLExecutor<InferenceBackend>>>;

pub struct Server;

impl Server {
    pub async fn run(
        config: ServerConfig,
        executor: RLExecutor<InferenceBackend>,
    ) -> Result<(), std::io::Error> {
        let executor: SharedExecutor = web::Data::new(Mutex::new(executor));
        tracing::info!("Starting decision server on {}", config.bind);

        HttpServer::new(move || App::new().app_data(executor.clone()).configure(routes))
            .bind(&config.bind)?
            .run()
            .await
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/get_action", web::post().to(get_action))
        .route("/health", web::get().to(health));
}

fn error_response(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    builder.json(json!({ "error": message }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn get_action(executor: SharedExecutor, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"));
    if !is_json {
        return error_response(HttpResponse::BadRequest(), "Request must be JSON");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Malformed request body: {}", e);
            return error_response(HttpResponse::BadRequest(), "Malformed JSON");
        }
    };

    let state: GameState = match serde_json::from_value(payload.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Request is not a game state: {}", e);
            return error_response(HttpResponse::BadRequest(), "Invalid game state");
        }
    };
    if state.available_actions.is_empty() {
        return error_response(HttpResponse::BadRequest(), "No available actions");
    }

    let decision = match executor.lock() {
        Ok(executor) => executor.decide(&state),
        Err(_) => {
            tracing::error!("Executor lock poisoned");
            return error_response(HttpResponse::InternalServerError(), "Model unavailable");
        }
    };

    match decision {
        Ok(decision) => {
            // Echo the client's own action object so unknown fields and
            // resource spellings come back unchanged
            let raw = payload
                .get("availableActions")
                .and_then(Value::as_array)
                .and_then(|actions| actions.get(decision.position))
                .cloned();
            match raw {
                Some(action) => HttpResponse::Ok().json(action),
                None => HttpResponse::Ok().json(&decision.action),
            }
        }
        Err(e) => {
            tracing::error!("Decision failed: {}", e);
            let message = match e {
                DecisionError::Encoding(_) => "Failed to encode game state",
                DecisionError::Inference(_) => "Model inference failed",
                DecisionError::Selection(_) => "No selectable action",
            };
            error_response(HttpResponse::InternalServerError(), message)
        }
    }
}
