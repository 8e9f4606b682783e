//! HTTP intake for TradingView alerts.
//!
//! The alert body is the raw command string. Every surfaced error maps to a
//! 400 with a JSON `{code, message}` body; accepted and skipped commands both
//! answer 200.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::Command;
use crate::error::Error;
use crate::service::{OrderOrchestrator, OrderOutcome};

/// JSON body of every webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: i32,
    pub message: String,
}

impl ApiResponse {
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
        }
    }

    #[must_use]
    pub fn error(error: &Error) -> Self {
        Self {
            code: -1,
            message: error.to_string(),
        }
    }
}

/// Build the webhook router.
pub fn build_router(orchestrator: Arc<OrderOrchestrator>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/v1/tradingview", post(tradingview))
        .with_state(orchestrator)
}

async fn index() -> &'static str {
    "welcome"
}

async fn tradingview(State(orchestrator): State<Arc<OrderOrchestrator>>, body: String) -> Response {
    let command: Command = match body.parse() {
        Ok(command) => command,
        Err(e) => return reject(&Error::Validation(e)),
    };
    info!(
        raw = %body.trim(),
        symbol = %command.symbol,
        side = %command.side,
        amount_usd = command.amount_usd,
        take_profit = command.take_profit,
        stop_loss = command.stop_loss,
        check_whitelist = command.check_whitelist,
        only_one_order = command.only_one_order,
        "Command received"
    );

    match orchestrator.execute(&command).await {
        Ok(OrderOutcome::Executed(_) | OrderOutcome::Skipped { .. }) => {
            (StatusCode::OK, Json(ApiResponse::success())).into_response()
        }
        Err(e) => reject(&e),
    }
}

fn reject(error: &Error) -> Response {
    warn!(error = %error, "Webhook request rejected");
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error))).into_response()
}
