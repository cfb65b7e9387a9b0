//! HTTP handlers.
//!
//! Successful reads and deploys answer with the bare value as text,
//! approvals and history lookups with JSON. Every failure is a
//! [`GeneralResponse`] envelope.

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::response::{ErrorKind, GeneralResponse};
use crate::api::server::AppState;
use crate::api::validation::{
    address_param, confirmation_timeout_from_headers, privacy_from_headers, AllowanceQuery,
    ApproveBody, DeployBody,
};
use crate::history::Transaction;
use crate::observability::metrics;
use crate::orchestrator::{WalletError, WalletResult};
use crate::token::{ReadField, TransferResult};

/// Response header carrying the transaction hash of a deploy.
pub const TX_ID_HEADER: &str = "x-transaction-id";

/// Node properties exposed at `/config`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub rpc_url: String,
    pub chain_id: u64,
    pub from_address: String,
    pub confirmation_blocks: u32,
    pub confirmation_timeout_secs: u64,
}

pub async fn deploy(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DeployBody>, JsonRejection>,
) -> WalletResult<Response> {
    let Json(body) = payload.map_err(reject_body)?;
    let spec = body.validate().map_err(WalletError::Validation)?;
    let privacy = privacy_from_headers(&headers);
    let timeout = confirmation_timeout(&state, &headers)?;

    // Detached so a dropped request cannot abandon a submitted transaction.
    let orchestrator = state.orchestrator.clone();
    let receipt = tokio::spawn(async move {
        orchestrator.deploy(spec, privacy.as_ref(), timeout).await
    })
    .await??;
    tracing::info!(
        contract = %receipt.contract_address,
        tx_id = %receipt.tx_id,
        "Token deployed"
    );

    Ok((
        [(TX_ID_HEADER, receipt.tx_id.to_string())],
        receipt.contract_address.to_string(),
    )
        .into_response())
}

pub async fn read_field(
    State(state): State<AppState>,
    Path((contract, field)): Path<(String, String)>,
) -> WalletResult<String> {
    let contract = address_param("contractAddress", &contract).map_err(WalletError::Validation)?;
    let field: ReadField = field.parse()?;
    let value = state.orchestrator.read(contract, field).await?;
    Ok(value.to_string())
}

pub async fn allowance(
    State(state): State<AppState>,
    Path(contract): Path<String>,
    Query(query): Query<AllowanceQuery>,
) -> WalletResult<String> {
    let contract = address_param("contractAddress", &contract);
    let parties = query.validate();
    let (contract, (owner, spender)) = match (contract, parties) {
        (Ok(contract), Ok(parties)) => (contract, parties),
        (contract, parties) => {
            let mut errors = contract.err().unwrap_or_default();
            errors.extend(parties.err().unwrap_or_default());
            return Err(WalletError::Validation(errors));
        }
    };

    let value = state.orchestrator.allowance(contract, owner, spender).await?;
    Ok(value.to_string())
}

pub async fn approve(
    State(state): State<AppState>,
    Path(contract): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<ApproveBody>, JsonRejection>,
) -> WalletResult<Json<TransferResult>> {
    let contract = address_param("contractAddress", &contract);
    let request = payload
        .map_err(|rejection| vec![body_error(&rejection)])
        .and_then(|Json(body)| body.validate());
    let (contract, request) = match (contract, request) {
        (Ok(contract), Ok(request)) => (contract, request),
        (contract, request) => {
            let mut errors = contract.err().unwrap_or_default();
            errors.extend(request.err().unwrap_or_default());
            return Err(WalletError::Validation(errors));
        }
    };
    let privacy = privacy_from_headers(&headers);
    let timeout = confirmation_timeout(&state, &headers)?;

    let orchestrator = state.orchestrator.clone();
    let result = tokio::spawn(async move {
        orchestrator
            .approve(contract, request, privacy.as_ref(), timeout)
            .await
    })
    .await??;
    Ok(Json(result))
}

pub async fn history(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> WalletResult<Json<Vec<Transaction>>> {
    let address = address_param("address", &address).map_err(WalletError::Validation)?;
    Ok(Json(state.orchestrator.history(address).await?))
}

pub async fn pending(State(state): State<AppState>) -> WalletResult<Json<Vec<Transaction>>> {
    Ok(Json(state.orchestrator.unresolved().await?))
}

pub async fn node_config(State(state): State<AppState>) -> Json<NodeProperties> {
    let node = &state.node;
    Json(NodeProperties {
        rpc_url: node.rpc_url.clone(),
        chain_id: node.chain_id,
        from_address: node.from_address.clone(),
        confirmation_blocks: node.confirmation_blocks,
        confirmation_timeout_secs: node.confirmation_timeout_secs,
    })
}

pub async fn health(State(state): State<AppState>) -> GeneralResponse {
    if state.orchestrator.ledger_healthy().await {
        GeneralResponse::ok("UP")
    } else {
        GeneralResponse::failure(ErrorKind::Unavailable, "ledger node unreachable")
    }
}

/// Count requests per matched route.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16());
    response
}

fn body_error(rejection: &JsonRejection) -> String {
    format!("body: {}", rejection.body_text())
}

fn reject_body(rejection: JsonRejection) -> WalletError {
    WalletError::Validation(vec![body_error(&rejection)])
}

fn confirmation_timeout(state: &AppState, headers: &HeaderMap) -> WalletResult<Option<Duration>> {
    let Some(secs) = confirmation_timeout_from_headers(headers).map_err(WalletError::Validation)? else {
        return Ok(None);
    };
    if secs > state.max_confirmation_secs {
        return Err(WalletError::Validation(vec![format!(
            "x-confirmation-timeout: must be at most {}s to finish within the request timeout",
            state.max_confirmation_secs
        )]));
    }
    Ok(Some(Duration::from_secs(secs)))
}
