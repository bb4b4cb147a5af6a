//! HTTP front end for the EC2 Query API.

use std::{sync::Arc, time::Instant};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    config::AdapterConfig,
    ec2::{self, render, Params, Reply},
    vdc::{VdcApi, VdcClient},
    Error, Result,
};

const XML_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    config: Arc<AdapterConfig>,
    vdc: Arc<dyn VdcApi>,
}

impl AppState {
    pub fn new(config: AdapterConfig, vdc: Arc<dyn VdcApi>) -> Self {
        Self {
            config: Arc::new(config),
            vdc,
        }
    }

    /// State backed by a [`VdcClient`] built from `config`.
    pub fn connect(config: AdapterConfig) -> Result<Self> {
        let client = VdcClient::new(&config)?;
        info!(base_url = %client.base_url(), "using VDC API");
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(query_handler).post(query_handler))
        .route("/{action}", get(action_handler).post(action_handler))
        .layer(middleware::from_fn(access_log_middleware))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

async fn access_log_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis(),
        "http access"
    );
    response
}

async fn query_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    handle(&state, None, query.as_deref(), &body).await
}

async fn action_handler(
    State(state): State<AppState>,
    Path(action): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    handle(&state, Some(&action), query.as_deref(), &body).await
}

async fn handle(
    state: &AppState,
    fallback: Option<&str>,
    query: Option<&str>,
    body: &[u8],
) -> Response {
    let result: Result<Reply> = async {
        let request = ec2::Request::new(parse_params(query, body)?, fallback);
        ec2::dispatch(state.vdc.as_ref(), &state.config, &request).await
    }
    .await;

    match result {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            error!(code = err.code(), "request failed: {err}");
            err.into_response()
        }
    }
}

/// Merge query-string and form-body parameters; the body wins on duplicates.
pub fn parse_params(query: Option<&str>, body: &[u8]) -> Result<Params> {
    let mut params: Params = serde_urlencoded::from_str::<Vec<(String, String)>>(
        query.unwrap_or_default(),
    )?
    .into_iter()
    .collect();
    params.extend(serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)?);
    Ok(params)
}

fn status_of(err: &Error) -> StatusCode {
    match err {
        Error::Transport { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::Decode { .. } => StatusCode::BAD_GATEWAY,
        Error::MalformedQuery(_) => StatusCode::BAD_REQUEST,
        Error::BaseUrl(_) | Error::PartialBatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Document(body) => {
                (StatusCode::OK, [(CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
            }
            Reply::Unsupported(body) => {
                (StatusCode::OK, [(CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = render::error_response(self.code(), &self.to_string());
        (status_of(&self), [(CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
    }
}
