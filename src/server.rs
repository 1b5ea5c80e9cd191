use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use crate::accounts::{self, AccountError, SeedOutcome};
use crate::backend::RowStore;
use crate::dates;

pub const SEED_ADMIN_PATH: &str = "/api/seed-admin";

/// Shared state for request handlers.
pub struct SeedContext {
    pub store: Arc<dyn RowStore + Send + Sync>,
    pub admin_password: Option<String>,
}

pub async fn serve(addr: SocketAddr, context: Arc<SeedContext>) -> Result<(), hyper::Error> {
    let make_service = make_service_fn(move |_conn| {
        let context = context.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, context.clone())))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_service);
    info!("listening on http://{}", server.local_addr());

    server
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {err}");
            }
            info!("shutting down");
        })
        .await
}

pub async fn handle_request(
    req: Request<Body>,
    context: Arc<SeedContext>,
) -> Result<Response<Body>, Infallible> {
    info!(method = %req.method(), path = req.uri().path(), "request");
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, SEED_ADMIN_PATH) => seed_admin(context).await,
        _ => json_response(StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
    };
    Ok(response)
}

async fn seed_admin(context: Arc<SeedContext>) -> Response<Body> {
    let outcome = tokio::task::spawn_blocking(move || {
        accounts::seed_admin(
            context.store.as_ref(),
            context.admin_password.as_deref(),
            dates::today(),
        )
    })
    .await;

    match outcome {
        Ok(Ok(outcome)) => seeded(outcome),
        Ok(Err(err)) => failed(&err),
        Err(join_err) => {
            error!("seed task failed: {join_err}");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to seed admin user" }),
            )
        }
    }
}

fn seeded(outcome: SeedOutcome) -> Response<Body> {
    info!("{}", outcome.message());
    json_response(StatusCode::OK, json!({ "message": outcome.message() }))
}

fn failed(err: &AccountError) -> Response<Body> {
    error!("seed admin failed: {err}");
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": err.to_string() }),
    )
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn context(password: Option<&str>) -> Arc<SeedContext> {
        Arc::new(SeedContext {
            store: Arc::new(MemoryStore::new()),
            admin_password: password.map(str::to_string),
        })
    }

    async fn call(context: Arc<SeedContext>, method: Method, path: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = handle_request(req, context).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn seeds_once_then_reports_existing() {
        let context = context(Some("pw"));
        let (status, body) = call(context.clone(), Method::GET, SEED_ADMIN_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Admin user created successfully");

        let (status, body) = call(context, Method::GET, SEED_ADMIN_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Admin user already exists");
    }

    #[tokio::test]
    async fn missing_password_is_a_server_error() {
        let (status, body) = call(context(None), Method::GET, SEED_ADMIN_PATH).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("admin password"));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let (status, _) = call(context(Some("pw")), Method::GET, "/api/other").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(context(Some("pw")), Method::POST, SEED_ADMIN_PATH).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
