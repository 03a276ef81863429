// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking member cluster API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

pub const CANARIES_PATH: &str = "/apis/flagger.app/v1beta1/canaries";
pub const CRDS_PATH: &str = "/apis/apiextensions.k8s.io/v1/customresourcedefinitions";

#[derive(Clone)]
struct Route {
    method: String,
    path: String,
    query: Option<String>,
    status: u16,
    body: String,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    routes: Arc<Mutex<Vec<Route>>>,
    unreachable: bool,
    delay: Option<Duration>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(Mutex::new(Vec::new())),
            unreachable: false,
            delay: None,
        }
    }

    /// A cluster whose transport fails for every request
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    /// Delay every response, for exercising timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.route("GET", path, None, status, body)
    }

    /// Add a response for GET requests matching the path whose query string
    /// contains `query`. These win over plain path routes.
    pub fn on_get_query(self, path: &str, query: &str, status: u16, body: &str) -> Self {
        self.route("GET", path, Some(query), status, body)
    }

    fn route(self, method: &str, path: &str, query: Option<&str>, status: u16, body: &str) -> Self {
        self.routes.lock().unwrap().push(Route {
            method: method.to_string(),
            path: path.to_string(),
            query: query.map(String::from),
            status,
            body: body.to_string(),
        });
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str, query: &str) -> Option<(u16, String)> {
        let routes = self.routes.lock().unwrap();
        let hit = |r: &Route| (r.status, r.body.clone());

        // Query-specific routes first, then exact path, then prefix
        routes
            .iter()
            .find(|r| {
                r.method == method
                    && r.path == path
                    && r.query.as_deref().is_some_and(|q| query.contains(q))
            })
            .or_else(|| {
                routes
                    .iter()
                    .find(|r| r.method == method && r.path == path && r.query.is_none())
            })
            .or_else(|| {
                routes
                    .iter()
                    .find(|r| r.method == method && r.query.is_none() && path.starts_with(&r.path))
            })
            .map(hit)
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let query = req.uri().query().unwrap_or_default().to_string();

        let response = self.find_response(&method, &path, &query);
        let unreachable = self.unreachable;
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if unreachable {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )
                .into());
            }

            let (status, body) = response.unwrap_or_else(|| {
                (404, not_found_json("path", &path))
            });

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a canary JSON object targeting a Deployment of the same name
pub fn canary_json(name: &str, namespace: &str) -> Value {
    serde_json::json!({
        "apiVersion": "flagger.app/v1beta1",
        "kind": "Canary",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{}", name)
        },
        "spec": {
            "provider": "traefik",
            "targetRef": {
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "name": name
            },
            "service": { "port": 80 }
        },
        "status": {
            "phase": "Succeeded",
            "conditions": [{ "type": "Promoted", "status": "True" }]
        }
    })
}

/// Create a canary list response, with an optional continue token
pub fn canary_list_json(items: &[Value], continue_token: Option<&str>) -> String {
    let mut metadata = serde_json::json!({ "resourceVersion": "1" });
    if let Some(token) = continue_token {
        metadata["continue"] = Value::from(token);
    }

    serde_json::json!({
        "apiVersion": "flagger.app/v1beta1",
        "kind": "CanaryList",
        "metadata": metadata,
        "items": items
    })
    .to_string()
}

/// Create a metadata-only CRD list response
pub fn crd_list_json(names: &[&str]) -> String {
    let items: Vec<Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "apiVersion": "meta.k8s.io/v1",
                "kind": "PartialObjectMetadata",
                "metadata": { "name": name }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "meta.k8s.io/v1",
        "kind": "PartialObjectMetadataList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn deployment_json(name: &str, namespace: &str) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        }
    })
    .to_string()
}

pub fn daemon_set_json(name: &str, namespace: &str) -> String {
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "DaemonSet",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
