//! Liveness and readiness probes.
//!
//! `/live` answers 200 as long as the process serves requests. `/ready`
//! answers 200 once bootstrap has finished attaching, 503 before that.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hyper::body::Body;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Method, Request, Response, StatusCode};
use tc_core::CollectorError;
use tracing::{error, info};

#[derive(Debug, Default)]
pub struct HealthState {
    ready: AtomicBool,
}

impl HealthState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_live(&self) -> bool {
        true
    }
}

/// Status code for a probe request.
pub fn probe_status(health: &HealthState, method: &Method, path: &str) -> StatusCode {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED;
    }
    let ok = match path {
        "/live" => health.is_live(),
        "/ready" => health.is_ready(),
        _ => return StatusCode::NOT_FOUND,
    };
    if ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE }
}

/// Bind `addr` and serve probes in a background task. Returns the bound
/// address (useful with port 0) and the server task.
pub fn spawn_probe_server(
    health: Arc<HealthState>,
    addr: SocketAddr,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), CollectorError> {
    let listener =
        std::net::TcpListener::bind(addr).map_err(|e| CollectorError::Config(format!("probe listen {addr}: {e}")))?;
    listener.set_nonblocking(true).map_err(|e| CollectorError::Config(format!("probe listen {addr}: {e}")))?;
    let local = listener.local_addr().map_err(|e| CollectorError::Config(format!("probe listen {addr}: {e}")))?;
    let server = hyper::Server::from_tcp(listener).map_err(|e| CollectorError::Config(format!("probe server: {e}")))?;

    let make_svc = make_service_fn(move |_| {
        let health = health.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let status = probe_status(&health, req.method(), req.uri().path());
                async move {
                    let mut resp = Response::new(Body::from(status.canonical_reason().unwrap_or_default()));
                    *resp.status_mut() = status;
                    Ok::<_, Infallible>(resp)
                }
            }))
        }
    });

    info!("[probe] listening on {local}");
    let task = tokio::spawn(async move {
        if let Err(err) = server.serve(make_svc).await {
            error!("[probe] server terminated: {err}");
        }
    });
    Ok((local, task))
}
