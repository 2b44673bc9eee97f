//! HTTP server and access gate
//!
//! Wires the proxy core behind a hyper server. The access gate runs
//! strictly upstream of the core: it enforces GET-only, the hostname
//! allow-list and the Referer prefix list from configuration, and rejects
//! everything else with a bare 403 before any cache or backend work.

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::proxy::{EdgeProxy, ProxyBody, ProxyResponse};
use bytes::Bytes;
use futures::TryStreamExt;
use http::{header, Method, Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

type OutBody = UnsyncBoxBody<Bytes, io::Error>;

/// Upstream request filter, external to the caching core
pub struct AccessGate {
    config: Arc<ProxyConfig>,
}

impl AccessGate {
    /// Create a gate from the shared configuration
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        AccessGate { config }
    }

    /// Decide whether a request may reach the caching core
    ///
    /// # Rules
    /// - method must be GET
    /// - host must be on the allow-list (when one is configured)
    /// - referer must start with a configured prefix (when any are)
    pub fn permit(&self, method: &Method, host: Option<&str>, referer: Option<&str>) -> bool {
        if method != Method::GET {
            debug!("gate: rejecting non-GET method {}", method);
            return false;
        }

        if !self.config.allowed_hosts.is_empty() {
            let allowed = host
                .map(|h| self.config.allowed_hosts.iter().any(|a| a == h))
                .unwrap_or(false);
            if !allowed {
                debug!("gate: rejecting host {:?}", host);
                return false;
            }
        }

        if !self.config.referer_prefixes.is_empty() {
            let referer = referer.unwrap_or("");
            if !self
                .config
                .referer_prefixes
                .iter()
                .any(|p| referer.starts_with(p.as_str()))
            {
                debug!("gate: rejecting referer {:?}", referer);
                return false;
            }
        }

        true
    }
}

/// Run the HTTP server until the listener fails
pub async fn run(proxy: Arc<EdgeProxy>, config: Arc<ProxyConfig>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.listen_address).await?;
    info!("listening on {}", config.listen_address);

    let gate = Arc::new(AccessGate::new(Arc::clone(&config)));

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let proxy = Arc::clone(&proxy);
        let gate = Arc::clone(&gate);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let proxy = Arc::clone(&proxy);
                let gate = Arc::clone(&gate);
                async move { handle(proxy, gate, req).await }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("connection from {} ended: {}", peer, e);
            }
        });
    }
}

/// Serve one request: gate first, then the caching core
async fn handle(
    proxy: Arc<EdgeProxy>,
    gate: Arc<AccessGate>,
    req: Request<Incoming>,
) -> std::result::Result<Response<OutBody>, Infallible> {
    let host = req
        .uri()
        .host()
        .map(str::to_owned)
        .or_else(|| header_str(&req, header::HOST));
    let referer = header_str(&req, header::REFERER);

    if !gate.permit(req.method(), host.as_deref(), referer.as_deref()) {
        return Ok(empty_status(StatusCode::FORBIDDEN));
    }

    let path = req.uri().path().to_string();
    match proxy.handle_get(&path, req.headers()).await {
        Ok(response) => Ok(into_http(response)),
        Err(e) => {
            error!("request for {} failed: {}", path, e);
            Ok(error_response(&e))
        }
    }
}

fn header_str(req: &Request<Incoming>, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn into_http(response: ProxyResponse) -> Response<OutBody> {
    let body = match response.body {
        ProxyBody::Full(bytes) => Full::new(bytes)
            .map_err(|never: Infallible| match never {})
            .boxed_unsync(),
        ProxyBody::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
    };

    let mut out = Response::new(body);
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    out
}

fn empty_status(status: StatusCode) -> Response<OutBody> {
    let mut out = Response::new(
        Empty::new()
            .map_err(|never: Infallible| match never {})
            .boxed_unsync(),
    );
    *out.status_mut() = status;
    out
}

fn error_response(error: &ProxyError) -> Response<OutBody> {
    let status = StatusCode::from_u16(error.to_http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    empty_status(status)
}
