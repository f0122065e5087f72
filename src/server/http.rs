//! HTTP transport
use super::api::{Api, Reply};
use super::routes::Method;
use crate::config::ServerConfig;
use crate::error::ApiError;
use std::error::Error;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tiny_http::{Header, Request, Response};
use tracing::{info, warn};

/// Error starting the HTTP server.
#[derive(Debug, Error)]
#[error("failed to listen on {address}: {source}")]
pub struct BindError {
    pub address: String,
    #[source]
    pub source: Box<dyn Error + Send + Sync + 'static>,
}

/// HTTP server answering API requests one at a time.
pub struct Server {
    server: Arc<tiny_http::Server>,
    api: Api,
}

impl Server {
    /// Listen on the configured address with an empty instance table.
    pub fn bind(config: &ServerConfig) -> Result<Self, BindError> {
        Self::with_api(config, Api::new())
    }

    pub fn with_api(config: &ServerConfig, api: Api) -> Result<Self, BindError> {
        let address = config.address();
        let server = tiny_http::Server::http(address.as_str())
            .map_err(|source| BindError { address, source })?;
        Ok(Self {
            server: Arc::new(server),
            api,
        })
    }

    /// The bound socket address, if listening on an IP address.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until the server is unblocked.
    pub fn run(self) {
        let Self { server, mut api } = self;
        match server.server_addr().to_ip() {
            Some(addr) => info!("Server listening at http://{}", addr),
            None => info!("Server listening"),
        }
        for request in server.incoming_requests() {
            respond(&mut api, request);
        }
        info!(
            instances = api.instances().len(),
            "Server stopped, dropping environment instances"
        );
    }

    /// Serve requests on a background thread.
    pub fn spawn(self) -> ServerHandle {
        let server = Arc::clone(&self.server);
        let addr = self.local_addr();
        let thread = thread::spawn(move || self.run());
        ServerHandle {
            addr,
            server,
            thread,
        }
    }
}

/// Handle to a server running on a background thread.
pub struct ServerHandle {
    addr: Option<SocketAddr>,
    server: Arc<tiny_http::Server>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub const fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Base URL of the server, like `http://127.0.0.1:40004`.
    pub fn url(&self) -> Option<String> {
        self.addr.map(|addr| format!("http://{}", addr))
    }

    /// Stop accepting requests and wait for the server thread to exit.
    pub fn shutdown(self) {
        self.server.unblock();
        if self.thread.join().is_err() {
            warn!("server thread panicked");
        }
    }
}

fn json_header() -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).ok()
}

/// Answer a single HTTP request.
fn respond(api: &mut Api, mut request: Request) {
    let method = Method::from(request.method());
    let url = request.url().to_string();
    let mut body = String::new();
    let reply = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => api.handle(method, &url, &body),
        Err(err) => {
            info!(%method, url, error = %err, "failed to read request body");
            Reply::error(&ApiError::InvalidJson)
        }
    };

    let response = match reply.body {
        Some(value) => {
            let response = Response::from_string(value.to_string());
            match json_header() {
                Some(header) => response.with_header(header),
                None => response,
            }
        }
        None => Response::from_string(""),
    }
    .with_status_code(reply.status);

    if let Err(err) = request.respond(response) {
        warn!(%method, url, error = %err, "failed to send response");
    }
}
