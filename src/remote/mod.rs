//! The remote command endpoint: the connection seam and its transports.
//!
//! The pipeline never opens or closes connections. Callers own a
//! [`ConnectionProvider`] (usually a [`ConnectionSlot`]) and the invoker looks
//! the handle up once per command.

pub mod http;
pub mod tcp;

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::settings::{ConnectionSettings, Transport};

pub use http::HttpConnection;
pub use tcp::TcpConnection;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON from remote: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("connection closed: {0}")]
    Closed(String),
}

/// A live handle to the remote endpoint.
pub trait Connection: Send + Sync {
    /// Send one command and wait for its reply. `Ok(None)` means the remote
    /// side answered with nothing.
    fn send_command(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Option<Value>, TransportError>;
}

/// Read-only lookup of the current connection.
pub trait ConnectionProvider {
    fn get_connection(&self) -> Option<Arc<dyn Connection>>;
}

impl<F> ConnectionProvider for F
where
    F: Fn() -> Option<Arc<dyn Connection>>,
{
    fn get_connection(&self) -> Option<Arc<dyn Connection>> {
        self()
    }
}

/// Caller-owned holder for the current connection.
#[derive(Default)]
pub struct ConnectionSlot {
    inner: Mutex<Option<Arc<dyn Connection>>>,
}

impl ConnectionSlot {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            inner: Mutex::new(Some(connection)),
        }
    }

    pub fn set(&self, connection: Arc<dyn Connection>) {
        *self.inner.lock() = Some(connection);
    }

    pub fn clear(&self) -> Option<Arc<dyn Connection>> {
        self.inner.lock().take()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().is_some()
    }
}

impl ConnectionProvider for ConnectionSlot {
    fn get_connection(&self) -> Option<Arc<dyn Connection>> {
        self.inner.lock().clone()
    }
}

/// Open the transport selected in settings.
pub fn connect(settings: &ConnectionSettings) -> Result<Arc<dyn Connection>, TransportError> {
    match settings.transport {
        Transport::Tcp => {
            info!(host = %settings.host, port = settings.port, "connecting to editor plugin");
            let conn = TcpConnection::connect(&settings.host, settings.port, settings.timeout())?;
            Ok(Arc::new(conn))
        }
        Transport::Http => {
            let base_url = settings.base_url();
            info!(%base_url, "using HTTP bridge endpoint");
            let conn = HttpConnection::new(&base_url, settings.timeout())?;
            Ok(Arc::new(conn))
        }
    }
}
