//! Socket protocol of the editor plugin: one connection per command, a JSON
//! object `{"type": name, "params": {...}}` out and one JSON value back.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{Connection, TransportError};

pub const DEFAULT_PORT: u16 = 55557;

pub struct TcpConnection {
    addr: SocketAddr,
    timeout: Duration,
    // The plugin handles one request at a time.
    lock: Mutex<()>,
}

impl TcpConnection {
    /// Resolve `host:port` and check that something is listening.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, TransportError> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            TransportError::Closed(format!("{host}:{port} did not resolve to an address"))
        })?;
        TcpStream::connect_timeout(&addr, timeout)?;
        Ok(Self {
            addr,
            timeout,
            lock: Mutex::new(()),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn open(&self) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&self.addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

impl Connection for TcpConnection {
    fn send_command(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Option<Value>, TransportError> {
        let _guard = self.lock.lock();
        let mut stream = self.open()?;

        let message = json!({ "type": name, "params": params });
        serde_json::to_writer(&mut stream, &message)?;
        stream.flush()?;
        debug!(command = name, addr = %self.addr, "command sent");

        let mut values = serde_json::Deserializer::from_reader(&stream).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(e)) if e.is_eof() => Err(TransportError::Closed(
                "remote closed the socket mid-response".into(),
            )),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}
