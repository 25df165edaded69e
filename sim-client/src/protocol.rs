//! Line-delimited JSON request/response framing shared by the query
//! connection and the tick stream.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::SimError;

/// Resolved simulator address plus the timeout applied to every socket
/// operation on query connections.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub address: String,
    pub addrs: Vec<SocketAddr>,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn resolve(host: &str, port: u16, timeout: Duration) -> Result<Self, SimError> {
        let address = format!("{host}:{port}");
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|_| SimError::Resolve {
                address: address.clone(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(SimError::Resolve { address });
        }
        Ok(Self {
            address,
            addrs,
            timeout,
        })
    }
}

#[derive(Serialize)]
pub(crate) struct NoParams {}

#[derive(Serialize)]
struct Request<'a, P> {
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

pub(crate) struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
    line: String,
}

impl Connection {
    /// Try every resolved address in turn, keeping the last failure.
    pub fn open(endpoint: &Endpoint) -> Result<Self, SimError> {
        let mut last_err = None;
        for addr in &endpoint.addrs {
            match TcpStream::connect_timeout(addr, endpoint.timeout) {
                Ok(stream) => return Self::from_stream(stream, endpoint.timeout),
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(SimError::Connect {
            address: endpoint.address.clone(),
            source: last_err
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address")),
        })
    }

    fn from_stream(stream: TcpStream, timeout: Duration) -> Result<Self, SimError> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            next_id: 1,
            line: String::new(),
        })
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SimError> {
        self.writer.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn try_clone_stream(&self) -> io::Result<TcpStream> {
        self.writer.try_clone()
    }

    /// Send one request and block until its response arrives.
    pub fn call<P, R>(&mut self, method: &str, params: P) -> Result<R, SimError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let mut frame = serde_json::to_vec(&Request { id, method, params })?;
        frame.push(b'\n');
        self.writer
            .write_all(&frame)
            .map_err(|e| SimError::from_io(method, e))?;
        trace!(id, method, "request sent");

        let response: Response = self.read_frame(method)?.ok_or(SimError::Closed)?;
        if response.id != id {
            return Err(SimError::Protocol(format!(
                "expected response {id} to `{method}`, got {}",
                response.id
            )));
        }
        if let Some(message) = response.error {
            return Err(SimError::Server {
                method: method.to_string(),
                message,
            });
        }
        Ok(serde_json::from_value(response.result)?)
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream.
    pub fn read_frame<T: DeserializeOwned>(&mut self, method: &str) -> Result<Option<T>, SimError> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| SimError::from_io(method, e))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(self.line.trim_end())?))
    }
}
