//! TLS handshake direction toggling (§12 supplemented, grounded on
//! `original_source/galay/kernel/async/SslEvent.*`'s Accept→SslAccept and
//! Ready→Connect→SslConnect state machines), built on `rustls` rather than
//! OpenSSL (feature `tls`).
//!
//! Unlike the plain socket futures in `tcp`/`udp`, a handshake in progress
//! may need to flip between `Direction::READ` and `Direction::WRITE` from
//! one suspend to the next — `rustls` exposes this directly via
//! `wants_read()`/`wants_write()`, which is checked on every poll rather than
//! fixed at construction.

use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::{ClientConfig, ClientConnection, ServerConfig, ServerConnection};

use crate::error::{self, Error};
use crate::reactor::{Direction, ReadinessEvent};

use super::tcp::TcpStream;

pub struct TlsAcceptor {
    config: Arc<ServerConfig>,
}

impl TlsAcceptor {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        TlsAcceptor { config }
    }

    /// Drives the server-side handshake (`SslAcceptEvent` in the original)
    /// to completion, toggling readiness direction as `rustls` requests.
    pub fn accept(&self, stream: TcpStream) -> error::Result<Accept> {
        let conn = ServerConnection::new(self.config.clone())
            .map_err(|_| Error::from_errno(Error::CallSslAccept))?;
        Ok(Accept {
            stream: Some(stream),
            conn: Some(conn),
            event: None,
        })
    }
}

pub struct TlsConnector {
    config: Arc<ClientConfig>,
}

impl TlsConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        TlsConnector { config }
    }

    /// Drives the client-side handshake (`SslConnectEvent`'s
    /// Ready→Connect→SslConnect, collapsed here since the TCP connect has
    /// already completed by the time a `TcpStream` exists).
    pub fn connect(&self, server_name: &str, stream: TcpStream) -> error::Result<Connect> {
        let name = rustls::pki_types::ServerName::try_from(server_name.to_string())
            .map_err(|_| Error::from_errno(Error::CallSslConnect))?;
        let conn = ClientConnection::new(self.config.clone(), name)
            .map_err(|_| Error::from_errno(Error::CallSslConnect))?;
        Ok(Connect {
            stream: Some(stream),
            conn: Some(conn),
            event: None,
        })
    }
}

/// Pumps ciphertext in the direction `conn` currently wants, then lets it
/// process whatever arrived. Returns `Ok(true)` once the handshake is done.
fn pump(
    conn: &mut dyn rustls::ConnectionCommon<rustls::CommonState>,
    stream: &mut TcpStream,
) -> io::Result<bool> {
    let raw = stream.raw_mut();
    if conn.wants_write() {
        while conn.wants_write() {
            conn.write_tls(raw)?;
        }
    }
    if conn.wants_read() {
        conn.read_tls(raw)?;
        conn.process_new_packets()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    }
    Ok(!conn.is_handshaking())
}

fn arm(stream: &TcpStream, direction: Direction, event: &Arc<ReadinessEvent>, cx: &Context<'_>) {
    event.set_waker(cx.waker().clone());
    stream
        .reactor_handle()
        .arm_event(stream.fd(), direction, event.clone())
        .expect("tls handshake: direction already armed on this stream");
}

pub struct Accept {
    stream: Option<TcpStream>,
    conn: Option<ServerConnection>,
    event: Option<Arc<ReadinessEvent>>,
}

impl Future for Accept {
    type Output = error::Result<TlsStream<ServerConnection>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        let stream = this.stream.as_mut().expect("Accept polled after completion");
        let conn = this.conn.as_mut().expect("Accept polled after completion");
        match pump(conn, stream) {
            Ok(true) => Poll::Ready(Ok(TlsStream {
                stream: this.stream.take().unwrap(),
                conn: this.conn.take().unwrap(),
            })),
            Ok(false) | Err(_) if conn.wants_read() || conn.wants_write() => {
                let ev = Arc::new(ReadinessEvent::new());
                let direction = if conn.wants_write() {
                    Direction::WRITE
                } else {
                    Direction::READ
                };
                arm(stream, direction, &ev, cx);
                this.event = Some(ev);
                Poll::Pending
            }
            _ => Poll::Ready(Err(Error::from_errno(Error::CallSslAccept))),
        }
    }
}

pub struct Connect {
    stream: Option<TcpStream>,
    conn: Option<ClientConnection>,
    event: Option<Arc<ReadinessEvent>>,
}

impl Future for Connect {
    type Output = error::Result<TlsStream<ClientConnection>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        let stream = this.stream.as_mut().expect("Connect polled after completion");
        let conn = this.conn.as_mut().expect("Connect polled after completion");
        match pump(conn, stream) {
            Ok(true) => Poll::Ready(Ok(TlsStream {
                stream: this.stream.take().unwrap(),
                conn: this.conn.take().unwrap(),
            })),
            Ok(false) | Err(_) if conn.wants_read() || conn.wants_write() => {
                let ev = Arc::new(ReadinessEvent::new());
                let direction = if conn.wants_write() {
                    Direction::WRITE
                } else {
                    Direction::READ
                };
                arm(stream, direction, &ev, cx);
                this.event = Some(ev);
                Poll::Pending
            }
            _ => Poll::Ready(Err(Error::from_errno(Error::CallSslConnect))),
        }
    }
}

/// An established TLS session over a `TcpStream`. `C` is `ServerConnection`
/// or `ClientConnection`; plaintext reads/writes go through `rustls`'s
/// buffered reader/writer, which internally calls back into the transport.
pub struct TlsStream<C> {
    stream: TcpStream,
    conn: C,
}

impl<C: rustls::ConnectionCommon<rustls::CommonState>> TlsStream<C> {
    pub fn read(&mut self, buf: &mut [u8]) -> error::Result<usize> {
        loop {
            match self.conn.reader().read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let raw = self.stream.raw_mut();
                    self.conn
                        .read_tls(raw)
                        .map_err(|_| Error::from_errno(Error::CallRecv))?;
                    self.conn
                        .process_new_packets()
                        .map_err(|_| Error::from_errno(Error::CallRecv))?;
                }
                Err(_) => return Err(Error::from_errno(Error::CallRecv)),
            }
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> error::Result<usize> {
        let n = self
            .conn
            .writer()
            .write(buf)
            .map_err(|_| Error::from_errno(Error::CallSend))?;
        let raw = self.stream.raw_mut();
        while self.conn.wants_write() {
            self.conn
                .write_tls(raw)
                .map_err(|_| Error::from_errno(Error::CallSend))?;
        }
        Ok(n)
    }
}
