//! TCP awaitables over the reactor (spec §4.5 "Socket operations").
//!
//! Thin by design (§1: networking is named ambient surface, not core). Each
//! future re-arms its own [`ReadinessEvent`] fresh on every suspend, since
//! this runtime's executor only ever re-polls a task on an actual wake (§4.1
//! "re-enqueued at most once per logical wake") — there is no spurious-poll
//! case to guard a stale armed slot against.

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use mio::Interest;

use crate::error::{self, Error};
use crate::reactor::{Direction, EventReactor, ReadinessEvent};

/// A bound, listening TCP socket.
pub struct TcpListener {
    io: mio::net::TcpListener,
    reactor: Arc<EventReactor>,
}

impl TcpListener {
    pub fn bind(addr: SocketAddr, reactor: Arc<EventReactor>) -> error::Result<Self> {
        let mut io =
            mio::net::TcpListener::bind(addr).map_err(|_| Error::from_errno(Error::CallBind))?;
        let fd = io.as_raw_fd();
        reactor
            .register_source(&mut io, fd, Interest::READABLE)
            .map_err(|_| Error::from_errno(Error::CallListen))?;
        Ok(TcpListener { io, reactor })
    }

    pub fn local_addr(&self) -> error::Result<SocketAddr> {
        self.io
            .local_addr()
            .map_err(|_| Error::from_errno(Error::CallGetSockName))
    }

    /// Suspends until a connection is ready, per §4.5's accept exemplar.
    pub fn accept(&self) -> Accept<'_> {
        Accept {
            listener: self,
            event: None,
        }
    }
}

impl Drop for TcpListener {
    fn drop(&mut self) {
        let fd = self.io.as_raw_fd();
        let _ = self.reactor.deregister_source(&mut self.io, fd);
    }
}

pub struct Accept<'a> {
    listener: &'a TcpListener,
    event: Option<Arc<ReadinessEvent>>,
}

impl<'a> Future for Accept<'a> {
    type Output = error::Result<(TcpStream, SocketAddr)>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        match this.listener.io.accept() {
            Ok((mut io, addr)) => {
                let fd = io.as_raw_fd();
                let reactor = this.listener.reactor.clone();
                if let Err(_) = reactor.register_source(&mut io, fd, Interest::READABLE | Interest::WRITABLE) {
                    return Poll::Ready(Err(Error::from_errno(Error::CallAccept)));
                }
                Poll::Ready(Ok((TcpStream { io, reactor }, addr)))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let ev = Arc::new(ReadinessEvent::new());
                ev.set_waker(cx.waker().clone());
                let fd = this.listener.io.as_raw_fd();
                this.listener
                    .reactor
                    .arm_event(fd, Direction::READ, ev.clone())
                    .expect("Accept: READ direction already armed on this listener");
                this.event = Some(ev);
                Poll::Pending
            }
            Err(_) => Poll::Ready(Err(Error::from_errno(Error::CallAccept))),
        }
    }
}

/// A connected TCP socket, readable and writable through the reactor.
pub struct TcpStream {
    io: mio::net::TcpStream,
    reactor: Arc<EventReactor>,
}

impl TcpStream {
    pub fn connect(addr: SocketAddr, reactor: Arc<EventReactor>) -> error::Result<Connect> {
        let mut io = mio::net::TcpStream::connect(addr)
            .map_err(|_| Error::from_errno(Error::CallConnect))?;
        let fd = io.as_raw_fd();
        reactor
            .register_source(&mut io, fd, Interest::READABLE | Interest::WRITABLE)
            .map_err(|_| Error::from_errno(Error::CallConnect))?;
        Ok(Connect {
            stream: Some(TcpStream { io, reactor }),
            event: None,
        })
    }

    pub fn peer_addr(&self) -> error::Result<SocketAddr> {
        self.io
            .peer_addr()
            .map_err(|_| Error::from_errno(Error::CallGetSockName))
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.io.as_raw_fd()
    }

    /// Exposes the raw transport and reactor handle to `net::tls`'s manual
    /// handshake driver.
    pub(crate) fn raw_mut(&mut self) -> &mut mio::net::TcpStream {
        &mut self.io
    }

    pub(crate) fn reactor_handle(&self) -> &Arc<EventReactor> {
        &self.reactor
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Read<'_> {
        Read {
            io: &mut self.io,
            reactor: &self.reactor,
            buf,
            event: None,
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> WriteFut<'_> {
        WriteFut {
            io: &mut self.io,
            reactor: &self.reactor,
            buf,
            event: None,
        }
    }

    pub fn shutdown(&self) -> error::Result<()> {
        self.io
            .shutdown(std::net::Shutdown::Both)
            .map_err(|_| Error::from_errno(Error::CallShutdown))
    }
}

impl Drop for TcpStream {
    fn drop(&mut self) {
        let fd = self.fd();
        let _ = self.reactor.deregister_source(&mut self.io, fd);
    }
}

pub struct Connect {
    stream: Option<TcpStream>,
    event: Option<Arc<ReadinessEvent>>,
}

impl Future for Connect {
    type Output = error::Result<TcpStream>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        let stream = this.stream.as_ref().expect("Connect polled after completion");
        match stream.io.take_error() {
            Ok(None) => {}
            _ => return Poll::Ready(Err(Error::from_errno(Error::CallConnect))),
        }
        if stream.io.peer_addr().is_ok() {
            return Poll::Ready(Ok(this.stream.take().unwrap()));
        }
        let ev = Arc::new(ReadinessEvent::new());
        ev.set_waker(cx.waker().clone());
        let fd = stream.fd();
        stream
            .reactor
            .arm_event(fd, Direction::WRITE, ev.clone())
            .expect("Connect: WRITE direction already armed on this stream");
        this.event = Some(ev);
        Poll::Pending
    }
}

pub struct Read<'a> {
    io: &'a mut mio::net::TcpStream,
    reactor: &'a Arc<EventReactor>,
    buf: &'a mut [u8],
    event: Option<Arc<ReadinessEvent>>,
}

impl<'a> Future for Read<'a> {
    type Output = error::Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        match this.io.read(this.buf) {
            Ok(n) => Poll::Ready(Ok(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let ev = Arc::new(ReadinessEvent::new());
                ev.set_waker(cx.waker().clone());
                let fd = this.io.as_raw_fd();
                this.reactor
                    .arm_event(fd, Direction::READ, ev.clone())
                    .expect("Read: READ direction already armed on this stream");
                this.event = Some(ev);
                Poll::Pending
            }
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                Poll::Ready(Err(Error::Disconnect(error::errno())))
            }
            Err(_) => Poll::Ready(Err(Error::from_errno(Error::CallRecv))),
        }
    }
}

pub struct WriteFut<'a> {
    io: &'a mut mio::net::TcpStream,
    reactor: &'a Arc<EventReactor>,
    buf: &'a [u8],
    event: Option<Arc<ReadinessEvent>>,
}

impl<'a> Future for WriteFut<'a> {
    type Output = error::Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        match this.io.write(this.buf) {
            Ok(n) => Poll::Ready(Ok(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let ev = Arc::new(ReadinessEvent::new());
                ev.set_waker(cx.waker().clone());
                let fd = this.io.as_raw_fd();
                this.reactor
                    .arm_event(fd, Direction::WRITE, ev.clone())
                    .expect("Write: WRITE direction already armed on this stream");
                this.event = Some(ev);
                Poll::Pending
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                Poll::Ready(Err(Error::Disconnect(error::errno())))
            }
            Err(_) => Poll::Ready(Err(Error::from_errno(Error::CallSend))),
        }
    }
}
