//! UDP awaitables over the reactor (spec §4.5 "recvfrom/sendto").

use std::io;
use std::net::SocketAddr;
use std::os::unix::io::AsRawFd;
use std::pin::Pin;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use mio::Interest;

use crate::error::{self, Error};
use crate::reactor::{Direction, EventReactor, ReadinessEvent};

pub struct UdpSocket {
    io: mio::net::UdpSocket,
    reactor: Arc<EventReactor>,
}

impl UdpSocket {
    pub fn bind(addr: SocketAddr, reactor: Arc<EventReactor>) -> error::Result<Self> {
        let mut io =
            mio::net::UdpSocket::bind(addr).map_err(|_| Error::from_errno(Error::CallBind))?;
        let fd = io.as_raw_fd();
        reactor
            .register_source(&mut io, fd, Interest::READABLE | Interest::WRITABLE)
            .map_err(|_| Error::from_errno(Error::CallBind))?;
        Ok(UdpSocket { io, reactor })
    }

    pub fn local_addr(&self) -> error::Result<SocketAddr> {
        self.io
            .local_addr()
            .map_err(|_| Error::from_errno(Error::CallGetSockName))
    }

    pub fn recv_from<'a>(&'a self, buf: &'a mut [u8]) -> RecvFrom<'a> {
        RecvFrom {
            socket: self,
            buf,
            event: None,
        }
    }

    pub fn send_to<'a>(&'a self, buf: &'a [u8], target: SocketAddr) -> SendTo<'a> {
        SendTo {
            socket: self,
            buf,
            target,
            event: None,
        }
    }
}

impl Drop for UdpSocket {
    fn drop(&mut self) {
        let fd = self.io.as_raw_fd();
        let _ = self.reactor.deregister_source(&mut self.io, fd);
    }
}

pub struct RecvFrom<'a> {
    socket: &'a UdpSocket,
    buf: &'a mut [u8],
    event: Option<Arc<ReadinessEvent>>,
}

impl<'a> Future for RecvFrom<'a> {
    type Output = error::Result<(usize, SocketAddr)>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        match this.socket.io.recv_from(this.buf) {
            Ok(result) => Poll::Ready(Ok(result)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let ev = Arc::new(ReadinessEvent::new());
                ev.set_waker(cx.waker().clone());
                let fd = this.socket.io.as_raw_fd();
                this.socket
                    .reactor
                    .arm_event(fd, Direction::READ, ev.clone())
                    .expect("RecvFrom: READ direction already armed on this socket");
                this.event = Some(ev);
                Poll::Pending
            }
            Err(_) => Poll::Ready(Err(Error::from_errno(Error::CallRecvfrom))),
        }
    }
}

pub struct SendTo<'a> {
    socket: &'a UdpSocket,
    buf: &'a [u8],
    target: SocketAddr,
    event: Option<Arc<ReadinessEvent>>,
}

impl<'a> Future for SendTo<'a> {
    type Output = error::Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.event = None;
        match this.socket.io.send_to(this.buf, this.target) {
            Ok(n) => Poll::Ready(Ok(n)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                let ev = Arc::new(ReadinessEvent::new());
                ev.set_waker(cx.waker().clone());
                let fd = this.socket.io.as_raw_fd();
                this.socket
                    .reactor
                    .arm_event(fd, Direction::WRITE, ev.clone())
                    .expect("SendTo: WRITE direction already armed on this socket");
                this.event = Some(ev);
                Poll::Pending
            }
            Err(_) => Poll::Ready(Err(Error::from_errno(Error::CallSendto))),
        }
    }
}
