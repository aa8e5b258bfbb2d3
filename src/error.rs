//! Error taxonomy surfaced to `resume()` on awaitables (§6, §7).
//!
//! Class-1 transient I/O (EAGAIN/EWOULDBLOCK/EINTR) is handled inline by the
//! reactor and never constructs an [`Error`]. Class-5 framework/programming
//! errors (double-arm, enqueue on a stopped scheduler, ...) panic instead of
//! returning a value here — see the call sites in `scheduler` and `reactor`.

/// One entry per error kind named in spec §6, each coupled with the OS errno
/// observed at the moment of failure (`None` when the failure has no errno,
/// e.g. a timeout).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("peer disconnected (errno={0:?})")]
    Disconnect(Option<i32>),
    #[error("socket() failed (errno={0:?})")]
    CallSocket(Option<i32>),
    #[error("bind() failed (errno={0:?})")]
    CallBind(Option<i32>),
    #[error("listen() failed (errno={0:?})")]
    CallListen(Option<i32>),
    #[error("accept() failed (errno={0:?})")]
    CallAccept(Option<i32>),
    #[error("connect() failed (errno={0:?})")]
    CallConnect(Option<i32>),
    #[error("recv() failed (errno={0:?})")]
    CallRecv(Option<i32>),
    #[error("recvfrom() failed (errno={0:?})")]
    CallRecvfrom(Option<i32>),
    #[error("send() failed (errno={0:?})")]
    CallSend(Option<i32>),
    #[error("sendto() failed (errno={0:?})")]
    CallSendto(Option<i32>),
    #[error("shutdown() failed (errno={0:?})")]
    CallShutdown(Option<i32>),
    #[error("close() failed (errno={0:?})")]
    CallClose(Option<i32>),
    #[error("TLS handshake failed (errno={0:?})")]
    CallSslHandshake(Option<i32>),
    #[error("TLS accept failed (errno={0:?})")]
    CallSslAccept(Option<i32>),
    #[error("TLS connect failed (errno={0:?})")]
    CallSslConnect(Option<i32>),
    #[error("TLS shutdown failed (errno={0:?})")]
    CallSslShutdown(Option<i32>),
    #[error("TLS close failed (errno={0:?})")]
    CallSslClose(Option<i32>),
    #[error("file read failed (errno={0:?})")]
    CallFileRead(Option<i32>),
    #[error("file write failed (errno={0:?})")]
    CallFileWrite(Option<i32>),
    #[error("lseek() failed (errno={0:?})")]
    CallLSeek(Option<i32>),
    #[error("remove() failed (errno={0:?})")]
    CallRemove(Option<i32>),
    #[error("arming an event on the reactor failed (errno={0:?})")]
    CallActiveEvent(Option<i32>),
    #[error("removing an event from the reactor failed (errno={0:?})")]
    CallRemoveEvent(Option<i32>),
    #[error("getsockname()/getpeername() failed (errno={0:?})")]
    CallGetSockName(Option<i32>),
    #[error("setsockopt() failed (errno={0:?})")]
    CallSetSockOpt(Option<i32>),
    #[error("setting socket (non)blocking mode failed (errno={0:?})")]
    CallSetBlocking(Option<i32>),
    #[error("open() failed (errno={0:?})")]
    CallOpen(Option<i32>),
    #[error("reading from an empty file read buffer")]
    FileReadEmpty,
    #[error("writing an empty file write buffer")]
    FileWriteEmpty,
    #[error("the runtime handle used has not been initialized")]
    NotInitialized,
    #[error("the operation timed out before completion")]
    AsyncTimeout,
    #[error("notify() called but the source was not ready")]
    NotifyButSourceNotReady,
    #[error("a concurrent operation conflicted with this one")]
    Concurrent,
    #[error("unspecified error (errno={0:?})")]
    Unspecified(Option<i32>),
}

impl Error {
    /// Captures `errno` at the call site and wraps it into the given variant
    /// constructor, e.g. `Error::from_errno(Error::CallConnect)`.
    pub fn from_errno(ctor: impl FnOnce(Option<i32>) -> Error) -> Error {
        let errno = std::io::Error::last_os_error().raw_os_error();
        ctor(errno)
    }

    /// `true` for the class-1 transient conditions that the reactor must
    /// swallow and retry rather than surface (§7 class 1).
    pub fn is_transient(io_err: &std::io::Error) -> bool {
        matches!(
            io_err.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::Interrupted
        )
    }
}

/// A plain errno wrapper used where a variant constructor is easier to pass
/// around than a closure.
pub fn errno() -> Option<i32> {
    std::io::Error::last_os_error().raw_os_error()
}

pub type Result<T> = std::result::Result<T, Error>;
