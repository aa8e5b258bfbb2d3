//! TCP/UDP/TLS awaitables (spec §1 "deliberately thin" ambient surface,
//! §4.5 "Specialisations observed").

pub mod tcp;
pub mod udp;

#[cfg(feature = "tls")]
pub mod tls;

pub use tcp::{TcpListener, TcpStream};
pub use udp::UdpSocket;
