//! Scenario 2 (spec §8): an acceptor task listens on a kernel-chosen port; a
//! client connects, sends `ping`, and expects `pong` back, with both sides
//! reaching `Finished` with no error.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::time::Duration;

use fastloop::net::{TcpListener, TcpStream};
use fastloop::{task, RuntimeConfig};

#[test]
fn ping_pong_round_trip() {
    let runtime = fastloop::Runtime::new(RuntimeConfig::new().scheduler_count(2)).unwrap();
    runtime.start();

    let reactor = runtime.reactor().clone();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let listener = TcpListener::bind(addr, reactor.clone()).unwrap();
    let local_addr = listener.local_addr().unwrap();

    let (server_tx, server_rx) = mpsc::channel();
    let server = task::create(async move {
        let (mut stream, _peer) = listener.accept().await.expect("accept failed");
        let mut buf = [0u8; 4];
        let mut read = 0;
        while read < buf.len() {
            read += stream.read(&mut buf[read..]).await.expect("server read failed");
        }
        assert_eq!(&buf, b"ping");
        stream.write(b"pong").await.expect("server write failed");
        server_tx.send(()).unwrap();
    });
    runtime.schedule(&server);

    let (client_tx, client_rx) = mpsc::channel();
    let client_reactor = reactor.clone();
    let client = task::create(async move {
        let mut stream = TcpStream::connect(local_addr, client_reactor)
            .expect("connect setup failed")
            .await
            .expect("connect failed");
        stream.write(b"ping").await.expect("client write failed");
        let mut buf = [0u8; 4];
        let mut read = 0;
        while read < buf.len() {
            read += stream.read(&mut buf[read..]).await.expect("client read failed");
        }
        client_tx.send(buf).unwrap();
    });
    runtime.schedule(&client);

    server_rx.recv_timeout(Duration::from_secs(5)).expect("server did not finish");
    let reply = client_rx.recv_timeout(Duration::from_secs(5)).expect("client did not finish");
    assert_eq!(&reply, b"pong");

    while !server.is_finished() || !client.is_finished() {
        std::thread::sleep(Duration::from_millis(1));
    }

    runtime.stop();
}
