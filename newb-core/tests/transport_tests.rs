//! Localhost round trips for the stream and datagram transports and the
//! accept side.

use std::net::UdpSocket;
use std::time::Duration;

use newb_core::acceptor::TcpAcceptor;
use newb_core::endpoint::Endpoint;
use newb_core::error::NewbError;
use newb_core::options::NewbOptions;
use newb_core::tcp::TcpTransport;
use newb_core::transport::{dial, Transport};
use newb_core::udp::UdpTransport;

fn init_logs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn tcp_accept_and_round_trip() {
    init_logs();
    let options = NewbOptions::default();
    let mut acceptor =
        TcpAcceptor::bind("127.0.0.1:0".parse().unwrap(), options.clone()).unwrap();
    let addr = acceptor.local_addr().unwrap();

    let mut client = TcpTransport::connect(addr, &options).unwrap();
    let (peer, mut server) = acceptor.accept().unwrap();
    assert_eq!(peer.ip(), addr.ip());

    client.send_buffer().extend_from_slice(b"ping");
    client.write_some().unwrap();
    assert!(client.send_buffer().is_empty());

    server.read_some().unwrap();
    assert_eq!(server.receive_buffer(), b"ping");
    assert_eq!(&server.take_frame()[..], b"ping");
    assert!(server.receive_buffer().is_empty());

    server.send_buffer().extend_from_slice(b"pong");
    server.write_some().unwrap();
    client.read_some().unwrap();
    assert_eq!(&client.take_frame()[..], b"pong");
}

#[test]
fn tcp_read_after_peer_close() {
    init_logs();
    let options = NewbOptions::default();
    let mut acceptor =
        TcpAcceptor::bind("127.0.0.1:0".parse().unwrap(), options.clone()).unwrap();
    let addr = acceptor.local_addr().unwrap();

    let client = TcpTransport::connect(addr, &options).unwrap();
    let (_, mut server) = acceptor.accept().unwrap();
    drop(client);

    let err = server.read_some().unwrap_err();
    assert!(matches!(err, NewbError::PeerClosed));
    assert!(err.is_connection_error());
}

#[test]
fn dial_tcp_endpoint() {
    init_logs();
    let options = NewbOptions::default();
    let mut acceptor =
        TcpAcceptor::bind("127.0.0.1:0".parse().unwrap(), options.clone()).unwrap();
    let addr = acceptor.local_addr().unwrap();

    let endpoint = Endpoint::parse(&format!("tcp://{}", addr)).unwrap();
    let mut client = dial(&endpoint, &options).unwrap();
    let (_, mut server) = acceptor.accept().unwrap();

    client.send_buffer().extend_from_slice(b"dialed");
    client.write_some().unwrap();
    server.read_some().unwrap();
    assert_eq!(&server.take_frame()[..], b"dialed");
}

#[test]
fn udp_pair_exchanges_datagrams() {
    init_logs();
    let options = NewbOptions::default();

    let sock_a = UdpSocket::bind("127.0.0.1:0").unwrap();
    let sock_b = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock_a.connect(sock_b.local_addr().unwrap()).unwrap();
    sock_b.connect(sock_a.local_addr().unwrap()).unwrap();
    sock_a
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    sock_b
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut a = UdpTransport::from_socket(sock_a, &options);
    let mut b = UdpTransport::from_socket(sock_b, &options);

    a.send_buffer().extend_from_slice(b"one datagram");
    a.write_some().unwrap();
    assert!(a.send_buffer().is_empty());

    b.read_some().unwrap();
    assert_eq!(&b.take_frame()[..], b"one datagram");

    // Each write is one frame on the wire; two writes arrive as two reads.
    b.send_buffer().extend_from_slice(b"first");
    b.write_some().unwrap();
    b.send_buffer().extend_from_slice(b"second");
    b.write_some().unwrap();

    a.read_some().unwrap();
    assert_eq!(&a.take_frame()[..], b"first");
    a.read_some().unwrap();
    assert_eq!(&a.take_frame()[..], b"second");
}

#[test]
fn udp_connect_binds_matching_family() {
    init_logs();
    let options = NewbOptions::default();
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    let peer = sock.local_addr().unwrap();

    let transport = UdpTransport::connect(peer, &options).unwrap();
    assert!(transport.local_addr().unwrap().is_ipv4());
}
