//! Tests for the [`FramedChannel`], with a loopback interface and against a local socket.

use std::{
    io::{Read, Write},
    net::TcpListener,
    thread,
};

use rstest::*;

use instrumentrs::{InstrumentError, LoopbackInterfaceBytes};

use montana_cryostation::{FrameConfig, FramedChannel, LengthPrefix};

/// Create a channel with the default framing on top of a loopback interface.
fn crt_channel(host2inst: Vec<&str>, inst2host: Vec<&str>) -> FramedChannel<LoopbackInterfaceBytes> {
    let h2i = host2inst.iter().map(|s| s.as_bytes().to_vec()).collect();
    let i2h = inst2host.iter().map(|s| s.as_bytes().to_vec()).collect();
    let interface = LoopbackInterfaceBytes::new(h2i, i2h);
    FramedChannel::try_new(interface, FrameConfig::default()).unwrap()
}

#[rstest]
fn test_request() {
    let mut channel = crt_channel(vec!["3GPT"], vec!["01293.15"]);
    assert_eq!(channel.request("GPT").unwrap(), "293.15");
}

/// Requests are sent one by one, each waiting for its own response.
#[rstest]
fn test_request_sequence() {
    let mut channel = crt_channel(vec!["3GAS", "3GCP"], vec!["01F", "0112.3"]);
    assert_eq!(channel.request("GAS").unwrap(), "F");
    assert_eq!(channel.request("GCP").unwrap(), "12.3");
}

/// A command that is too long is rejected before anything is sent.
#[rstest]
fn test_request_too_long() {
    let mut channel = crt_channel(vec![], vec![]);
    assert!(matches!(
        channel.request("STSP100.00"),
        Err(InstrumentError::CommandTooLong { max: 9, .. })
    ));
}

#[rstest]
fn test_request_empty_response() {
    let mut channel = crt_channel(vec!["3SWU"], vec![""]);
    assert_eq!(channel.request("SWU").unwrap(), "");
}

#[rstest]
fn test_request_short_response() {
    let mut channel = crt_channel(vec!["3SWU"], vec!["0"]);
    assert!(matches!(
        channel.request("SWU"),
        Err(InstrumentError::FrameInvalid(_))
    ));
}

#[rstest]
fn test_request_invalid_utf8() {
    let interface = LoopbackInterfaceBytes::new(vec![b"3GPT".to_vec()], vec![b"01\xFF".to_vec()]);
    let mut channel = FramedChannel::try_new(interface, FrameConfig::default()).unwrap();
    assert!(matches!(
        channel.request("GPT"),
        Err(InstrumentError::FrameInvalid(_))
    ));
}

/// Only one receive call is made: a response longer than the buffer is truncated.
#[rstest]
fn test_request_single_receive() {
    let interface = LoopbackInterfaceBytes::new(
        vec![b"3GPT".to_vec(), b"3GPT".to_vec()],
        vec![b"01293.15".to_vec()],
    );
    let config = FrameConfig {
        max_response_size: 5,
        ..Default::default()
    };
    let mut channel = FramedChannel::try_new(interface, config).unwrap();
    assert_eq!(channel.request("GPT").unwrap(), "293");
    // the leftover ".15" is taken as the next response, including its "header"
    assert_eq!(channel.request("GPT").unwrap(), "5");
}

/// The channel keeps the configuration it was created with.
#[rstest]
#[case(FrameConfig::default())]
#[case(FrameConfig { prefix: LengthPrefix::TwoDigit, max_response_size: 64 })]
fn test_config(#[case] config: FrameConfig) {
    let interface = LoopbackInterfaceBytes::new(vec![], vec![]);
    let channel = FramedChannel::try_new(interface, config).unwrap();
    assert_eq!(channel.config(), config);
}

#[rstest]
#[case(0)]
#[case(2)]
fn test_buffer_too_small(#[case] max_response_size: usize) {
    let config = FrameConfig {
        prefix: LengthPrefix::OneDigit,
        max_response_size,
    };
    let interface = LoopbackInterfaceBytes::new(vec![], vec![]);
    assert!(matches!(
        FramedChannel::try_new(interface, config),
        Err(InstrumentError::InvalidArgument(_))
    ));
}

/// Closing is idempotent, closes the interface, and prevents further requests.
#[rstest]
fn test_close() {
    let mut channel = crt_channel(vec![], vec![]);
    assert!(!channel.is_closed());
    channel.close().unwrap();
    channel.close().unwrap();
    assert!(channel.is_closed());
    assert!(channel.get_ref().is_closed());
    assert!(matches!(
        channel.request("GPT"),
        Err(InstrumentError::InterfaceClosed)
    ));
}

/// Open a channel to a local server that plays the Cryostation software.
#[rstest]
fn test_open_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"3GPT");
        stream.write_all(b"01293.15").unwrap();
        // wait for the client to hang up
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());
    });

    let mut channel = FramedChannel::open("127.0.0.1", port).unwrap();
    assert_eq!(channel.request("GPT").unwrap(), "293.15");
    drop(channel);
    server.join().unwrap();
}

/// A silent server makes the request fail with a timeout that names the command.
#[rstest]
fn test_open_tcp_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
    });

    let mut channel = FramedChannel::open("127.0.0.1", port).unwrap();
    match channel.request("GPT") {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query, "GPT");
            assert_eq!(timeout, montana_cryostation::DEFAULT_TIMEOUT);
        }
        other => panic!("Expected a timeout, got {other:?}"),
    }
    channel.close().unwrap();
    server.join().unwrap();
}

#[rstest]
fn test_open_tcp_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    assert!(matches!(
        FramedChannel::open("127.0.0.1", port),
        Err(InstrumentError::ConnectionFailed(_))
    ));
}
