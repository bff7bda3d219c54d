//! Tests for the [`Instrument`] interface itself.
//!
//! Note that many of the functionality of the [`InstrumentInterface`] trait is tested in the
//! [`instrumentrs::LoopbackInterfaceString`] tests.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use instrumentrs::{Instrument, InstrumentError, InstrumentInterface};

/// Set up a empty instrument with default 3 second timeout.
#[fixture]
fn empt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::new(), Duration::from_secs(3))
}

/// Set up a instrument with no terminator and no timeout duration.
#[fixture]
fn no_term_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(
        VecDeque::from(vec![b'r', b'e', b's', b'p']),
        Duration::from_secs(0),
    )
}

#[rstest]
fn test_instrument_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_terminator(), "\n");

    empt_inst.set_terminator("\r\n");
    assert_eq!(empt_inst.get_terminator(), "\r\n");
}

#[rstest]
fn test_instrument_timeout(empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_timeout(), Duration::from_secs(3));
}

#[rstest]
fn test_instrument_write_read(mut empt_inst: Instrument<VecDeque<u8>>) {
    let data = b"Hello, Instrument!";
    empt_inst.write_raw(data).unwrap();

    let mut buf = vec![0; data.len()];
    empt_inst.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, data);
}

/// A single receive call hands out what is there, and zero bytes if nothing is there.
#[rstest]
fn test_instrument_read_available(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.write_raw(b"01293.15").unwrap();

    let mut buf = [0u8; 1024];
    let n = empt_inst.read_available(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"01293.15");

    assert_eq!(empt_inst.read_available(&mut buf).unwrap(), 0);
}

#[rstest]
fn test_instrument_query(mut empt_inst: Instrument<VecDeque<u8>>) {
    // The port echos what we write, so the query reads back its own command.
    let resp = empt_inst.query("*IDN?").unwrap();
    assert_eq!(resp, "*IDN?");
}

#[rstest]
fn test_instrument_read_until_terminator_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_term_inst.read_until_terminator() {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_instrument_query_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);
    let query_exp = "QUERY";

    match no_term_inst.query(query_exp) {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query_exp, query);
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

/// Closing releases the port, can be repeated, and makes every further call fail.
#[rstest]
fn test_instrument_close(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert!(empt_inst.is_open());
    empt_inst.close().unwrap();
    assert!(!empt_inst.is_open());
    empt_inst.close().unwrap();

    assert!(matches!(
        empt_inst.write_raw(b"cmd"),
        Err(InstrumentError::InterfaceClosed)
    ));
    let mut buf = [0u8; 4];
    assert!(matches!(
        empt_inst.read_exact(&mut buf),
        Err(InstrumentError::InterfaceClosed)
    ));
    assert!(matches!(
        empt_inst.read_available(&mut buf),
        Err(InstrumentError::InterfaceClosed)
    ));
}

/// Reading more than there is, is an I/O error and not a timeout.
#[rstest]
fn test_instrument_read_exact_eof(mut empt_inst: Instrument<VecDeque<u8>>) {
    let mut buf = [0u8; 4];
    assert!(matches!(
        empt_inst.read_exact(&mut buf),
        Err(InstrumentError::Io(_))
    ));
}
