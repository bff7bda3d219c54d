//! Length-prefixed frames as spoken by the Cryostation software.
//!
//! Wire format of a request:
//! ```text
//! ┌────────────────────────┬─────────────────────┐
//! │ Length (ASCII decimal) │ Command (ASCII)     │
//! │ 1 digit, or 2 padded   │ (Length bytes)      │
//! └────────────────────────┴─────────────────────┘
//! ```
//! e.g., `"3GPT"`. A response starts with a 2 byte header that is discarded, the rest is the
//! payload, e.g., `"01293.15"` carries the payload `"293.15"`.

use instrumentrs::InstrumentError;

/// Number of header bytes in front of every response payload.
pub const RESPONSE_HEADER_LEN: usize = 2;

/// Maximum number of bytes that are read for one response.
pub const MAX_RESPONSE_SIZE: usize = 1024;

/// Width of the decimal length prefix in front of every request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    /// One decimal digit, commands can be 1 to 9 bytes long.
    #[default]
    OneDigit,
    /// Two zero-padded decimal digits, commands can be 1 to 99 bytes long.
    TwoDigit,
}

impl LengthPrefix {
    /// Number of ASCII digits of the prefix.
    pub fn width(&self) -> usize {
        match self {
            LengthPrefix::OneDigit => 1,
            LengthPrefix::TwoDigit => 2,
        }
    }

    /// Longest command in bytes that this prefix can express.
    pub fn max_len(&self) -> usize {
        match self {
            LengthPrefix::OneDigit => 9,
            LengthPrefix::TwoDigit => 99,
        }
    }
}

/// Configuration of the framing of a [`crate::FramedChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Width of the request length prefix.
    pub prefix: LengthPrefix,
    /// Size of the receive buffer, i.e., the longest response that can be received.
    pub max_response_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            prefix: LengthPrefix::default(),
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }
}

/// Encode a command into a request frame.
///
/// Commands must be non-empty ASCII and fit into the length prefix. Longer commands are rejected
/// with [`InstrumentError::CommandTooLong`], a prefix is never truncated.
///
/// # Arguments
/// * `cmd` - The command, e.g., `"GPT"`.
/// * `prefix` - The width of the length prefix.
pub fn encode_frame(cmd: &str, prefix: LengthPrefix) -> Result<Vec<u8>, InstrumentError> {
    if cmd.is_empty() {
        return Err(InstrumentError::InvalidArgument(
            "An empty command cannot be framed.".into(),
        ));
    }
    if !cmd.is_ascii() {
        return Err(InstrumentError::InvalidArgument(format!(
            "Command '{cmd}' contains non-ASCII characters."
        )));
    }
    if cmd.len() > prefix.max_len() {
        return Err(InstrumentError::CommandTooLong {
            cmd: cmd.to_string(),
            max: prefix.max_len(),
        });
    }
    let frame = format!("{:0width$}{cmd}", cmd.len(), width = prefix.width());
    Ok(frame.into_bytes())
}

/// Decode a received response into its payload.
///
/// An empty response (the remote side closed or sent nothing) decodes to an empty string.
/// Responses that are shorter than the header or are not valid UTF-8 are an
/// [`InstrumentError::FrameInvalid`].
///
/// # Arguments
/// * `data` - All bytes received for one response, header included.
pub fn decode_frame(data: &[u8]) -> Result<String, InstrumentError> {
    if data.is_empty() {
        return Ok(String::new());
    }
    if data.len() < RESPONSE_HEADER_LEN {
        return Err(InstrumentError::FrameInvalid(format!(
            "Response {data:?} is shorter than its {RESPONSE_HEADER_LEN} byte header."
        )));
    }
    let text = std::str::from_utf8(data).map_err(|e| {
        InstrumentError::FrameInvalid(format!("Response {data:?} is not valid UTF-8: {e}"))
    })?;
    let payload = text.get(RESPONSE_HEADER_LEN..).ok_or_else(|| {
        InstrumentError::FrameInvalid(format!("Response header of '{text}' is not ASCII."))
    })?;
    Ok(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("GPT", LengthPrefix::OneDigit, b"3GPT".to_vec())]
    #[case("GS1HP", LengthPrefix::OneDigit, b"5GS1HP".to_vec())]
    #[case("STSP20.00", LengthPrefix::OneDigit, b"9STSP20.00".to_vec())]
    #[case("GPT", LengthPrefix::TwoDigit, b"03GPT".to_vec())]
    #[case("STSP100.00", LengthPrefix::TwoDigit, b"10STSP100.00".to_vec())]
    fn test_encode_frame(#[case] cmd: &str, #[case] prefix: LengthPrefix, #[case] exp: Vec<u8>) {
        assert_eq!(encode_frame(cmd, prefix).unwrap(), exp);
    }

    /// Every command from 1 to 9 bytes gets its length as single digit in front.
    #[rstest]
    fn test_encode_frame_all_single_digit_lengths() {
        for len in 1..=9 {
            let cmd = "X".repeat(len);
            let frame = encode_frame(&cmd, LengthPrefix::OneDigit).unwrap();
            assert_eq!(frame.len(), len + 1);
            assert_eq!(frame[0], b'0' + len as u8);
            assert_eq!(&frame[1..], cmd.as_bytes());
        }
    }

    #[rstest]
    #[case(10, LengthPrefix::OneDigit)]
    #[case(42, LengthPrefix::OneDigit)]
    #[case(100, LengthPrefix::TwoDigit)]
    fn test_encode_frame_too_long(#[case] len: usize, #[case] prefix: LengthPrefix) {
        let cmd = "X".repeat(len);
        match encode_frame(&cmd, prefix) {
            Err(InstrumentError::CommandTooLong { cmd: c, max }) => {
                assert_eq!(c, cmd);
                assert_eq!(max, prefix.max_len());
            }
            other => panic!("Expected CommandTooLong, got {other:?}"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("GPTé")]
    fn test_encode_frame_invalid(#[case] cmd: &str) {
        assert!(matches!(
            encode_frame(cmd, LengthPrefix::OneDigit),
            Err(InstrumentError::InvalidArgument(_))
        ));
    }

    #[rstest]
    #[case(b"01293.15", "293.15")]
    #[case(b"01T", "T")]
    #[case(b"01", "")]
    #[case(b"", "")]
    fn test_decode_frame(#[case] data: &[u8], #[case] exp: &str) {
        assert_eq!(decode_frame(data).unwrap(), exp);
    }

    /// Whatever follows the header is handed back untouched.
    #[rstest]
    fn test_decode_frame_payload_after_header() {
        for payload in ["", "-0.100", "OK", "System not ready, try again later."] {
            let mut data = b"xy".to_vec();
            data.extend_from_slice(payload.as_bytes());
            assert_eq!(decode_frame(&data).unwrap(), payload);
        }
    }

    /// Each command from 1 to 9 bytes is framed as length digit plus command, and the payload
    /// after the 2 byte header of the answer comes back unchanged.
    #[rstest]
    #[case(b"".to_vec())]
    #[case(b"293.15".to_vec())]
    #[case(b"-0.100".to_vec())]
    #[case(b"T".to_vec())]
    #[case("Kühlung läuft".as_bytes().to_vec())]
    #[case(vec![b'9'; MAX_RESPONSE_SIZE - RESPONSE_HEADER_LEN])]
    fn test_frame_exchange(#[case] payload: Vec<u8>) {
        for len in 1..=9 {
            let cmd: String = "GS1HPSTSP".chars().take(len).collect();
            let frame = encode_frame(&cmd, LengthPrefix::OneDigit).unwrap();
            let sent_len = (frame[0] - b'0') as usize;
            assert_eq!(sent_len, len);
            assert_eq!(&frame[1..], cmd.as_bytes());

            let mut response = b"01".to_vec();
            response.extend_from_slice(&payload);
            let decoded = decode_frame(&response).unwrap();
            assert_eq!(decoded.as_bytes(), payload.as_slice());
        }
    }

    #[rstest]
    #[case(b"0")]
    #[case(b"01\xFF\xFE")]
    #[case(b"0\xC3\xA9")]
    fn test_decode_frame_invalid(#[case] data: &[u8]) {
        assert!(matches!(
            decode_frame(data),
            Err(InstrumentError::FrameInvalid(_))
        ));
    }
}
