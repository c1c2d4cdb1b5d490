//! Payload codec.
//!
//! Payloads are stored as standard, padded base64 of their UTF-8 bytes. The
//! encoded form is printable ASCII with no line breaks, so line-oriented
//! readers and catalog services cannot corrupt it.
//!
//! Decoding skips ASCII whitespace first. Older writers used a MIME-style
//! encoder that wrapped output every 76 characters and appended a newline;
//! those payloads still decode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Failure to turn stored bytes back into a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Invalid alphabet, length or padding.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not UTF-8 text.
    #[error("decoded bytes are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode a payload for storage. Never fails.
pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode stored bytes back into the payload.
pub fn decode(encoded: impl AsRef<[u8]>) -> Result<String, DecodeError> {
    let compact: Vec<u8> = encoded
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(""), "");
        assert_eq!(encode("hello\nworld"), "aGVsbG8Kd29ybGQ=");
        assert_eq!(decode("aGVsbG8Kd29ybGQ=").unwrap(), "hello\nworld");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn test_encoded_output_is_line_safe() {
        let encoded = encode(&"line\n".repeat(200));
        assert!(encoded.len() > 76);
        assert!(encoded.bytes().all(|b| b.is_ascii_graphic()));
    }

    #[test]
    fn test_decode_accepts_wrapped_input() {
        let payload = "x".repeat(120);
        let encoded = encode(&payload);
        let wrapped: String = encoded
            .as_bytes()
            .chunks(76)
            .map(|chunk| format!("{}\n", std::str::from_utf8(chunk).unwrap()))
            .collect();
        assert!(wrapped.contains('\n'));
        assert_eq!(decode(&wrapped).unwrap(), payload);
        assert_eq!(decode("aGk=\r\n").unwrap(), "hi");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("this is not base64!"),
            Err(DecodeError::Base64(_))
        ));
        // Bad padding
        assert!(decode("aGk").is_err());
        assert!(decode("aGk==").is_err());
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        // 0xff 0xfe
        assert!(matches!(decode("//4="), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_non_ascii_payload() {
        let payload = "设备标识 ✓ ñ";
        assert_eq!(decode(encode(payload)).unwrap(), payload);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(payload in any::<String>()) {
            let encoded = encode(&payload);
            prop_assert!(!encoded.contains('\n'));
            prop_assert_eq!(decode(&encoded).unwrap(), payload);
        }
    }
}
