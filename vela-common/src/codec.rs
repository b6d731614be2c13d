//! The encoding of every persisted value: bincode with the standard configuration
//! (varint integers, length-prefixed sequences and strings).

pub use bincode::error::{DecodeError, EncodeError};
pub use bincode::{Decode, Encode};

/// Encodes a value into its persisted form.
pub fn vela_encode<T: Encode>(value: &T) -> Result<Vec<u8>, EncodeError> {
    bincode::encode_to_vec(value, bincode::config::standard())
}

/// Decodes a persisted value. Trailing bytes are rejected.
pub fn vela_decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, DecodeError> {
    let (value, read) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    if read != bytes.len() {
        return Err(DecodeError::OtherString(format!(
            "{} trailing bytes",
            bytes.len() - read
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Encode, Decode)]
    enum Sample {
        Empty,
        Pair { left: u64, right: String },
    }

    #[test]
    fn enum_discriminant_is_leading_byte() {
        let bytes = vela_encode(&Sample::Pair {
            left: 5,
            right: "x".to_string(),
        })
        .unwrap();
        assert_eq!(bytes, vec![1, 5, 1, b'x']);
        assert_eq!(vela_encode(&Sample::Empty).unwrap(), vec![0]);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = vela_encode(&Sample::Empty).unwrap();
        assert_eq!(vela_decode::<Sample>(&bytes).unwrap(), Sample::Empty);
        bytes.push(0);
        assert!(vela_decode::<Sample>(&bytes).is_err());
    }
}
