use blake2::digest::{consts::U32, Digest};
use blake2::Blake2b;

pub const HASH_LENGTH: usize = 32;

/// Computes the Blake2b-256 digest of `data`.
pub fn blake2b_256_hash<T: AsRef<[u8]>>(data: T) -> [u8; HASH_LENGTH] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_input_sensitive() {
        assert_eq!(blake2b_256_hash(b"fee_collector"), blake2b_256_hash(b"fee_collector"));
        assert_ne!(blake2b_256_hash(b"vpn"), blake2b_256_hash(b"storage"));
        assert_eq!(
            hex::encode(blake2b_256_hash(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
