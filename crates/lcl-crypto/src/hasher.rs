use lcl_types::{Digest, DIGEST_LEN};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake128;

/// SHAKE128 content addresser with a fixed 128-bit output.
///
/// The primitive and output length are part of the stored data format:
/// category and filter keys, and URL-entry address seeds, are all computed
/// with it. There is deliberately no domain tag.
pub struct ContentAddresser;

impl ContentAddresser {
    /// Digest arbitrary bytes.
    pub fn digest(data: &[u8]) -> Digest {
        let mut hasher = Shake128::default();
        hasher.update(data);
        let mut reader = hasher.finalize_xof();
        let mut out = [0u8; DIGEST_LEN];
        reader.read(&mut out);
        Digest::from_hash(out)
    }

    /// Digest the UTF-8 bytes of a string.
    pub fn digest_str(text: &str) -> Digest {
        Self::digest(text.as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(data: &[u8], expected: &Digest) -> bool {
        Self::digest(data) == *expected
    }
}
