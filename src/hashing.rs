/// Signature of the hash functions used to derive pseudonyms.
///
/// Takes the raw input bytes and returns the digest as a lowercase hex string.
pub type HashFn = fn(&[u8]) -> String;

/// Default [`HashFn`], based on BLAKE3.
pub fn blake3_hash_fn(input: &[u8]) -> String {
    blake3::hash(input).to_hex().to_string()
}

/// Hashes `value` followed by `salt`.
pub(crate) fn salted_hash(hash_fn: HashFn, value: &str, salt: &[u8]) -> String {
    let mut input = Vec::with_capacity(value.len() + salt.len());
    input.extend_from_slice(value.as_bytes());
    input.extend_from_slice(salt);
    hash_fn(&input)
}
