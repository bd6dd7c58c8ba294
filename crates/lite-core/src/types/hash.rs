use sha2::{Digest, Sha256};

/// Length in bytes of a SHA256 digest.
pub const HASH_LEN: usize = 32;

/// Length in bytes of a validator address (truncated SHA256 of the public key).
pub const ADDRESS_LEN: usize = 20;

/// Implements hex `Display`/`Serialize`/`Deserialize` and `from_bytes` for a
/// fixed-size byte newtype. Deserialization accepts an optional `0x` prefix.
macro_rules! impl_hex_bytes {
    ($name:ident, $len:expr, $what:literal) => {
        impl $name {
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
                if bytes.len() != $len {
                    return Err(concat!("Invalid ", $what, " length"));
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(bytes);
                Ok(Self(arr))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&hex::encode_upper(self.0))
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                let s = s.strip_prefix("0x").unwrap_or(&s);
                let bytes = hex::decode(s).map_err(::serde::de::Error::custom)?;
                Self::from_bytes(&bytes).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_hex_bytes;

/// A SHA256 digest binding a header, a validator set or a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; HASH_LEN]);

impl_hex_bytes!(Hash, HASH_LEN, "hash");

/// Identity of a validator: the first 20 bytes of the SHA256 of its public key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl_hex_bytes!(Address, ADDRESS_LEN, "address");

impl Address {
    /// Derive the address of a validator from its encoded public key.
    pub fn from_pub_key_bytes(pub_key: &[u8]) -> Self {
        let digest = sha256_hash(pub_key);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest.0[..ADDRESS_LEN]);
        Address(out)
    }
}

/// SHA256 hash of arbitrary data.
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_LEN];
    output.copy_from_slice(&result);
    Hash(output)
}

/// SHA256 hash of two 32-byte values concatenated.
fn sha256_pair(a: &[u8; HASH_LEN], b: &[u8; HASH_LEN]) -> [u8; HASH_LEN] {
    let mut data = [0u8; 2 * HASH_LEN];
    data[..HASH_LEN].copy_from_slice(a);
    data[HASH_LEN..].copy_from_slice(b);
    sha256_hash(&data).0
}

/// Binary Merkle root over `leaves`, padded with zero leaves to the next
/// power of two. An empty list hashes to the zero hash.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::default();
    }

    let width = leaves.len().next_power_of_two();
    let mut layer: Vec<[u8; HASH_LEN]> = leaves.iter().map(|leaf| leaf.0).collect();
    layer.resize(width, [0u8; HASH_LEN]);

    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| sha256_pair(&pair[0], &pair[1]))
            .collect();
    }

    Hash(layer[0])
}
