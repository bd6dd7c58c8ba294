pub mod block;
pub mod hash;
pub mod validator;

pub use block::*;
pub use hash::{merkle_root, sha256_hash, Address, Hash, ADDRESS_LEN, HASH_LEN};
pub use validator::*;
