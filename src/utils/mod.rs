pub mod cookie;
pub mod crypto;

pub use cookie::get_cookie;
pub use crypto::{constant_time_eq, random_hex, sha256_hex};
