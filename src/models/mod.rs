pub mod identity;
pub mod request;
pub mod response;

pub use identity::*;
pub use request::*;
pub use response::*;
