pub mod address;
pub mod endpoint;

pub use address::{Address, AddressError};
pub use endpoint::Endpoint;
