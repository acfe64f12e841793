pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod transport;
