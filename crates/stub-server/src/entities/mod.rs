mod protocol;

pub use protocol::Protocol;
