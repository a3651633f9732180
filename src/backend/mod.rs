//! Backend connection factory abstraction and the bundled TCP implementation

pub mod connector;
pub mod tcp;

pub use connector::BackendConnector;
pub use tcp::TcpConnector;
