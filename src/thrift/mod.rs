/// Thrift wire layer
///
/// Only the pieces the Cassandra client needs: the strict binary protocol
/// and a buffered socket transport with optional framing.
///
/// ```text
/// ThriftClient
///  ├─→ BinaryEncoder ──→ SocketTransport::send ──→ TcpStream
///  └─→ BinaryDecoder ←── SocketTransport::reply ←── TcpStream
/// ```
pub mod protocol;
pub mod transport;

pub use protocol::{BinaryDecoder, BinaryEncoder, MessageHeader, MessageType, TType};
pub use transport::{Reply, SocketOptions, SocketTransport};

/// Default cap on frames and length-prefixed values read from the peer
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;
