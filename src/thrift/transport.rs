use std::{
    io::{BufReader, Cursor, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use tracing::debug;

use crate::util::{Result, Status};

/// Length prefix of a framed message
pub const FRAME_HEADER_SIZE: usize = 4;

/// Socket-level settings applied when a transport is opened.
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    /// Wrap every message in a 4 byte length frame (Cassandra 0.7+ default)
    pub framed: bool,
    /// Largest frame or length-prefixed value accepted from the peer
    pub max_frame_size: usize,
}

/// Buffered, optionally framed, byte transport.
///
/// Writes are whole messages: the client encodes a call into one buffer and
/// hands it over in a single [`SocketTransport::send`]. Reads go through a
/// `BufReader` so the decoder's many small reads do not become syscalls.
pub struct SocketTransport<S> {
    stream: BufReader<S>,
    framed: bool,
    max_frame_size: usize,
}

impl SocketTransport<TcpStream> {
    /// Connect to `host:port` and wrap the socket.
    pub fn open(host: &str, port: u16, options: &SocketOptions) -> Result<Self> {
        let stream = match options.connect_timeout {
            Some(timeout) => {
                let mut last_err = None;
                let mut connected = None;
                for addr in (host, port).to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(s) => {
                            connected = Some(s);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match (connected, last_err) {
                    (Some(s), _) => s,
                    (None, Some(e)) => return Err(e.into()),
                    (None, None) => {
                        return Err(Status::io_error(format!(
                            "{host}:{port} did not resolve to any address"
                        )));
                    }
                }
            }
            None => TcpStream::connect((host, port))?,
        };

        stream.set_nodelay(true)?;
        stream.set_read_timeout(options.read_timeout)?;
        stream.set_write_timeout(options.write_timeout)?;
        debug!(host, port, framed = options.framed, "socket transport opened");

        Ok(SocketTransport::new(
            stream,
            options.framed,
            options.max_frame_size,
        ))
    }
}

impl<S: Read + Write> SocketTransport<S> {
    pub fn new(stream: S, framed: bool, max_frame_size: usize) -> Self {
        SocketTransport {
            stream: BufReader::new(stream),
            framed,
            max_frame_size,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Write one complete message and flush it.
    pub fn send(&mut self, message: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        if self.framed {
            if message.len() > self.max_frame_size {
                return Err(Status::invalid_argument(format!(
                    "message of {} bytes exceeds frame limit {}",
                    message.len(),
                    self.max_frame_size
                )));
            }
            stream.write_all(&(message.len() as u32).to_be_bytes())?;
        }
        stream.write_all(message)?;
        stream.flush()?;
        Ok(())
    }

    /// Reader positioned at the start of the next reply.
    ///
    /// In framed mode the whole frame is read up front; otherwise the
    /// decoder pulls bytes straight from the buffered socket.
    pub fn reply(&mut self) -> Result<Reply<'_, S>> {
        if !self.framed {
            return Ok(Reply::Buffered(&mut self.stream));
        }

        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.stream.read_exact(&mut header)?;
        let len = i32::from_be_bytes(header);
        if len < 0 || len as usize > self.max_frame_size {
            return Err(Status::corruption(format!(
                "frame size {len} outside 0..={}",
                self.max_frame_size
            )));
        }

        let mut frame = vec![0u8; len as usize];
        self.stream.read_exact(&mut frame)?;
        Ok(Reply::Framed(Cursor::new(frame)))
    }

    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

/// Byte source of one reply message.
pub enum Reply<'a, S> {
    Buffered(&'a mut BufReader<S>),
    Framed(Cursor<Vec<u8>>),
}

impl<S: Read> Read for Reply<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Reply::Buffered(r) => r.read(buf),
            Reply::Framed(c) => c.read(buf),
        }
    }
}
