/// Thrift strict binary protocol
///
/// Every value is big-endian. A message on the wire is:
///
/// Message format:
/// +----------------------+-------------+--------+---------+
/// | Version | Type       | Name        | Seq id | Body    |
/// +----------------------+-------------+--------+---------+
/// | 0x8001 (2) | 0 | t(1)| len(4)+bytes| 4 bytes| struct  |
/// +----------------------+-------------+--------+---------+
///
/// A struct is a sequence of fields terminated by a STOP byte:
///
/// +-----------+----------+-------+     +------+
/// | Type (1)  | Id (2)   | Value | ... | 0x00 |
/// +-----------+----------+-------+     +------+
///
/// Containers:
/// - list/set: element type (1), size (4), elements
/// - map: key type (1), value type (1), size (4), key/value pairs
/// - string/binary: length (4), bytes
use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};

use crate::util::{Result, Status};

/// Version word of the strict protocol, OR-ed with the message type
pub const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the version half of the first header word
pub const VERSION_MASK: u32 = 0xffff_0000;

/// Nesting limit for [`BinaryDecoder::skip`]
pub const MAX_SKIP_DEPTH: usize = 64;

/// Field and element type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TType {
    Stop = 0,
    Void = 1,
    Bool = 2,
    Byte = 3,
    Double = 4,
    I16 = 6,
    I32 = 8,
    I64 = 10,
    String = 11,
    Struct = 12,
    Map = 13,
    Set = 14,
    List = 15,
}

impl TType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TType::Stop),
            1 => Some(TType::Void),
            2 => Some(TType::Bool),
            3 => Some(TType::Byte),
            4 => Some(TType::Double),
            6 => Some(TType::I16),
            8 => Some(TType::I32),
            10 => Some(TType::I64),
            11 => Some(TType::String),
            12 => Some(TType::Struct),
            13 => Some(TType::Map),
            14 => Some(TType::Set),
            15 => Some(TType::List),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Call = 1,
    Reply = 2,
    Exception = 3,
    Oneway = 4,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(MessageType::Call),
            2 => Some(MessageType::Reply),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::Oneway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub message_type: MessageType,
    pub seq_id: i32,
}

fn wire_len(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Status::invalid_argument(format!("{len} bytes exceed the Thrift size limit")))
}

/// Encodes one message into a contiguous buffer.
#[derive(Debug, Default)]
pub struct BinaryEncoder {
    buf: BytesMut,
}

impl BinaryEncoder {
    pub fn new() -> Self {
        BinaryEncoder {
            buf: BytesMut::with_capacity(256),
        }
    }

    pub fn write_message_begin(
        &mut self,
        name: &str,
        message_type: MessageType,
        seq_id: i32,
    ) -> Result<()> {
        self.buf.put_u32(VERSION_1 | message_type as u32);
        self.write_string(name)?;
        self.buf.put_i32(seq_id);
        Ok(())
    }

    #[inline]
    pub fn write_field_begin(&mut self, field_type: TType, id: i16) {
        self.buf.put_u8(field_type as u8);
        self.buf.put_i16(id);
    }

    #[inline]
    pub fn write_field_stop(&mut self) {
        self.buf.put_u8(TType::Stop as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn write_binary(&mut self, value: &[u8]) -> Result<()> {
        self.buf.put_i32(wire_len(value.len())?);
        self.buf.put_slice(value);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }

    pub fn write_list_begin(&mut self, element_type: TType, size: usize) -> Result<()> {
        self.buf.put_u8(element_type as u8);
        self.buf.put_i32(wire_len(size)?);
        Ok(())
    }

    pub fn write_set_begin(&mut self, element_type: TType, size: usize) -> Result<()> {
        self.write_list_begin(element_type, size)
    }

    pub fn write_map_begin(&mut self, key_type: TType, value_type: TType, size: usize) -> Result<()> {
        self.buf.put_u8(key_type as u8);
        self.buf.put_u8(value_type as u8);
        self.buf.put_i32(wire_len(size)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Decodes values from a byte stream.
///
/// Lengths read from the wire are checked against `max_length` before any
/// allocation so a corrupt header cannot make the client reserve gigabytes.
pub struct BinaryDecoder<R> {
    reader: R,
    max_length: usize,
}

impl<R: Read> BinaryDecoder<R> {
    pub fn new(reader: R, max_length: usize) -> Self {
        BinaryDecoder { reader, max_length }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_message_begin(&mut self) -> Result<MessageHeader> {
        let word = u32::from_be_bytes(self.read_array()?);
        if word & VERSION_MASK != VERSION_1 {
            return Err(Status::corruption(format!(
                "bad protocol version word {word:#010x}"
            )));
        }

        let message_type = MessageType::from_u8((word & 0xff) as u8)
            .ok_or_else(|| Status::corruption(format!("unknown message type {}", word & 0xff)))?;
        let name = self.read_string()?;
        let seq_id = self.read_i32()?;

        Ok(MessageHeader {
            name,
            message_type,
            seq_id,
        })
    }

    /// Returns `None` at the STOP byte that ends a struct.
    pub fn read_field_begin(&mut self) -> Result<Option<(TType, i16)>> {
        let field_type = self.read_type()?;
        if field_type == TType::Stop {
            return Ok(None);
        }
        let id = self.read_i16()?;
        Ok(Some((field_type, id)))
    }

    fn read_type(&mut self) -> Result<TType> {
        let [tag] = self.read_array::<1>()?;
        TType::from_u8(tag).ok_or_else(|| Status::corruption(format!("unknown field type {tag}")))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let [b] = self.read_array::<1>()?;
        Ok(b != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    fn read_size(&mut self) -> Result<usize> {
        let size = self.read_i32()?;
        if size < 0 {
            return Err(Status::corruption(format!("negative size {size}")));
        }
        let size = size as usize;
        if size > self.max_length {
            return Err(Status::corruption(format!(
                "size {size} exceeds limit {}",
                self.max_length
            )));
        }
        Ok(size)
    }

    pub fn read_binary(&mut self) -> Result<Bytes> {
        let len = self.read_size()?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let raw = self.read_binary()?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| Status::corruption(format!("string is not UTF-8: {e}")))
    }

    pub fn read_list_begin(&mut self) -> Result<(TType, usize)> {
        let element_type = self.read_type()?;
        let size = self.read_size()?;
        Ok((element_type, size))
    }

    pub fn read_set_begin(&mut self) -> Result<(TType, usize)> {
        self.read_list_begin()
    }

    pub fn read_map_begin(&mut self) -> Result<(TType, TType, usize)> {
        let key_type = self.read_type()?;
        let value_type = self.read_type()?;
        let size = self.read_size()?;
        Ok((key_type, value_type, size))
    }

    /// Walks the fields of a struct, handing each to `on_field`.
    ///
    /// `on_field` must consume the value, either by reading it or by calling
    /// [`BinaryDecoder::skip`].
    pub fn read_struct<F>(&mut self, mut on_field: F) -> Result<()>
    where
        F: FnMut(&mut Self, TType, i16) -> Result<()>,
    {
        while let Some((field_type, id)) = self.read_field_begin()? {
            on_field(self, field_type, id)?;
        }
        Ok(())
    }

    pub fn skip(&mut self, field_type: TType) -> Result<()> {
        self.skip_depth(field_type, MAX_SKIP_DEPTH)
    }

    fn skip_depth(&mut self, field_type: TType, depth: usize) -> Result<()> {
        if depth == 0 {
            return Err(Status::corruption("value nested too deeply"));
        }
        match field_type {
            TType::Stop | TType::Void => {}
            TType::Bool | TType::Byte => {
                self.read_array::<1>()?;
            }
            TType::I16 => {
                self.read_i16()?;
            }
            TType::I32 => {
                self.read_i32()?;
            }
            TType::I64 | TType::Double => {
                self.read_i64()?;
            }
            TType::String => {
                self.read_binary()?;
            }
            TType::Struct => {
                while let Some((inner, _)) = self.read_field_begin()? {
                    self.skip_depth(inner, depth - 1)?;
                }
            }
            TType::Map => {
                let (key_type, value_type, size) = self.read_map_begin()?;
                for _ in 0..size {
                    self.skip_depth(key_type, depth - 1)?;
                    self.skip_depth(value_type, depth - 1)?;
                }
            }
            TType::Set | TType::List => {
                let (element_type, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip_depth(element_type, depth - 1)?;
                }
            }
        }
        Ok(())
    }

    /// Checks that a field carries the type the IDL declares for it.
    pub fn expect(&self, actual: TType, expected: TType, field: &str) -> Result<()> {
        if actual != expected {
            return Err(Status::corruption(format!(
                "field `{field}` has type {actual:?}, expected {expected:?}"
            )));
        }
        Ok(())
    }

    /// Decodes a `TApplicationException` body into a status.
    pub fn read_application_exception(&mut self) -> Result<Status> {
        let mut message = None;
        let mut kind = 0;
        self.read_struct(|dec, field_type, id| match (id, field_type) {
            (1, TType::String) => {
                message = Some(dec.read_string()?);
                Ok(())
            }
            (2, TType::I32) => {
                kind = dec.read_i32()?;
                Ok(())
            }
            _ => dec.skip(field_type),
        })?;

        let message = message.unwrap_or_else(|| "unknown application error".to_string());
        Ok(Status::application(format!(
            "{message} ({})",
            application_exception_kind(kind)
        )))
    }
}

fn application_exception_kind(kind: i32) -> &'static str {
    match kind {
        1 => "unknown method",
        2 => "invalid message type",
        3 => "wrong method name",
        4 => "bad sequence id",
        5 => "missing result",
        6 => "internal error",
        7 => "protocol error",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(bytes: &[u8]) -> BinaryDecoder<&[u8]> {
        BinaryDecoder::new(bytes, 1024)
    }

    #[test]
    fn test_ttype_conversion() {
        assert_eq!(TType::from_u8(11), Some(TType::String));
        assert_eq!(TType::from_u8(15), Some(TType::List));
        assert_eq!(TType::from_u8(5), None);
        assert_eq!(TType::from_u8(16), None);
    }

    #[test]
    fn test_message_header_layout() {
        let mut enc = BinaryEncoder::new();
        enc.write_message_begin("get_count", MessageType::Call, 7).unwrap();
        let bytes = enc.finish();

        let mut expected = vec![0x80, 0x01, 0x00, 0x01, 0, 0, 0, 9];
        expected.extend_from_slice(b"get_count");
        expected.extend_from_slice(&[0, 0, 0, 7]);
        assert_eq!(bytes.as_ref(), expected.as_slice());

        let header = decoder(&bytes).read_message_begin().unwrap();
        assert_eq!(header.name, "get_count");
        assert_eq!(header.message_type, MessageType::Call);
        assert_eq!(header.seq_id, 7);
    }

    #[test]
    fn test_unversioned_header_rejected() {
        let bytes = [0, 0, 0, 4, b'p', b'i', b'n', b'g', 1, 0, 0, 0, 0];
        let err = decoder(&bytes).read_message_begin().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_negative_and_oversized_lengths() {
        let negative = (-1i32).to_be_bytes();
        assert!(decoder(&negative).read_binary().unwrap_err().is_corruption());

        let huge = 4096i32.to_be_bytes();
        assert!(decoder(&huge).read_binary().unwrap_err().is_corruption());
    }

    #[test]
    fn test_truncated_input_is_io_error() {
        let bytes = [0, 0, 0, 5, b'a', b'b'];
        let err = decoder(&bytes).read_string().unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_skip_nested_struct() {
        let mut enc = BinaryEncoder::new();
        // struct { 1: list<string> ["x"], 2: map<string,i32> {"k": 3} }
        enc.write_field_begin(TType::List, 1);
        enc.write_list_begin(TType::String, 1).unwrap();
        enc.write_string("x").unwrap();
        enc.write_field_begin(TType::Map, 2);
        enc.write_map_begin(TType::String, TType::I32, 1).unwrap();
        enc.write_string("k").unwrap();
        enc.write_i32(3);
        enc.write_field_stop();
        enc.write_i64(42);
        let bytes = enc.finish();

        let mut dec = decoder(&bytes);
        dec.skip(TType::Struct).unwrap();
        assert_eq!(dec.read_i64().unwrap(), 42);
    }

    #[test]
    fn test_read_struct_visits_fields_in_order() {
        let mut enc = BinaryEncoder::new();
        enc.write_field_begin(TType::I32, 4);
        enc.write_i32(100);
        enc.write_field_begin(TType::Bool, 3);
        enc.write_bool(true);
        enc.write_field_stop();
        let bytes = enc.finish();

        let mut seen = Vec::new();
        decoder(&bytes)
            .read_struct(|dec, field_type, id| {
                seen.push(id);
                dec.skip(field_type)
            })
            .unwrap();
        assert_eq!(seen, vec![4, 3]);
    }

    #[test]
    fn test_application_exception() {
        let mut enc = BinaryEncoder::new();
        enc.write_field_begin(TType::String, 1);
        enc.write_string("Invalid method name: 'login'").unwrap();
        enc.write_field_begin(TType::I32, 2);
        enc.write_i32(1);
        enc.write_field_stop();
        let bytes = enc.finish();

        let status = decoder(&bytes).read_application_exception().unwrap();
        assert_eq!(status.code(), &crate::util::Code::Application);
        assert_eq!(
            status.message(),
            Some("Invalid method name: 'login' (unknown method)")
        );
    }
}
