use std::{
    collections::BTreeMap,
    io::{Read, Write},
    net::TcpStream,
};

use tracing::debug;

use crate::{
    cassandra::{
        client::CassandraClient,
        types::{
            ColumnOrSuperColumn, ColumnParent, ColumnPath, ConsistencyLevel, KeyspaceDescription,
            SlicePredicate,
        },
    },
    thrift::{
        BinaryDecoder, BinaryEncoder, MessageType, Reply, SocketOptions, SocketTransport, TType,
    },
    util::{Result, Status},
};

/// Exceptions a method declares, in result field order starting at id 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    InvalidRequest,
    NotFound,
    Unavailable,
    TimedOut,
}

const READ_EXCEPTIONS: &[Declared] = &[
    Declared::InvalidRequest,
    Declared::Unavailable,
    Declared::TimedOut,
];
const WRITE_EXCEPTIONS: &[Declared] = READ_EXCEPTIONS;
const DESCRIBE_EXCEPTIONS: &[Declared] = &[Declared::NotFound];

type Decoder<'a, S> = BinaryDecoder<Reply<'a, S>>;

/// `CassandraClient` speaking the strict binary protocol over a socket.
pub struct ThriftClient<S> {
    transport: SocketTransport<S>,
    seq_id: i32,
}

impl ThriftClient<TcpStream> {
    pub fn connect(host: &str, port: u16, options: &SocketOptions) -> Result<Self> {
        Ok(ThriftClient::new(SocketTransport::open(host, port, options)?))
    }
}

impl<S: Read + Write> ThriftClient<S> {
    pub fn new(transport: SocketTransport<S>) -> Self {
        ThriftClient {
            transport,
            seq_id: 0,
        }
    }

    pub fn into_transport(self) -> SocketTransport<S> {
        self.transport
    }

    /// One request/response exchange.
    ///
    /// `write_args` encodes the argument fields; `read_success` decodes
    /// result field 0. Returns `Ok(None)` when the reply carries neither a
    /// result nor an exception, which is how void methods succeed.
    fn call<T, F>(
        &mut self,
        method: &'static str,
        declared: &[Declared],
        write_args: impl FnOnce(&mut BinaryEncoder) -> Result<()>,
        mut read_success: F,
    ) -> Result<Option<T>>
    where
        F: FnMut(&mut Decoder<'_, S>, TType) -> Result<T>,
    {
        self.seq_id = self.seq_id.wrapping_add(1);
        let seq_id = self.seq_id;

        let mut enc = BinaryEncoder::new();
        enc.write_message_begin(method, MessageType::Call, seq_id)?;
        write_args(&mut enc)?;
        enc.write_field_stop();
        let message = enc.finish();

        debug!(method, seq_id, bytes = message.len(), "thrift call");
        self.transport.send(&message)?;

        let max_length = self.transport.max_frame_size();
        let mut dec = BinaryDecoder::new(self.transport.reply()?, max_length);
        let header = dec.read_message_begin()?;
        if header.name != method {
            return Err(Status::corruption(format!(
                "reply for `{}` while waiting for `{method}`",
                header.name
            )));
        }
        if header.seq_id != seq_id {
            return Err(Status::corruption(format!(
                "out of sequence reply: got {}, expected {seq_id}",
                header.seq_id
            )));
        }
        match header.message_type {
            MessageType::Reply => {}
            MessageType::Exception => return Err(dec.read_application_exception()?),
            other => {
                return Err(Status::corruption(format!(
                    "unexpected message type {other:?} in reply"
                )));
            }
        }

        let mut success = None;
        let mut failure = None;
        while let Some((ty, id)) = dec.read_field_begin()? {
            if id == 0 {
                success = Some(read_success(&mut dec, ty)?);
                continue;
            }
            let kind = usize::try_from(id - 1)
                .ok()
                .and_then(|idx| declared.get(idx).copied());
            match kind {
                Some(kind) if ty == TType::Struct => failure = Some(read_exception(&mut dec, kind)?),
                _ => dec.skip(ty)?,
            }
        }

        if let Some(status) = failure {
            debug!(method, seq_id, %status, "thrift call failed");
            return Err(status);
        }
        Ok(success)
    }
}

fn read_exception<R: Read>(dec: &mut BinaryDecoder<R>, kind: Declared) -> Result<Status> {
    let mut why = None;
    dec.read_struct(|dec, ty, id| match (id, ty) {
        (1, TType::String) => {
            why = Some(dec.read_string()?);
            Ok(())
        }
        _ => dec.skip(ty),
    })?;

    Ok(match kind {
        Declared::InvalidRequest => {
            Status::invalid_request(why.unwrap_or_else(|| "invalid request".to_string()))
        }
        Declared::NotFound => Status::not_found(why.unwrap_or_else(|| "not found".to_string())),
        Declared::Unavailable => Status::unavailable(),
        Declared::TimedOut => Status::timed_out(),
    })
}

fn missing_result(method: &str) -> Status {
    Status::application(format!("{method} failed: unknown result"))
}

fn write_key_args(enc: &mut BinaryEncoder, keyspace: &str, key: &str) -> Result<()> {
    enc.write_field_begin(TType::String, 1);
    enc.write_string(keyspace)?;
    enc.write_field_begin(TType::String, 2);
    enc.write_string(key)?;
    Ok(())
}

fn read_string_collection<R: Read>(dec: &mut BinaryDecoder<R>, ty: TType) -> Result<Vec<String>> {
    let (element_type, size) = match ty {
        TType::Set => dec.read_set_begin()?,
        TType::List => dec.read_list_begin()?,
        other => {
            return Err(Status::corruption(format!(
                "keyspace names sent as {other:?}"
            )));
        }
    };
    dec.expect(element_type, TType::String, "keyspaces")?;

    let mut names = Vec::with_capacity(size);
    for _ in 0..size {
        names.push(dec.read_string()?);
    }
    Ok(names)
}

fn read_string_map<R: Read>(dec: &mut BinaryDecoder<R>) -> Result<BTreeMap<String, String>> {
    let (key_type, value_type, size) = dec.read_map_begin()?;
    dec.expect(key_type, TType::String, "property name")?;
    dec.expect(value_type, TType::String, "property value")?;

    let mut map = BTreeMap::new();
    for _ in 0..size {
        let k = dec.read_string()?;
        let v = dec.read_string()?;
        map.insert(k, v);
    }
    Ok(map)
}

impl<S: Read + Write + Send> CassandraClient for ThriftClient<S> {
    fn describe_keyspaces(&mut self) -> Result<Vec<String>> {
        self.call(
            "describe_keyspaces",
            &[],
            |_| Ok(()),
            |dec, ty| read_string_collection(dec, ty),
        )?
        .ok_or_else(|| missing_result("describe_keyspaces"))
    }

    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription> {
        self.call(
            "describe_keyspace",
            DESCRIBE_EXCEPTIONS,
            |enc| {
                enc.write_field_begin(TType::String, 1);
                enc.write_string(keyspace)
            },
            |dec, ty| {
                dec.expect(ty, TType::Map, "describe_keyspace result")?;
                let (key_type, value_type, size) = dec.read_map_begin()?;
                dec.expect(key_type, TType::String, "column family name")?;
                dec.expect(value_type, TType::Map, "column family properties")?;

                let mut description = KeyspaceDescription::new();
                for _ in 0..size {
                    let name = dec.read_string()?;
                    let properties = read_string_map(dec)?;
                    description.insert(name, properties);
                }
                Ok(description)
            },
        )?
        .ok_or_else(|| missing_result("describe_keyspace"))
    }

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        predicate: &SlicePredicate,
        consistency_level: ConsistencyLevel,
    ) -> Result<Vec<ColumnOrSuperColumn>> {
        self.call(
            "get_slice",
            READ_EXCEPTIONS,
            |enc| {
                write_key_args(enc, keyspace, key)?;
                enc.write_field_begin(TType::Struct, 3);
                column_parent.write(enc)?;
                enc.write_field_begin(TType::Struct, 4);
                predicate.write(enc)?;
                enc.write_field_begin(TType::I32, 5);
                enc.write_i32(consistency_level as i32);
                Ok(())
            },
            |dec, ty| {
                dec.expect(ty, TType::List, "get_slice result")?;
                let (element_type, size) = dec.read_list_begin()?;
                dec.expect(element_type, TType::Struct, "get_slice result element")?;
                let mut items = Vec::with_capacity(size);
                for _ in 0..size {
                    items.push(ColumnOrSuperColumn::read(dec)?);
                }
                Ok(items)
            },
        )?
        .ok_or_else(|| missing_result("get_slice"))
    }

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        column_parent: &ColumnParent,
        consistency_level: ConsistencyLevel,
    ) -> Result<i32> {
        self.call(
            "get_count",
            READ_EXCEPTIONS,
            |enc| {
                write_key_args(enc, keyspace, key)?;
                enc.write_field_begin(TType::Struct, 3);
                column_parent.write(enc)?;
                enc.write_field_begin(TType::I32, 4);
                enc.write_i32(consistency_level as i32);
                Ok(())
            },
            |dec, ty| {
                dec.expect(ty, TType::I32, "get_count result")?;
                dec.read_i32()
            },
        )?
        .ok_or_else(|| missing_result("get_count"))
    }

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        value: &[u8],
        timestamp: i64,
        consistency_level: ConsistencyLevel,
    ) -> Result<()> {
        self.call(
            "insert",
            WRITE_EXCEPTIONS,
            |enc| {
                write_key_args(enc, keyspace, key)?;
                enc.write_field_begin(TType::Struct, 3);
                column_path.write(enc)?;
                enc.write_field_begin(TType::String, 4);
                enc.write_binary(value)?;
                enc.write_field_begin(TType::I64, 5);
                enc.write_i64(timestamp);
                enc.write_field_begin(TType::I32, 6);
                enc.write_i32(consistency_level as i32);
                Ok(())
            },
            |dec, ty| dec.skip(ty),
        )?;
        Ok(())
    }

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        column_path: &ColumnPath,
        timestamp: i64,
        consistency_level: ConsistencyLevel,
    ) -> Result<()> {
        self.call(
            "remove",
            WRITE_EXCEPTIONS,
            |enc| {
                write_key_args(enc, keyspace, key)?;
                enc.write_field_begin(TType::Struct, 3);
                column_path.write(enc)?;
                enc.write_field_begin(TType::I64, 4);
                enc.write_i64(timestamp);
                enc.write_field_begin(TType::I32, 5);
                enc.write_i32(consistency_level as i32);
                Ok(())
            },
            |dec, ty| dec.skip(ty),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{cassandra::types::Column, util::Slice};

    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn client_with_reply(reply: Vec<u8>) -> ThriftClient<Duplex> {
        let duplex = Duplex {
            input: Cursor::new(reply),
            output: Vec::new(),
        };
        ThriftClient::new(SocketTransport::new(duplex, false, 1 << 20))
    }

    fn reply<F>(method: &str, seq_id: i32, body: F) -> Vec<u8>
    where
        F: FnOnce(&mut BinaryEncoder) -> Result<()>,
    {
        let mut enc = BinaryEncoder::new();
        enc.write_message_begin(method, MessageType::Reply, seq_id)
            .unwrap();
        body(&mut enc).unwrap();
        enc.write_field_stop();
        enc.finish().to_vec()
    }

    fn sent(client: ThriftClient<Duplex>) -> Vec<u8> {
        client.into_transport().into_inner().output
    }

    #[test]
    fn test_get_count_request_layout() {
        let bytes = reply("get_count", 1, |enc| {
            enc.write_field_begin(TType::I32, 0);
            enc.write_i32(3);
            Ok(())
        });
        let mut client = client_with_reply(bytes);

        let parent = ColumnParent::new("Users", Some(Slice::from("info")));
        let n = client
            .get_count("MyDatabase", "joe", &parent, ConsistencyLevel::One)
            .unwrap();
        assert_eq!(n, 3);

        let request = sent(client);
        let mut dec = BinaryDecoder::new(request.as_slice(), 1 << 20);
        let header = dec.read_message_begin().unwrap();
        assert_eq!(header.name, "get_count");
        assert_eq!(header.message_type, MessageType::Call);
        assert_eq!(header.seq_id, 1);

        let mut keyspace = None;
        let mut key = None;
        let mut decoded_parent = None;
        let mut level = None;
        dec.read_struct(|dec, ty, id| match id {
            1 => {
                keyspace = Some(dec.read_string()?);
                Ok(())
            }
            2 => {
                key = Some(dec.read_string()?);
                Ok(())
            }
            3 => {
                decoded_parent = Some(ColumnParent::read(dec)?);
                Ok(())
            }
            4 => {
                level = Some(dec.read_i32()?);
                Ok(())
            }
            _ => dec.skip(ty),
        })
        .unwrap();
        assert_eq!(keyspace.as_deref(), Some("MyDatabase"));
        assert_eq!(key.as_deref(), Some("joe"));
        assert_eq!(decoded_parent, Some(parent));
        assert_eq!(level, Some(1));
    }

    #[test]
    fn test_get_slice_decodes_both_shapes() {
        let bytes = reply("get_slice", 1, |enc| {
            enc.write_field_begin(TType::List, 0);
            enc.write_list_begin(TType::Struct, 2)?;
            ColumnOrSuperColumn::from_column(Column::new("a", "1", 10)).write(enc)?;
            ColumnOrSuperColumn::from_super_column(crate::cassandra::types::SuperColumn::new(
                "g",
                vec![Column::new("b", "2", 11)],
            ))
            .write(enc)
        });
        let mut client = client_with_reply(bytes);

        let items = client
            .get_slice(
                "ks",
                "row",
                &ColumnParent::new("cf", None),
                &SlicePredicate::Range(Default::default()),
                ConsistencyLevel::One,
            )
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].column.as_ref().unwrap().name, "a");
        assert_eq!(items[1].super_column.as_ref().unwrap().columns[0].value, "2");
    }

    #[test]
    fn test_invalid_request_exception() {
        let bytes = reply("insert", 1, |enc| {
            enc.write_field_begin(TType::Struct, 1);
            enc.write_field_begin(TType::String, 1);
            enc.write_string("unconfigured columnfamily Nope")?;
            enc.write_field_stop();
            Ok(())
        });
        let mut client = client_with_reply(bytes);

        let err = client
            .insert(
                "ks",
                "row",
                &ColumnPath::new("Nope", None, Some(Slice::from("c"))),
                b"v",
                1,
                ConsistencyLevel::One,
            )
            .unwrap_err();
        assert!(err.is_invalid_request());
        assert_eq!(err.message(), Some("unconfigured columnfamily Nope"));
    }

    #[test]
    fn test_unavailable_and_timed_out() {
        let bytes = reply("remove", 1, |enc| {
            enc.write_field_begin(TType::Struct, 2);
            enc.write_field_stop();
            Ok(())
        });
        let mut client = client_with_reply(bytes);
        let path = ColumnPath::new("cf", None, None);
        let err = client
            .remove("ks", "row", &path, 1, ConsistencyLevel::All)
            .unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::Unavailable);

        let bytes = reply("get_count", 1, |enc| {
            enc.write_field_begin(TType::Struct, 3);
            enc.write_field_stop();
            Ok(())
        });
        let mut client = client_with_reply(bytes);
        let err = client
            .get_count("ks", "row", &ColumnParent::new("cf", None), ConsistencyLevel::One)
            .unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::TimedOut);
    }

    #[test]
    fn test_describe_keyspace_not_found() {
        let bytes = reply("describe_keyspace", 1, |enc| {
            enc.write_field_begin(TType::Struct, 1);
            enc.write_field_stop();
            Ok(())
        });
        let mut client = client_with_reply(bytes);
        assert!(client.describe_keyspace("Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_describe_keyspaces_accepts_list() {
        let bytes = reply("describe_keyspaces", 1, |enc| {
            enc.write_field_begin(TType::List, 0);
            enc.write_list_begin(TType::String, 2)?;
            enc.write_string("MyDatabase")?;
            enc.write_string("system")
        });
        let mut client = client_with_reply(bytes);
        assert_eq!(
            client.describe_keyspaces().unwrap(),
            vec!["MyDatabase".to_string(), "system".to_string()]
        );
    }

    #[test]
    fn test_sequence_mismatch_is_corruption() {
        let bytes = reply("get_count", 9, |enc| {
            enc.write_field_begin(TType::I32, 0);
            enc.write_i32(3);
            Ok(())
        });
        let mut client = client_with_reply(bytes);
        let err = client
            .get_count("ks", "row", &ColumnParent::new("cf", None), ConsistencyLevel::One)
            .unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_missing_result() {
        let bytes = reply("get_count", 1, |_| Ok(()));
        let mut client = client_with_reply(bytes);
        let err = client
            .get_count("ks", "row", &ColumnParent::new("cf", None), ConsistencyLevel::One)
            .unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::Application);
    }

    #[test]
    fn test_application_exception_reply() {
        let mut enc = BinaryEncoder::new();
        enc.write_message_begin("describe_keyspaces", MessageType::Exception, 1)
            .unwrap();
        enc.write_field_begin(TType::String, 1);
        enc.write_string("Internal error processing describe_keyspaces")
            .unwrap();
        enc.write_field_begin(TType::I32, 2);
        enc.write_i32(6);
        enc.write_field_stop();
        let mut client = client_with_reply(enc.finish().to_vec());

        let err = client.describe_keyspaces().unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::Application);
        assert_eq!(
            err.message(),
            Some("Internal error processing describe_keyspaces (internal error)")
        );
    }
}
