#![allow(dead_code)]

use std::{
    io::{BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
    time::Duration,
};

use cassal::{
    CassandraClient, ColumnFamilyDescriptor, ConnectOptions, Connection, KeyspaceCatalog,
    MemoryCluster, Result, Status,
    cassandra::{ColumnParent, ColumnPath, ConsistencyLevel, SlicePredicate},
    thrift::{BinaryDecoder, BinaryEncoder, MessageType, TType},
    util::Code,
};

/// `MyDatabase` with a Super `Users` and a Standard `Sessions` family.
pub fn users_cluster() -> MemoryCluster {
    MemoryCluster::new()
        .with_keyspace(
            "MyDatabase",
            [
                ColumnFamilyDescriptor::super_family("Users"),
                ColumnFamilyDescriptor::standard("Sessions"),
            ],
        )
        .with_keyspace("system", [ColumnFamilyDescriptor::standard("LocationInfo")])
}

pub fn memory_catalog() -> KeyspaceCatalog {
    Connection::with_client(users_cluster(), ConnectOptions::default())
        .catalog()
        .unwrap()
}

/// Minimal Thrift server answering one connection from `cluster`.
pub struct FakeServer {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl FakeServer {
    pub fn start(cluster: MemoryCluster, framed: bool) -> Self {
        Self::start_with_delay(cluster, framed, Delay::default())
    }

    /// Like `start`, but holds one reply back.
    pub fn start_with_delay(cluster: MemoryCluster, framed: bool, delay: Delay) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            serve(stream, cluster, framed, delay);
        });
        FakeServer { port, handle }
    }

    pub fn options(&self, framed: bool) -> ConnectOptions {
        ConnectOptions {
            framed,
            read_timeout_ms: Some(5_000),
            ..ConnectOptions::new("127.0.0.1", self.port)
        }
    }

    pub fn join(self) {
        self.handle.join().unwrap();
    }
}

/// Hold the reply to request number `nth` (0-based) back for `duration`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delay {
    pub nth: usize,
    pub duration: Duration,
}

#[derive(Default)]
struct Args {
    keyspace: String,
    key: String,
    parent: Option<ColumnParent>,
    path: Option<ColumnPath>,
    predicate: Option<SlicePredicate>,
    value: Vec<u8>,
    timestamp: i64,
    level: i32,
}

fn serve(stream: TcpStream, mut cluster: MemoryCluster, framed: bool, delay: Delay) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    for request in 0.. {
        if framed {
            let mut len = [0u8; 4];
            if reader.read_exact(&mut len).is_err() {
                return;
            }
        }
        let mut dec = BinaryDecoder::new(&mut reader, 1 << 20);
        let header = match dec.read_message_begin() {
            Ok(header) => header,
            Err(_) => return,
        };
        let args = read_args(&mut dec, &header.name).unwrap();

        let mut enc = BinaryEncoder::new();
        enc.write_message_begin(&header.name, MessageType::Reply, header.seq_id)
            .unwrap();
        dispatch(&mut cluster, &header.name, args, &mut enc).unwrap();
        enc.write_field_stop();
        let reply = enc.finish();

        if request == delay.nth {
            thread::sleep(delay.duration);
        }

        let mut out = Vec::with_capacity(reply.len() + 4);
        if framed {
            out.extend_from_slice(&(reply.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&reply);
        // The client may already have hung up
        if writer.write_all(&out).and_then(|_| writer.flush()).is_err() {
            return;
        }
    }
}

fn read_args<R: Read>(dec: &mut BinaryDecoder<R>, method: &str) -> Result<Args> {
    let mut args = Args::default();
    dec.read_struct(|dec, ty, id| {
        match (method, id, ty) {
            (_, 1, TType::String) => args.keyspace = dec.read_string()?,
            (_, 2, TType::String) => args.key = dec.read_string()?,
            ("get_slice" | "get_count", 3, TType::Struct) => {
                args.parent = Some(ColumnParent::read(dec)?)
            }
            ("insert" | "remove", 3, TType::Struct) => args.path = Some(ColumnPath::read(dec)?),
            ("get_slice", 4, TType::Struct) => args.predicate = Some(SlicePredicate::read(dec)?),
            ("insert", 4, TType::String) => args.value = dec.read_binary()?.to_vec(),
            ("insert", 5, TType::I64) | ("remove", 4, TType::I64) => {
                args.timestamp = dec.read_i64()?
            }
            (_, _, TType::I32) => args.level = dec.read_i32()?,
            _ => dec.skip(ty)?,
        }
        Ok(())
    })?;
    Ok(args)
}

fn write_exception(enc: &mut BinaryEncoder, status: &Status) -> Result<()> {
    let id = match status.code() {
        Code::InvalidRequest | Code::NotFound => 1,
        Code::Unavailable => 2,
        _ => 3,
    };
    enc.write_field_begin(TType::Struct, id);
    if let Some(why) = status.message() {
        enc.write_field_begin(TType::String, 1);
        enc.write_string(why)?;
    }
    enc.write_field_stop();
    Ok(())
}

fn dispatch(
    cluster: &mut MemoryCluster,
    method: &str,
    args: Args,
    enc: &mut BinaryEncoder,
) -> Result<()> {
    let level = ConsistencyLevel::from_i32(args.level).unwrap_or_default();
    match method {
        "describe_keyspaces" => {
            let names = cluster.describe_keyspaces()?;
            enc.write_field_begin(TType::Set, 0);
            enc.write_set_begin(TType::String, names.len())?;
            for name in names {
                enc.write_string(&name)?;
            }
        }
        "describe_keyspace" => match cluster.describe_keyspace(&args.keyspace) {
            Ok(desc) => {
                enc.write_field_begin(TType::Map, 0);
                enc.write_map_begin(TType::String, TType::Map, desc.len())?;
                for (cf, props) in desc {
                    enc.write_string(&cf)?;
                    enc.write_map_begin(TType::String, TType::String, props.len())?;
                    for (k, v) in props {
                        enc.write_string(&k)?;
                        enc.write_string(&v)?;
                    }
                }
            }
            Err(status) => write_exception(enc, &status)?,
        },
        "get_slice" => {
            let parent = args.parent.unwrap();
            let predicate = args.predicate.unwrap();
            match cluster.get_slice(&args.keyspace, &args.key, &parent, &predicate, level) {
                Ok(items) => {
                    enc.write_field_begin(TType::List, 0);
                    enc.write_list_begin(TType::Struct, items.len())?;
                    for item in items {
                        item.write(enc)?;
                    }
                }
                Err(status) => write_exception(enc, &status)?,
            }
        }
        "get_count" => {
            let parent = args.parent.unwrap();
            match cluster.get_count(&args.keyspace, &args.key, &parent, level) {
                Ok(n) => {
                    enc.write_field_begin(TType::I32, 0);
                    enc.write_i32(n);
                }
                Err(status) => write_exception(enc, &status)?,
            }
        }
        "insert" => {
            let path = args.path.unwrap();
            let result = cluster.insert(
                &args.keyspace,
                &args.key,
                &path,
                &args.value,
                args.timestamp,
                level,
            );
            if let Err(status) = result {
                write_exception(enc, &status)?;
            }
        }
        "remove" => {
            let path = args.path.unwrap();
            let result = cluster.remove(&args.keyspace, &args.key, &path, args.timestamp, level);
            if let Err(status) = result {
                write_exception(enc, &status)?;
            }
        }
        other => panic!("fake server got unknown method {other}"),
    }
    Ok(())
}
