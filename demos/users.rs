//! Walk through the `MyDatabase`/`Users` layout.
//!
//! Runs against an in-process cluster by default. Pass a JSON options file
//! to talk to a real node instead:
//!
//! ```text
//! cargo run --example users -- node.json
//!
//! {"host": "127.0.0.1", "port": 9160, "consistency_level": "QUORUM"}
//! ```
use cassal::{
    ColumnFamilyDescriptor, ConnectOptions, Connection, KeyspaceCatalog, MemoryCluster, Result,
    SliceItem, connect,
};
use tracing_subscriber::EnvFilter;

fn open_catalog() -> Result<KeyspaceCatalog> {
    if let Some(path) = std::env::args().nth(1) {
        return connect(ConnectOptions::from_json_file(path)?);
    }

    let cluster = MemoryCluster::new().with_keyspace(
        "MyDatabase",
        [ColumnFamilyDescriptor::super_family("Users")],
    );
    Connection::with_client(cluster, ConnectOptions::default()).catalog()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = open_catalog()?;
    println!("{catalog}");

    let users = catalog.keyspace("MyDatabase")?.column_family("Users")?;
    println!("{users}");

    let details = users.row("Rex").super_column("Details");
    details.insert("email", "rex@example.com")?;
    details.insert("name", "Rex")?;
    users.row("Rex").super_column("Prefs").insert("theme", "dark")?;

    println!("{} has {} super columns", users.row("Rex"), users.row("Rex").count()?);
    for item in &users.row("Rex").get_all()? {
        if let SliceItem::SuperColumn(sc) = item {
            for column in &sc.columns {
                println!("  {}/{} = {}", sc.name, column.name, column.value);
            }
        }
    }

    details.remove("email")?;
    println!("{details} has {} columns after remove", details.count()?);

    users.remove_row("Rex")?;
    println!("{} has {} super columns after remove_row", users.row("Rex"), users.row("Rex").count()?);

    println!("{}", catalog.connection().statistics().report());
    catalog.connection().close();
    Ok(())
}
