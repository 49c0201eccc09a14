use std::time::Duration;

use log::{info, warn};
use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Database,
};

use crate::errors::Result;

/// Connects and returns the agency database. A failed ping is logged but not
/// fatal; the health endpoint reports it.
pub async fn connect(uri: &str, database: &str) -> Result<Database> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);
    client_options.app_name = Some("quotedesk-api".to_string());

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;
    let db = client.database(database);

    match ping(&db).await {
        Ok(()) => info!("Connected to MongoDB database {}", database),
        Err(e) => warn!("Connected to MongoDB but ping failed: {}", e),
    }
    Ok(db)
}

pub async fn ping(db: &Database) -> Result<()> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}
