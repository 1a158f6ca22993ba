use anyhow::Result;
use tracing::{info, trace};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::Settings;

pub async fn migrate_and_serve(database_url: Option<&str>, bind_address: Option<&str>) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    let settings = Settings::load()?.with_overrides(database_url, bind_address);
    apply_migrations(&settings.database_url).await?;
    run_server(&settings).await
}
