use std::sync::Arc;

use nfy_core::{config::Config, registry::RejectionRegistry, service::MessageService};
use nfy_store::{Database, SqliteMessageStore, SqliteOverrideStore};

#[tokio::main]
async fn main() -> Result<(), nfy_core::Error> {
    nfy_core::logging::init("nfy");

    let cfg = Arc::new(Config::load()?);
    let db = Database::open(&cfg.database_path)?;

    let messages = Arc::new(SqliteMessageStore::new(db.clone()));
    let overrides = Arc::new(SqliteOverrideStore::new(db));
    let service = Arc::new(MessageService::new(
        messages,
        RejectionRegistry::new(overrides),
        cfg.message_ttl,
    ));

    nfy_telegram::router::run_polling(cfg, service)
        .await
        .map_err(|e| nfy_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
