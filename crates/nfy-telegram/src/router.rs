use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use nfy_core::{config::Config, service::MessageService, utils::AuditLogger};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: Arc<MessageService>,
    pub audit: Arc<AuditLogger>,
    /// Without the leading `@`; interpolated into usage texts.
    pub bot_username: String,
}

pub async fn run_polling(cfg: Arc<Config>, service: Arc<MessageService>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    tracing::info!(username = %bot_username, db = %cfg.database_path.display(), "nfy bot started");

    let state = Arc::new(AppState {
        audit: Arc::new(AuditLogger::new(
            cfg.audit_log_path.clone(),
            cfg.audit_log_json,
        )),
        cfg,
        service,
        bot_username,
    });

    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint(handlers::handle_inline_query))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
