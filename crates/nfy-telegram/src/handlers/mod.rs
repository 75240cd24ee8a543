//! Telegram update handlers.
//!
//! Each handler translates one update into a core-service call and renders
//! the typed outcome back to the user. No decision logic lives here.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, InlineQuery, Message},
};

use crate::router::AppState;

mod callback;
mod commands;
mod inline;

pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    inline::handle_inline_query(bot, q, state).await
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    // Anything that is not a command (stickers, plain chatter) is ignored;
    // the bot works through inline mode.
    Ok(())
}
