use std::sync::Arc;

use teloxide::prelude::*;

use nfy_core::{domain::MessageToken, service::RevealOutcome, utils::AuditEvent};

use crate::router::AppState;

/// Handle a `show:{token}` button press: one reveal decision per viewer,
/// answered as an alert popup only that viewer can see.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let data = q.data.clone().unwrap_or_default();
    let Some(token) = data.strip_prefix("show:") else {
        // Unknown button payload; just dismiss the spinner.
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    let token = MessageToken(token.to_string());
    let user_id = q.from.id.0 as i64;
    let viewer = q.from.username.as_deref();

    match state.service.reveal(&token, viewer).await {
        Ok(RevealOutcome::Expired) => {
            let _ = state
                .audit
                .write(AuditEvent::reveal(user_id, viewer, token.as_str(), "expired"));
            bot.answer_callback_query(q.id)
                .text("❌ Сообщение не найдено или устарело")
                .show_alert(true)
                .await?;
        }
        Ok(RevealOutcome::Denied(reject_text)) => {
            let _ = state
                .audit
                .write(AuditEvent::reveal(user_id, viewer, token.as_str(), "denied"));
            tracing::info!(user_id, token = token.as_str(), "reveal denied");
            bot.answer_callback_query(q.id)
                .text(reject_text)
                .show_alert(true)
                .await?;
        }
        Ok(RevealOutcome::Granted(body)) => {
            let _ = state
                .audit
                .write(AuditEvent::reveal(user_id, viewer, token.as_str(), "granted"));
            tracing::info!(user_id, token = token.as_str(), "reveal granted");
            bot.answer_callback_query(q.id)
                .text(body)
                .show_alert(true)
                .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, user_id, token = token.as_str(), "reveal failed");
            let _ = state.audit.write(AuditEvent::error(user_id, &e.to_string()));
            bot.answer_callback_query(q.id)
                .text("⚠️ Что-то пошло не так, попробуй ещё раз")
                .show_alert(true)
                .await?;
        }
    }

    Ok(())
}
