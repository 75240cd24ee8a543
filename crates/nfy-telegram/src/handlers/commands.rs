use std::sync::Arc;

use teloxide::{prelude::*, types::ParseMode};

use nfy_core::{
    domain::UserId,
    formatting::escape_html,
    registry::DEFAULT_REJECTION_TEXT,
    utils::AuditEvent,
    Error,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let author = UserId(user.id.0 as i64);
    let (cmd, args) = parse_command(text);

    match cmd.as_str() {
        "start" | "help" => cmd_start(&bot, &msg, &state).await,
        "setmessage" => cmd_set_message(&bot, &msg, &state, author, &args).await,
        "resetmessage" => cmd_reset_message(&bot, &msg, &state, author).await,
        "settings" => cmd_settings(&bot, &msg, &state, author).await,
        _ => Ok(()),
    }
}

async fn cmd_start(bot: &Bot, msg: &Message, state: &AppState) -> ResponseResult<()> {
    let bot_name = &state.bot_username;
    let welcome = format!(
        "👋 <b>Привет! Я бот «Не для тебя»</b>\n\
         \n\
         Я отправляю сообщения, которые видят <b>все, кроме</b> указанных людей.\n\
         \n\
         <b>🔹 Как использовать:</b>\n\
         В любом чате напиши:\n\
         <code>@{bot_name} Твоё сообщение @username1 @username2</code>\n\
         \n\
         Сообщение увидят все, <b>кроме</b> @username1 и @username2.\n\
         \n\
         <b>🔹 Команды:</b>\n\
         /setmessage &lt;текст&gt; — изменить текст, который видят исключённые\n\
         /resetmessage — сбросить текст на стандартный\n\
         /settings — посмотреть настройки\n\
         \n\
         <b>🔹 Пример:</b>\n\
         <code>@{bot_name} Го в кино вечером? @vasya</code>\n\
         Все увидят приглашение, кроме Васи 😏"
    );

    bot.send_message(msg.chat.id, welcome)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn cmd_set_message(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    author: UserId,
    args: &str,
) -> ResponseResult<()> {
    let new_text = args.trim();
    if new_text.is_empty() {
        bot.send_message(
            msg.chat.id,
            "⚠️ Укажи текст после команды.\n\n\
             Пример: <code>/setmessage Тебе это видеть не положено!</code>",
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    match state.service.registry().set(author, new_text).await {
        Ok(()) => {
            let _ = state.audit.write(AuditEvent::override_change(author.0, "set"));
            tracing::info!(user_id = author.0, "rejection text updated");
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Установлено новое сообщение для исключённых:\n\n<i>{}</i>",
                    escape_html(new_text)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Err(Error::TextTooLong { .. }) => {
            bot.send_message(msg.chat.id, "⚠️ Слишком длинный текст. Максимум 200 символов.")
                .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = author.0, "setmessage failed");
            let _ = state.audit.write(AuditEvent::error(author.0, &e.to_string()));
            bot.send_message(msg.chat.id, "⚠️ Не получилось сохранить, попробуй ещё раз.")
                .await?;
        }
    }
    Ok(())
}

async fn cmd_reset_message(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    author: UserId,
) -> ResponseResult<()> {
    match state.service.registry().reset(author).await {
        Ok(()) => {
            let _ = state.audit.write(AuditEvent::override_change(author.0, "reset"));
            tracing::info!(user_id = author.0, "rejection text reset");
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Сообщение сброшено на стандартное:\n\n<i>{}</i>",
                    escape_html(DEFAULT_REJECTION_TEXT)
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = author.0, "resetmessage failed");
            let _ = state.audit.write(AuditEvent::error(author.0, &e.to_string()));
            bot.send_message(msg.chat.id, "⚠️ Не получилось сбросить, попробуй ещё раз.")
                .await?;
        }
    }
    Ok(())
}

async fn cmd_settings(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    author: UserId,
) -> ResponseResult<()> {
    let registry = state.service.registry();
    let (reject_text, is_custom) = match (
        registry.rejection_text(author).await,
        registry.is_custom(author).await,
    ) {
        (Ok(text), Ok(custom)) => (text, custom),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, user_id = author.0, "settings lookup failed");
            bot.send_message(msg.chat.id, "⚠️ Не получилось прочитать настройки.")
                .await?;
            return Ok(());
        }
    };

    let label = if is_custom { "(кастомное)" } else { "(стандартное)" };
    bot.send_message(
        msg.chat.id,
        format!(
            "⚙️ <b>Твои настройки:</b>\n\n\
             <b>Сообщение для исключённых:</b>\n<i>{}</i>\n{label}",
            escape_html(&reject_text)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_strips_bot_mention() {
        assert_eq!(
            parse_command("/setmessage@nfy_bot Не для тебя"),
            ("setmessage".to_string(), "Не для тебя".to_string())
        );
    }

    #[test]
    fn parse_command_without_args() {
        assert_eq!(parse_command("/settings"), ("settings".to_string(), String::new()));
        assert_eq!(
            parse_command("  /ResetMessage  "),
            ("resetmessage".to_string(), String::new())
        );
    }
}
