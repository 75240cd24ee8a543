use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InlineQuery, InlineQueryResult,
        InlineQueryResultArticle, InputMessageContent, InputMessageContentText, ParseMode,
    },
};

use nfy_core::{
    domain::UserId,
    formatting,
    parse::ParseError,
    service::{ComposeError, ComposedPreview},
    utils::AuditEvent,
};

use crate::router::AppState;

pub async fn handle_inline_query(
    bot: Bot,
    q: InlineQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let query_text = q.query.trim().to_string();

    if query_text.is_empty() {
        // Empty query: no results, just a pointer to the help text in PM.
        bot.answer_inline_query(q.id, vec![])
            .switch_pm_text("Как пользоваться ботом?")
            .switch_pm_parameter("help")
            .cache_time(5)
            .await?;
        return Ok(());
    }

    let author = UserId(q.from.id.0 as i64);
    match state.service.compose(author, &query_text).await {
        Ok(preview) => {
            let _ = state.audit.write(AuditEvent::compose(
                author.0,
                preview.message.token.as_str(),
                preview.message.excluded.len(),
            ));
            tracing::info!(
                user_id = author.0,
                token = preview.message.token.as_str(),
                excluded = preview.message.excluded.len(),
                "inline message composed"
            );

            bot.answer_inline_query(q.id, vec![preview_article(&preview)])
                .cache_time(state.cfg.inline_cache_time)
                .is_personal(true)
                .await?;
        }
        Err(ComposeError::Parse(ParseError::EmptyBody)) => {
            let hint = hint_article(
                "no_text",
                "⚠️ Введи текст сообщения",
                "Формат: сообщение @исключённый1 @исключённый2",
                "Ошибка: пустое сообщение",
            );
            bot.answer_inline_query(q.id, vec![hint]).cache_time(5).await?;
        }
        Err(ComposeError::Parse(ParseError::NoExclusions)) => {
            let hint = hint_article(
                "no_excluded",
                "⚠️ Укажи кого исключить",
                "Добавь @username в конце сообщения",
                "Ошибка: не указаны исключённые",
            );
            bot.answer_inline_query(q.id, vec![hint]).cache_time(5).await?;
        }
        Err(ComposeError::Store(e)) => {
            tracing::error!(error = %e, user_id = author.0, "compose failed");
            let _ = state.audit.write(AuditEvent::error(author.0, &e.to_string()));
            bot.answer_inline_query(q.id, vec![]).cache_time(5).await?;
        }
    }

    Ok(())
}

/// The real preview card: placeholder text goes into the chat, the body stays
/// behind the reveal button.
fn preview_article(preview: &ComposedPreview) -> InlineQueryResult {
    let token = preview.message.token.as_str();

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "👀 Показать сообщение".to_string(),
        format!("show:{token}"),
    )]]);

    let content = InputMessageContent::Text(
        InputMessageContentText::new(formatting::placeholder_html(&preview.message.excluded))
            .parse_mode(ParseMode::Html),
    );

    InlineQueryResult::Article(
        InlineQueryResultArticle::new(token.to_string(), preview.title.clone(), content)
            .description(preview.description.clone())
            .reply_markup(keyboard),
    )
}

fn hint_article(id: &str, title: &str, description: &str, fallback: &str) -> InlineQueryResult {
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(
            id.to_string(),
            title.to_string(),
            InputMessageContent::Text(InputMessageContentText::new(fallback.to_string())),
        )
        .description(description.to_string()),
    )
}
