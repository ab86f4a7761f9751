use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, Chat, InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage,
    MessageOrigin, ParseMode, User,
};
use teloxide::RequestError;
use tracing::{debug, info, warn};

use crate::platform::{handle_event, Gateway, GatewayError, KeepAliveTrigger};
use crate::router::{
    ButtonPress, ChatInfo, ChatKind, InboundEvent, Keyboard, MessageEvent, OutboundReply,
    UserInfo,
};

// Replies are written for legacy Markdown, not MarkdownV2
#[allow(deprecated)]
const REPLY_PARSE_MODE: ParseMode = ParseMode::Markdown;

impl From<RequestError> for GatewayError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(api) => GatewayError::Rejected(api.to_string()),
            other => GatewayError::Transport(other.to_string()),
        }
    }
}

/// Sends replies through the Telegram Bot API
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send(&self, reply: &OutboundReply) -> Result<(), GatewayError> {
        let mut request = self
            .bot
            .send_message(ChatId(reply.chat_id), reply.text.clone())
            .parse_mode(REPLY_PARSE_MODE);
        if let Some(keyboard) = &reply.keyboard {
            request = request.reply_markup(inline_keyboard(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn acknowledge(&self, press_id: &str) -> Result<(), GatewayError> {
        self.bot
            .answer_callback_query(CallbackQueryId(press_id.to_string()))
            .await?;
        Ok(())
    }
}

fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.token.as_str()))
            .collect::<Vec<_>>()
    }))
}

fn chat_info(chat: &Chat) -> ChatInfo {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Unknown
    };

    ChatInfo {
        id: chat.id.0,
        kind,
        title: chat.title().map(str::to_string),
        username: chat.username().map(str::to_string),
    }
}

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id.0,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Origin chat of a message forwarded from a group or channel.
/// Messages forwarded from users carry no chat and yield `None`.
fn forwarded_chat(msg: &Message) -> Option<ChatInfo> {
    match msg.forward_origin()? {
        MessageOrigin::Chat { sender_chat, .. } => Some(chat_info(sender_chat)),
        MessageOrigin::Channel { chat, .. } => Some(chat_info(chat)),
        MessageOrigin::User { .. } | MessageOrigin::HiddenUser { .. } => None,
    }
}

pub fn message_event(msg: &Message) -> MessageEvent {
    MessageEvent {
        chat: chat_info(&msg.chat),
        from: msg.from.as_ref().map(user_info),
        text: msg.text().map(str::to_string),
        forwarded_from: forwarded_chat(msg),
    }
}

pub fn button_press(query: &CallbackQuery) -> ButtonPress {
    let chat = match &query.message {
        Some(MaybeInaccessibleMessage::Regular(msg)) => chat_info(&msg.chat),
        Some(MaybeInaccessibleMessage::Inaccessible(msg)) => chat_info(&msg.chat),
        // Inline-mode presses have no message; answer the user directly
        None => ChatInfo {
            id: query.from.id.0 as i64,
            kind: ChatKind::Private,
            title: None,
            username: None,
        },
    };

    ButtonPress {
        id: query.id.to_string(),
        data: query.data.clone(),
        from: user_info(&query.from),
        chat,
    }
}

/// Run the Telegram dispatcher until `shutdown` resolves
pub async fn run<S>(bot: Bot, keep_alive: Arc<dyn KeepAliveTrigger>, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    info!("Starting Telegram platform...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_channel_post().endpoint(on_channel_post))
        .branch(Update::filter_callback_query().endpoint(on_callback_query));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![keep_alive])
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .build();

    let token = dispatcher.shutdown_token();
    let dispatch = dispatcher.dispatch();
    tokio::pin!(dispatch);

    tokio::select! {
        _ = &mut dispatch => {
            info!("Telegram dispatcher stopped");
            return Ok(());
        }
        _ = shutdown => info!("Stopping Telegram dispatcher..."),
    }

    // The dispatcher cannot be asked to stop until it has finished its
    // startup requests; before that, dropping the future is the only way out.
    match token.shutdown() {
        Ok(_) => dispatch.await,
        Err(e) => warn!("Dispatcher still starting, abandoning it: {}", e),
    }
    info!("Telegram dispatcher stopped");

    Ok(())
}

async fn on_message(
    bot: Bot,
    msg: Message,
    keep_alive: Arc<dyn KeepAliveTrigger>,
) -> ResponseResult<()> {
    let event = message_event(&msg);
    info!(
        "Telegram message in chat {} from {:?}: {:?}",
        event.chat.id,
        event.from.as_ref().map(|u| u.id),
        event.text
    );

    handle_event(
        &InboundEvent::Message(event),
        &TelegramGateway::new(bot),
        keep_alive.as_ref(),
    )
    .await;
    Ok(())
}

async fn on_channel_post(
    bot: Bot,
    msg: Message,
    keep_alive: Arc<dyn KeepAliveTrigger>,
) -> ResponseResult<()> {
    let event = message_event(&msg);
    info!("Channel post in {} ({:?})", event.chat.id, event.chat.title);

    handle_event(
        &InboundEvent::ChannelPost(event),
        &TelegramGateway::new(bot),
        keep_alive.as_ref(),
    )
    .await;
    Ok(())
}

async fn on_callback_query(
    bot: Bot,
    query: CallbackQuery,
    keep_alive: Arc<dyn KeepAliveTrigger>,
) -> ResponseResult<()> {
    let press = button_press(&query);
    info!(
        "Button press from {} in chat {}: {:?}",
        press.from.id, press.chat.id, press.data
    );

    handle_event(
        &InboundEvent::ButtonPress(press),
        &TelegramGateway::new(bot),
        keep_alive.as_ref(),
    )
    .await;
    Ok(())
}
