pub mod replies;

use std::fmt;

/// Kind of conversation a chat represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
    Unknown,
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatKind::Private => write!(f, "private"),
            ChatKind::Group => write!(f, "group"),
            ChatKind::Supergroup => write!(f, "supergroup"),
            ChatKind::Channel => write!(f, "channel"),
            ChatKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A chat as seen by the router, independent of the platform SDK
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInfo {
    pub id: i64,
    pub kind: ChatKind,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// The sender of a message or button press
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// A text message or channel post
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    pub chat: ChatInfo,
    /// Absent for anonymous channel posts
    pub from: Option<UserInfo>,
    pub text: Option<String>,
    /// Origin chat when the message was forwarded from a group or channel
    pub forwarded_from: Option<ChatInfo>,
}

/// An inline keyboard button press
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonPress {
    /// Platform id of the press, needed to acknowledge it
    pub id: String,
    pub data: Option<String>,
    pub from: UserInfo,
    pub chat: ChatInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(MessageEvent),
    ChannelPost(MessageEvent),
    ButtonPress(ButtonPress),
}

/// Text commands the bot answers to. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    GetId,
    Channel,
    Group,
    Help,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Command::Start),
            "/getid" | "/id" => Some(Command::GetId),
            "/channel" => Some(Command::Channel),
            "/group" => Some(Command::Group),
            "/help" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Callback data carried by the welcome keyboard buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonToken {
    GetId,
    ChannelGuide,
    GroupGuide,
}

impl ButtonToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonToken::GetId => "cmd_getid",
            ButtonToken::ChannelGuide => "cmd_channel",
            ButtonToken::GroupGuide => "cmd_group",
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "cmd_getid" => Some(ButtonToken::GetId),
            "cmd_channel" => Some(ButtonToken::ChannelGuide),
            "cmd_group" => Some(ButtonToken::GroupGuide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: &'static str,
    pub token: ButtonToken,
}

/// Inline keyboard, one inner vec per row
#[derive(Debug, Clone, PartialEq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

/// A reply body, always rendered as Telegram's legacy Markdown
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutboundReply {
    fn markdown(chat_id: i64, text: String) -> Self {
        Self {
            chat_id,
            text: text.trim().to_string(),
            keyboard: None,
        }
    }

    fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Side effects requested alongside a reply
#[derive(Debug, Clone, PartialEq)]
pub enum AuxAction {
    /// Start a keep-alive burst so the host does not idle the process
    ActivateKeepAlive,
    /// Clear the pending state of a pressed button
    AcknowledgePress(String),
}

/// Result of routing one inbound event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub reply: Option<OutboundReply>,
    pub actions: Vec<AuxAction>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    fn reply(reply: OutboundReply) -> Self {
        Self {
            reply: Some(reply),
            actions: Vec::new(),
        }
    }

    fn with_action(mut self, action: AuxAction) -> Self {
        self.actions.push(action);
        self
    }
}

pub fn welcome_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![Button {
                label: "🆔 Get My ID",
                token: ButtonToken::GetId,
            }],
            vec![
                Button {
                    label: "📢 Channel ID Guide",
                    token: ButtonToken::ChannelGuide,
                },
                Button {
                    label: "👥 Group ID Guide",
                    token: ButtonToken::GroupGuide,
                },
            ],
        ],
    }
}

/// Classify an event and decide what to answer.
///
/// Rules are tried in order and the first match wins: text commands, then
/// channel posts, then forwarded messages. Anything else is ignored so the
/// bot stays quiet in busy groups. Button presses are always acknowledged,
/// even when their token is unknown.
pub fn route(event: &InboundEvent) -> Outcome {
    match event {
        InboundEvent::Message(msg) => route_message(msg, false),
        InboundEvent::ChannelPost(post) => route_message(post, true),
        InboundEvent::ButtonPress(press) => route_press(press),
    }
}

fn route_message(msg: &MessageEvent, channel_post: bool) -> Outcome {
    if let Some(command) = msg.text.as_deref().and_then(Command::parse) {
        return command_outcome(command, msg);
    }

    if channel_post {
        return Outcome::reply(OutboundReply::markdown(
            msg.chat.id,
            replies::channel_post(&msg.chat),
        ));
    }

    match &msg.forwarded_from {
        Some(origin) => Outcome::reply(OutboundReply::markdown(
            msg.chat.id,
            replies::forwarded_detected(origin),
        )),
        None => Outcome::none(),
    }
}

fn command_outcome(command: Command, msg: &MessageEvent) -> Outcome {
    let chat_id = msg.chat.id;
    match command {
        Command::Start => Outcome::reply(
            OutboundReply::markdown(chat_id, replies::welcome()).with_keyboard(welcome_keyboard()),
        )
        .with_action(AuxAction::ActivateKeepAlive),
        Command::GetId => {
            let text = match &msg.forwarded_from {
                Some(origin) => replies::forwarded_chat(origin),
                None => replies::identity(msg.from.as_ref(), &msg.chat),
            };
            Outcome::reply(OutboundReply::markdown(chat_id, text))
        }
        Command::Channel => Outcome::reply(OutboundReply::markdown(chat_id, replies::channel_guide())),
        Command::Group => Outcome::reply(OutboundReply::markdown(chat_id, replies::group_guide())),
        Command::Help => Outcome::reply(OutboundReply::markdown(chat_id, replies::help())),
    }
}

fn route_press(press: &ButtonPress) -> Outcome {
    let chat_id = press.chat.id;
    let reply = press
        .data
        .as_deref()
        .and_then(ButtonToken::parse)
        .map(|token| {
            let text = match token {
                ButtonToken::GetId => replies::button_identity(&press.from, &press.chat),
                ButtonToken::ChannelGuide => replies::channel_guide(),
                ButtonToken::GroupGuide => replies::group_guide(),
            };
            OutboundReply::markdown(chat_id, text)
        });

    Outcome {
        reply,
        actions: vec![AuxAction::AcknowledgePress(press.id.clone())],
    }
}
