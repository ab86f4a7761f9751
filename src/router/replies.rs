//! Reply bodies, formatted for Telegram's legacy Markdown.
//!
//! Optional fields are dropped as whole lines. The two exceptions are the
//! forwarded chat title, which falls back to "N/A", and the user's username,
//! which falls back to "not set".

use super::{ChatInfo, UserInfo};

/// Escape characters that legacy Markdown treats as entity delimiters.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn username_or_not_set(user: &UserInfo) -> String {
    match &user.username {
        Some(username) => format!("@{}", escape(username)),
        None => "not set".to_string(),
    }
}

pub fn welcome() -> String {
    r#"
👋 *Welcome to Find ID Bot*

This bot helps you retrieve Telegram IDs for users, groups, and channels.

📋 *Available Commands:*
• `/getid` - Get your User ID and current Chat ID
• `/channel` - How to get a Channel ID
• `/group` - How to get a Group ID

💡 *Quick Tips:*
• Works in private chats, groups, and channels
• No admin rights needed
• Forward messages to get IDs easily
"#
    .trim()
    .to_string()
}

/// Requesting user and current chat. `user` is absent for anonymous channel posts.
pub fn identity(user: Option<&UserInfo>, chat: &ChatInfo) -> String {
    let mut lines = vec!["🆔 *Your Telegram Information*".to_string(), String::new()];

    if let Some(user) = user {
        lines.push("👤 *User Details:*".to_string());
        lines.push(format!("• User ID: `{}`", user.id));
        lines.push(format!("• First Name: {}", escape(&user.first_name)));
        if let Some(last_name) = &user.last_name {
            lines.push(format!("• Last Name: {}", escape(last_name)));
        }
        lines.push(format!("• Username: {}", username_or_not_set(user)));
        lines.push(String::new());
    }

    lines.push("💬 *Chat Details:*".to_string());
    lines.push(format!("• Chat ID: `{}`", chat.id));
    lines.push(format!("• Chat Type: {}", chat.kind));
    if let Some(title) = &chat.title {
        lines.push(format!("• Chat Title: {}", escape(title)));
    }
    lines.push(String::new());
    lines.push(
        "💡 *Tip:* Forward a message from any group or channel, then use /getid to see its ID!"
            .to_string(),
    );

    lines.join("\n").trim().to_string()
}

fn origin_fields(origin: &ChatInfo) -> Vec<String> {
    let mut lines = vec![
        format!("💬 Chat ID: `{}`", origin.id),
        format!("🏷️ Type: {}", origin.kind),
        format!(
            "📛 Title: {}",
            origin.title.as_deref().map(escape).unwrap_or_else(|| "N/A".to_string())
        ),
    ];
    if let Some(username) = &origin.username {
        lines.push(format!("🔗 Username: @{}", escape(username)));
    }
    lines
}

/// Answer to `/getid` sent on a forwarded message
pub fn forwarded_chat(origin: &ChatInfo) -> String {
    let mut lines = vec!["🆔 *Forwarded Chat Information*".to_string(), String::new()];
    lines.extend(origin_fields(origin));
    lines.join("\n").trim().to_string()
}

/// Sent unprompted when a forwarded message arrives without a command
pub fn forwarded_detected(origin: &ChatInfo) -> String {
    let mut lines = vec!["🔍 *Forwarded Chat Detected*".to_string(), String::new()];
    lines.extend(origin_fields(origin));
    lines.join("\n").trim().to_string()
}

pub fn channel_post(channel: &ChatInfo) -> String {
    let mut lines = vec![
        "✅ *Channel ID Detected*".to_string(),
        String::new(),
        format!("📢 Channel ID: `{}`", channel.id),
        format!(
            "📛 Title: {}",
            channel.title.as_deref().map(escape).unwrap_or_else(|| "N/A".to_string())
        ),
    ];
    if let Some(username) = &channel.username {
        lines.push(format!("🔗 Username: @{}", escape(username)));
    }
    lines.join("\n").trim().to_string()
}

/// Compact identity sent for the "Get My ID" button
pub fn button_identity(user: &UserInfo, chat: &ChatInfo) -> String {
    format!(
        "🆔 *Your Telegram Information*\n\n\
         👤 User ID: `{}`\n\
         💬 Chat ID: `{}`\n\
         📛 Username: {}\n\n\
         💡 Send /getid in any chat to get its ID!",
        user.id,
        chat.id,
        username_or_not_set(user)
    )
    .trim()
    .to_string()
}

pub fn channel_guide() -> String {
    r#"
📢 *How to Get a Channel ID*

*For Public Channels:*
1️⃣ Open the channel you want
2️⃣ Forward ANY post from that channel to this bot
3️⃣ Send `/getid` command

*For Private Channels:*
1️⃣ You must be a member or admin
2️⃣ Forward ANY post from the channel to this bot
3️⃣ Send `/getid` command

⚠️ *Important Notes:*
• Channel links or usernames alone will NOT work
• You must forward an actual message/post
• No admin rights required
• Forwarding must be enabled in the channel

✅ *Try it now:* Forward a channel post to me and use /getid
"#
    .trim()
    .to_string()
}

pub fn group_guide() -> String {
    r#"
👥 *How to Get a Group ID*

*Method 1: Using /getid in the Group*
1️⃣ Add this bot to the group
2️⃣ Send `/getid` command in the group
3️⃣ Bot will reply with the Group ID

*Method 2: Forwarding a Message*
1️⃣ Forward ANY message from the group to this bot (in private chat)
2️⃣ Send `/getid` command
3️⃣ Bot will show the Group ID

⚠️ *Important Notes:*
• Group invite links alone will NOT work
• You must be a member of the group
• No admin rights required
• Forwarding must be enabled in the group

✅ *Try it now:* Forward a group message to me and use /getid
"#
    .trim()
    .to_string()
}

pub fn help() -> String {
    r#"
ℹ️ *Find ID Bot Help*

• `/start` - Show the welcome message
• `/getid` or `/id` - Get your User ID and current Chat ID
• `/channel` - How to get a Channel ID
• `/group` - How to get a Group ID
• `/help` - Show this help

💡 Forward any message from a channel or group and I'll show its ID right away.
"#
    .trim()
    .to_string()
}
