use serenity::builder::{CreateAttachment, CreateEmbed, CreateMessage};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::ChannelId;

pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
pub const STATUS_EMBED_COLOR: u32 = 0x43_B5_81;

/// Send plain text, split on line boundaries to fit Discord's message limit.
///
/// Returns the last message sent.
pub async fn send_text(
    http: &Http,
    channel_id: ChannelId,
    content: &str,
) -> serenity::Result<Option<Message>> {
    let mut last = None;
    for chunk in split_discord_message(content) {
        last = Some(channel_id.say(http, chunk).await?);
    }
    Ok(last)
}

/// Send a PNG as a file attachment.
pub async fn send_png(
    http: &Http,
    channel_id: ChannelId,
    png: Vec<u8>,
    filename: &str,
) -> serenity::Result<Message> {
    let msg = CreateMessage::new().add_file(CreateAttachment::bytes(png, filename));
    channel_id.send_message(http, msg).await
}

/// Send an embed made of inline `(name, value)` fields.
pub async fn send_fields_embed(
    http: &Http,
    channel_id: ChannelId,
    title: &str,
    fields: Vec<(&str, String)>,
) -> serenity::Result<Message> {
    let embed = CreateEmbed::new()
        .title(title)
        .color(STATUS_EMBED_COLOR)
        .fields(fields.into_iter().map(|(name, value)| (name, value, true)));
    channel_id
        .send_message(http, CreateMessage::new().embed(embed))
        .await
}

fn split_discord_message(content: &str) -> Vec<String> {
    if content.chars().count() <= DISCORD_MESSAGE_LIMIT {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for line in content.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > DISCORD_MESSAGE_LIMIT && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        // A single oversized line is hard-split by characters
        if line_len > DISCORD_MESSAGE_LIMIT {
            for ch in line.chars() {
                if current_len == DISCORD_MESSAGE_LIMIT {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
