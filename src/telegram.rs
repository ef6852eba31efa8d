//! [`MemberDirectory`] backed by the Telegram Bot API.
//!
//! The Bot API only lists a chat's administrators, so that is the roster this adapter
//! enumerates; the member count comes from `getChatMemberCount`. Invite slugs cannot be
//! looked up by a bot and come back as not found.
use crate::directory::{MemberDirectory, MemberStream};
use crate::error::{AccessDeniedReason, PlatformError};
use crate::resolver::EntityReference;
use crate::types::{EntityId, EntityMetadata, MemberProfile};
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use teloxide::prelude::*;
use teloxide::types::{ChatMember, Recipient};
use teloxide::{ApiError, RequestError};
use tracing::debug;

#[derive(Clone)]
pub struct TelegramDirectory {
    bot: Bot,
}

impl TelegramDirectory {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }
}

#[async_trait]
impl MemberDirectory for TelegramDirectory {
    async fn lookup_entity(
        &self,
        reference: &EntityReference,
    ) -> Result<EntityMetadata, PlatformError> {
        let chat = self
            .bot
            .get_chat(recipient_for(reference))
            .await
            .map_err(map_request_error)?;
        let total = self
            .bot
            .get_chat_member_count(chat.id)
            .await
            .map_err(map_request_error)?;
        let display_name = chat
            .title()
            .or_else(|| chat.username())
            .unwrap_or_default()
            .to_string();
        debug!(chat = chat.id.0, total, "looked up chat");
        Ok(EntityMetadata {
            id: EntityId(chat.id.0),
            display_name,
            reported_total: u64::from(total),
        })
    }

    fn iterate_members(&self, entity: EntityId, cap: usize) -> MemberStream<'_> {
        let chat_id = ChatId(entity.0);
        let bot = self.bot.clone();
        stream::once(async move { bot.get_chat_administrators(chat_id).await })
            .flat_map(|res| match res {
                Ok(admins) => {
                    stream::iter(admins.into_iter().map(Ok::<ChatMember, PlatformError>))
                        .left_stream()
                }
                Err(e) => stream::once(future::ready(Err(map_request_error(e)))).right_stream(),
            })
            .take(cap)
            .then(move |item| async move {
                match item {
                    Ok(member) => self.profile_of(member).await,
                    Err(e) => Err(e),
                }
            })
            .boxed()
    }
}

impl TelegramDirectory {
    async fn profile_of(&self, member: ChatMember) -> Result<MemberProfile, PlatformError> {
        let user = member.user;
        // Bots short-circuit classification, so their photos are never needed.
        let has_photo = if user.is_bot {
            false
        } else {
            self.bot
                .get_user_profile_photos(user.id)
                .await
                .map_err(map_request_error)?
                .total_count
                > 0
        };
        Ok(MemberProfile {
            is_bot: user.is_bot,
            has_photo,
            username: user.username,
            first_name: Some(user.first_name),
            last_name: user.last_name,
        })
    }
}

fn recipient_for(reference: &EntityReference) -> Recipient {
    match reference.as_numeric() {
        Some(id) => Recipient::Id(ChatId(id)),
        None => Recipient::ChannelUsername(format!("@{reference}")),
    }
}

/// Translate a Bot API failure into the directory's error vocabulary.
fn map_request_error(err: RequestError) -> PlatformError {
    match err {
        RequestError::Api(ApiError::ChatNotFound) => {
            PlatformError::NotFound("chat not found".to_string())
        }
        RequestError::Api(ApiError::BotKicked | ApiError::BotKickedFromSupergroup) => {
            PlatformError::AccessDenied(AccessDeniedReason::NotParticipant)
        }
        RequestError::Api(ApiError::Unknown(msg)) => map_api_message(&msg),
        other => PlatformError::Transport(other.to_string()),
    }
}

fn map_api_message(msg: &str) -> PlatformError {
    let lower = msg.to_ascii_lowercase();
    if lower.contains("not a member") || lower.contains("not participant") {
        PlatformError::AccessDenied(AccessDeniedReason::NotParticipant)
    } else if lower.contains("admin") || lower.contains("not enough rights") {
        PlatformError::AccessDenied(AccessDeniedReason::AdminRequired)
    } else if lower.contains("inaccessible") || lower.contains("private") {
        PlatformError::AccessDenied(AccessDeniedReason::PrivateRoster)
    } else if lower.contains("not found") || lower.contains("invalid") {
        PlatformError::NotFound(msg.to_string())
    } else {
        PlatformError::Transport(msg.to_string())
    }
}
