//! Telegram Bot API transport.
//!
//! This module is the only place that talks to the messaging platform: a
//! thin HTTP client over the Bot API with a long-poll update stream in and
//! message delivery, prompt edits, and chat lookups out. Every request
//! carries a bounded timeout so a slow or blocked recipient can never stall
//! the dispatch loop or the timeout sweep.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::UserHandle;

/// Base URL for the Bot API.
const API_BASE: &str = "https://api.telegram.org";

/// Bound on ordinary API calls (sends, lookups, callback answers).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the server may hold a `getUpdates` long poll open, in seconds.
const POLL_SECS: u64 = 25;

/// Bound on the long-poll request itself; must exceed `POLL_SECS`.
const POLL_TIMEOUT: Duration = Duration::from_secs(POLL_SECS + 10);

/// Errors that can occur while talking to the messaging platform.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API rejected the call: {0}")]
    Api(String),
}

/// One element of the `getUpdates` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// An inbound chat message. Only the fields the dispatcher reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct User {
    pub id: i64,
}

/// An inline-button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
    /// The message the pressed button was attached to, when available.
    #[serde(default)]
    pub message: Option<Message>,
}

/// Inline keyboard attached to an outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

/// Response from `getChat`, used to build a display name for the reveal
/// handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl ChatInfo {
    /// Human-readable name: full name, else username, else a placeholder.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self
                .username
                .clone()
                .unwrap_or_else(|| "Anonymous".to_string()),
        }
    }
}

/// Display information disclosed by an accepted reveal.
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    pub name: String,
}

/// Every Bot API response wraps its payload in this envelope; errors are
/// reported as `ok: false` with a description, on 200 and 4xx alike.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Serialize)]
struct GetUpdatesPayload {
    offset: i64,
    timeout: u64,
}

#[derive(Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackPayload<'a> {
    callback_query_id: &'a str,
}

#[derive(Serialize)]
struct EditMessagePayload<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct ChatIdPayload {
    chat_id: i64,
}

/// The outbound primitives the core needs from the messaging platform.
///
/// The production implementation is [`TelegramClient`]; tests drive the
/// core through a recording fake.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to a user, optionally with inline buttons.
    async fn send(
        &self,
        to: UserHandle,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TransportError>;

    /// Fetch display information for a handle. Used only by the reveal
    /// handshake, after mutual consent.
    async fn display_info(&self, user: UserHandle) -> Result<DisplayInfo, TransportError>;

    /// Export the invite link of the given group chat.
    async fn invite_link(&self, chat_id: i64) -> Result<String, TransportError>;
}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    /// `https://api.telegram.org/bot<token>`; kept out of Debug output.
    base: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new client for the given bot token.
    pub fn new(token: &str) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base: format!("{API_BASE}/bot{token}"),
        })
    }

    async fn call<T, P>(
        &self,
        method: &str,
        payload: &P,
        timeout: Duration,
    ) -> Result<T, TransportError>
    where
        T: serde::de::DeserializeOwned,
        P: Serialize,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| TransportError::Api("empty result".to_string()))
        } else {
            Err(TransportError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Long-poll for updates past `offset`. Blocks up to `POLL_SECS` on the
    /// server side; returns an empty batch on a quiet interval.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdatesPayload {
                offset,
                timeout: POLL_SECS,
            },
            POLL_TIMEOUT,
        )
        .await
    }

    /// Send a text message, optionally with an inline keyboard.
    pub async fn send_message(
        &self,
        to: UserHandle,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        let payload = SendMessagePayload {
            chat_id: to.0,
            text,
            reply_markup: markup,
        };
        self.call::<Message, _>("sendMessage", &payload, REQUEST_TIMEOUT)
            .await
            .map(|_| ())
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.call::<bool, _>(
            "answerCallbackQuery",
            &AnswerCallbackPayload {
                callback_query_id: callback_id,
            },
            REQUEST_TIMEOUT,
        )
        .await
        .map(|_| ())
    }

    /// Replace the text of a previously sent message. Any attached inline
    /// keyboard is dropped with the old text.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        let payload = EditMessagePayload {
            chat_id,
            message_id,
            text,
        };
        // editMessageText returns the edited Message for bot-sent messages
        // and `true` otherwise; we need neither.
        self.call::<serde_json::Value, _>("editMessageText", &payload, REQUEST_TIMEOUT)
            .await
            .map(|_| ())
    }

    /// Fetch chat metadata for a user.
    pub async fn get_chat(&self, user: UserHandle) -> Result<ChatInfo, TransportError> {
        self.call("getChat", &ChatIdPayload { chat_id: user.0 }, REQUEST_TIMEOUT)
            .await
    }

    /// Export a fresh invite link for a group chat.
    pub async fn export_invite_link(&self, chat_id: i64) -> Result<String, TransportError> {
        self.call("exportChatInviteLink", &ChatIdPayload { chat_id }, REQUEST_TIMEOUT)
            .await
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(
        &self,
        to: UserHandle,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TransportError> {
        self.send_message(to, text, markup).await
    }

    async fn display_info(&self, user: UserHandle) -> Result<DisplayInfo, TransportError> {
        let chat = self.get_chat(user).await?;
        Ok(DisplayInfo {
            name: chat.display_name(),
        })
    }

    async fn invite_link(&self, chat_id: i64) -> Result<String, TransportError> {
        self.export_invite_link(chat_id).await
    }
}
