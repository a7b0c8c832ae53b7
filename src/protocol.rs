//! Boundary types for the chat service.
//!
//! Inbound text and callback payloads are decoded here, exactly once, into
//! typed values; malformed callback payloads are rejected explicitly
//! instead of being string-matched deeper in the core. The outcome enums
//! returned by the core operations live here too, together with their
//! user-facing rendering.

use thiserror::Error;

use crate::state::UserHandle;

/// Greeting sent in reply to `/start`.
pub const GREETING: &str = "🔒 Anonymous Chat Bot\n\
    Use /connect to start chatting!\n\
    /disconnect to leave your chat\n\
    /reveal to request identity disclosure\n\
    /invite to get the group link";

/// Sent to the waiting partner when a pairing is made.
pub const PARTNER_CONNECTED: &str = "✅ Connected! Chat anonymously now!";

/// Sent to the remaining partner when the other side disconnects.
pub const PARTNER_DISCONNECTED: &str = "🚪 Partner disconnected";

/// Approval prompt shown to the target of a reveal request.
pub const REVEAL_PROMPT: &str = "🔓 Your partner wants to reveal their identity. Allow?";

/// Sent to the requester when the target declines a reveal.
pub const REVEAL_DECLINED: &str = "❌ Partner declined identity reveal";

/// Sent to a waiter evicted by the timeout sweep.
pub const TIMEOUT_NOTICE: &str = "⏰ Connection timeout. Use /connect to try again";

/// Message disclosing a partner's display name after an accepted reveal.
pub fn partner_name_notice(name: &str) -> String {
    format!("👤 Partner's name: {name}")
}

/// A bot command extracted from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Connect,
    Disconnect,
    Reveal,
    /// `/broadcast <text>`; the payload may be empty.
    Broadcast(String),
    Invite,
}

/// Classification of an inbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A recognized command.
    Command(Command),
    /// Slash-prefixed but not a command we know. Never relayed.
    UnknownCommand,
    /// Plain text, to be relayed to the sender's partner.
    Text(String),
}

impl Inbound {
    /// Classify a message body as a command, an unknown command, or plain
    /// relayable text.
    pub fn classify(text: &str) -> Inbound {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return Inbound::Text(text.to_string());
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let word = parts.next().unwrap_or("");
        let payload = parts.next().unwrap_or("").trim();

        // Clients append "@BotName" to commands issued in group chats.
        let name = word.trim_start_matches('/');
        let name = name.split('@').next().unwrap_or(name);

        let command = match name {
            "start" => Command::Start,
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "reveal" => Command::Reveal,
            "broadcast" => Command::Broadcast(payload.to_string()),
            "invite" => Command::Invite,
            _ => return Inbound::UnknownCommand,
        };
        Inbound::Command(command)
    }
}

/// The target's answer to a reveal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealDecision {
    Accept,
    Decline,
}

/// Error for callback payloads that do not decode to a known action.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed callback payload")]
pub struct MalformedCallback;

/// A decoded inline-button payload.
///
/// The reveal variants carry the `(requester, target)` binding of the
/// pairing that spawned the prompt; resolution re-validates that binding
/// against the live registry, so a replayed or forged payload can at worst
/// resolve to a stale outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Reveal {
        decision: RevealDecision,
        requester: UserHandle,
        target: UserHandle,
    },
    /// Re-enter the matchmaking queue after a timeout eviction.
    RetryConnect,
}

impl CallbackAction {
    /// Encode as callback data. The platform caps callback payloads at 64
    /// bytes, which two decimal i64 handles fit comfortably.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Reveal {
                decision,
                requester,
                target,
            } => {
                let kind = match decision {
                    RevealDecision::Accept => "accept",
                    RevealDecision::Decline => "decline",
                };
                format!("reveal:{kind}:{requester}:{target}")
            }
            CallbackAction::RetryConnect => "retry".to_string(),
        }
    }

    /// Decode callback data, rejecting anything that is not a complete,
    /// well-formed action.
    pub fn parse(data: &str) -> Result<CallbackAction, MalformedCallback> {
        if data == "retry" {
            return Ok(CallbackAction::RetryConnect);
        }

        let mut parts = data.split(':');
        match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some("reveal"), Some(kind), Some(requester), Some(target), None) => {
                let decision = match kind {
                    "accept" => RevealDecision::Accept,
                    "decline" => RevealDecision::Decline,
                    _ => return Err(MalformedCallback),
                };
                let requester = requester.parse::<i64>().map_err(|_| MalformedCallback)?;
                let target = target.parse::<i64>().map_err(|_| MalformedCallback)?;
                Ok(CallbackAction::Reveal {
                    decision,
                    requester: UserHandle(requester),
                    target: UserHandle(target),
                })
            }
            _ => Err(MalformedCallback),
        }
    }
}

/// Outcome of a connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Paired with the user who was waiting.
    Paired(UserHandle),
    /// Nobody was waiting; the caller now occupies the slot.
    Searching,
    AlreadyInChat,
    AlreadyWaiting,
}

impl ConnectOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            ConnectOutcome::Paired(_) => "✅ Connected! Start chatting!",
            ConnectOutcome::Searching => "🔍 Searching for a partner...",
            ConnectOutcome::AlreadyInChat => "⚠️ You're already in a chat! Use /disconnect first.",
            ConnectOutcome::AlreadyWaiting => "⏳ Already searching for a partner...",
        }
    }
}

/// Outcome of a disconnect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Disconnected(UserHandle),
    NotInChat,
}

impl DisconnectOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            DisconnectOutcome::Disconnected(_) => "✅ Disconnected successfully",
            DisconnectOutcome::NotInChat => "❌ You're not in an active chat",
        }
    }
}

/// Outcome of relaying a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    NotInChat,
    /// The partner was unreachable; the pairing has been torn down.
    DeliveryFailed,
}

impl RelayOutcome {
    /// Reply for the sender. Successful relays are silent.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            RelayOutcome::Delivered => None,
            RelayOutcome::NotInChat => Some("❌ You're not connected. Use /connect first"),
            RelayOutcome::DeliveryFailed => {
                Some("❌ Message failed to send. The chat has been closed.")
            }
        }
    }
}

/// Outcome of a reveal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The approval prompt reached the partner.
    Requested,
    NotInChat,
    /// The prompt could not be delivered; the request stays pending and
    /// may simply be retried.
    PromptUndeliverable,
}

impl RevealOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            RevealOutcome::Requested => "⏳ Reveal request sent...",
            RevealOutcome::NotInChat => "❌ You're not in a chat",
            RevealOutcome::PromptUndeliverable => "❌ Failed to send request",
        }
    }
}

/// Outcome of resolving a reveal prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Accepted,
    Declined,
    /// The pairing behind the request changed before the answer arrived.
    /// No identity was disclosed.
    Stale,
}

impl ResolveOutcome {
    /// Replacement text for the prompt message after resolution.
    pub fn prompt_edit(&self) -> &'static str {
        match self {
            ResolveOutcome::Accepted => "✅ Identity shared",
            ResolveOutcome::Declined => "🚫 Request declined",
            ResolveOutcome::Stale => "⌛ This request is no longer valid",
        }
    }
}

/// Outcome of an operator broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Sent { delivered: usize, failed: usize },
    Forbidden,
    /// `/broadcast` with no payload.
    Empty,
}

impl BroadcastOutcome {
    pub fn notice(&self) -> String {
        match self {
            BroadcastOutcome::Sent { delivered, failed } => {
                format!("✅ Broadcast delivered to {delivered} users ({failed} failed)")
            }
            BroadcastOutcome::Forbidden => "⛔ Admin only command!".to_string(),
            BroadcastOutcome::Empty => "Usage: /broadcast <message>".to_string(),
        }
    }
}

/// Outcome of an invite-link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteOutcome {
    Link(String),
    NotConfigured,
    Unavailable,
}

impl InviteOutcome {
    pub fn notice(&self) -> String {
        match self {
            InviteOutcome::Link(link) => {
                format!("👥 Join our community:\n{link}\nShare this link to invite friends!")
            }
            InviteOutcome::NotConfigured => "❌ Group chat not configured".to_string(),
            InviteOutcome::Unavailable => "❌ Failed to generate invite link".to_string(),
        }
    }
}
