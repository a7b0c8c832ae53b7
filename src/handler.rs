//! Chat service operations.
//!
//! `ChatHandler` implements matchmaking, relay, the reveal handshake, the
//! timeout sweep, and operator broadcast on top of the session registry.
//! Each operation makes a single atomic registry transition and only then
//! attempts its best-effort notifications, outside the critical section, so
//! a slow or unreachable recipient can never block another user's command
//! or roll back committed state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::protocol::{
    partner_name_notice, BroadcastOutcome, CallbackAction, ConnectOutcome, DisconnectOutcome,
    InviteOutcome, RelayOutcome, ResolveOutcome, RevealDecision, RevealOutcome,
    PARTNER_CONNECTED, PARTNER_DISCONNECTED, REVEAL_DECLINED, REVEAL_PROMPT, TIMEOUT_NOTICE,
};
use crate::state::{EnqueueOutcome, PairOutcome, Registry, UserHandle};
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, Transport};

/// The chat service: registry plus transport.
pub struct ChatHandler<T> {
    registry: Arc<Registry>,
    transport: Arc<T>,
    /// The one handle allowed to broadcast. `None` means nobody is.
    admin: Option<UserHandle>,
    /// Community group whose invite link `/invite` hands out.
    group_chat: Option<i64>,
    /// How long a waiter may occupy the slot before the sweep evicts them.
    connect_timeout: Duration,
}

impl<T> Clone for ChatHandler<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
            admin: self.admin,
            group_chat: self.group_chat,
            connect_timeout: self.connect_timeout,
        }
    }
}

impl<T: Transport> ChatHandler<T> {
    pub fn new(
        registry: Arc<Registry>,
        transport: Arc<T>,
        admin: Option<UserHandle>,
        group_chat: Option<i64>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            admin,
            group_chat,
            connect_timeout,
        }
    }

    /// Record that a user exists, for broadcast fan-out. Idempotent.
    pub fn register(&self, user: UserHandle) {
        self.registry.register(user);
    }

    /// Enter the matchmaking queue: pair with the current waiter if there
    /// is one, otherwise become the waiter.
    pub async fn connect(&self, user: UserHandle) -> ConnectOutcome {
        self.registry.register(user);

        match self.registry.try_pair_with_waiting(user) {
            PairOutcome::AlreadyPaired => ConnectOutcome::AlreadyInChat,
            PairOutcome::Paired(partner) => {
                info!(%user, %partner, "paired");
                if let Err(error) = self.transport.send(partner, PARTNER_CONNECTED, None).await {
                    warn!(%partner, %error, "pairing notice undeliverable");
                }
                ConnectOutcome::Paired(partner)
            }
            PairOutcome::SlotEmpty => {
                match self.registry.try_enqueue_waiting(user, Instant::now()) {
                    EnqueueOutcome::Enqueued => {
                        debug!(%user, "waiting for a partner");
                        ConnectOutcome::Searching
                    }
                    EnqueueOutcome::AlreadyWaiting => ConnectOutcome::AlreadyWaiting,
                    EnqueueOutcome::AlreadyPaired => ConnectOutcome::AlreadyInChat,
                }
            }
        }
    }

    /// Leave the current chat. The partner is notified best-effort; a
    /// failed notice never resurrects the pairing.
    pub async fn disconnect(&self, user: UserHandle) -> DisconnectOutcome {
        match self.registry.disconnect(user) {
            Some(partner) => {
                info!(%user, %partner, "disconnected");
                if let Err(error) = self
                    .transport
                    .send(partner, PARTNER_DISCONNECTED, None)
                    .await
                {
                    warn!(%partner, %error, "disconnect notice undeliverable");
                }
                DisconnectOutcome::Disconnected(partner)
            }
            None => DisconnectOutcome::NotInChat,
        }
    }

    /// Forward a text message to the sender's partner. Delivery is
    /// at-most-once; an unreachable partner is treated as a fatal session
    /// fault and the pairing is torn down symmetrically.
    pub async fn relay(&self, sender: UserHandle, text: &str) -> RelayOutcome {
        let Some(partner) = self.registry.partner_of(sender) else {
            return RelayOutcome::NotInChat;
        };

        match self
            .transport
            .send(partner, &format!("💬 {text}"), None)
            .await
        {
            Ok(()) => RelayOutcome::Delivered,
            Err(error) => {
                warn!(%sender, %partner, %error, "relay failed, tearing the pairing down");
                self.disconnect(sender).await;
                RelayOutcome::DeliveryFailed
            }
        }
    }

    /// Ask the partner for permission to disclose identities. The approval
    /// prompt carries the `(requester, target)` binding that resolution
    /// will re-validate.
    pub async fn request_reveal(&self, requester: UserHandle) -> RevealOutcome {
        let Some(target) = self.registry.begin_reveal(requester) else {
            return RevealOutcome::NotInChat;
        };

        let markup = reveal_keyboard(requester, target);
        match self
            .transport
            .send(target, REVEAL_PROMPT, Some(&markup))
            .await
        {
            Ok(()) => {
                info!(%requester, %target, "reveal requested");
                RevealOutcome::Requested
            }
            Err(error) => {
                warn!(%requester, %target, %error, "reveal prompt undeliverable");
                RevealOutcome::PromptUndeliverable
            }
        }
    }

    /// Resolve a reveal prompt. Valid only when the responder is the
    /// prompted target, the request is still pending, and the pairing that
    /// spawned it is still intact; anything else is `Stale` and discloses
    /// nothing. A responder other than the target does not consume the
    /// pending request.
    pub async fn resolve_reveal(
        &self,
        responder: UserHandle,
        requester: UserHandle,
        target: UserHandle,
        decision: RevealDecision,
    ) -> ResolveOutcome {
        if responder != target || !self.registry.resolve_reveal(requester, target) {
            debug!(%responder, %requester, %target, "stale reveal resolution");
            return ResolveOutcome::Stale;
        }

        match decision {
            RevealDecision::Accept => {
                info!(%requester, %target, "reveal accepted");
                self.disclose(requester, target).await;
                self.disclose(target, requester).await;
                ResolveOutcome::Accepted
            }
            RevealDecision::Decline => {
                info!(%requester, %target, "reveal declined");
                if let Err(error) = self.transport.send(requester, REVEAL_DECLINED, None).await {
                    warn!(%requester, %error, "decline notice undeliverable");
                }
                ResolveOutcome::Declined
            }
        }
    }

    /// Send `who`'s display name to `recipient`. Lookup and delivery
    /// failures are logged and swallowed; the reveal is already resolved.
    async fn disclose(&self, who: UserHandle, recipient: UserHandle) {
        match self.transport.display_info(who).await {
            Ok(info) => {
                if let Err(error) = self
                    .transport
                    .send(recipient, &partner_name_notice(&info.name), None)
                    .await
                {
                    warn!(%recipient, %error, "name disclosure undeliverable");
                }
            }
            Err(error) => warn!(%who, %error, "display info lookup failed"),
        }
    }

    /// One pass of the timeout sweep: evict the waiter if they have been
    /// in the slot longer than the connection timeout, and offer them a
    /// retry button. A tick that finds no stale waiter is a no-op.
    pub async fn sweep_tick(&self) -> Option<UserHandle> {
        let user = self
            .registry
            .evict_waiting_if_stale(Instant::now(), self.connect_timeout)?;

        info!(%user, "evicted stale waiter");
        let markup = retry_keyboard();
        if let Err(error) = self
            .transport
            .send(user, TIMEOUT_NOTICE, Some(&markup))
            .await
        {
            warn!(%user, %error, "timeout notice undeliverable");
        }
        Some(user)
    }

    /// Fan an operator message out to every known user. Authorization is
    /// checked before any delivery; per-recipient failures are counted and
    /// skipped, never aborting the batch.
    pub async fn broadcast(&self, operator: UserHandle, text: &str) -> BroadcastOutcome {
        if self.admin != Some(operator) {
            warn!(%operator, "broadcast rejected");
            return BroadcastOutcome::Forbidden;
        }
        if text.trim().is_empty() {
            return BroadcastOutcome::Empty;
        }

        let body = format!("📢 Admin broadcast: {text}");
        let mut delivered = 0;
        let mut failed = 0;
        for user in self.registry.known_users() {
            match self.transport.send(user, &body, None).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    failed += 1;
                    debug!(%user, %error, "broadcast delivery failed");
                }
            }
        }

        info!(delivered, failed, "broadcast complete");
        BroadcastOutcome::Sent { delivered, failed }
    }

    /// Hand out the community group's invite link.
    pub async fn invite(&self) -> InviteOutcome {
        let Some(group) = self.group_chat else {
            return InviteOutcome::NotConfigured;
        };
        match self.transport.invite_link(group).await {
            Ok(link) => InviteOutcome::Link(link),
            Err(error) => {
                warn!(%error, "invite link export failed");
                InviteOutcome::Unavailable
            }
        }
    }
}

fn reveal_keyboard(requester: UserHandle, target: UserHandle) -> InlineKeyboardMarkup {
    let accept = CallbackAction::Reveal {
        decision: RevealDecision::Accept,
        requester,
        target,
    };
    let decline = CallbackAction::Reveal {
        decision: RevealDecision::Decline,
        requester,
        target,
    };
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton {
                text: "Accept ✅".to_string(),
                callback_data: accept.encode(),
            },
            InlineKeyboardButton {
                text: "Decline ❌".to_string(),
                callback_data: decline.encode(),
            },
        ]],
    }
}

fn retry_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: "🔄 Retry".to_string(),
            callback_data: CallbackAction::RetryConnect.encode(),
        }]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::telegram::{DisplayInfo, TransportError};

    const A: UserHandle = UserHandle(1);
    const B: UserHandle = UserHandle(2);
    const C: UserHandle = UserHandle(3);
    const ADMIN: UserHandle = UserHandle(99);
    const GROUP: i64 = -1000;

    #[derive(Debug)]
    struct Sent {
        to: UserHandle,
        text: String,
        has_buttons: bool,
    }

    /// Transport fake that records every delivery and can be told to fail
    /// for specific recipients.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Sent>>,
        unreachable: Mutex<HashSet<UserHandle>>,
        names: Mutex<HashMap<UserHandle, String>>,
    }

    impl RecordingTransport {
        fn mark_unreachable(&self, user: UserHandle) {
            self.unreachable.lock().insert(user);
        }

        fn set_name(&self, user: UserHandle, name: &str) {
            self.names.lock().insert(user, name.to_string());
        }

        fn texts_to(&self, user: UserHandle) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .filter(|s| s.to == user)
                .map(|s| s.text.clone())
                .collect()
        }

        fn last_to(&self, user: UserHandle) -> Option<(String, bool)> {
            self.sent
                .lock()
                .iter()
                .rev()
                .find(|s| s.to == user)
                .map(|s| (s.text.clone(), s.has_buttons))
        }

        fn nothing_mentions(&self, needle: &str) -> bool {
            !self.sent.lock().iter().any(|s| s.text.contains(needle))
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            to: UserHandle,
            text: &str,
            markup: Option<&InlineKeyboardMarkup>,
        ) -> Result<(), TransportError> {
            if self.unreachable.lock().contains(&to) {
                return Err(TransportError::Api("recipient unreachable".to_string()));
            }
            self.sent.lock().push(Sent {
                to,
                text: text.to_string(),
                has_buttons: markup.is_some(),
            });
            Ok(())
        }

        async fn display_info(&self, user: UserHandle) -> Result<DisplayInfo, TransportError> {
            self.names
                .lock()
                .get(&user)
                .cloned()
                .map(|name| DisplayInfo { name })
                .ok_or_else(|| TransportError::Api("no display info".to_string()))
        }

        async fn invite_link(&self, _chat_id: i64) -> Result<String, TransportError> {
            Ok("https://t.me/+veil".to_string())
        }
    }

    fn setup() -> (
        ChatHandler<RecordingTransport>,
        Arc<Registry>,
        Arc<RecordingTransport>,
    ) {
        let registry = Arc::new(Registry::new());
        let transport = Arc::new(RecordingTransport::default());
        let handler = ChatHandler::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            Some(ADMIN),
            Some(GROUP),
            Duration::from_secs(45),
        );
        (handler, registry, transport)
    }

    async fn pair(handler: &ChatHandler<RecordingTransport>) {
        assert_eq!(handler.connect(A).await, ConnectOutcome::Searching);
        assert_eq!(handler.connect(B).await, ConnectOutcome::Paired(A));
    }

    #[tokio::test]
    async fn first_connect_waits_second_pairs() {
        let (handler, registry, transport) = setup();

        assert_eq!(handler.connect(A).await, ConnectOutcome::Searching);
        assert!(registry.is_waiting(A));

        assert_eq!(handler.connect(B).await, ConnectOutcome::Paired(A));
        assert!(!registry.is_waiting(A));
        assert_eq!(registry.partner_of(A), Some(B));
        assert_eq!(registry.partner_of(B), Some(A));
        assert_eq!(
            transport.texts_to(A),
            vec![PARTNER_CONNECTED.to_string()],
            "the waiter is told about the pairing"
        );
    }

    #[tokio::test]
    async fn reconnect_while_waiting_is_idempotent() {
        let (handler, registry, _transport) = setup();

        handler.connect(A).await;
        assert_eq!(handler.connect(A).await, ConnectOutcome::AlreadyWaiting);
        assert_eq!(handler.connect(A).await, ConnectOutcome::AlreadyWaiting);
        assert!(registry.is_waiting(A));
    }

    #[tokio::test]
    async fn connect_while_paired_is_rejected() {
        let (handler, _registry, _transport) = setup();

        pair(&handler).await;
        assert_eq!(handler.connect(A).await, ConnectOutcome::AlreadyInChat);
        assert_eq!(handler.connect(B).await, ConnectOutcome::AlreadyInChat);
    }

    #[tokio::test]
    async fn relay_reaches_the_partner_and_disconnect_notifies() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;

        assert_eq!(handler.relay(A, "hi").await, RelayOutcome::Delivered);
        assert_eq!(transport.texts_to(B), vec!["💬 hi".to_string()]);

        assert_eq!(
            handler.disconnect(B).await,
            DisconnectOutcome::Disconnected(A)
        );
        assert!(transport
            .texts_to(A)
            .contains(&PARTNER_DISCONNECTED.to_string()));
        assert_eq!(registry.partner_of(A), None);
        assert_eq!(registry.partner_of(B), None);

        assert_eq!(handler.disconnect(B).await, DisconnectOutcome::NotInChat);
    }

    #[tokio::test]
    async fn relay_without_a_partner_is_rejected() {
        let (handler, _registry, _transport) = setup();
        assert_eq!(handler.relay(A, "hi").await, RelayOutcome::NotInChat);
    }

    #[tokio::test]
    async fn relay_failure_tears_the_pairing_down() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;

        transport.mark_unreachable(B);
        assert_eq!(handler.relay(A, "hi").await, RelayOutcome::DeliveryFailed);

        // The teardown is symmetric and survives the partner being
        // unreachable for the disconnect notice too.
        assert_eq!(registry.partner_of(A), None);
        assert_eq!(registry.partner_of(B), None);
        assert_eq!(handler.relay(A, "again").await, RelayOutcome::NotInChat);
    }

    #[tokio::test]
    async fn disconnect_commits_even_when_the_notice_fails() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;

        transport.mark_unreachable(A);
        assert_eq!(
            handler.disconnect(B).await,
            DisconnectOutcome::Disconnected(A)
        );
        assert_eq!(registry.partner_of(A), None);
        assert_eq!(registry.partner_of(B), None);
    }

    #[tokio::test]
    async fn sweep_evicts_only_a_stale_waiter() {
        let (handler, registry, transport) = setup();

        registry.try_enqueue_waiting(A, Instant::now() - Duration::from_secs(60));
        let evicted = handler.sweep_tick().await;
        assert_eq!(evicted, Some(A));
        assert!(!registry.is_waiting(A));

        let (text, has_buttons) = transport.last_to(A).unwrap();
        assert_eq!(text, TIMEOUT_NOTICE);
        assert!(has_buttons, "the timeout notice offers a retry button");

        // The slot is empty now; the next tick is a no-op.
        assert_eq!(handler.sweep_tick().await, None);
    }

    #[tokio::test]
    async fn sweep_spares_a_fresh_waiter() {
        let (handler, registry, _transport) = setup();

        handler.connect(A).await;
        assert_eq!(handler.sweep_tick().await, None);
        assert!(registry.is_waiting(A));
    }

    #[tokio::test]
    async fn sweep_never_evicts_a_user_who_got_paired() {
        let (handler, registry, _transport) = setup();

        registry.try_enqueue_waiting(A, Instant::now() - Duration::from_secs(60));
        assert_eq!(handler.connect(B).await, ConnectOutcome::Paired(A));

        assert_eq!(handler.sweep_tick().await, None);
        assert_eq!(registry.partner_of(A), Some(B));
    }

    #[tokio::test]
    async fn accepted_reveal_discloses_both_names() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");

        assert_eq!(handler.request_reveal(A).await, RevealOutcome::Requested);
        let (text, has_buttons) = transport.last_to(B).unwrap();
        assert_eq!(text, REVEAL_PROMPT);
        assert!(has_buttons);

        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Accepted);

        assert!(transport
            .texts_to(A)
            .contains(&partner_name_notice("Bob")));
        assert!(transport
            .texts_to(B)
            .contains(&partner_name_notice("Alice")));
        assert!(!registry.has_pending_reveal(A, B));
    }

    #[tokio::test]
    async fn declined_reveal_notifies_only_the_requester() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");

        handler.request_reveal(A).await;
        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Decline)
            .await;
        assert_eq!(outcome, ResolveOutcome::Declined);

        assert!(transport.texts_to(A).contains(&REVEAL_DECLINED.to_string()));
        assert!(transport.nothing_mentions("Alice"));
        assert!(transport.nothing_mentions("Bob"));
        assert!(!registry.has_pending_reveal(A, B));
    }

    #[tokio::test]
    async fn reveal_without_a_partner_is_rejected() {
        let (handler, _registry, _transport) = setup();
        assert_eq!(handler.request_reveal(A).await, RevealOutcome::NotInChat);
    }

    #[tokio::test]
    async fn reveal_prompt_failure_keeps_the_request_pending() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;

        transport.mark_unreachable(B);
        assert_eq!(
            handler.request_reveal(A).await,
            RevealOutcome::PromptUndeliverable
        );
        assert!(registry.has_pending_reveal(A, B));
    }

    #[tokio::test]
    async fn stale_acceptance_after_disconnect_leaks_nothing() {
        let (handler, _registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");

        handler.request_reveal(A).await;
        handler.disconnect(B).await;

        // B replays the accept button after leaving.
        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Stale);
        assert!(transport.nothing_mentions("Alice"));
        assert!(transport.nothing_mentions("Bob"));
    }

    #[tokio::test]
    async fn stale_acceptance_after_repairing_leaks_nothing() {
        let (handler, _registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");
        transport.set_name(C, "Carol");

        handler.request_reveal(A).await;

        // The pairing is replaced before B answers.
        handler.disconnect(A).await;
        handler.connect(A).await;
        handler.connect(C).await;

        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Stale);
        assert!(transport.nothing_mentions("Alice"));
        assert!(transport.nothing_mentions("Bob"));
        assert!(transport.nothing_mentions("Carol"));
    }

    #[tokio::test]
    async fn only_the_prompted_target_may_resolve() {
        let (handler, registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");

        handler.request_reveal(A).await;

        // An unrelated clicker gets a stale answer and does not consume
        // the pending request.
        let outcome = handler
            .resolve_reveal(C, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Stale);
        assert!(transport.nothing_mentions("Alice"));
        assert!(registry.has_pending_reveal(A, B));

        // The genuine target can still accept.
        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Accepted);
    }

    #[tokio::test]
    async fn resolving_twice_is_stale() {
        let (handler, _registry, transport) = setup();
        pair(&handler).await;
        transport.set_name(A, "Alice");
        transport.set_name(B, "Bob");

        handler.request_reveal(A).await;
        handler.resolve_reveal(B, A, B, RevealDecision::Accept).await;

        let replay = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(replay, ResolveOutcome::Stale);
    }

    #[tokio::test]
    async fn accepted_reveal_survives_a_failed_lookup() {
        let (handler, _registry, transport) = setup();
        pair(&handler).await;
        // No names configured: both lookups fail, but the resolution is
        // already committed.

        handler.request_reveal(A).await;
        let outcome = handler
            .resolve_reveal(B, A, B, RevealDecision::Accept)
            .await;
        assert_eq!(outcome, ResolveOutcome::Accepted);
        assert!(transport.nothing_mentions("👤"));
    }

    #[tokio::test]
    async fn broadcast_requires_the_admin() {
        let (handler, _registry, transport) = setup();
        handler.register(A);

        assert_eq!(
            handler.broadcast(A, "hello").await,
            BroadcastOutcome::Forbidden
        );
        assert!(transport.sent.lock().is_empty(), "no fan-out before auth");
    }

    #[tokio::test]
    async fn broadcast_counts_and_skips_failures() {
        let (handler, _registry, transport) = setup();
        handler.register(A);
        handler.register(B);
        handler.register(C);
        transport.mark_unreachable(B);

        let outcome = handler.broadcast(ADMIN, "maintenance at noon").await;
        assert_eq!(
            outcome,
            BroadcastOutcome::Sent {
                delivered: 2,
                failed: 1
            }
        );
        assert!(transport
            .texts_to(A)
            .contains(&"📢 Admin broadcast: maintenance at noon".to_string()));
        assert!(transport.texts_to(B).is_empty());
    }

    #[tokio::test]
    async fn broadcast_with_no_payload_is_a_usage_hint() {
        let (handler, _registry, transport) = setup();
        handler.register(A);

        assert_eq!(handler.broadcast(ADMIN, "  ").await, BroadcastOutcome::Empty);
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn invite_link_round_trip() {
        let (handler, _registry, _transport) = setup();
        assert_eq!(
            handler.invite().await,
            InviteOutcome::Link("https://t.me/+veil".to_string())
        );

        let unconfigured = ChatHandler::new(
            Arc::new(Registry::new()),
            Arc::new(RecordingTransport::default()),
            Some(ADMIN),
            None,
            Duration::from_secs(45),
        );
        assert_eq!(unconfigured.invite().await, InviteOutcome::NotConfigured);
    }
}
