//! Veil - Anonymous Chat Relay
//!
//! Pairs anonymous participants for one-to-one conversation over Telegram.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use veil::handler::ChatHandler;
use veil::protocol::{CallbackAction, Command, Inbound, GREETING};
use veil::state::{Registry, UserHandle};
use veil::telegram::{TelegramClient, Update};

/// Pause after a failed update poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Command-line arguments for the chat relay.
#[derive(Debug, Parser)]
#[command(name = "veil")]
#[command(about = "Anonymous chat relay pairing strangers for one-to-one conversation")]
struct Args {
    /// Bot API token.
    #[arg(long, env = "VEIL_BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Handle of the operator allowed to broadcast. Unset means nobody.
    #[arg(long, env = "VEIL_ADMIN_ID")]
    admin_id: Option<i64>,

    /// Community group whose invite link /invite hands out.
    #[arg(long, env = "VEIL_GROUP_CHAT_ID")]
    group_chat_id: Option<i64>,

    /// Seconds a waiter may sit in the queue before being evicted.
    #[arg(long, default_value = "45")]
    connect_timeout: u64,

    /// Seconds between timeout sweeps; must be below the connect timeout.
    #[arg(long, default_value = "30")]
    sweep_interval: u64,
}

/// Periodically evict stale waiters until shutdown.
async fn run_sweeper(
    handler: ChatHandler<TelegramClient>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                handler.sweep_tick().await;
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Long-poll for updates and dispatch them until shutdown.
async fn run_dispatch(
    client: Arc<TelegramClient>,
    handler: ChatHandler<TelegramClient>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset = 0i64;
    loop {
        let updates = tokio::select! {
            _ = shutdown.changed() => break,
            polled = client.get_updates(offset) => match polled {
                Ok(updates) => updates,
                Err(error) => {
                    warn!(%error, "update poll failed; backing off");
                    tokio::select! {
                        _ = tokio::time::sleep(POLL_BACKOFF) => continue,
                        _ = shutdown.changed() => break,
                    }
                }
            },
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            handle_update(&client, &handler, update).await;
        }
    }
}

/// Route one update to the matching operation and render the outcome back
/// to the initiating user.
async fn handle_update(
    client: &TelegramClient,
    handler: &ChatHandler<TelegramClient>,
    update: Update,
) {
    if let Some(message) = update.message {
        let Some(from) = message.from else { return };
        let Some(text) = message.text else { return };
        let user = UserHandle(from.id);

        let reply = match Inbound::classify(&text) {
            Inbound::Command(Command::Start) => {
                handler.register(user);
                Some(GREETING.to_string())
            }
            Inbound::Command(Command::Connect) => {
                Some(handler.connect(user).await.notice().to_string())
            }
            Inbound::Command(Command::Disconnect) => {
                Some(handler.disconnect(user).await.notice().to_string())
            }
            Inbound::Command(Command::Reveal) => {
                Some(handler.request_reveal(user).await.notice().to_string())
            }
            Inbound::Command(Command::Broadcast(payload)) => {
                Some(handler.broadcast(user, &payload).await.notice())
            }
            Inbound::Command(Command::Invite) => Some(handler.invite().await.notice()),
            Inbound::UnknownCommand => {
                debug!(%user, "ignoring unknown command");
                None
            }
            Inbound::Text(body) => handler.relay(user, &body).await.notice().map(String::from),
        };

        if let Some(reply) = reply {
            if let Err(error) = client.send_message(user, &reply, None).await {
                warn!(%user, %error, "reply undeliverable");
            }
        }
    } else if let Some(callback) = update.callback_query {
        // Stop the client's loading spinner whatever happens next.
        if let Err(error) = client.answer_callback(&callback.id).await {
            debug!(%error, "callback answer failed");
        }

        let responder = UserHandle(callback.from.id);
        let Some(data) = callback.data.as_deref() else {
            debug!(%responder, "callback without payload");
            return;
        };

        match CallbackAction::parse(data) {
            Ok(CallbackAction::Reveal {
                decision,
                requester,
                target,
            }) => {
                let outcome = handler
                    .resolve_reveal(responder, requester, target, decision)
                    .await;
                // Replace the prompt in place so the buttons disappear.
                match callback.message {
                    Some(prompt) => {
                        if let Err(error) = client
                            .edit_message_text(prompt.chat.id, prompt.message_id, outcome.prompt_edit())
                            .await
                        {
                            warn!(%responder, %error, "prompt edit failed");
                        }
                    }
                    None => {
                        if let Err(error) =
                            client.send_message(responder, outcome.prompt_edit(), None).await
                        {
                            warn!(%responder, %error, "resolution notice undeliverable");
                        }
                    }
                }
            }
            Ok(CallbackAction::RetryConnect) => {
                let outcome = handler.connect(responder).await;
                if let Err(error) = client.send_message(responder, outcome.notice(), None).await {
                    warn!(%responder, %error, "retry reply undeliverable");
                }
            }
            Err(error) => {
                warn!(%responder, %error, "rejected callback payload");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("veil=info".parse()?),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.sweep_interval < args.connect_timeout,
        "sweep interval ({}s) must be strictly smaller than the connect timeout ({}s)",
        args.sweep_interval,
        args.connect_timeout,
    );

    let transport = Arc::new(TelegramClient::new(&args.bot_token)?);
    let registry = Arc::new(Registry::new());
    let handler = ChatHandler::new(
        Arc::clone(&registry),
        Arc::clone(&transport),
        args.admin_id.map(UserHandle),
        args.group_chat_id,
        Duration::from_secs(args.connect_timeout),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(run_sweeper(
        handler.clone(),
        Duration::from_secs(args.sweep_interval),
        shutdown_rx.clone(),
    ));
    let dispatcher = tokio::spawn(run_dispatch(Arc::clone(&transport), handler, shutdown_rx));

    info!(
        admin = ?args.admin_id,
        connect_timeout = args.connect_timeout,
        sweep_interval = args.sweep_interval,
        "veil is running"
    );
    info!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");

    // Both loops exit at their next check; in-flight operations complete
    // first, so no registry transition is lost.
    let _ = shutdown_tx.send(true);
    dispatcher.await?;
    sweeper.await?;

    info!("Stopped");

    Ok(())
}
