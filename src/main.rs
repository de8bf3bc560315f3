//! Terminal driver for the Connect Four client.
//!
//! Wires `client` together the way the browser screens would: REST via
//! [`ApiClient`], realtime channels from one [`ChannelRegistry`], and the
//! game, waiting, and share-link screens. Board and status are redrawn as
//! plain text after every event; moves are read from stdin.

mod commands;
mod render;

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use client::config::{ClientConfig, ConfigError};
use client::net::api::{ApiClient, ApiError};
use client::net::channel::{ChannelRegistry, ConnectionStatus, TungsteniteConnector};
use client::pages::game::GameScreen;
use client::pages::sharelink::{InvitationError, ShareLinkOutcome, follow_share_link};
use client::pages::waiting::{Navigate, WaitFor, WaitingRoom};
use client::state::auth::{CurrentUser, SessionProvider, StaticSession};
use client::state::game::Phase;
use client::util::share_link::{ShareLinkError, share_link};
use protocol::ClientMessage;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{HELP, PlayerCommand, parse_command};

const KEEPALIVE: Duration = Duration::from_secs(30);

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Invitation(#[from] InvitationError),
    #[error(transparent)]
    ShareLink(#[from] ShareLinkError),
    #[error("missing player id; pass --player-id or set C4_PLAYER_ID")]
    MissingPlayerId,
    #[error("channel {0} closed")]
    ChannelClosed(String),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "connect-four", about = "Play Connect Four against the match backend from a terminal")]
struct Cli {
    #[arg(long, env = "C4_USERNAME")]
    username: String,

    #[arg(long, env = "C4_PLAYER_ID")]
    player_id: Option<String>,

    #[arg(long, env = "C4_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an existing game.
    Play { game_id: String },
    /// Start a game against the computer.
    Ai(AiArgs),
    /// Create an invitation link and wait for it to be accepted.
    Invite,
    /// Follow an invitation link or bare invitation code.
    Join { link: String },
    /// Queue for a random opponent.
    Match,
    /// Leave the matchmaking queue.
    CancelMatch,
}

#[derive(Args, Debug)]
struct AiArgs {
    #[arg(long, default_value = "minimax")]
    algorithm: String,
    #[arg(long, default_value_t = 1)]
    difficulty: u8,
}

struct CliContext {
    config: ClientConfig,
    user: CurrentUser,
    api: ApiClient,
    registry: ChannelRegistry,
}

/// Next screen in the lobby flow.
enum Step {
    Play(String),
    Join(String),
    Wait(WaitFor),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let user = CurrentUser { username: cli.username, player_id: cli.player_id, token: cli.token };
    let session: Arc<dyn SessionProvider> = Arc::new(StaticSession::new(user.clone()));
    let ctx = CliContext {
        api: ApiClient::new(&config, Arc::clone(&session)),
        registry: ChannelRegistry::new(&config, session, Arc::new(TungsteniteConnector)),
        config,
        user,
    };
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Command::Play { game_id } => run(&ctx, &mut input, Step::Play(game_id)).await,
        Command::Ai(args) => {
            let game_id = ctx.api.create_ai_game(args.difficulty, &args.algorithm).await?;
            info!(%game_id, algorithm = %args.algorithm, difficulty = args.difficulty, "cli: ai game created");
            run(&ctx, &mut input, Step::Play(game_id)).await
        }
        Command::Invite => {
            let invitation_id = ctx.api.generate_invitation().await?;
            let link = share_link(&ctx.config.app_url, &invitation_id)?;
            println!("Share this link with your opponent:\n  {link}");
            run(&ctx, &mut input, Step::Wait(WaitFor::Invitation { invitation_id, share_link: link })).await
        }
        Command::Join { link } => run(&ctx, &mut input, Step::Join(link)).await,
        Command::Match => {
            let queued = ctx.api.request_match().await?;
            info!(status = %queued.status, queue_id = ?queued.queue_id, "cli: match requested");
            println!("Looking for an opponent... (`q` to leave the queue)");
            run(&ctx, &mut input, Step::Wait(WaitFor::Match)).await
        }
        Command::CancelMatch => {
            ctx.api.cancel_match().await?;
            println!("Left the matchmaking queue.");
            Ok(())
        }
    }
}

async fn run(ctx: &CliContext, input: &mut Input, mut step: Step) -> Result<(), CliError> {
    loop {
        step = match step {
            Step::Play(game_id) => return play(ctx, input, &game_id).await,
            Step::Join(link) => match follow_share_link(&ctx.api, &ctx.config.app_url, &link, &ctx.user.username).await? {
                ShareLinkOutcome::Game(game_id) => Step::Play(game_id),
                ShareLinkOutcome::Waiting { invitation_id, share_link } => {
                    println!("Waiting for someone to accept:\n  {share_link}");
                    Step::Wait(WaitFor::Invitation { invitation_id, share_link })
                }
            },
            Step::Wait(wait_for) => match wait(ctx, input, wait_for.clone()).await? {
                Some(Navigate::Game(game_id)) => Step::Play(game_id),
                Some(Navigate::ShareLink(link)) => Step::Join(link),
                None => {
                    if wait_for == WaitFor::Match {
                        ctx.api.cancel_match().await?;
                    }
                    return Ok(());
                }
            },
        };
    }
}

/// Sit on the player inbox until the waiting room navigates. `None` means
/// the user quit.
async fn wait(ctx: &CliContext, input: &mut Input, wait_for: WaitFor) -> Result<Option<Navigate>, CliError> {
    let player_id = ctx.user.player_id.as_deref().ok_or(CliError::MissingPlayerId)?;
    let channel = ctx.registry.open(&format!("/player/{player_id}"));
    debug!(path = channel.path(), live = ctx.registry.live_channels(), "cli: inbox opened");
    let closed = || CliError::ChannelClosed(channel.path().to_owned());
    let mut status_rx = channel.subscribe_status();
    let mut message_rx = channel.subscribe_messages();
    let mut keepalive = tokio::time::interval(KEEPALIVE);
    let mut room = WaitingRoom::new(wait_for);

    let initial = *status_rx.borrow_and_update();
    if let Some(next) = room.on_connection_status(initial) {
        return Ok(Some(next));
    }
    let mut announced = false;
    // The inbox may still hold a message from an earlier wait.
    let _ = message_rx.borrow_and_update();

    loop {
        if room.is_connected() && !announced {
            println!("Connected; waiting for the other player.");
            announced = true;
        }

        tokio::select! {
            changed = status_rx.changed() => {
                changed.map_err(|_| closed())?;
                let status = *status_rx.borrow_and_update();
                if let Some(next) = room.on_connection_status(status) {
                    return Ok(Some(next));
                }
            }
            changed = message_rx.changed() => {
                changed.map_err(|_| closed())?;
                let inbound = message_rx.borrow_and_update().clone();
                if let Some(next) = inbound.and_then(|m| room.on_message(&m)) {
                    return Ok(Some(next));
                }
            }
            _ = keepalive.tick() => {
                if channel.connection_status() == ConnectionStatus::Open {
                    if let Err(e) = channel.send_message(&ClientMessage::Ping.to_json()) {
                        debug!(error = %e, "cli: keepalive skipped");
                    }
                }
            }
            line = input.next_line() => {
                match line?.as_deref().map(parse_command) {
                    None | Some(PlayerCommand::Quit) => return Ok(None),
                    Some(_) => println!("Still waiting... (`q` to stop)"),
                }
            }
        }
    }
}

async fn play(ctx: &CliContext, input: &mut Input, game_id: &str) -> Result<(), CliError> {
    let channel = ctx.registry.open(&format!("/game/{game_id}"));
    debug!(path = channel.path(), live = ctx.registry.live_channels(), "cli: game channel opened");
    let path = channel.path().to_owned();
    let mut status_rx = channel.subscribe_status();
    let mut message_rx = channel.subscribe_messages();
    let mut screen = GameScreen::new(channel, ctx.api.clone());

    screen.load(game_id).await?;
    let initial = *status_rx.borrow_and_update();
    screen.on_connection_status(initial).await?;
    println!("{HELP}");

    loop {
        render::draw(&screen, OffsetDateTime::now_utc());
        if screen.store().phase() == Phase::Concluded {
            return Ok(());
        }

        tokio::select! {
            changed = status_rx.changed() => {
                changed.map_err(|_| CliError::ChannelClosed(path.clone()))?;
                let status = *status_rx.borrow_and_update();
                screen.on_connection_status(status).await?;
            }
            changed = message_rx.changed() => {
                changed.map_err(|_| CliError::ChannelClosed(path.clone()))?;
                let inbound = message_rx.borrow_and_update().clone();
                if let Some(inbound) = inbound {
                    let reaction = screen.on_message(&inbound).await?;
                    debug!(seq = inbound.seq, ?reaction, "cli: message handled");
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match parse_command(&line) {
                    PlayerCommand::Drop(col) => match screen.click(col) {
                        Ok(outcome) if !outcome.delivered => {
                            warn!(col, "cli: move not delivered; channel is down");
                            println!("Not connected; the move will be reconciled on reconnect.");
                        }
                        Ok(_) => {}
                        Err(rejection) => println!("{rejection}"),
                    },
                    PlayerCommand::Undo => {
                        if let Err(e) = screen.undo() {
                            println!("{e}");
                        }
                    }
                    PlayerCommand::Quit => return Ok(()),
                    PlayerCommand::Help | PlayerCommand::Unknown(_) => println!("{HELP}"),
                }
            }
        }
    }
}
