//! Duel Room Server
//!
//! Runs one HexStack match between two scripted in-process players and
//! verifies the recorded moves against the final state.

use anyhow::Context;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use duel_room::{
    VERSION,
    core::hash::short_hex,
    game::{
        hexstack::{HexStack, StackMove},
        logic::{apply_move, GameLogic, StateOf},
        player::Team,
    },
    network::{
        listener::ChannelListener,
        protocol::{GameCommand, GameMessage, RoomCommand, RoomMessage},
        session::{GameResult, GameSession, SessionConfig, SessionManager, SessionOutcome},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Duel Room Server v{}", VERSION);

    demo_match().await
}

/// Play one match between two bots and check its replay.
async fn demo_match() -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let logic = HexStack::default();
    let manager = SessionManager::new(logic.clone(), SessionConfig::from_env());

    let mut bots = Vec::new();
    let mut match_id = None;
    for name in ["north", "south"] {
        let (listener, inbox) = ChannelListener::<GameMessage<HexStack>>::pair();
        let (session_id, joined) = manager.join_or_create(name, listener).await?;
        let session = manager
            .get_session(&session_id)
            .await
            .context("session disappeared after join")?;

        info!(session = %session_id, player = %joined.player, "bot joined");
        match_id = Some(session_id);
        bots.push(tokio::spawn(run_bot(name, session, joined.team, logic.clone(), inbox)));
    }

    let mut result = None;
    for bot in bots {
        if let Some(r) = bot.await?? {
            result = Some(r);
        }
    }
    let result = result.context("match ended without a result")?;

    match &result.outcome {
        SessionOutcome::Finished(win) => info!(%win, turn = result.turn, "match finished"),
        SessionOutcome::Aborted { reason } => warn!(%reason, "match aborted"),
    }

    // Verify replay
    let session_id = match_id.context("no session was joined")?;
    let session = manager
        .get_session(&session_id)
        .await
        .context("session disappeared before replay")?;
    let log = session.move_log().await;
    let replayed = log.replay(&logic)?;
    let replay_hash = replayed.compute_hash()?;
    let verified = result.final_state_hash == Some(replay_hash);
    info!(
        moves = log.len(),
        replay = %short_hex(&replay_hash),
        verified,
        "replay checked"
    );
    if !verified {
        anyhow::bail!("replay diverged from the live session");
    }

    let removed = manager.cleanup().await;
    info!(removed, remaining = manager.session_count().await, "sessions cleaned up");
    info!("=== Demo Complete ===");
    Ok(())
}

/// Scripted player: answers every move request from the latest snapshot.
///
/// Moves travel through the JSON command encoding a transport would use.
async fn run_bot(
    name: &'static str,
    session: GameSession<HexStack>,
    team: Team,
    logic: HexStack,
    mut inbox: UnboundedReceiver<GameMessage<HexStack>>,
) -> anyhow::Result<Option<GameResult>> {
    let mut latest = None;

    while let Some(message) = inbox.recv().await {
        match message {
            RoomMessage::Memento { state } => latest = Some(state),
            RoomMessage::MoveRequest { turn } => {
                let state = latest.as_ref().context("move requested before any snapshot")?;
                let mv = choose_move(&logic, state, team, turn).context("no legal move")?;

                let wire = RoomCommand::Move { mv }.to_json()?;
                debug!(bot = name, %wire, "sending move");
                let command = GameCommand::<HexStack>::from_json(&wire)?;
                if let Err(err) = session.handle_command(team, command).await {
                    warn!(bot = name, error = %err, "move rejected");
                }
            }
            RoomMessage::GameOver(result) => return Ok(Some(result)),
            other => debug!(bot = name, ?other, "event"),
        }
    }

    Ok(None)
}

/// Take a winning move if there is one, otherwise a fixed pick.
fn choose_move(logic: &HexStack, state: &StateOf<HexStack>, team: Team, turn: u32) -> Option<StackMove> {
    let moves = logic.legal_moves(state);
    let winning = moves.iter().find(|mv| {
        apply_move(logic, state, mv)
            .ok()
            .and_then(|next| logic.check_win_condition(&next))
            .map_or(false, |win| win.winner == Some(team))
    });

    winning
        .or_else(|| moves.get((turn as usize * 7 + team.index() * 3) % moves.len().max(1)))
        .cloned()
}
