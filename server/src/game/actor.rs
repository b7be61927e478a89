use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tracing::Instrument;

use super::commands::GameCommand;
use super::state::GameState;

/// The game actor loop. Owns the record and applies commands one at a time.
/// After `idle` without a command the actor retires; the game stays on disk.
pub(crate) async fn run_game_actor(
    state: GameState,
    cmd_rx: mpsc::Receiver<GameCommand>,
    idle: Duration,
) {
    let game_id = state.record.id.clone();
    run_game_actor_inner(state, cmd_rx, idle)
        .instrument(tracing::info_span!("game", id = %game_id))
        .await;
}

async fn run_game_actor_inner(
    mut state: GameState,
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    idle: Duration,
) {
    tracing::info!("Game actor started");

    state.on_start().await;

    loop {
        let cmd = match time::timeout(idle, cmd_rx.recv()).await {
            Ok(Some(cmd)) => cmd,
            Ok(None) => break,
            Err(_) => {
                tracing::info!("Game idle, retiring actor");
                cmd_rx.close();
                // answer whatever was queued before the close
                while let Some(cmd) = cmd_rx.recv().await {
                    if !handle_command(&mut state, cmd).await {
                        break;
                    }
                }
                break;
            }
        };
        if !handle_command(&mut state, cmd).await {
            tracing::info!("Game actor shutting down");
            break;
        }
    }

    tracing::info!("Game actor exited");
}

/// Returns false once the actor should stop.
async fn handle_command(state: &mut GameState, cmd: GameCommand) -> bool {
    match cmd {
        GameCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        GameCommand::MakeMove { input, reply } => {
            let _ = reply.send(state.make_move(input).await);
        }
        GameCommand::RetryAi { reply } => {
            let _ = reply.send(state.retry_ai().await);
        }
        GameCommand::Resign { reply } => {
            let _ = reply.send(state.resign());
        }
        GameCommand::Reset { reply } => {
            let _ = reply.send(state.reset().await);
        }
        GameCommand::SubmitRps {
            side,
            choice,
            reply,
        } => {
            let _ = reply.send(state.submit_rps(side, choice));
        }
        GameCommand::Shutdown => return false,
    }
    true
}
