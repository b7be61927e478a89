use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tracing::Instrument;

use super::commands::MatchCommand;
use super::state::MatchState;

/// The match actor loop. Owns the record, applies commands sequentially and
/// wakes itself for the RPS deadline or a flag fall. Once the match is over
/// and no command arrives for `linger`, the actor retires.
///
/// Returns whether the match was over when the actor stopped.
pub(crate) async fn run_match_actor(
    state: MatchState,
    cmd_rx: mpsc::Receiver<MatchCommand>,
    linger: Duration,
) -> bool {
    let room_id = state.record.room_id.clone();
    run_match_actor_inner(state, cmd_rx, linger)
        .instrument(tracing::info_span!("match", id = %room_id))
        .await
}

async fn run_match_actor_inner(
    mut state: MatchState,
    mut cmd_rx: mpsc::Receiver<MatchCommand>,
    linger: Duration,
) -> bool {
    tracing::info!("Match actor started");

    loop {
        let (wakeup, retire) = match state.next_wakeup() {
            Some(wait) => (Some(wait), false),
            None if state.record.play.is_over => (Some(linger), true),
            None => (None, false),
        };

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(MatchCommand::Shutdown) | None => {
                        tracing::info!("Match actor shutting down");
                        break;
                    }
                    Some(cmd) => handle_command(&mut state, cmd),
                }
            }

            _ = time::sleep(wakeup.unwrap_or_default()), if wakeup.is_some() => {
                if retire {
                    tracing::info!("Finished match idle, retiring actor");
                    cmd_rx.close();
                    // answer whatever was queued before the close
                    while let Some(cmd) = cmd_rx.recv().await {
                        handle_command(&mut state, cmd);
                    }
                    break;
                }
                if let Err(e) = state.catch_up(Utc::now()) {
                    tracing::error!("Deadline catch-up failed: {}", e);
                    // store still failing, retry shortly
                    time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    tracing::info!("Match actor exited");
    state.record.play.is_over
}

fn handle_command(state: &mut MatchState, cmd: MatchCommand) {
    match cmd {
        MatchCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.read());
        }
        MatchCommand::SubmitRps {
            player_id,
            choice,
            reply,
        } => {
            let result = state.apply(|record, now| {
                let outcome = record.submit_rps(&player_id, choice, now)?;
                tracing::info!(player = %player_id, ?outcome, "RPS choice submitted");
                Ok(())
            });
            let _ = reply.send(result);
        }
        MatchCommand::MakeMove {
            player_id,
            from,
            to,
            promotion,
            use_chaos_token,
            reply,
        } => {
            let result = state.apply(|record, now| {
                record.make_move(&player_id, from, to, promotion, use_chaos_token, now)?;
                if let Some(notation) = record.play.move_notation_history.last() {
                    tracing::info!(player = %player_id, %notation, "Move applied");
                }
                Ok(())
            });
            let _ = reply.send(result);
        }
        MatchCommand::Resign { player_id, reply } => {
            let result = state.apply(|record, now| record.resign(&player_id, now));
            let _ = reply.send(result);
        }
        MatchCommand::Draw {
            player_id,
            action,
            reply,
        } => {
            let result = state.apply(|record, now| record.respond_draw(&player_id, action, now));
            let _ = reply.send(result);
        }
        MatchCommand::Chat {
            player_id,
            message,
            reply,
        } => {
            let result = state.apply(|record, now| record.post_chat(&player_id, &message, now));
            let _ = reply.send(result);
        }
        MatchCommand::Shutdown => {}
    }
}
