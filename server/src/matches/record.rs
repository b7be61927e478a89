use chess::{resolve_move, DrawReason, Outcome, PieceColor};
use chrono::{DateTime, Duration, Utc};
use cozy_chess::{Piece, Square};
use serde::{Deserialize, Serialize};

use crate::duel::clock::{elapsed_ms, flag_instant};
use crate::duel::{ChaosDuel, RpsChoice, RpsOutcome, TimeControl};
use crate::error::GameError;
use crate::play::{title, PlayState};

pub const CHAT_LOG_LIMIT: usize = 100;
pub const MAX_CHAT_CHARS: usize = 500;

/// One player's slot in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub player_id: String,
    pub display_name: String,
    pub time_remaining_ms: u64,
}

impl Seat {
    pub fn new(
        player_id: impl Into<String>,
        display_name: impl Into<String>,
        time_control: TimeControl,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            time_remaining_ms: time_control.initial_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawAction {
    Offer,
    Accept,
    Decline,
}

/// Persistent state of an online match between two remote players.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub room_id: String,
    pub time_control: TimeControl,
    pub white: Seat,
    pub black: Seat,
    #[serde(flatten)]
    pub play: PlayState,
    pub duel: ChaosDuel,
    /// Length of each rock-paper-scissors round.
    pub rps_window_ms: u64,
    pub rps_deadline: Option<DateTime<Utc>>,
    /// When the side to move started thinking. Set only while playing.
    pub clock_started_at: Option<DateTime<Utc>>,
    pub draw_offered_by: Option<String>,
    pub chat_log: Vec<ChatMessage>,
    pub status_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn new(
        room_id: String,
        time_control: TimeControl,
        white: Seat,
        black: Seat,
        now: DateTime<Utc>,
        rps_window: std::time::Duration,
    ) -> Self {
        let rps_window_ms = rps_window.as_millis().min(u64::MAX as u128) as u64;
        let mut record = Self {
            room_id,
            time_control,
            white,
            black,
            play: PlayState::new(),
            duel: ChaosDuel::new(),
            rps_window_ms,
            rps_deadline: Some(now + millis(rps_window_ms)),
            clock_started_at: None,
            draw_offered_by: None,
            chat_log: Vec::new(),
            status_text: String::new(),
            created_at: now,
            updated_at: now,
        };
        record.refresh_status();
        record
    }

    pub fn seat(&self, side: PieceColor) -> &Seat {
        match side {
            PieceColor::White => &self.white,
            PieceColor::Black => &self.black,
        }
    }

    fn seat_mut(&mut self, side: PieceColor) -> &mut Seat {
        match side {
            PieceColor::White => &mut self.white,
            PieceColor::Black => &mut self.black,
        }
    }

    pub fn side_of(&self, player_id: &str) -> Result<PieceColor, GameError> {
        if self.white.player_id == player_id {
            Ok(PieceColor::White)
        } else if self.black.player_id == player_id {
            Ok(PieceColor::Black)
        } else {
            Err(GameError::NotParticipant(player_id.to_string()))
        }
    }

    /// Clock of `side` as of `now`, counting the running turn.
    pub fn remaining_ms(&self, side: PieceColor, now: DateTime<Utc>) -> u64 {
        let stored = self.seat(side).time_remaining_ms;
        match self.clock_started_at {
            Some(started) if !self.play.is_over && self.play.side_to_move() == side => {
                stored.saturating_sub(elapsed_ms(started, now))
            }
            _ => stored,
        }
    }

    /// Apply any deadline or flag fall that has passed. Returns true when
    /// the match ended.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> bool {
        if self.play.is_over {
            return false;
        }
        if !self.duel.is_playing() {
            if self.rps_deadline.is_some_and(|deadline| now >= deadline) {
                self.rps_deadline = None;
                self.play.finish(Outcome::Abandoned, None, None);
                self.refresh_status();
                return true;
            }
            return false;
        }

        let side = self.play.side_to_move();
        if self.clock_started_at.is_some() && self.remaining_ms(side, now) == 0 {
            self.seat_mut(side).time_remaining_ms = 0;
            self.clock_started_at = None;
            self.draw_offered_by = None;
            self.play.finish(Outcome::Timeout, None, Some(!side));
            self.refresh_status();
            return true;
        }
        false
    }

    /// Next instant at which `catch_up` would change something.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        if self.play.is_over {
            return None;
        }
        if !self.duel.is_playing() {
            return self.rps_deadline;
        }
        let started = self.clock_started_at?;
        let side = self.play.side_to_move();
        Some(flag_instant(started, self.seat(side).time_remaining_ms))
    }

    pub fn submit_rps(
        &mut self,
        player_id: &str,
        choice: RpsChoice,
        now: DateTime<Utc>,
    ) -> Result<RpsOutcome, GameError> {
        let side = self.side_of(player_id)?;
        self.play.ensure_ongoing()?;
        let outcome = self.duel.submit(side, choice)?;
        match outcome {
            RpsOutcome::Tie => self.rps_deadline = Some(now + millis(self.rps_window_ms)),
            RpsOutcome::Won(_) => {
                self.rps_deadline = None;
                self.clock_started_at = Some(now);
            }
            RpsOutcome::Pending => {}
        }
        Ok(outcome)
    }

    pub fn make_move(
        &mut self,
        player_id: &str,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        use_chaos_token: bool,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        let side = self.side_of(player_id)?;
        self.play.ensure_ongoing()?;
        if !self.duel.is_playing() {
            return Err(GameError::InvalidPhase(
                "rock-paper-scissors must finish first".into(),
            ));
        }
        if side != self.play.side_to_move() {
            return Err(GameError::OutOfTurn);
        }

        let allow_illegal = self.duel.may_force(side, use_chaos_token);
        let resolution = resolve_move(&self.play.position, from, to, promotion, allow_illegal)?;
        if resolution.was_forced {
            self.duel.consume();
        }

        let remaining = self.remaining_ms(side, now);
        self.seat_mut(side).time_remaining_ms = remaining;
        if self
            .draw_offered_by
            .as_deref()
            .is_some_and(|offerer| offerer != player_id)
        {
            self.draw_offered_by = None;
        }

        self.play.apply(resolution);
        self.clock_started_at = (!self.play.is_over).then_some(now);
        if self.play.is_over {
            self.draw_offered_by = None;
        }
        Ok(())
    }

    pub fn resign(&mut self, player_id: &str, now: DateTime<Utc>) -> Result<(), GameError> {
        let side = self.side_of(player_id)?;
        self.play.ensure_ongoing()?;
        self.stop_clock(now);
        self.play.finish(Outcome::Resigned, None, Some(!side));
        Ok(())
    }

    pub fn respond_draw(
        &mut self,
        player_id: &str,
        action: DrawAction,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        self.side_of(player_id)?;
        self.play.ensure_ongoing()?;
        if !self.duel.is_playing() {
            return Err(GameError::InvalidPhase(
                "draws can only be offered once play has started".into(),
            ));
        }

        let pending_from_opponent = self
            .draw_offered_by
            .as_deref()
            .is_some_and(|offerer| offerer != player_id);
        match action {
            DrawAction::Offer if pending_from_opponent => self.agree_draw(now),
            DrawAction::Offer => self.draw_offered_by = Some(player_id.to_string()),
            DrawAction::Accept if pending_from_opponent => self.agree_draw(now),
            DrawAction::Decline if pending_from_opponent => self.draw_offered_by = None,
            DrawAction::Accept | DrawAction::Decline => {
                return Err(GameError::InvalidRequest(
                    "no draw offer from the opponent is pending".into(),
                ))
            }
        }
        Ok(())
    }

    pub fn post_chat(
        &mut self,
        player_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GameError> {
        let side = self.side_of(player_id)?;
        let text: String = message.trim().chars().take(MAX_CHAT_CHARS).collect();
        if text.is_empty() {
            return Err(GameError::InvalidRequest("chat message is empty".into()));
        }
        if self.chat_log.len() >= CHAT_LOG_LIMIT {
            let excess = self.chat_log.len() + 1 - CHAT_LOG_LIMIT;
            self.chat_log.drain(..excess);
        }
        let sender_name = self.seat(side).display_name.clone();
        self.chat_log.push(ChatMessage {
            sender_id: player_id.to_string(),
            sender_name,
            text,
            sent_at: now,
        });
        Ok(())
    }

    pub fn refresh_status(&mut self) {
        self.status_text = if self.play.is_over {
            self.play.summary()
        } else if !self.duel.is_playing() {
            match self.duel.round {
                1 => "Rock-paper-scissors for the chaos token.".to_string(),
                n => format!("Rock-paper-scissors round {n}, the last one was a tie."),
            }
        } else {
            let side = self.play.side_to_move();
            let mut text = format!(
                "{} ({}) to move.",
                self.seat(side).display_name,
                title(side)
            );
            if self.play.position.is_check() {
                text.push_str(" Check!");
            }
            if self.draw_offered_by.is_some() {
                text.push_str(" A draw has been offered.");
            }
            text
        };
    }

    fn agree_draw(&mut self, now: DateTime<Utc>) {
        self.stop_clock(now);
        self.draw_offered_by = None;
        self.play
            .finish(Outcome::Draw, Some(DrawReason::Agreement), None);
    }

    /// Charge the running turn and stop the clock.
    fn stop_clock(&mut self, now: DateTime<Utc>) {
        if self.duel.is_playing() && self.clock_started_at.is_some() {
            let side = self.play.side_to_move();
            let remaining = self.remaining_ms(side, now);
            self.seat_mut(side).time_remaining_ms = remaining;
        }
        self.clock_started_at = None;
        self.rps_deadline = None;
    }
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(ms.min(i64::MAX as u64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::parse_square;

    fn new_match(now: DateTime<Utc>) -> MatchRecord {
        MatchRecord::new(
            "room_test".into(),
            TimeControl::Bullet,
            Seat::new("ann", "Ann", TimeControl::Bullet),
            Seat::new("bo", "Bo", TimeControl::Bullet),
            now,
            std::time::Duration::from_secs(60),
        )
    }

    fn playing(now: DateTime<Utc>) -> MatchRecord {
        let mut record = new_match(now);
        record.submit_rps("ann", RpsChoice::Rock, now).unwrap();
        record.submit_rps("bo", RpsChoice::Scissors, now).unwrap();
        record
    }

    fn mv(record: &mut MatchRecord, player: &str, from: &str, to: &str, at: DateTime<Utc>) {
        record
            .make_move(
                player,
                parse_square(from).unwrap(),
                parse_square(to).unwrap(),
                None,
                false,
                at,
            )
            .unwrap();
    }

    #[test]
    fn test_rps_deadline_abandons() {
        let start = Utc::now();
        let mut record = new_match(start);
        assert!(!record.catch_up(start + Duration::seconds(59)));
        assert!(record.catch_up(start + Duration::seconds(60)));
        assert_eq!(record.play.outcome, Some(Outcome::Abandoned));
        assert_eq!(record.play.winner, None);
        assert_eq!(record.next_deadline(), None);
    }

    #[test]
    fn test_tie_renews_deadline() {
        let start = Utc::now();
        let mut record = new_match(start);
        let later = start + Duration::seconds(50);
        record.submit_rps("ann", RpsChoice::Paper, later).unwrap();
        record.submit_rps("bo", RpsChoice::Paper, later).unwrap();
        assert_eq!(record.rps_deadline, Some(later + Duration::seconds(60)));
        assert!(!record.catch_up(start + Duration::seconds(61)));
    }

    #[test]
    fn test_rps_win_starts_white_clock() {
        let start = Utc::now();
        let record = playing(start);
        assert!(record.duel.is_playing());
        assert_eq!(record.duel.token_holder, Some(PieceColor::White));
        assert_eq!(record.clock_started_at, Some(start));
        assert_eq!(
            record.next_deadline(),
            Some(start + Duration::milliseconds(60_000))
        );
    }

    #[test]
    fn test_move_charges_mover() {
        let start = Utc::now();
        let mut record = playing(start);
        mv(&mut record, "ann", "e2", "e4", start + Duration::seconds(5));
        assert_eq!(record.white.time_remaining_ms, 55_000);
        assert_eq!(record.black.time_remaining_ms, 60_000);
        assert_eq!(
            record.remaining_ms(PieceColor::Black, start + Duration::seconds(7)),
            58_000
        );
    }

    #[test]
    fn test_flag_fall_ends_in_timeout() {
        let start = Utc::now();
        let mut record = playing(start);
        mv(&mut record, "ann", "e2", "e4", start + Duration::seconds(1));
        assert!(!record.catch_up(start + Duration::seconds(60)));
        assert!(record.catch_up(start + Duration::seconds(61)));
        assert_eq!(record.play.outcome, Some(Outcome::Timeout));
        assert_eq!(record.play.winner, Some(PieceColor::White));
        assert_eq!(record.black.time_remaining_ms, 0);
        assert_eq!(record.status_text, "Black ran out of time. White wins.");
    }

    #[test]
    fn test_turn_and_phase_checks() {
        let start = Utc::now();
        let mut record = new_match(start);
        let e2 = parse_square("e2").unwrap();
        let e4 = parse_square("e4").unwrap();
        let err = record.make_move("ann", e2, e4, None, false, start).unwrap_err();
        assert_eq!(err.code(), "INVALID_PHASE");

        let mut record = playing(start);
        let e7 = parse_square("e7").unwrap();
        let e5 = parse_square("e5").unwrap();
        let err = record.make_move("bo", e7, e5, None, false, start).unwrap_err();
        assert_eq!(err, GameError::OutOfTurn);
        let err = record.make_move("eve", e2, e4, None, false, start).unwrap_err();
        assert_eq!(err.code(), "NOT_PARTICIPANT");
    }

    #[test]
    fn test_draw_offer_rules() {
        let now = Utc::now();
        let mut record = playing(now);

        let err = record.respond_draw("ann", DrawAction::Accept, now).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");

        record.respond_draw("ann", DrawAction::Offer, now).unwrap();
        record.respond_draw("ann", DrawAction::Offer, now).unwrap();
        assert_eq!(record.draw_offered_by.as_deref(), Some("ann"));
        let err = record.respond_draw("ann", DrawAction::Accept, now).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");

        record.respond_draw("bo", DrawAction::Decline, now).unwrap();
        assert_eq!(record.draw_offered_by, None);

        record.respond_draw("ann", DrawAction::Offer, now).unwrap();
        record.respond_draw("bo", DrawAction::Accept, now).unwrap();
        assert_eq!(record.play.outcome, Some(Outcome::Draw));
        assert_eq!(record.play.draw_reason, Some(DrawReason::Agreement));
        assert_eq!(record.play.winner, None);
    }

    #[test]
    fn test_receiver_move_declines_offer() {
        let now = Utc::now();
        let mut record = playing(now);
        mv(&mut record, "ann", "e2", "e4", now);
        record.respond_draw("ann", DrawAction::Offer, now).unwrap();
        mv(&mut record, "bo", "e7", "e5", now);
        assert_eq!(record.draw_offered_by, None);

        record.respond_draw("bo", DrawAction::Offer, now).unwrap();
        mv(&mut record, "ann", "g1", "f3", now);
        assert_eq!(record.draw_offered_by, None);
    }

    #[test]
    fn test_offerer_move_keeps_offer() {
        let now = Utc::now();
        let mut record = playing(now);
        record.respond_draw("ann", DrawAction::Offer, now).unwrap();
        mv(&mut record, "ann", "e2", "e4", now);
        assert_eq!(record.draw_offered_by.as_deref(), Some("ann"));
    }

    #[test]
    fn test_resign_names_other_side() {
        let now = Utc::now();
        let mut record = playing(now);
        record.resign("bo", now).unwrap();
        assert_eq!(record.play.outcome, Some(Outcome::Resigned));
        assert_eq!(record.play.winner, Some(PieceColor::White));
        assert_eq!(record.resign("ann", now).unwrap_err(), GameError::GameAlreadyOver);
    }

    #[test]
    fn test_chat_is_trimmed_and_bounded() {
        let now = Utc::now();
        let mut record = new_match(now);
        let err = record.post_chat("ann", "   ", now).unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert_eq!(
            record.post_chat("eve", "hi", now).unwrap_err().code(),
            "NOT_PARTICIPANT"
        );

        record.post_chat("ann", &"y".repeat(800), now).unwrap();
        assert_eq!(record.chat_log[0].text.chars().count(), MAX_CHAT_CHARS);

        for i in 0..120 {
            record.post_chat("bo", &format!("  msg {i} "), now).unwrap();
        }
        assert_eq!(record.chat_log.len(), CHAT_LOG_LIMIT);
        assert_eq!(record.chat_log[0].text, "msg 20");
        assert_eq!(record.chat_log[99].text, "msg 119");
        assert_eq!(record.chat_log[99].sender_name, "Bo");
    }
}
