//! Match session: server messages in, composed orders out
//!
//! Wraps a grid with the turn lifecycle around it: batches of results
//! are queued for playback as they arrive, the send gate opens only
//! when every received batch has finished playing, and end-of-match
//! notices wait for playback to catch up before they surface.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::audio::AudioDriver;
use crate::config::Timings;
use crate::display::DisplayDriver;
use crate::game::{Grid, GridEvent};
use crate::protocol::{BoardConfig, ClientMsg, MatchOutcome, ProtocolError, ServerMsg};

/// User-facing notices raised by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Victory,
    Draw,
    Defeat,
    OpponentLeft,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Victory => "you won!",
            Notice::Draw => "draw",
            Notice::Defeat => "you lost...",
            Notice::OpponentLeft => "your opponent left the game",
        }
    }
}

pub struct TurnSession {
    pub grid: Grid,
    batches_received: u32,
    batches_played: u32,
    animating: bool,
    finished: bool,
    can_send: bool,
    /// Notices held back until playback catches up
    deferred_notices: VecDeque<Notice>,
    ready_notices: Vec<Notice>,
}

impl TurnSession {
    pub fn new(config: &BoardConfig, timings: Timings) -> Self {
        info!(
            hexes = config.hexes.len(),
            own = config.player_tanks.len(),
            enemy = config.enemy_tanks.len(),
            "match session started"
        );
        Self {
            grid: Grid::new(config, timings),
            batches_received: 0,
            batches_played: 0,
            animating: false,
            finished: false,
            can_send: false,
            deferred_notices: VecDeque::new(),
            ready_notices: Vec::new(),
        }
    }

    /// Whether the confirm-turn control should be offered
    pub fn can_send(&self) -> bool {
        self.can_send
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one message from the server
    pub fn handle_message(&mut self, msg: ServerMsg) {
        match msg {
            ServerMsg::StartGame { .. } => {
                warn!("start message received mid-match, ignoring");
            }
            ServerMsg::TurnResults { results } => {
                debug!(count = results.len(), "turn results received");
                self.batches_received += 1;
                self.animating = true;
                self.can_send = false;
                self.grid.push_results(results);
            }
            ServerMsg::GameFinished { result } => {
                info!(result = ?result, "match finished");
                self.finished = true;
                self.can_send = false;
                self.raise(match result {
                    MatchOutcome::Win => Notice::Victory,
                    MatchOutcome::Draw => Notice::Draw,
                    MatchOutcome::Loss => Notice::Defeat,
                });
            }
            ServerMsg::RoomJoined => {
                debug!("room joined acknowledged");
            }
            ServerMsg::RoomDisconnected => {
                if self.finished {
                    return;
                }
                info!("opponent disconnected");
                self.can_send = false;
                self.raise(Notice::OpponentLeft);
            }
        }
    }

    /// Advance playback and fold the grid's events into the session
    /// lifecycle. The events are passed through for the caller's UI.
    pub fn tick(
        &mut self,
        now: f64,
        display: &mut dyn DisplayDriver,
        audio: &mut dyn AudioDriver,
    ) -> Vec<GridEvent> {
        let events = self.grid.tick(now, display, audio);
        for event in &events {
            match event {
                GridEvent::AnimationEnded => self.batch_finished(),
                GridEvent::TankSelected { .. } => {
                    if !self.finished && !self.animating {
                        self.can_send = true;
                    }
                }
                _ => {}
            }
        }
        events
    }

    /// Encode the composed orders for the server. Returns None while
    /// the send gate is closed; the gate closes again after a send.
    pub fn confirm_turn(&mut self) -> Result<Option<String>, ProtocolError> {
        if !self.can_send {
            return Ok(None);
        }
        let actions = self.grid.actions();
        debug!(count = actions.len(), "sending turn");
        self.can_send = false;
        ClientMsg::SendTurn { actions }.encode().map(Some)
    }

    /// Drain notices whose moment has come
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.ready_notices)
    }

    fn batch_finished(&mut self) {
        self.batches_played += 1;
        if self.batches_played != self.batches_received {
            return;
        }
        self.animating = false;
        self.can_send = !self.finished;
        while let Some(notice) = self.deferred_notices.pop_front() {
            self.ready_notices.push(notice);
        }
    }

    fn raise(&mut self, notice: Notice) {
        if self.animating {
            self.deferred_notices.push_back(notice);
        } else {
            self.ready_notices.push(notice);
        }
    }
}
