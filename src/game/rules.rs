use serde::{Deserialize, Serialize};

use super::{
    lines,
    state::{CellIndex, GameEvent, GameState, IntegrityError, Outcome, CELL_COUNT},
};

/// 一次落子请求。落子方始终是 `state.current_player`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveAction {
    pub index: CellIndex,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    OutOfRange {
        index: CellIndex,
    },
    CellOccupied {
        index: CellIndex,
    },
    StaleDecision {
        decision_epoch: u64,
        state_epoch: u64,
    },
    IntegrityViolation {
        error: IntegrityError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl RuleResolution {
    pub fn new(state: GameState, mut events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome;
        if let Some(outcome) = outcome {
            let has_event = events.iter().any(|event| {
                matches!(event, GameEvent::GameWon { .. } | GameEvent::GameDrawn)
            });
            if !has_event {
                events.push(match outcome {
                    Outcome::Win { winner, line } => GameEvent::GameWon { winner, line },
                    Outcome::Draw => GameEvent::GameDrawn,
                });
            }
        }

        Self {
            state,
            events,
            outcome,
        }
    }
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    /// 校验并执行一次落子。被拒绝的落子不会对状态产生任何改动。
    pub fn apply_move(
        &mut self,
        state: &mut GameState,
        action: MoveAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }

        Self::ensure_integrity(state)?;

        let index = action.index;
        if usize::from(index) >= CELL_COUNT {
            return Err(RuleError::OutOfRange { index });
        }
        if state.board[usize::from(index)].is_some() {
            return Err(RuleError::CellOccupied { index });
        }

        let mover = state.current_player;
        state.board[usize::from(index)] = Some(mover);

        let mut events = Vec::new();
        let accepted = GameEvent::MoveAccepted {
            index,
            player: mover,
        };
        state.record_event(accepted.clone());
        events.push(accepted);

        match lines::evaluate(&state.board) {
            Some(outcome) => {
                events.push(state.declare_outcome(outcome));
            }
            None => {
                state.current_player = mover.other();
                let turn = GameEvent::TurnChanged {
                    player: state.current_player,
                };
                state.record_event(turn.clone());
                events.push(turn);
            }
        }

        Ok(events)
    }

    /// 执行在指定 epoch 下计算出的落子；reset 之后留下的旧决策会被拒绝。
    pub fn apply_move_at_epoch(
        &mut self,
        state: &mut GameState,
        action: MoveAction,
        epoch: u64,
    ) -> Result<Vec<GameEvent>, RuleError> {
        if epoch != state.epoch {
            return Err(RuleError::StaleDecision {
                decision_epoch: epoch,
                state_epoch: state.epoch,
            });
        }
        self.apply_move(state, action)
    }

    pub fn reset(&mut self, state: &mut GameState) -> Vec<GameEvent> {
        state.reset();
        let event = GameEvent::GameReset;
        state.record_event(event.clone());
        vec![event]
    }
}
