use serde::{Deserialize, Serialize};

use super::lines::{self, LineId};
use super::rules::RuleError;

/// 棋盘格子总数（3x3）。
pub const CELL_COUNT: usize = 9;

/// 棋盘格子索引（0-8，按行优先排列）。
pub type CellIndex = u8;

/// 执子方。X 总是先手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

/// 3x3 棋盘，空格为 `None`，序列化后与前端的 `null` 数组一致。
pub type Board = [Option<Player>; CELL_COUNT];

/// 对局模式：双人对战或人机对战。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    TwoPlayer,
    VsAi,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::TwoPlayer
    }
}

/// 终局结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    Win { winner: Player, line: LineId },
    Draw,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MoveAccepted {
        index: CellIndex,
        player: Player,
    },
    MoveRejected {
        index: CellIndex,
        reason: RuleError,
    },
    GameWon {
        winner: Player,
        line: LineId,
    },
    GameDrawn,
    TurnChanged {
        player: Player,
    },
    GameReset,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    MarkImbalance { x: u8, o: u8 },
    OutcomeMismatch,
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub current_player: Player,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub epoch: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: [None; CELL_COUNT],
            current_player: Player::X,
            mode: GameMode::default(),
            epoch: 0,
            event_log: Vec::new(),
            outcome: None,
        }
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cell(&self, index: CellIndex) -> Option<Player> {
        self.board.get(usize::from(index)).copied().flatten()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    /// 记录终局结果并生成对应事件；已有结果时不再覆盖。
    pub fn declare_outcome(&mut self, outcome: Outcome) -> GameEvent {
        let event = match outcome {
            Outcome::Win { winner, line } => GameEvent::GameWon { winner, line },
            Outcome::Draw => GameEvent::GameDrawn,
        };
        if self.outcome.is_none() {
            self.record_event(event.clone());
            self.outcome = Some(outcome);
        }
        event
    }

    /// 回到开局状态。模式保留，epoch 递增以使挂起的 AI 决策失效。
    pub fn reset(&mut self) {
        self.board = [None; CELL_COUNT];
        self.current_player = Player::X;
        self.epoch = self.epoch.wrapping_add(1);
        self.event_log.clear();
        self.outcome = None;
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x = self
            .board
            .iter()
            .filter(|cell| **cell == Some(Player::X))
            .count() as u8;
        let o = self
            .board
            .iter()
            .filter(|cell| **cell == Some(Player::O))
            .count() as u8;
        // X 先手：X 的子数只能等于 O 或比 O 多一。
        if x < o || x > o + 1 {
            return Err(IntegrityError::MarkImbalance { x, o });
        }

        if self.outcome != lines::evaluate(&self.board) {
            return Err(IntegrityError::OutcomeMismatch);
        }

        Ok(())
    }

    /// 返回一个中局示例状态（X 威胁首行，轮到 O），方便前端调试或测试。
    pub fn sample() -> Self {
        let mut state = GameState::new().with_mode(GameMode::VsAi);
        state.board[0] = Some(Player::X);
        state.board[3] = Some(Player::O);
        state.board[1] = Some(Player::X);
        state.current_player = Player::O;

        state.record_event(GameEvent::MoveAccepted {
            index: 0,
            player: Player::X,
        });
        state.record_event(GameEvent::TurnChanged { player: Player::O });
        state.record_event(GameEvent::MoveAccepted {
            index: 3,
            player: Player::O,
        });
        state.record_event(GameEvent::TurnChanged { player: Player::X });
        state.record_event(GameEvent::MoveAccepted {
            index: 1,
            player: Player::X,
        });
        state.record_event(GameEvent::TurnChanged { player: Player::O });
        state
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
