use serde::{Deserialize, Serialize};

use crate::game::{Board, CellIndex, GameState, Outcome, Player, CELL_COUNT};
use crate::game::lines;

const WIN_SCORE: i32 = 1;
const LOSS_SCORE: i32 = -1;
const DRAW_SCORE: i32 = 0;

/// Wall-clock for search statistics. `std::time::Instant` is unavailable on
/// wasm32, so the JS `Date` clock is used there instead.
#[derive(Debug, Clone, Copy)]
struct SearchClock {
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl SearchClock {
    #[cfg(target_arch = "wasm32")]
    fn start() -> Self {
        Self {
            started_ms: web_sys::js_sys::Date::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed_ms(&self) -> u64 {
        (web_sys::js_sys::Date::now() - self.started_ms) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// AI 决策结果，附带搜索统计，便于前端展示与调试。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<CellIndex>,
    pub evaluation: i32,
    pub nodes: u64,
    pub duration_ms: u64,
    pub epoch: u64,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

/// 永远执 O 的对手。对剩余空格做穷举式极小极大搜索，不剪枝、不缓存，
/// 分数不随深度衰减；同分时取编号最小的格子。
#[derive(Debug, Default)]
pub struct AiAgent;

impl AiAgent {
    pub fn new() -> Self {
        Self
    }

    /// 为 O 选出最优落子。棋盘已满或对局已结束时返回 `index: None`。
    pub fn find_best_move(&self, state: &GameState) -> AiDecision {
        let clock = SearchClock::start();
        let mut stats = SearchStats::new();

        if state.is_finished() {
            return AiDecision {
                index: None,
                evaluation: state.outcome.map(Self::score).unwrap_or(DRAW_SCORE),
                nodes: 0,
                duration_ms: clock.elapsed_ms(),
                epoch: state.epoch,
            };
        }

        let mut best_score = i32::MIN;
        let mut best_move: Option<CellIndex> = None;

        for cell in 0..CELL_COUNT {
            if state.board[cell].is_none() {
                // 每个分支都在棋盘的独立副本上模拟，绝不回写调用方的状态。
                let mut board = state.board;
                board[cell] = Some(Player::O);
                let score = Self::search(board, Player::X, &mut stats);

                if score > best_score {
                    best_score = score;
                    best_move = Some(cell as CellIndex);
                }
            }
        }

        AiDecision {
            index: best_move,
            evaluation: if best_move.is_some() {
                best_score
            } else {
                DRAW_SCORE
            },
            nodes: stats.nodes,
            duration_ms: clock.elapsed_ms(),
            epoch: state.epoch,
        }
    }

    fn search(mut board: Board, to_move: Player, stats: &mut SearchStats) -> i32 {
        stats.nodes += 1;

        if let Some(outcome) = lines::evaluate(&board) {
            return Self::score(outcome);
        }

        match to_move {
            Player::O => {
                let mut value = i32::MIN;
                for cell in 0..CELL_COUNT {
                    if board[cell].is_none() {
                        board[cell] = Some(Player::O);
                        value = value.max(Self::search(board, Player::X, stats));
                        board[cell] = None;
                    }
                }
                value
            }
            Player::X => {
                let mut value = i32::MAX;
                for cell in 0..CELL_COUNT {
                    if board[cell].is_none() {
                        board[cell] = Some(Player::X);
                        value = value.min(Self::search(board, Player::O, stats));
                        board[cell] = None;
                    }
                }
                value
            }
        }
    }

    fn score(outcome: Outcome) -> i32 {
        match outcome {
            Outcome::Win {
                winner: Player::O, ..
            } => WIN_SCORE,
            Outcome::Win {
                winner: Player::X, ..
            } => LOSS_SCORE,
            Outcome::Draw => DRAW_SCORE,
        }
    }
}
