//! 游戏核心逻辑模块（棋盘状态、规则引擎、胜负判定）。

pub mod lines;
pub mod rules;
pub mod state;

pub use lines::{LineId, WIN_LINES};
pub use rules::{MoveAction, RuleEngine, RuleError, RuleResolution};
pub use state::{
    Board,
    CellIndex,
    GameEvent,
    GameMode,
    GameState,
    IntegrityError,
    Outcome,
    Player,
    CELL_COUNT,
};
