pub mod ai;
pub mod game;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiDecision};
pub use game::{
    Board, CellIndex, GameEvent, GameMode, GameState, IntegrityError, LineId, MoveAction, Outcome,
    Player, RuleEngine, RuleError, RuleResolution, CELL_COUNT, WIN_LINES,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn resolution_from_events(state: &GameState, events: Vec<GameEvent>) -> RuleResolution {
    RuleResolution::new(state.clone(), events)
}

// 拒绝的落子不改动状态，只以事件的形式回报给展示层。
fn rejection_resolution(state: &GameState, index: CellIndex, error: RuleError) -> RuleResolution {
    RuleResolution::new(
        state.clone(),
        vec![GameEvent::MoveRejected {
            index,
            reason: error,
        }],
    )
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<RuleResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<GameEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            serde_json::from_str(&json).map_err(serde_to_js_error)?
        } else {
            GameState::new()
        };
        Ok(GameEngine { state })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn epoch(&self) -> u64 {
        self.state.epoch
    }

    /// 人类落子入口。非法落子不会抛出异常，而是返回仅含
    /// `MoveRejected` 事件的结算结果，状态保持不变。
    pub fn request_move(&mut self, index: u8) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        match engine.apply_move(&mut self.state, MoveAction { index }) {
            Ok(events) => make_resolution_json(resolution_from_events(&self.state, events)),
            Err(error) => make_resolution_json(rejection_resolution(&self.state, index, error)),
        }
    }

    /// 立即计算并执行 AI 落子，走与人类落子相同的校验路径。
    pub fn request_ai_move(&mut self) -> Result<String, JsValue> {
        let agent = AiAgent::new();
        let decision = agent.find_best_move(&self.state);

        let applied = decision
            .index
            .map(|index| self.apply_decision(&decision, index));

        let response = AiMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    /// 在克隆的状态上异步计算 AI 落子，可选延迟用来模拟“思考”。
    /// 结果需经 `apply_thought` 应用，期间发生的 reset 会使其作废。
    pub fn think_move(&self, delay_ms: Option<u32>) -> Promise {
        let state = self.state.clone();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = AiAgent::new().find_best_move(&state);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    /// 应用 `think_move` 先前计算出的决策。
    pub fn apply_thought(&mut self, decision_json: &str) -> Result<String, JsValue> {
        let decision: AiDecision = serde_json::from_str(decision_json).map_err(serde_to_js_error)?;
        match decision.index {
            Some(index) => {
                let resolution = self.apply_decision(&decision, index);
                make_resolution_json(resolution)
            }
            None => make_resolution_json(resolution_from_events(&self.state, Vec::new())),
        }
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let mut engine = RuleEngine::new();
        let events = engine.reset(&mut self.state);
        make_resolution_json(resolution_from_events(&self.state, events))
    }

    /// 切换对局模式并重新开局。
    pub fn set_game_mode(&mut self, vs_ai: bool) -> Result<String, JsValue> {
        self.state.mode = if vs_ai {
            GameMode::VsAi
        } else {
            GameMode::TwoPlayer
        };
        self.reset()
    }

    fn apply_decision(&mut self, decision: &AiDecision, index: CellIndex) -> RuleResolution {
        let mut engine = RuleEngine::new();
        match engine.apply_move_at_epoch(&mut self.state, MoveAction { index }, decision.epoch) {
            Ok(events) => resolution_from_events(&self.state, events),
            Err(error) => {
                if matches!(error, RuleError::StaleDecision { .. }) {
                    warn_stale_discard();
                }
                rejection_resolution(&self.state, index, error)
            }
        }
    }
}

/// 创建一局全新的游戏状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::new()).map_err(JsValue::from)
}

/// 返回一个中局示例状态，方便前端调试或初始化。
#[wasm_bindgen(js_name = "sampleGameState")]
pub fn sample_game_state() -> Result<JsValue, JsValue> {
    to_value(&GameState::sample()).map_err(JsValue::from)
}

/// 将传入的游戏状态进行深拷贝后返回。
#[wasm_bindgen(js_name = "cloneGameState")]
pub fn clone_game_state(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let cloned = state.clone();
    to_value(&cloned).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move(state: JsValue, index: u8) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    match engine.apply_move(&mut state, MoveAction { index }) {
        Ok(events) => to_value(&RuleResolution::new(state, events)).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "resetGame")]
pub fn reset_game(state: JsValue) -> Result<JsValue, JsValue> {
    let mut state: GameState = from_value(state).map_err(JsValue::from)?;
    let mut engine = RuleEngine::new();
    let events = engine.reset(&mut state);
    to_value(&RuleResolution::new(state, events)).map_err(JsValue::from)
}

/// 对棋盘做一次胜负扫描；对局未结束时返回 `null`。
#[wasm_bindgen(js_name = "checkWinner")]
pub fn check_winner(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let outcome = game::lines::evaluate(&state.board);
    to_value(&outcome).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

/// 为传入状态计算 AI 落子，不改动任何状态。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(state: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let decision = AiAgent::new().find_best_move(&state);
    to_value(&decision).map_err(JsValue::from)
}

#[cfg(target_arch = "wasm32")]
fn warn_stale_discard() {
    web_sys::console::warn_1(&"discarding AI decision computed before the last reset".into());
}

#[cfg(not(target_arch = "wasm32"))]
fn warn_stale_discard() {}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_move_reports_an_event_and_keeps_the_state() {
        let mut engine = GameEngine::new(None).expect("engine should build");
        engine.request_move(4).expect("move should apply");
        let before = engine.state_json().expect("state should serialize");

        let json = engine.request_move(4).expect("rejection should not throw");
        let resolution: RuleResolution =
            serde_json::from_str(&json).expect("resolution should parse");

        assert_eq!(
            resolution.events,
            vec![GameEvent::MoveRejected {
                index: 4,
                reason: RuleError::CellOccupied { index: 4 }
            }]
        );
        assert_eq!(engine.state_json().expect("state should serialize"), before);
    }

    #[test]
    fn ai_move_goes_through_the_move_application_path() {
        let sample = serde_json::to_string(&GameState::sample()).expect("sample serializes");
        let mut engine = GameEngine::new(Some(sample)).expect("engine should build");

        let json = engine.request_ai_move().expect("ai move should apply");
        assert!(json.contains("\"decision\""));
        assert!(json.contains("\"applied\""));

        let state: GameState =
            serde_json::from_str(&engine.state_json().expect("state json")).expect("state parses");
        assert_eq!(state.cell(2), Some(Player::O), "the block must be played");
        assert_eq!(state.current_player, Player::X);
    }

    #[test]
    fn thought_from_before_a_reset_is_discarded() {
        let sample = serde_json::to_string(&GameState::sample()).expect("sample serializes");
        let mut engine = GameEngine::new(Some(sample)).expect("engine should build");

        let stale = AiAgent::new().find_best_move(&GameState::sample());
        let stale_json = serde_json::to_string(&stale).expect("decision serializes");

        engine.reset().expect("reset should succeed");
        let before = engine.state_json().expect("state should serialize");

        let json = engine
            .apply_thought(&stale_json)
            .expect("stale thought should be discarded, not thrown");
        let resolution: RuleResolution =
            serde_json::from_str(&json).expect("resolution should parse");

        assert!(matches!(
            resolution.events.as_slice(),
            [GameEvent::MoveRejected {
                reason: RuleError::StaleDecision { .. },
                ..
            }]
        ));
        assert_eq!(engine.state_json().expect("state should serialize"), before);
    }

    #[test]
    fn switching_the_mode_resets_the_game() {
        let mut engine = GameEngine::new(None).expect("engine should build");
        engine.request_move(0).expect("move should apply");

        let epoch_before = engine.epoch();
        engine.set_game_mode(true).expect("mode switch should work");

        let state: GameState =
            serde_json::from_str(&engine.state_json().expect("state json")).expect("state parses");
        assert_eq!(state.mode, GameMode::VsAi);
        assert_eq!(state.board, [None; CELL_COUNT]);
        assert_eq!(engine.epoch(), epoch_before + 1);
    }
}
