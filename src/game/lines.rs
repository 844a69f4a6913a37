//! 胜负判定：对 8 条固定连线的纯函数扫描。

use super::state::{Board, Outcome, Player};

/// 连线编号（0-7），前端按编号绘制获胜线条。
pub type LineId = u8;

/// 8 条获胜连线：三行、三列、主对角线、副对角线，顺序固定。
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub fn is_full(board: &Board) -> bool {
    board.iter().all(|cell| cell.is_some())
}

/// 扫描棋盘：返回按固定顺序找到的第一条完成连线；棋盘占满且无连线时为平局；
/// 否则返回 `None` 表示对局继续。
pub fn evaluate(board: &Board) -> Option<Outcome> {
    for (line_id, line) in WIN_LINES.iter().enumerate() {
        let [a, b, c] = *line;
        if let Some(winner) = board[a] {
            if board[b] == Some(winner) && board[c] == Some(winner) {
                return Some(Outcome::Win {
                    winner,
                    line: line_id as LineId,
                });
            }
        }
    }

    if is_full(board) {
        return Some(Outcome::Draw);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::CELL_COUNT;

    const X: Option<Player> = Some(Player::X);
    const O: Option<Player> = Some(Player::O);
    const E: Option<Player> = None;

    #[test]
    fn empty_board_is_still_in_play() {
        assert_eq!(evaluate(&[E; CELL_COUNT]), None);
    }

    #[test]
    fn detects_each_line_with_its_id() {
        for (line_id, line) in WIN_LINES.iter().enumerate() {
            let mut board: Board = [E; CELL_COUNT];
            for cell in line {
                board[*cell] = O;
            }
            assert_eq!(
                evaluate(&board),
                Some(Outcome::Win {
                    winner: Player::O,
                    line: line_id as LineId
                }),
                "line {line_id} should be reported with its own id"
            );
        }
    }

    #[test]
    fn full_board_without_line_is_a_draw() {
        let board: Board = [X, X, O, O, O, X, X, O, X];
        assert_eq!(evaluate(&board), Some(Outcome::Draw));
    }

    #[test]
    fn scan_order_breaks_ties_deterministically() {
        // Row 0 and column 0 are both complete; the row comes first in scan
        // order and must win every time.
        let board: Board = [X, X, X, X, O, O, X, O, E];
        assert_eq!(
            evaluate(&board),
            Some(Outcome::Win {
                winner: Player::X,
                line: 0
            })
        );
    }

    #[test]
    fn win_on_a_full_board_beats_draw() {
        let board: Board = [X, X, X, O, O, X, X, O, O];
        assert_eq!(
            evaluate(&board),
            Some(Outcome::Win {
                winner: Player::X,
                line: 0
            })
        );
    }
}
