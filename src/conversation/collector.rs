//! Four-question slot collector.
//!
//! The collector state is never stored; it is always the first missing
//! slot of the session state, so filled slots are skipped automatically.
//! One message may fill several slots at once.

use serde::Serialize;

use crate::session::SessionState;
use crate::slots::{
    parse_brand_stance, parse_budget, parse_message, parse_scene, parse_size, BrandStance, Parsed,
    Scene, SlotHints,
};

const RESET_TOKENS: &[&str] = &["reset", "重置", "清空", "重新开始"];
const SHOW_MORE_TOKENS: &[&str] = &["more", "detail", "更多", "展开", "详细", "详情", "全文"];
const COMPARE_TOKENS: &[&str] = &["compare", "vs", "pk", "对比", "比较", "选哪个", "哪个好"];

/// Which question the conversation is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectorState {
    AskSize,
    AskBudget,
    AskScene,
    AskBrand,
    Ready,
}

impl CollectorState {
    pub fn of(state: &SessionState) -> Self {
        if state.size.is_none() {
            CollectorState::AskSize
        } else if state.budget.is_none() {
            CollectorState::AskBudget
        } else if state.scene.is_none() {
            CollectorState::AskScene
        } else if !state.brand_answered {
            CollectorState::AskBrand
        } else {
            CollectorState::Ready
        }
    }

    /// Question text for this state; `None` once every slot is filled.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            CollectorState::AskSize => Some("Q1/4：你要多大尺寸？（例：75 / 65 / 85）"),
            CollectorState::AskBudget => Some("Q2/4：预算上限多少？（例：6000 / 1.2万 / 8k / 13k）"),
            CollectorState::AskScene => Some("Q3/4：主要场景是什么？（movie / ps5 / bright / sport）"),
            CollectorState::AskBrand => {
                Some("Q4/4：品牌态度？（无所谓 / 只要 某品牌 / 排除 某品牌）")
            }
            CollectorState::Ready => None,
        }
    }
}

/// First question of a round.
pub fn first_prompt() -> &'static str {
    CollectorState::AskSize.prompt().unwrap_or_default()
}

/// Commands recognized before any slot parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    ShowMore,
    Compare,
}

/// Match reserved tokens after dropping whitespace and trailing punctuation.
pub fn command(text: &str) -> Option<Command> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || "。！？，、…～".contains(c))
        .to_lowercase();

    if SHOW_MORE_TOKENS.contains(&compact.as_str()) {
        Some(Command::ShowMore)
    } else if RESET_TOKENS.contains(&compact.as_str()) {
        Some(Command::Reset)
    } else if COMPARE_TOKENS.contains(&compact.as_str()) {
        Some(Command::Compare)
    } else {
        None
    }
}

/// Everything the engines need for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub size: u32,
    pub budget: u32,
    pub scene: Scene,
    pub brand: BrandStance,
}

impl Criteria {
    pub fn from_state(state: &SessionState) -> Option<Self> {
        if !state.is_complete() {
            return None;
        }
        Some(Self {
            size: state.size?,
            budget: state.budget?,
            scene: state.scene?,
            brand: state.brand.clone(),
        })
    }
}

/// What happened to one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The answer was stored; ask the next question.
    Next(&'static str),
    /// The answer did not parse; ask the same question again.
    Retry(&'static str),
    /// All four slots are filled.
    Ready(Criteria),
}

/// Merge one message into `state`.
///
/// A message with marked values (`75寸 预算13000 打游戏`) fills every empty
/// slot it names; slots already filled are kept. Otherwise the text is read
/// as the answer to the pending question alone.
pub fn apply(state: &mut SessionState, text: &str) -> Advance {
    let current = CollectorState::of(state);
    let text = text.trim();

    let hints = parse_message(text);
    let accepted = if text.is_empty() {
        false
    } else if hints.is_empty() {
        answer(state, current, text)
    } else {
        merge_hints(state, hints) > 0
    };

    if !accepted {
        return Advance::Retry(current.prompt().unwrap_or_default());
    }

    match CollectorState::of(state).prompt() {
        Some(next) => Advance::Next(next),
        None => match Criteria::from_state(state) {
            Some(criteria) => Advance::Ready(criteria),
            None => Advance::Retry(first_prompt()),
        },
    }
}

/// Read `text` as the answer to `current`.
fn answer(state: &mut SessionState, current: CollectorState, text: &str) -> bool {
    match current {
        CollectorState::AskSize => match parse_size(text) {
            Parsed::Value(size) => {
                state.size = Some(size);
                true
            }
            Parsed::Unparsed => false,
        },
        CollectorState::AskBudget => match parse_budget(text) {
            Parsed::Value(budget) => {
                state.budget = Some(budget);
                true
            }
            Parsed::Unparsed => false,
        },
        CollectorState::AskScene => match parse_scene(text) {
            Parsed::Value(scene) => {
                state.scene = Some(scene);
                true
            }
            Parsed::Unparsed => false,
        },
        CollectorState::AskBrand => match parse_brand_stance(text) {
            Parsed::Value(stance) => {
                state.brand = stance;
                state.brand_answered = true;
                true
            }
            Parsed::Unparsed => false,
        },
        CollectorState::Ready => true,
    }
}

/// Fill empty slots from `hints`; returns how many were filled.
fn merge_hints(state: &mut SessionState, hints: SlotHints) -> usize {
    let mut filled = 0;
    if let (None, Some(size)) = (state.size, hints.size) {
        state.size = Some(size);
        filled += 1;
    }
    if let (None, Some(budget)) = (state.budget, hints.budget) {
        state.budget = Some(budget);
        filled += 1;
    }
    if let (None, Some(scene)) = (state.scene, hints.scene) {
        state.scene = Some(scene);
        filled += 1;
    }
    if !state.brand_answered {
        if let Some(stance) = hints.brand {
            state.brand = stance;
            state.brand_answered = true;
            filled += 1;
        }
    }
    filled
}
