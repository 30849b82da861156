use std::path::PathBuf;

use tvpick::candidates::{import, InMemoryPool, LaunchPeriod};
use tvpick::conversation::collector::{first_prompt, CollectorState};
use tvpick::render;
use tvpick::scoring::{default_profiles, ScoringEngine};
use tvpick::selection::{AlternateSlot, Outcome, SelectionEngine};
use tvpick::session::{MemorySessionStore, SessionState, SessionStore};
use tvpick::slots::{canonical_brand, BrandStance, Scene};
use tvpick::Conversation;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn chat(fixture: &str) -> Conversation<MemorySessionStore, InMemoryPool> {
    let candidates =
        import::load_json_file(&fixture_path(fixture)).expect("Failed to load fixture");
    Conversation::new(
        MemorySessionStore::default(),
        InMemoryPool::new(candidates),
        ScoringEngine::new(default_profiles()),
        SelectionEngine::new(2026),
    )
    .with_reference_month(LaunchPeriod::new(2026, 6).unwrap())
}

#[test]
fn test_four_answers_then_show_more() {
    let chat = chat("tv_75.json");

    let turn = chat.handle("u1", "75").unwrap();
    assert_eq!(turn.reply, CollectorState::AskBudget.prompt().unwrap());
    let turn = chat.handle("u1", "13k").unwrap();
    assert_eq!(turn.reply, CollectorState::AskScene.prompt().unwrap());
    let turn = chat.handle("u1", "ps5").unwrap();
    assert_eq!(turn.reply, CollectorState::AskBrand.prompt().unwrap());

    let turn = chat.handle("u1", "只要tcl").unwrap();
    assert!(turn.done);
    assert_eq!(
        turn.state,
        SessionState {
            size: Some(75),
            budget: Some(13000),
            scene: Some(Scene::Ps5),
            brand: BrandStance::RestrictTo(vec!["tcl".to_string()]),
            brand_answered: true,
        }
    );

    let result = turn.result.expect("round should produce a result");
    assert_eq!(result.outcome, Outcome::Recommended);
    let top: Vec<_> = result.top.iter().map(|p| p.model.as_str()).collect();
    assert_eq!(top, vec!["Q10M", "Q9M", "T7K"]);
    assert_eq!(result.lowest_price.pick().map(|p| p.model.as_str()), Some("V8G"));
    assert_eq!(result.mid_price, AlternateSlot::Unavailable);
    assert!(turn.reply.contains("1. TCL Q10M | 75寸 | ￥12999 | 首发 2026-03"));
    assert!(turn.reply.contains("更多"));

    let more = chat.handle("u1", "更多").unwrap();
    assert!(!more.done);
    assert_eq!(more.reply, render::long(&result));
    assert_eq!(more.result, Some(result));
    assert_eq!(more.state, SessionState::default());
}

#[test]
fn test_next_round_starts_from_first_question() {
    let chat = chat("tv_75.json");
    for text in ["75", "13k", "ps5", "无所谓"] {
        chat.handle("u1", text).unwrap();
    }
    // the next message is read as a size again
    let turn = chat.handle("u1", "65").unwrap();
    assert_eq!(turn.state.size, Some(65));
    assert_eq!(turn.reply, CollectorState::AskBudget.prompt().unwrap());
}

#[test]
fn test_reset_then_show_more_has_nothing() {
    let chat = chat("tv_75.json");
    for text in ["75", "13k", "ps5", "只要tcl"] {
        chat.handle("u1", text).unwrap();
    }

    let reset = chat.handle("u1", "重置").unwrap();
    assert!(reset.reply.contains(first_prompt()));

    let more = chat.handle("u1", "更多").unwrap();
    assert_eq!(more.reply, render::NOTHING_TO_SHOW);
    assert_eq!(more.result, None);
}

#[test]
fn test_unparsed_answer_repeats_question_verbatim() {
    let chat = chat("tv_75.json");
    chat.handle("u1", "75寸").unwrap();
    let first = chat.handle("u1", "not sure yet").unwrap();
    let second = chat.handle("u1", "").unwrap();
    assert_eq!(first.reply, CollectorState::AskBudget.prompt().unwrap());
    assert_eq!(second.reply, first.reply);
    assert_eq!(second.state.budget, None);
}

#[test]
fn test_excluded_brand_never_recommended() {
    let chat = chat("tv_75.json");
    let mut turn = None;
    for text in ["75", "1.3万", "movie", "排除 tcl"] {
        turn = Some(chat.handle("u1", text).unwrap());
    }
    let result = turn.and_then(|t| t.result).expect("round should produce a result");
    assert!(result.all_picks().count() > 0);
    assert!(result.all_picks().all(|p| canonical_brand(&p.brand) != "tcl"));
    assert!(render::long(&result).contains("排除某品牌"));
}

#[test]
fn test_budget_too_low_reports_no_candidates() {
    let chat = chat("scenario_abc.json");
    let mut last = None;
    for text in ["75", "1000", "ps5", "随便"] {
        last = Some(chat.handle("u1", text).unwrap());
    }
    let turn = last.unwrap();
    assert!(turn.done);
    let result = turn.result.unwrap();
    assert_eq!(result.outcome, Outcome::NoCandidates);
    assert!(turn.reply.contains("暂无可推荐机型"));
    assert!(turn.reply.contains("预算上限：1000 元"));
}

#[test]
fn test_sessions_do_not_share_answers() {
    let chat = chat("tv_75.json");
    chat.handle("a", "75").unwrap();
    chat.handle("a", "13k").unwrap();
    let b = chat.handle("b", "13k").unwrap();
    // "13k" is not a size for a fresh session
    assert_eq!(b.reply, first_prompt());
    assert_eq!(b.state.size, None);
    assert_eq!(chat.store().with_session("a", |e| e.state.budget), Some(13000));
}

#[test]
fn test_single_message_round_then_compare() {
    let chat = chat("tv_75.json");
    let turn = chat.handle("u1", "75寸 预算13000 ps5 只要tcl").unwrap();
    assert!(turn.done);
    let result = turn.result.expect("round should produce a result");
    let top: Vec<_> = result.top.iter().map(|p| p.model.as_str()).collect();
    assert_eq!(top, vec!["Q10M", "Q9M", "T7K"]);

    let compare = chat.handle("u1", "对比").unwrap();
    assert_eq!(compare.reply, render::compare(&result));
    assert!(compare.reply.contains("A：TCL Q10M"));
    assert!(compare.reply.contains("B：TCL Q9M"));
    assert!(compare.reply.contains("结论：选 A（TCL Q10M）"));
    // compare is not read as an answer for the next round
    assert_eq!(compare.state, SessionState::default());
}
