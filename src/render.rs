//! Text renderings of a recommendation result.
//!
//! `short` is the reply that ends a round; `long` is what "show more"
//! replays and `compare` puts Top-1 against Top-2. All of them read only
//! the cached result, never the candidate pool.

use crate::selection::{AlternateSlot, AppliedFilters, Outcome, Pick, RecommendationResult};
use crate::slots::{parse_scene, BrandStance};

/// Reply to "show more" when no round has completed yet.
pub const NOTHING_TO_SHOW: &str = "暂无可展开的结果：请先完成 4 个问题拿到推荐。";

const RULE: &str = "--------------------------------------------------------------------";

/// Human label for a metric name; unknown metrics keep their raw name.
pub fn metric_label(metric: &str) -> &str {
    match metric {
        "input_lag_ms_60hz" => "输入延迟",
        "hdmi_2_1_ports" => "HDMI 2.1 接口数",
        "vrr" => "VRR",
        "allm" => "ALLM",
        "peak_brightness_nits" => "峰值亮度",
        "local_dimming_zones" => "控光分区",
        "reflection_specular" => "镜面反射",
        "uniformity_gray50_max_dev" => "灰阶均匀性偏差",
        "color_gamut_dci_p3" => "DCI-P3 色域",
        "refresh_rate_hz" => "刷新率",
        "price" => "价格",
        "launch_recency" => "上市时间",
        other => other,
    }
}

fn pick_line(p: &Pick) -> String {
    let launch = p
        .launch
        .map(|l| l.to_string())
        .unwrap_or_else(|| "未知".to_string());
    format!(
        "{} {} | {}寸 | ￥{} | 首发 {}",
        p.brand, p.model, p.size_inch, p.price, launch
    )
}

fn scene_text(scene: &str) -> String {
    parse_scene(scene)
        .value()
        .map(|s| s.description().to_string())
        .unwrap_or_else(|| scene.to_string())
}

fn push_filters(lines: &mut Vec<String>, f: &AppliedFilters) {
    lines.push(format!("- 尺寸：{} 寸", f.size));
    lines.push(format!("- 预算上限：{} 元", f.budget));
    lines.push(format!("- 场景：{}", f.scene));
    lines.push(format!("- 品牌：{}", f.brand.describe()));
}

fn push_alternates(lines: &mut Vec<String>, result: &RecommendationResult, detailed: bool) {
    let slots = [
        ("备选1｜低价款", &result.lowest_price),
        ("备选2｜中价款", &result.mid_price),
    ];
    for (label, slot) in slots {
        match slot {
            AlternateSlot::Available(p) => {
                lines.push(format!("{}：{}", label, pick_line(p)));
                if detailed {
                    push_pick_detail(lines, p);
                }
            }
            AlternateSlot::Unavailable => {
                lines.push(format!("{}：暂无（预算内找不到不重复且有价格的候选）", label))
            }
        }
    }
}

fn push_pick_detail(lines: &mut Vec<String>, p: &Pick) {
    lines.push(format!("   综合得分：{:.3}", p.score));

    let mut parts: Vec<(&String, &f64)> = p.contributions.iter().filter(|(_, v)| **v > 0.0).collect();
    parts.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !parts.is_empty() {
        let text = parts
            .iter()
            .map(|(m, v)| format!("{} +{:.3}", metric_label(m), v))
            .collect::<Vec<_>>()
            .join("，");
        lines.push(format!("   加分项：{}", text));
    }
    if !p.adjustments.is_empty() {
        lines.push(format!("   扣分项：{}", p.adjustments.join("；")));
    }
}

fn brand_note(stance: &BrandStance) -> &'static str {
    match stance {
        BrandStance::RestrictTo(_) => "说明：你选择了“只要某品牌”，因此 Top3/+2 都在该品牌内找。",
        BrandStance::Exclude(_) => "说明：你选择了“排除某品牌”，因此结果已过滤这些品牌。",
        BrandStance::Unrestricted => "说明：你未限制品牌，因此 Top3/+2 允许跨品牌。",
    }
}

/// Reply when nothing survived filtering.
pub fn no_candidates(result: &RecommendationResult) -> String {
    let mut lines = vec!["⚠️ 当前条件下暂无可推荐机型".to_string()];
    push_filters(&mut lines, &result.filters);
    lines.push(String::new());
    lines.push("常见原因：预算内可用候选不足，或价格缺失被过滤。可以回复“重置”放宽条件再试。".to_string());
    lines.join("\n")
}

/// Compact reply for a finished round.
pub fn short(result: &RecommendationResult) -> String {
    if result.outcome == Outcome::NoCandidates {
        return no_candidates(result);
    }

    let mut lines = vec!["✅ 已收集需求（固定4问完成）".to_string()];
    push_filters(&mut lines, &result.filters);
    lines.push(String::new());
    lines.push("Top3：".to_string());
    for (i, p) in result.top.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, pick_line(p)));
    }
    lines.push(String::new());
    push_alternates(&mut lines, result, false);
    lines.push(String::new());
    lines.push("回复：更多 查看详细分析｜对比 查看前两名差异".to_string());
    lines.join("\n")
}

/// Full explanation of a cached result.
pub fn long(result: &RecommendationResult) -> String {
    if result.outcome == Outcome::NoCandidates {
        return no_candidates(result);
    }

    let f = &result.filters;
    let mut lines = vec!["📋 详细分析".to_string()];
    push_filters(&mut lines, f);
    lines.push(format!("- 场景权重：{}", scene_text(&f.scene)));
    lines.push(format!("- 符合条件的候选：{} 台", result.eligible));
    lines.push(String::new());

    lines.push(format!(
        "Top3：当前条件下综合最优（预算内，{} 年新品优先）",
        f.preferred_year
    ));
    lines.push(RULE.to_string());
    for (i, p) in result.top.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, pick_line(p)));
        push_pick_detail(&mut lines, p);
    }
    lines.push(String::new());

    lines.push("+2 备选（不重复 Top3）".to_string());
    lines.push(RULE.to_string());
    push_alternates(&mut lines, result, true);
    lines.push(String::new());

    lines.push(format!(
        "说明：排序规则={} 年首发优先 → 综合得分高→低 → 首发时间新→旧 → 价格高→低。",
        f.preferred_year
    ));
    lines.push(brand_note(&f.brand).to_string());
    lines.join("\n")
}

/// Contribution gaps below this count as a tie.
const TIE_EPSILON: f64 = 1e-9;

/// Head-to-head of the two best picks: per-metric differences, a verdict
/// with reasons, and who each one does not suit.
pub fn compare(result: &RecommendationResult) -> String {
    let (a, b) = match result.top.as_slice() {
        [a, b, ..] => (a, b),
        _ => return NOTHING_TO_COMPARE.to_string(),
    };

    let mut lines = vec!["⚖️ Top1 vs Top2".to_string()];
    lines.push(format!("A：{}", pick_line(a)));
    lines.push(format!("B：{}", pick_line(b)));
    lines.push(RULE.to_string());

    let gaps = metric_gaps(a, b);
    lines.push("差异：".to_string());
    for (metric, av, bv) in &gaps {
        let verdict = if (av - bv).abs() <= TIE_EPSILON {
            "两者一致"
        } else if av > bv {
            "A更好"
        } else {
            "B更好"
        };
        lines.push(format!(
            "- {}：A +{:.3}，B +{:.3}（{}）",
            metric_label(metric),
            av,
            bv,
            verdict
        ));
    }
    lines.push(String::new());

    let (winner, loser, name) = if b.score > a.score { (b, a, "B") } else { (a, b, "A") };
    lines.push(format!("结论：选 {}（{} {}）", name, winner.brand, winner.model));
    if (a.score - b.score).abs() <= TIE_EPSILON {
        lines.push("- 综合得分相同，按排序优先 A".to_string());
    } else {
        lines.push(format!(
            "- 综合得分 {} 更高（{:.3} > {:.3}）",
            name, winner.score, loser.score
        ));
    }
    let mut leads: Vec<&(String, f64, f64)> = gaps
        .iter()
        .filter(|(_, av, bv)| {
            let lead = if name == "A" { av - bv } else { bv - av };
            lead > TIE_EPSILON
        })
        .collect();
    leads.sort_by(|x, y| (y.1 - y.2).abs().total_cmp(&(x.1 - x.2).abs()));
    for (metric, _, _) in leads.into_iter().take(2) {
        lines.push(format!("- {}：{} 更占优", metric_label(metric), name));
    }
    lines.push(String::new());

    lines.push("不适合谁：".to_string());
    lines.push(format!("- A：{}", not_suited(a)));
    lines.push(format!("- B：{}", not_suited(b)));
    lines.join("\n")
}

/// Reply to "compare" when there are fewer than two picks to compare.
pub const NOTHING_TO_COMPARE: &str = "暂无可对比的结果：需要先完成一轮推荐，且 Top3 至少有 2 台。";

/// Weighted metrics of both picks, largest gap first.
fn metric_gaps(a: &Pick, b: &Pick) -> Vec<(String, f64, f64)> {
    let mut gaps: Vec<(String, f64, f64)> = a
        .contributions
        .keys()
        .chain(b.contributions.keys())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .map(|m| {
            let av = a.contributions.get(m).copied().unwrap_or(0.0);
            let bv = b.contributions.get(m).copied().unwrap_or(0.0);
            (m.clone(), av, bv)
        })
        .collect();
    gaps.sort_by(|x, y| {
        (y.1 - y.2)
            .abs()
            .total_cmp(&(x.1 - x.2).abs())
            .then_with(|| x.0.cmp(&y.0))
    });
    gaps
}

/// Weak spots of one pick: metrics that earned nothing plus fired penalties.
fn not_suited(p: &Pick) -> String {
    let mut parts: Vec<String> = p
        .contributions
        .iter()
        .filter(|(_, v)| **v <= TIE_EPSILON)
        .map(|(m, _)| format!("看重{}的用户", metric_label(m)))
        .collect();
    parts.extend(p.adjustments.iter().map(|a| format!("在意扣分项（{}）的用户", a)));
    if parts.is_empty() {
        "暂无明显短板".to_string()
    } else {
        parts.join("；")
    }
}
