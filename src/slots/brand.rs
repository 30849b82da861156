//! Brand name canonicalization shared by the stance parser and the
//! candidate filters.

/// Known aliases mapped to a canonical lowercase key.
const BRAND_ALIASES: &[(&str, &[&str])] = &[
    ("tcl", &["tcl", "t.c.l"]),
    ("hisense", &["hisense", "海信"]),
    ("sony", &["sony", "索尼"]),
    ("samsung", &["samsung", "三星"]),
    ("mi", &["mi", "xiaomi", "小米"]),
    ("lg", &["lg"]),
    ("vidda", &["vidda"]),
    ("skyworth", &["skyworth", "创维"]),
    ("huawei", &["huawei", "华为"]),
    ("sharp", &["sharp", "夏普"]),
    ("philips", &["philips", "飞利浦"]),
    ("changhong", &["changhong", "长虹"]),
    ("konka", &["konka", "康佳"]),
];

/// Canonical comparison key for a brand as typed by a user or stored in the
/// candidate data. Unknown brands pass through lowercased and trimmed.
///
/// Data sources sometimes prefix the brand to a marketing name
/// (e.g. "hisense 海信E8S"), so the first whitespace-separated word is what
/// gets matched against the alias table.
pub fn canonical_brand(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let head = lowered.split_whitespace().next().unwrap_or("");
    for (canonical, aliases) in BRAND_ALIASES {
        if aliases.iter().any(|a| *a == head || *a == lowered) {
            return (*canonical).to_string();
        }
    }
    lowered
}

/// Whether `raw` names a brand from the alias table.
pub fn is_known_brand(raw: &str) -> bool {
    let key = canonical_brand(raw);
    BRAND_ALIASES.iter().any(|(canonical, _)| *canonical == key)
}

/// Display form used in replies.
pub fn display_brand(canonical: &str) -> String {
    match canonical {
        "tcl" | "lg" => canonical.to_uppercase(),
        "mi" => "小米".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}
