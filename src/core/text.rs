//! Name and club normalization.
//!
//! Both sources spell the same people differently: diacritics, hyphens,
//! initials, generational suffixes. Everything here is pure string work so the
//! reconciler can be tested without a network.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];
const CLUB_AFFIXES: &[&str] = &["fc", "afc", "cf", "sc"];

/// Strip diacritics and fold letters that have no decomposition.
///
/// ```rust
/// use pl_collector::core::text::fold_diacritics;
///
/// assert_eq!(fold_diacritics("Martin Ødegaard"), "Martin Odegaard");
/// assert_eq!(fold_diacritics("Kanté"), "Kante");
/// ```
pub fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' | 'ð' => out.push('d'),
            'Đ' | 'Ð' => out.push('D'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ı' => out.push('i'),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("TH"),
            other => out.push(other),
        }
    }
    out
}

/// Lowercased, diacritic-free tokens; apostrophes vanish, other punctuation splits.
fn tokens(input: &str) -> Vec<String> {
    let folded = fold_diacritics(input).to_lowercase();
    let mut cleaned = String::with_capacity(folded.len());
    for c in folded.chars() {
        match c {
            '\'' | '\u{2019}' | '`' => {}
            '&' => cleaned.push_str(" and "),
            c if c.is_alphanumeric() => cleaned.push(c),
            _ => cleaned.push(' '),
        }
    }
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Normalized name tokens with generational suffixes removed.
pub fn name_tokens(name: &str) -> Vec<String> {
    let mut toks = tokens(name);
    if toks.len() > 1 {
        toks.retain(|t| !NAME_SUFFIXES.contains(&t.as_str()));
    }
    toks
}

/// Case-folded, diacritic-free, whitespace-collapsed player name.
///
/// ```rust
/// use pl_collector::core::text::normalize_name;
///
/// assert_eq!(normalize_name("  Heung-min   Son "), "heung min son");
/// assert_eq!(normalize_name("N'Golo Kanté"), "ngolo kante");
/// ```
pub fn normalize_name(name: &str) -> String {
    name_tokens(name).join(" ")
}

/// Normalized club name: affixes like `FC` dropped, common short forms expanded.
pub fn normalize_club(club: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for tok in tokens(club) {
        if CLUB_AFFIXES.contains(&tok.as_str()) {
            continue;
        }
        match tok.as_str() {
            "utd" => out.push("united".to_string()),
            "nottm" | "nottham" => out.push("nottingham".to_string()),
            "spurs" => {
                out.push("tottenham".to_string());
                out.push("hotspur".to_string());
            }
            "wolves" => {
                out.push("wolverhampton".to_string());
                out.push("wanderers".to_string());
            }
            "man" => out.push("manchester".to_string()),
            _ => out.push(tok),
        }
    }
    out.join(" ")
}

/// Whether two club labels plausibly name the same club.
///
/// Equal normalized names agree; a shorter label also agrees when it shares
/// the longer label's first token and all of its tokens appear there
/// (`Brighton` vs `Brighton and Hove Albion`).
pub fn clubs_agree(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_club(a), normalize_club(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let a_toks: Vec<&str> = a.split(' ').collect();
    let b_toks: Vec<&str> = b.split(' ').collect();
    let (short, long) = if a_toks.len() <= b_toks.len() {
        (a_toks, b_toks)
    } else {
        (b_toks, a_toks)
    };
    short[0] == long[0] && short.iter().all(|t| long.contains(t))
}

/// URL slug used by the valuation site: `Erling Haaland` → `erling-haaland`.
pub fn slugify(name: &str) -> String {
    name_tokens(name).join("-")
}
