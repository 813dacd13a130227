//! 事实文本的关键词相似度
//!
//! 相似度 = 共同关键词数 / 较短文本的关键词数。
//! 关键词提取：小写 → 按空白切分 → 去首尾标点 → 去法语省音前缀 → 去停用词和
//! 长度小于 3 的词 → 同义词归一。
//!
//! 分母取较短一方，短摘要与长描述讲同一件事时也能命中。

use std::collections::HashSet;
use std::sync::OnceLock;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// 少于该字符数的词不算关键词
///
/// 代价：只有一两个字母的名称（Go、C、R）不参与相似度计算，
/// 关于这类语言的事实主要靠其余关键词区分。
const MIN_KEYWORD_CHARS: usize = 3;

const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}', '«', '»', '“', '”',
    '‘', '’', '-', '—', '–', '…', '*', '`',
];

const ELISIONS: &[&str] = &["qu'", "qu’", "l'", "l’", "d'", "d’", "j'", "j’", "n'", "n’", "s'", "s’", "c'", "c’", "m'", "m’", "t'", "t’"];

#[rustfmt::skip]
const STOP_WORDS: &[&str] = &[
    // French
    "le", "la", "les", "un", "une", "des", "du", "de", "et", "ou", "au", "aux", "en", "dans",
    "sur", "pour", "par", "avec", "sans", "est", "sont", "été", "était", "ce", "cette", "ces",
    "qui", "que", "dont", "où", "quand", "comment", "pourquoi", "son", "sa", "ses", "leur",
    "leurs", "mon", "ma", "mes", "il", "elle", "ils", "elles", "on", "nous", "vous", "plus",
    "moins", "très", "bien", "aussi", "comme", "ainsi", "premier", "première", "premiers",
    "premières", "avoir", "être", "fait", "faire", "lors",
    // English
    "the", "an", "of", "in", "on", "at", "to", "for", "by", "with", "from", "is", "are",
    "was", "were", "been", "be", "has", "have", "had", "this", "that", "these", "those",
    "which", "who", "whom", "whose", "when", "where", "why", "how", "first", "one", "two",
    "three", "and", "or", "its", "it", "into", "than", "then", "also", "very", "about",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// 同义词 / 同一概念的不同说法归一到同一个标记
fn canonical(word: &str) -> &str {
    match word {
        "mite" | "moth" | "papillon" | "insecte" | "insect" => "bug_insect",
        "bug" | "bogue" | "erreur" => "bug_term",
        "hopper" | "grace" => "grace_hopper",
        "harvard" | "mark" => "harvard_mark",
        "ordinateur" | "computer" | "informatique" | "machine" => "computer",
        "origine" | "origin" | "histoire" | "history" | "naissance" => "origin",
        "1940" | "1940s" | "1947" => "year_1940s",
        "1990" | "1990s" | "1995" | "1996" | "1997" | "1998" | "1999" => "year_1990s",
        "easter" | "egg" | "caché" | "cache" | "hidden" | "secret" => "easter_egg",
        "simulateur" | "simulator" | "jeu" | "game" => "simulator_game",
        "vol" | "flight" => "flight_sim",
        "excel" | "tableur" | "spreadsheet" | "calc" => "spreadsheet",
        "microsoft" | "office" => "microsoft",
        "développeur" | "developpeur" | "developer" | "programmeur" | "programmer"
        | "ingénieur" | "ingenieur" | "engineer" => "developer",
        "email" | "mail" | "courriel" | "courrier" => "email",
        "internet" | "arpanet" | "réseau" | "reseau" | "network" | "web" => "network",
        "intelligence" | "artificielle" | "artificial" | "learning" | "neural" | "neurone"
        | "deep" => "ai",
        "langage" | "language" | "programmation" | "programming" | "code" | "coder" => {
            "programming"
        }
        "nasa" | "spatial" | "space" | "apollo" | "lune" | "moon" | "fusée" | "rocket" => "space",
        "cryptographie" | "cryptography" | "chiffrement" | "encryption" | "sécurité"
        | "security" | "hacker" | "pirate" => "crypto",
        other => other,
    }
}

/// 小写并合并空白，用于精确比较
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn extract_keywords(text: &str) -> HashSet<String> {
    let stop = stop_words();
    text.to_lowercase()
        .split_whitespace()
        .filter_map(|word| {
            let mut word = word.trim_matches(PUNCTUATION);
            if let Some(rest) = ELISIONS.iter().find_map(|p| word.strip_prefix(*p)) {
                word = rest.trim_matches(PUNCTUATION);
            }
            if word.is_empty()
                || stop.contains(word)
                || word.chars().count() < MIN_KEYWORD_CHARS
            {
                return None;
            }
            Some(canonical(word).to_string())
        })
        .collect()
}

/// 两组关键词的重叠率；任一为空时为 0
pub fn keyword_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let shorter = a.len().min(b.len());
    if shorter == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / shorter as f64
}

pub fn similarity(a: &str, b: &str) -> f64 {
    keyword_overlap(&extract_keywords(a), &extract_keywords(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  The   Moth\tWAS  here\n"), "the moth was here");
        assert_eq!(normalize_text(" \t\n"), "");
    }

    #[test]
    fn test_keywords_drop_noise() {
        let kw = extract_keywords("The first bug, (really) a moth — in 1947!");
        let expected: HashSet<String> = ["bug_term", "really", "bug_insect", "year_1940s"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(kw, expected);
    }

    #[test]
    fn test_french_elision() {
        let kw = extract_keywords("L'origine d'Internet");
        assert!(kw.contains("origin"));
        assert!(kw.contains("network"));
    }

    #[test]
    fn test_moth_restatement_is_similar() {
        let a = "The first computer bug was a real moth found in the Harvard Mark II in 1947.";
        let b = "In 1947, a moth was found inside the Harvard Mark II — the origin of the word 'bug'.";
        let score = similarity(a, b);
        assert!(score >= DEFAULT_SIMILARITY_THRESHOLD, "score = {score}");
    }

    #[test]
    fn test_unrelated_facts() {
        let a = "The first computer bug was a real moth found in the Harvard Mark II in 1947.";
        let b = "Python is named after Monty Python's Flying Circus, not the snake.";
        assert_eq!(similarity(a, b), 0.0);
    }

    #[test]
    fn test_ratio_uses_shorter_side() {
        // 3 个共同词 / 较短一方 3 个词
        let score = similarity(
            "alpha bravo charlie",
            "alpha bravo charlie delta kilo lima",
        );
        assert_eq!(score, 1.0);
        assert_eq!(
            similarity("alpha bravo charlie delta kilo", "alpha bravo charlie xray yankee"),
            0.6
        );
    }

    #[test]
    fn test_short_names_are_not_keywords() {
        let kw = extract_keywords("Go and C were both designed at Bell Labs or Google");
        assert!(!kw.contains("go"));
        assert!(!kw.contains("c"));
        assert!(kw.contains("google"));
    }

    #[test]
    fn test_empty_keywords() {
        assert_eq!(similarity("the a of", "alpha bravo"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
    }
}
