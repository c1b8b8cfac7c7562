//! Script-aware collation for alphabetic ordering
//!
//! Labels sort by script first (Latin, then kana, then kanji, then anything
//! else) and then by a folded form of the text: Latin is lowercased with
//! common diacritics and romaji macrons removed, katakana is folded onto
//! hiragana, punctuation and whitespace are ignored.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Script {
    Latin,
    Kana,
    Kanji,
    Other,
}

/// Sort key for one label
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollationKey {
    script: Script,
    folded: String,
}

impl CollationKey {
    pub fn new(label: &str) -> Self {
        let folded = fold(label);
        let script = folded.chars().next().map_or(Script::Other, script_of);
        Self { script, folded }
    }

    pub fn script(&self) -> Script {
        self.script
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Quick-scroll label: initial letter, kana row, or the kanji itself
    pub fn index_label(&self) -> String {
        let Some(first) = self.folded.chars().next() else {
            return "#".to_string();
        };
        match self.script {
            Script::Latin if first.is_ascii_digit() => "#".to_string(),
            Script::Latin => first.to_uppercase().collect(),
            Script::Kana => kana_row(first).unwrap_or(first).to_string(),
            Script::Kanji | Script::Other => first.to_string(),
        }
    }
}

/// Compare two labels; identical keys fall back to the raw text
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    CollationKey::new(a)
        .cmp(&CollationKey::new(b))
        .then_with(|| a.cmp(b))
}

fn fold(label: &str) -> String {
    let mut folded = String::with_capacity(label.len());
    for c in label.chars() {
        if !c.is_alphanumeric() {
            continue;
        }
        let c = katakana_to_hiragana(c);
        for lower in c.to_lowercase() {
            folded.push(strip_diacritic(lower));
        }
    }
    folded
}

fn katakana_to_hiragana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

fn script_of(c: char) -> Script {
    match c {
        '0'..='9' | 'a'..='z' | 'A'..='Z' | '\u{00C0}'..='\u{024F}' => Script::Latin,
        '\u{3041}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' => Script::Kana,
        '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}' => {
            Script::Kanji
        }
        _ => Script::Other,
    }
}

/// Head of the gojūon row a hiragana character belongs to
fn kana_row(c: char) -> Option<char> {
    let row = match c {
        '\u{3041}'..='\u{304A}' | '\u{3094}' => 'あ',
        '\u{304B}'..='\u{3054}' | '\u{3095}'..='\u{3096}' => 'か',
        '\u{3055}'..='\u{305E}' => 'さ',
        '\u{305F}'..='\u{3069}' => 'た',
        '\u{306A}'..='\u{306E}' => 'な',
        '\u{306F}'..='\u{307D}' => 'は',
        '\u{307E}'..='\u{3082}' => 'ま',
        '\u{3083}'..='\u{3088}' => 'や',
        '\u{3089}'..='\u{308D}' => 'ら',
        '\u{308E}'..='\u{3093}' => 'わ',
        _ => return None,
    };
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_grouped() {
        let mut labels = vec!["日本", "たべる", "apple", "Zebra", "カメラ"];
        labels.sort_by(|a, b| compare_labels(a, b));
        assert_eq!(labels, vec!["apple", "Zebra", "カメラ", "たべる", "日本"]);
    }

    #[test]
    fn test_folding() {
        assert_eq!(CollationKey::new("Tōkyō").folded(), "tokyo");
        assert_eq!(CollationKey::new("(to) eat").folded(), "toeat");
        assert_eq!(CollationKey::new("カタカナ").folded(), "かたかな");
        assert_eq!(CollationKey::new("カタカナ"), CollationKey::new("かたかな"));
        assert_eq!(CollationKey::new("...").script(), Script::Other);
    }

    #[test]
    fn test_case_and_accent_ties_break_on_raw_text() {
        assert_eq!(compare_labels("cafe", "café"), Ordering::Less);
        assert_eq!(compare_labels("Cafe", "cafe"), Ordering::Less);
        assert_eq!(compare_labels("cafe", "cafe"), Ordering::Equal);
    }

    #[test]
    fn test_index_labels() {
        assert_eq!(CollationKey::new("apple").index_label(), "A");
        assert_eq!(CollationKey::new("éclair").index_label(), "E");
        assert_eq!(CollationKey::new("7 days").index_label(), "#");
        assert_eq!(CollationKey::new("ぎんこう").index_label(), "か");
        assert_eq!(CollationKey::new("ショップ").index_label(), "さ");
        assert_eq!(CollationKey::new("んー").index_label(), "わ");
        assert_eq!(CollationKey::new("日本").index_label(), "日");
        assert_eq!(CollationKey::new("").index_label(), "#");
    }
}
