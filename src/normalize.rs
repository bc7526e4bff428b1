//! Word normalization shared by the embedding index and the solver.
//!
//! Two forms exist. [`normalize`] trims and lowercases and is what gets
//! submitted to the oracle, so accents survive. [`fold_key`] additionally
//! folds diacritics and is only used as the lookup key inside the index.

/// Trim surrounding whitespace and lowercase.
pub fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Normalize and fold diacritics so `"Rêve"`, `"reve"` and `"rêve"` share a key.
pub fn fold_key(word: &str) -> String {
    let normalized = normalize(word);
    let mut out = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match fold_char(c) {
            Folded::Keep => out.push(c),
            Folded::Drop => {}
            Folded::One(r) => out.push(r),
            Folded::Two(a, b) => {
                out.push(a);
                out.push(b);
            }
        }
    }
    out
}

enum Folded {
    Keep,
    Drop,
    One(char),
    Two(char, char),
}

fn fold_char(c: char) -> Folded {
    use Folded::*;
    match c {
        '\u{0300}'..='\u{036F}' => Drop,
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => One('a'),
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => One('c'),
        'ď' | 'đ' => One('d'),
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => One('e'),
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => One('g'),
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => One('i'),
        'ñ' | 'ń' | 'ņ' | 'ň' => One('n'),
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => One('o'),
        'ŕ' | 'ř' => One('r'),
        'ś' | 'ŝ' | 'ş' | 'š' => One('s'),
        'ţ' | 'ť' => One('t'),
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => One('u'),
        'ý' | 'ÿ' => One('y'),
        'ź' | 'ż' | 'ž' => One('z'),
        'œ' => Two('o', 'e'),
        'æ' => Two('a', 'e'),
        'ß' => Two('s', 's'),
        _ => Keep,
    }
}
