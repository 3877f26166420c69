//! Identifier case conversion.
//!
//! Names in an API description are free-form (`radiation_and_weather`,
//! `outputParameters`, `pm2.5`). These helpers turn them into the PascalCase,
//! snake_case and SCREAMING_SNAKE_CASE forms used in generated code. Any
//! character that cannot appear in a Rust identifier acts as a word separator.

use std::collections::HashMap;

use proc_macro2::{Ident, Span};

/// Words that cannot be used as plain identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that are not even allowed as raw identifiers.
const RESERVED: &[&str] = &["crate", "self", "Self", "super"];

/// Converts a name to PascalCase.
///
/// Every letter that follows a non-letter (or starts the string) is upper-cased
/// and every other letter is lower-cased; separators are dropped.
///
/// ## Examples
///
/// ```
/// use sdkgen_lib::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("radiation_and_weather"), "RadiationAndWeather");
/// assert_eq!(to_pascal_case("pv-power"), "PvPower");
/// assert_eq!(to_pascal_case("forecast"), "Forecast");
/// ```
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else if c.is_alphanumeric() {
            out.push(c);
            prev_is_letter = false;
        } else {
            prev_is_letter = false;
        }
    }
    out
}

/// Converts a name to snake_case, splitting on separators and on CamelCase
/// word boundaries.
///
/// ## Examples
///
/// ```
/// use sdkgen_lib::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("GetRadiationForecast"), "get_radiation_forecast");
/// assert_eq!(to_snake_case("outputParameters"), "output_parameters");
/// assert_eq!(to_snake_case("pm2.5"), "pm2_5");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|chunk| !chunk.is_empty())
        .flat_map(split_camel_case)
        .map(str::to_lowercase)
        .collect();
    let joined = words.join("_");
    if joined.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", joined)
    } else {
        joined
    }
}

/// Converts a name to SCREAMING_SNAKE_CASE.
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).to_uppercase()
}

/// Makes a type name usable as a Rust type identifier while keeping its
/// existing capitalization (`RadiationResponse` stays as is, `pv site`
/// becomes `PvSite`).
pub fn to_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for chunk in name.split(|c: char| !c.is_alphanumeric()).filter(|c| !c.is_empty()) {
        let mut chars = chunk.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        return "Unnamed".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'T');
    }
    out
}

/// Builds an identifier, using the raw form for keywords.
///
/// `self`, `Self`, `super` and `crate` cannot be raw identifiers and get a
/// trailing underscore instead.
pub fn ident(name: &str) -> Ident {
    if RESERVED.contains(&name) {
        Ident::new(&format!("{}_", name), Span::call_site())
    } else if KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

/// A snake_case name usable as a module and file name. Keywords get a
/// trailing underscore rather than the raw form, so the file name stays plain.
pub fn module_name(name: &str) -> String {
    let snake = to_snake_case(name);
    if snake.is_empty() {
        "unnamed".to_string()
    } else if KEYWORDS.contains(&snake.as_str()) || RESERVED.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else {
        snake
    }
}

/// Hands out unique names, suffixing repeats with `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashMap<String, usize>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `name` up front so later requests for it get a suffix.
    pub fn reserve(&mut self, name: &str) {
        self.seen.entry(name.to_string()).or_insert(1);
    }

    pub fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        while let Some(count) = self.seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{}_{}", name, count);
        }
        self.seen.insert(candidate.clone(), 1);
        candidate
    }
}

/// Splits a CamelCase string into individual words.
///
/// - "GetRadiationForecast" -> ["Get", "Radiation", "Forecast"]
/// - "HTTPClient" -> ["HTTP", "Client"]
/// - "outputParameters" -> ["output", "Parameters"]
fn split_camel_case(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut word_start = 0;
    let chars: Vec<(usize, char)> = s.char_indices().collect();

    for i in 1..chars.len() {
        let (idx, current) = chars[i];
        let prev = chars[i - 1].1;

        let is_new_word = current.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (i + 1 < chars.len() && chars[i + 1].1.is_lowercase() && prev.is_uppercase()));

        if is_new_word {
            if idx > word_start {
                words.push(&s[word_start..idx]);
            }
            word_start = idx;
        }
    }

    if word_start < s.len() {
        words.push(&s[word_start..]);
    }

    words
}
