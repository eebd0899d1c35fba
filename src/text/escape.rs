//! Control-sequence conversion for bubble text.
//!
//! Text goes through two passes. Substitution replaces `\V[n]`, `\N[n]`,
//! `\P[n]` and `\G` with their values and turns `\\` into a literal
//! backslash. Stripping then removes the remaining directives (`\C[n]`,
//! `\I[n]`, `\{`, `\}` and friends) and splits the result into drawable lines.

/// Marker standing in for an unescaped backslash between the two passes.
const ESC: char = '\u{1b}';

/// Single-symbol directives recognised after a backslash.
const SYMBOL_CODES: &str = "$.|^!><{}\\";

/// Directives that consume a trailing `[n]` parameter.
const PARAM_CODES: [&str; 5] = ["C", "I", "PX", "PY", "FS"];

/// Host values referenced by substitution sequences.
pub trait TextContext {
    /// Value of the game variable at `id`; unset variables read as 0.
    fn variable(&self, id: usize) -> i32;

    /// Name of the actor with database id `id`.
    fn actor_name(&self, id: usize) -> Option<&str>;

    /// Name of the party member at 1-based position `index`.
    fn party_member_name(&self, index: usize) -> Option<&str>;

    fn currency_unit(&self) -> &str;
}

/// Text after substitution and directive stripping, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedText {
    pub lines: Vec<String>,
}

impl ConvertedText {
    /// Number of drawn characters. Line breaks are not drawn.
    pub fn visible_length(&self) -> usize {
        self.lines.iter().map(|line| line.chars().count()).sum()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs both passes over `text`.
pub fn convert(text: &str, context: &dyn TextContext) -> ConvertedText {
    strip_directives(&substitute(text, context))
}

/// Substitution pass. Directives survive as `ESC` + code for the next pass.
pub fn substitute(text: &str, context: &dyn TextContext) -> String {
    let mut converted = text.replace('\\', &ESC.to_string());
    converted = converted.replace(&format!("{ESC}{ESC}"), "\\");

    // Repeated so that `\V[\V[1]]` resolves the inner reference first.
    while let Some(next) = substitute_param(&converted, 'V', |id| context.variable(id).to_string())
    {
        converted = next;
    }

    if let Some(next) = substitute_param(&converted, 'N', |id| {
        context.actor_name(id).unwrap_or_default().to_string()
    }) {
        converted = next;
    }

    if let Some(next) = substitute_param(&converted, 'P', |index| {
        context
            .party_member_name(index)
            .unwrap_or_default()
            .to_string()
    }) {
        converted = next;
    }

    let mut with_currency = String::with_capacity(converted.len());
    let mut chars = converted.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == ESC && chars.peek().is_some_and(|next| next.eq_ignore_ascii_case(&'G')) {
            chars.next();
            with_currency.push_str(context.currency_unit());
        } else {
            with_currency.push(ch);
        }
    }

    with_currency
}

/// Stripping pass. Every `ESC` directive is dropped along with its parameter.
pub fn strip_directives(converted: &str) -> ConvertedText {
    let chars: Vec<char> = converted.chars().collect();
    let mut lines = vec![String::new()];
    let mut index = 0;

    while index < chars.len() {
        match chars[index] {
            ESC => {
                let (code, after_code) = escape_code(&chars, index + 1);
                index = after_code;
                if PARAM_CODES.contains(&code.as_str()) {
                    if let Some((_, after_param)) = bracket_param(&chars, index) {
                        index = after_param;
                    }
                }
            }
            '\n' => {
                lines.push(String::new());
                index += 1;
            }
            '\r' => index += 1,
            ch => {
                if let Some(line) = lines.last_mut() {
                    line.push(ch);
                }
                index += 1;
            }
        }
    }

    ConvertedText { lines }
}

/// Replaces every `ESC` + `code` + `[digits]` in one pass. Returns `None`
/// when nothing matched.
fn substitute_param(
    text: &str,
    code: char,
    mut value: impl FnMut(usize) -> String,
) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut replaced = false;
    let mut index = 0;

    while index < chars.len() {
        let is_code = chars[index] == ESC
            && chars
                .get(index + 1)
                .is_some_and(|next| next.eq_ignore_ascii_case(&code));
        if is_code {
            if let Some((param, end)) = bracket_param(&chars, index + 2) {
                out.push_str(&value(param));
                index = end;
                replaced = true;
                continue;
            }
        }
        out.push(chars[index]);
        index += 1;
    }

    replaced.then_some(out)
}

/// Parses `[digits]` starting at `start`, returning the number and the index
/// just past the closing bracket.
fn bracket_param(chars: &[char], start: usize) -> Option<(usize, usize)> {
    if chars.get(start) != Some(&'[') {
        return None;
    }
    let digits_start = start + 1;
    let mut end = digits_start;
    while chars.get(end).is_some_and(|ch| ch.is_ascii_digit()) {
        end += 1;
    }
    if end == digits_start || chars.get(end) != Some(&']') {
        return None;
    }
    let digits: String = chars[digits_start..end].iter().collect();
    let param = digits.parse().ok()?;
    Some((param, end + 1))
}

/// Reads the directive code following an `ESC`: one symbol or a run of ASCII
/// letters (upper-cased). An empty code consumes only the marker.
fn escape_code(chars: &[char], start: usize) -> (String, usize) {
    match chars.get(start) {
        Some(ch) if SYMBOL_CODES.contains(*ch) => (ch.to_string(), start + 1),
        _ => {
            let mut end = start;
            while chars.get(end).is_some_and(|ch| ch.is_ascii_alphabetic()) {
                end += 1;
            }
            let code = chars[start..end]
                .iter()
                .map(|ch| ch.to_ascii_uppercase())
                .collect();
            (code, end)
        }
    }
}
