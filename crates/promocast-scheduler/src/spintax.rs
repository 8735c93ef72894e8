//! Spin-syntax template expansion.
//!
//! `{option1|option2|...}` groups are replaced one at a time with a
//! uniformly chosen option, rescanning from the start after each
//! splice. Groups must not nest; unbalanced braces are left as plain
//! text. Pure — each call may produce a different result, and the
//! cycle calls it once per outgoing message.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

fn group_pattern() -> &'static Regex {
    static GROUP: OnceLock<Regex> = OnceLock::new();
    GROUP.get_or_init(|| Regex::new(r"\{([^{}]*)\}").unwrap())
}

/// Expand a template with the thread-local RNG.
pub fn expand(template: &str) -> String {
    expand_with(template, &mut rand::thread_rng())
}

/// Expand with a caller-supplied RNG (seedable in tests).
pub fn expand_with<R: Rng>(template: &str, rng: &mut R) -> String {
    let re = group_pattern();
    let mut text = template.to_string();
    while let Some(m) = re.find(&text) {
        // Inner content between the braces
        let inner = &text[m.start() + 1..m.end() - 1];
        let options: Vec<&str> = inner.split('|').collect();
        let choice = options[rng.gen_range(0..options.len())];
        text = format!("{}{}{}", &text[..m.start()], choice, &text[m.end()..]);
    }
    text
}
