//! Prefix matching for full text filters.
//!
//! Bare search terms get the `*` prefix marker, so typing `wor` finds `work`. Queries using the
//! tsquery syntax explicitly (boolean operators, negation, phrases) are sent as typed.

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

static EXPLICIT_AND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\W(&|and)\W").expect("must be a valid regex"));
static KEEP_AS_TYPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\||<->|:\*|!)").expect("must be a valid regex"));
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""\w*"|'\w*'"#).expect("must be a valid regex"));

pub fn prefix_terms(query: &str) -> String {
    if EXPLICIT_AND.is_match(query) {
        return query.to_owned();
    }

    let Some(normalized) = normalize(query) else {
        return query.to_owned();
    };

    if KEEP_AS_TYPED.is_match(&normalized) {
        return query.to_owned();
    }

    // A dangling quote marks its term as typed and is dropped.
    normalized
        .split('&')
        .filter_map(|term| {
            if QUOTED.is_match(term) {
                Some(term.to_owned())
            } else if let Some(rest) = term.strip_prefix(&['\'', '"'][..]) {
                (!rest.is_empty()).then(|| rest.to_owned())
            } else {
                Some(format!("{term}*"))
            }
        })
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Joiner {
    And,
    Or,
}

/// Rewrites a search string in tsquery notation: terms are joined with `&`, or with `|` where the
/// input asked for alternatives, negated terms get `!` and quoted phrases become `<->` chains.
/// Returns `None` when the input contains no term at all.
fn normalize(query: &str) -> Option<String> {
    let mut normalized = String::new();
    let mut joiner = Joiner::And;
    let mut negated = false;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        let term = match c {
            c if c.is_whitespace() || matches!(c, '(' | ')' | '&') => continue,
            '|' | ',' => {
                joiner = Joiner::Or;
                continue;
            }
            '!' | '-' => {
                negated = true;
                continue;
            }
            '"' | '\'' => {
                let quoted: String = chars.by_ref().take_while(|next| *next != c).collect();

                if query_has_closing_quote(query, c) {
                    match quoted.split_whitespace().collect::<Vec<_>>().as_slice() {
                        [] => continue,
                        [word] => format!("{c}{word}{c}"),
                        words => words.join("<->"),
                    }
                } else {
                    format!("{c}{}", quoted.split_whitespace().join("&"))
                }
            }
            c => {
                let mut word = String::from(c);

                while let Some(next) = chars.next_if(|next| is_word_char(*next)) {
                    word.push(next);
                }

                if word.eq_ignore_ascii_case("or") {
                    joiner = Joiner::Or;
                    continue;
                }

                if word.eq_ignore_ascii_case("and") {
                    continue;
                }

                word
            }
        };

        if !normalized.is_empty() {
            normalized.push(match joiner {
                Joiner::And => '&',
                Joiner::Or => '|',
            });
        }

        if negated {
            normalized.push('!');
        }

        normalized.push_str(&term);
        joiner = Joiner::And;
        negated = false;
    }

    (!normalized.is_empty()).then_some(normalized)
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '&' | '|' | ',' | '!' | '"' | '\'')
}

fn query_has_closing_quote(query: &str, quote: char) -> bool {
    query.matches(quote).count() >= 2
}
