//! Parse free-form model replies into moves and preferences
//!
//! Models are asked for a terse answer but rarely give only that, so each
//! parser looks for one well-defined shape inside arbitrary text.

use crate::buffer::tournament::Choice;
use nom::bytes::complete::take_while1;
use nom::character::complete::{multispace0, one_of, satisfy};
use nom::{IResult, Parser};

/// A Tower-of-Hanoi style move named by two peg letters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterPair {
    pub from: char,
    pub to: char,
}

/// Read a tournament reply: "2" wins only when it is unambiguous
///
/// Any reply that mentions "1", or mentions neither digit, keeps the first
/// record.
pub fn parse_preference(reply: &str) -> Choice {
    let reply = reply.trim();
    if reply.contains('2') && !reply.contains('1') {
        Choice::Second
    } else {
        Choice::First
    }
}

/// Find every isolated uppercase letter pair such as `A C` in the text
///
/// A pair is two uppercase ASCII letters separated by whitespace, with no
/// uppercase letter directly before the first or after the second. Matches
/// do not overlap.
pub fn isolated_letter_pairs(text: &str) -> Vec<LetterPair> {
    let mut pairs = Vec::new();
    let mut previous: Option<char> = None;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let bounded_left = !previous.is_some_and(|p| p.is_ascii_uppercase());
        if bounded_left {
            if let Ok((after, pair)) = letter_pair(rest) {
                if !after.starts_with(|next: char| next.is_ascii_uppercase()) {
                    pairs.push(pair);
                    previous = Some(pair.to);
                    rest = after;
                    continue;
                }
            }
        }
        previous = Some(c);
        rest = &rest[c.len_utf8()..];
    }

    pairs
}

fn uppercase(input: &str) -> IResult<&str, char> {
    satisfy(|c: char| c.is_ascii_uppercase()).parse(input)
}

fn letter_pair(input: &str) -> IResult<&str, LetterPair> {
    (uppercase, take_while1(char::is_whitespace), uppercase)
        .map(|(from, _, to)| LetterPair { from, to })
        .parse(input)
}

/// The single letter pair in the reply, if there is exactly one
pub fn unique_letter_pair(text: &str) -> Option<LetterPair> {
    let pairs = isolated_letter_pairs(text);
    match pairs.as_slice() {
        [pair] => Some(*pair),
        _ => None,
    }
}

const MOVE_PREFIX: &str = "MOVE:";

fn vehicle_and_direction(input: &str) -> IResult<&str, (char, char)> {
    (
        multispace0,
        satisfy(|c: char| c.is_ascii_alphabetic()),
        one_of("+-"),
    )
        .map(|(_, vehicle, direction)| (vehicle, direction))
        .parse(input)
}

/// Find the first `MOVE: X+` / `MOVE: X-` instruction in a reply
pub fn vehicle_move(text: &str) -> Option<(char, char)> {
    let mut rest = text;
    while let Some(pos) = rest.find(MOVE_PREFIX) {
        let after = &rest[pos + MOVE_PREFIX.len()..];
        if let Ok((_, found)) = vehicle_and_direction(after) {
            return Some(found);
        }
        rest = after;
    }
    None
}
