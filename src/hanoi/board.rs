//! Tower-of-Hanoi board state and its textual form in game logs
//!
//! Logs announce each board with a marker line followed by one declaration
//! per peg, listing disk sizes bottom to top:
//!
//! ```text
//! [GAME] Current Board:
//! A: [4, 3]
//! B: [2]
//! C: [1]
//! ```

use nom::bytes::complete::{tag, take_until, take_while};
use nom::character::complete::{char, multispace0, one_of, space0};
use nom::combinator::recognize;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker that precedes every board snapshot in a log
pub const BOARD_MARKER: &str = "[GAME] Current Board:";

/// One of the three fixed pegs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Peg {
    A,
    B,
    C,
}

impl Peg {
    pub const ALL: [Peg; 3] = [Peg::A, Peg::B, Peg::C];

    fn index(self) -> usize {
        match self {
            Peg::A => 0,
            Peg::B => 1,
            Peg::C => 2,
        }
    }

    pub fn label(self) -> char {
        match self {
            Peg::A => 'A',
            Peg::B => 'B',
            Peg::C => 'C',
        }
    }

    pub fn from_label(label: char) -> Option<Peg> {
        match label.to_ascii_uppercase() {
            'A' => Some(Peg::A),
            'B' => Some(Peg::B),
            'C' => Some(Peg::C),
            _ => None,
        }
    }

    /// The peg that is neither `a` nor `b`
    ///
    /// When `a == b` any other peg is returned.
    pub fn spare(a: Peg, b: Peg) -> Peg {
        Peg::ALL
            .into_iter()
            .find(|&p| p != a && p != b)
            .unwrap_or(a)
    }
}

impl fmt::Display for Peg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Disk stacks on each peg, bottom to top
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pegs: [Vec<u32>; 3],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for setting one peg
    pub fn with_peg(mut self, peg: Peg, disks: impl Into<Vec<u32>>) -> Self {
        self.set(peg, disks.into());
        self
    }

    /// Every disk `1..=n` stacked on `peg`, largest at the bottom
    pub fn stacked(n: u32, peg: Peg) -> Self {
        Self::new().with_peg(peg, (1..=n).rev().collect::<Vec<_>>())
    }

    pub fn set(&mut self, peg: Peg, disks: Vec<u32>) {
        self.pegs[peg.index()] = disks;
    }

    pub fn peg(&self, peg: Peg) -> &[u32] {
        &self.pegs[peg.index()]
    }

    /// Which peg holds `disk`, if any
    pub fn locate(&self, disk: u32) -> Option<Peg> {
        Peg::ALL.into_iter().find(|&p| self.peg(p).contains(&disk))
    }

    /// Size of the largest disk on the board
    pub fn largest_disk(&self) -> Option<u32> {
        self.pegs.iter().flatten().copied().max()
    }

    pub fn disk_count(&self) -> usize {
        self.pegs.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.disk_count() == 0
    }

    /// Build a board from every `X: [..]` declaration in the text
    ///
    /// Later declarations of a peg replace earlier ones. Entries that are not
    /// non-negative integers are skipped, and pegs that are never declared
    /// stay empty. Parsing never fails: a garbled log gives a partial board.
    pub fn parse(text: &str) -> Board {
        let mut board = Board::new();
        let mut rest = text;

        while !rest.is_empty() {
            match peg_declaration(rest) {
                Ok((remaining, (peg, disks))) => {
                    board.set(peg, parse_disks(disks));
                    rest = remaining;
                }
                Err(_) => {
                    let mut chars = rest.chars();
                    chars.next();
                    rest = chars.as_str();
                }
            }
        }

        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, peg) in Peg::ALL.into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let disks: Vec<String> = self.peg(peg).iter().map(u32::to_string).collect();
            write!(f, "{}: [{}]", peg, disks.join(", "))?;
        }
        Ok(())
    }
}

fn peg_label(input: &str) -> IResult<&str, Peg> {
    one_of("ABC")
        .map(|c| match c {
            'A' => Peg::A,
            'B' => Peg::B,
            _ => Peg::C,
        })
        .parse(input)
}

fn disk_list(input: &str) -> IResult<&str, &str> {
    (
        char('['),
        take_while(|c: char| c.is_ascii_digit() || c == ',' || c == ' ' || c == '-'),
        char(']'),
    )
        .map(|(_, disks, _)| disks)
        .parse(input)
}

/// `A: [3, 2, 1]`
fn peg_declaration(input: &str) -> IResult<&str, (Peg, &str)> {
    (peg_label, char(':'), space0, disk_list)
        .map(|(peg, _, _, disks)| (peg, disks))
        .parse(input)
}

fn parse_disks(list: &str) -> Vec<u32> {
    list.split(',')
        .filter_map(|token| token.trim().parse::<u32>().ok())
        .collect()
}

fn peg_block<'a>(
    label: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    recognize((tag(label), tag(": ["), take_until("]"), char(']')))
}

/// The three peg declarations that follow a board marker
fn snapshot_block(input: &str) -> IResult<&str, &str> {
    recognize((
        peg_block("A"),
        multispace0,
        peg_block("B"),
        multispace0,
        peg_block("C"),
    ))
    .parse(input)
}

/// Every board snapshot in a log, in document order
///
/// A marker not followed by a complete `A`/`B`/`C` block is skipped.
pub fn extract_snapshots(text: &str) -> Vec<&str> {
    let mut snapshots = Vec::new();
    let mut rest = text;

    while let Some(pos) = rest.find(BOARD_MARKER) {
        let after = &rest[pos + BOARD_MARKER.len()..];
        match snapshot_block(after.trim_start()) {
            Ok((remaining, block)) => {
                snapshots.push(block.trim());
                rest = remaining;
            }
            Err(_) => rest = after,
        }
    }

    snapshots
}
