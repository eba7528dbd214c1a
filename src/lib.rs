//! Replay Lab - experience replay for language-model agents in text games
//!
//! Past trajectories are kept in a JSON buffer, a few of them are chosen
//! (at random, by recency, or by a model-judged tournament) and shown to the
//! model before each new game. Offline analysis scores stored Tower-of-Hanoi
//! runs against optimal play.

pub mod agent;
pub mod analysis;
pub mod buffer;
pub mod core;
pub mod hanoi;
pub mod llm;
