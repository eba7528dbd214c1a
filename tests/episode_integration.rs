//! Agent loop integration tests with a scripted model and game

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use replay_lab::agent::action::LetterPairMove;
use replay_lab::agent::{
    run_curriculum, run_episode, run_evaluation, run_session, Action, Environment, EnvironmentReport,
    EpisodeSettings, Observation, StepOutcome,
};
use replay_lab::buffer::ExperienceBuffer;
use replay_lab::core::config::RunProfile;
use replay_lab::core::error::{ReplayError, Result};
use replay_lab::llm::{Generation, RunningContext, TextGenerator};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

const ANCHOR: &str = "At each turn, submit one move.";

/// Answers game prompts with a fixed move and judge prompts with a fixed pick
struct ScriptedModel {
    game_reply: String,
    judge_reply: String,
    prompts: RefCell<Vec<String>>,
    contexts: RefCell<Vec<RunningContext>>,
    judge_calls: Cell<usize>,
}

impl ScriptedModel {
    fn new(game_reply: &str) -> Self {
        Self {
            game_reply: game_reply.into(),
            judge_reply: "1".into(),
            prompts: RefCell::new(Vec::new()),
            contexts: RefCell::new(Vec::new()),
            judge_calls: Cell::new(0),
        }
    }
}

impl TextGenerator for ScriptedModel {
    async fn generate(&self, prompt: &str, context: &RunningContext) -> Result<Generation> {
        if prompt.contains("Replay 1:") {
            assert!(context.is_empty());
            self.judge_calls.set(self.judge_calls.get() + 1);
            return Ok(Generation {
                text: self.judge_reply.clone(),
                ..Generation::default()
            });
        }

        self.prompts.borrow_mut().push(prompt.to_string());
        self.contexts.borrow_mut().push(context.clone());
        let next = context.0.last().copied().unwrap_or(0) + 1;
        Ok(Generation {
            text: self.game_reply.clone(),
            context: RunningContext(vec![next]),
            thinking: None,
        })
    }
}

/// A puzzle that is solved after a fixed number of moves, or never
struct ScriptedPuzzle {
    solve_after: Option<usize>,
    steps: usize,
    played: Rc<RefCell<Vec<String>>>,
    closed: bool,
}

impl ScriptedPuzzle {
    fn new(solve_after: Option<usize>, played: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            solve_after,
            steps: 0,
            played,
            closed: false,
        }
    }

    fn solved(&self) -> bool {
        self.solve_after == Some(self.steps)
    }
}

impl Environment for ScriptedPuzzle {
    fn reset(&mut self) -> Result<Observation> {
        self.steps = 0;
        Ok(Observation::new(format!(
            "Rules of the game.\n{}\n[GAME] Current Board:\nA: [2, 1]\nB: []\nC: []",
            ANCHOR
        )))
    }

    fn step(&mut self, action: &Action) -> Result<StepOutcome> {
        self.steps += 1;
        self.played.borrow_mut().push(action.to_string());
        Ok(StepOutcome {
            observation: Observation::new(format!("[GAME] Current Board: step {}", self.steps)),
            reward: if self.solved() { 1.0 } else { 0.0 },
            done: self.solved(),
        })
    }

    fn close(&mut self) -> Result<EnvironmentReport> {
        self.closed = true;
        Ok(if self.solved() {
            EnvironmentReport {
                reward: 1.0,
                reason: "The puzzle was solved.".into(),
            }
        } else {
            EnvironmentReport {
                reward: 0.0,
                reason: "You ran out of turns.".into(),
            }
        })
    }
}

fn temp_buffer(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("replay_lab_episode_{}", std::process::id()))
        .join(name);
    let _ = fs::remove_file(&path);
    path
}

fn settings() -> EpisodeSettings {
    EpisodeSettings {
        anchor: Some(ANCHOR.into()),
        turn_suffix: "\nYour move?".into(),
        trajectory_start: Some("[GAME] Current Board:".into()),
        ..EpisodeSettings::default()
    }
}

#[tokio::test]
async fn test_episode_threads_context() {
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(Some(3), played.clone());

    let record = run_episode(&model, &mut env, &LetterPairMove, &settings())
        .await
        .unwrap();

    assert_eq!(record.steps(), 3);
    assert!(record.done);
    assert!(record.solved());
    assert_eq!(*played.borrow(), vec!["[A C]"; 3]);

    let contexts = model.contexts.borrow();
    assert!(contexts[0].is_empty());
    assert_eq!(contexts[1], RunningContext(vec![1]));
    assert_eq!(contexts[2], RunningContext(vec![2]));

    let trajectory = record.trajectory();
    assert!(trajectory.starts_with("[GAME] Current Board:"));
    assert!(!trajectory.contains("Rules of the game"));
    assert!(trajectory.contains("[GAME] Current Board: step 3"));
    assert!(trajectory.ends_with("The puzzle was solved."));
}

#[tokio::test]
async fn test_experience_only_in_first_prompt() {
    let model = ScriptedModel::new("B C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(Some(2), played);
    let settings = settings().with_experience(Some("PAST RUNS".into()));

    run_episode(&model, &mut env, &LetterPairMove, &settings)
        .await
        .unwrap();

    let prompts = model.prompts.borrow();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains(&format!("PAST RUNS\n\n{}", ANCHOR)));
    assert!(prompts[0].find("Rules of the game") < prompts[0].find("PAST RUNS"));
    assert!(!prompts[1].contains("PAST RUNS"));
    assert!(prompts[1].ends_with("\nYour move?"));
}

#[tokio::test]
async fn test_step_limit_stops_episode() {
    let model = ScriptedModel::new("A B");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(None, played.clone());
    let settings = EpisodeSettings {
        step_limit: Some(3),
        ..settings()
    };

    let record = run_episode(&model, &mut env, &LetterPairMove, &settings)
        .await
        .unwrap();

    assert_eq!(record.steps(), 3);
    assert!(!record.done);
    assert!(!record.solved());
    assert_eq!(played.borrow().len(), 3);
    assert!(record.trajectory().ends_with("You ran out of turns."));
}

#[tokio::test]
async fn test_unparseable_reply_aborts() {
    let model = ScriptedModel::new("I am not sure what to do");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(Some(1), played.clone());

    let err = run_episode(&model, &mut env, &LetterPairMove, &settings())
        .await
        .unwrap_err();

    assert!(matches!(err, ReplayError::InvalidAction(_)));
    assert!(played.borrow().is_empty());
}

#[tokio::test]
async fn test_aborted_episode_closes_environment() {
    let model = ScriptedModel::new("I am not sure what to do");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(Some(1), played);

    let result = run_episode(&model, &mut env, &LetterPairMove, &settings()).await;

    assert!(result.is_err());
    assert!(env.closed, "the game must be closed even when a reply is unusable");
}

#[tokio::test]
async fn test_finished_episode_closes_environment() {
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut env = ScriptedPuzzle::new(Some(2), played);

    run_episode(&model, &mut env, &LetterPairMove, &settings())
        .await
        .unwrap();

    assert!(env.closed);
}

fn session_profile(buffer: &PathBuf, strategy: &str, count: usize, episodes: u32) -> RunProfile {
    RunProfile::from_toml_str(&format!(
        r#"
env_id = "TowerOfHanoi-v0"
episodes = {episodes}
step_limit = 10
buffer_path = '{buffer}'

[generation]
model = "scripted"

[selection]
strategy = "{strategy}"
count = {count}

[prompts]
game = "Tower of Hanoi"
anchor = "{anchor}"
trajectory_start = "[GAME] Current Board:"
buffer_header = "PAST:\n"
"#,
        episodes = episodes,
        buffer = buffer.display(),
        strategy = strategy,
        count = count,
        anchor = ANCHOR,
    ))
    .unwrap()
}

#[tokio::test]
async fn test_session_learns_from_previous_episode() {
    let path = temp_buffer("session_recent.json");
    let profile = session_profile(&path, "recent", 3, 2);
    let mut buffer = ExperienceBuffer::load_or_empty(&profile.buffer_path).unwrap();
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let report = run_session(
        &model,
        &profile,
        &mut buffer,
        |_| Ok(ScriptedPuzzle::new(Some(2), played.clone())),
        &mut rng,
    )
    .await
    .unwrap();

    assert_eq!(report.episodes.len(), 2);
    assert_eq!(report.solved(), 2);
    assert_eq!(report.episodes[0].experiences_used, 0);
    assert_eq!(report.episodes[1].experiences_used, 1);
    assert_eq!(report.buffer_len, 2);

    let prompts = model.prompts.borrow();
    assert!(!prompts[0].contains("PAST:"));
    assert!(prompts[2].contains("PAST:\n[GAME] Current Board:"));

    let saved = ExperienceBuffer::load(&path).unwrap();
    assert_eq!(saved.records(), buffer.records());
}

#[tokio::test]
async fn test_session_tournament_uses_judge() {
    let path = temp_buffer("session_tournament.json");
    let mut seeded = ExperienceBuffer::empty(&path);
    for i in 0..5 {
        seeded.push(format!("old run {}. The puzzle was solved.", i));
    }
    seeded.save().unwrap();

    let profile = session_profile(&path, "tournament", 2, 1);
    let mut buffer = ExperienceBuffer::load(&profile.buffer_path).unwrap();
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let report = run_session(
        &model,
        &profile,
        &mut buffer,
        |_| Ok(ScriptedPuzzle::new(Some(1), played.clone())),
        &mut rng,
    )
    .await
    .unwrap();

    assert_eq!(model.judge_calls.get(), 3);
    assert_eq!(report.episodes[0].experiences_used, 2);
    assert_eq!(ExperienceBuffer::load(&path).unwrap().len(), 6);
}

#[tokio::test]
async fn test_curriculum_stops_on_unwinnable_stage() {
    let path = temp_buffer("curriculum.json");
    let mut seeded = ExperienceBuffer::empty(&path);
    seeded.push("stale run");
    seeded.save().unwrap();

    let profile = RunProfile::from_toml_str(&format!(
        r#"
env_id = "TowerOfHanoi-v0"
step_limit = 2
buffer_path = '{buffer}'

[generation]
model = "scripted"

[prompts]
buffer_header = "PAST:\n"

[curriculum]
wins_per_stage = 2
max_games_per_stage = 3
clear_buffer_at_start = true
success_header = "WIN\n"

[[curriculum.stages]]
name = "easy"
params = {{ win = true }}

[[curriculum.stages]]
name = "hard"
params = {{ win = false }}

[[curriculum.stages]]
name = "expert"
params = {{ win = true }}
"#,
        buffer = path.display(),
    ))
    .unwrap();

    let mut buffer = ExperienceBuffer::load(&path).unwrap();
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));

    let report = run_curriculum(&model, &profile, &mut buffer, |stage| {
        let win = stage
            .params
            .get("win")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(ScriptedPuzzle::new(win.then_some(1), played.clone()))
    })
    .await
    .unwrap();

    assert_eq!(report.stages.len(), 2);
    assert_eq!((report.stages[0].games, report.stages[0].wins), (2, 2));
    assert_eq!((report.stages[1].games, report.stages[1].wins), (3, 0));
    assert!(report.stopped_early);

    let saved = ExperienceBuffer::load(&path).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved.records().iter().all(|r| r.starts_with("WIN\n")));

    let prompts = model.prompts.borrow();
    assert!(!prompts[0].contains("<run 1>"));
    assert!(prompts[1].contains("PAST:\n<run 1>\nWIN\n"));
}

#[tokio::test]
async fn test_evaluation_leaves_buffer_untouched() {
    let path = temp_buffer("evaluation.json");
    let mut seeded = ExperienceBuffer::empty(&path);
    seeded.push("[GAME] Current Board: old run. The puzzle was solved.");
    seeded.push("[GAME] Current Board: older run. You ran out of turns.");
    seeded.save().unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let profile = session_profile(&path, "recent", 1, 3);
    let buffer = ExperienceBuffer::load(&path).unwrap();
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));
    let seeds = RefCell::new(Vec::new());

    // Odd seeds give a game that is never solved
    let report = run_evaluation(&model, &profile, Some(&buffer), 40, |_, seed| {
        seeds.borrow_mut().push(seed);
        Ok(ScriptedPuzzle::new((seed % 2 == 0).then_some(1), played.clone()))
    })
    .await
    .unwrap();

    assert_eq!(*seeds.borrow(), vec![40, 41, 42]);
    assert_eq!(report.seeds, vec![40, 41, 42]);
    assert_eq!(report.wins, 2);
    assert!((report.win_rate() - 2.0 / 3.0).abs() < 1e-9);
    assert!(report.episodes.iter().all(|e| e.experiences_used == 1));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);

    let prompts = model.prompts.borrow();
    let first_prompts: Vec<&String> = prompts.iter().filter(|p| p.contains(ANCHOR)).collect();
    assert_eq!(first_prompts.len(), 3);
    assert!(first_prompts
        .iter()
        .all(|p| p.contains("PAST:\n[GAME] Current Board: older run.")));
}

#[tokio::test]
async fn test_evaluation_without_buffer_is_a_baseline() {
    let path = temp_buffer("evaluation_baseline.json");
    let profile = session_profile(&path, "tournament", 2, 2);
    let model = ScriptedModel::new("A C");
    let played = Rc::new(RefCell::new(Vec::new()));

    let report = run_evaluation(&model, &profile, None, 0, |_, _| {
        Ok(ScriptedPuzzle::new(Some(1), played.clone()))
    })
    .await
    .unwrap();

    assert_eq!(report.wins, 2);
    assert_eq!(report.win_rate(), 1.0);
    assert_eq!(model.judge_calls.get(), 0);
    assert!(model.prompts.borrow().iter().all(|p| !p.contains("PAST:")));
    assert!(!path.exists());
}
