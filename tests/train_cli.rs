use clap::Parser;
use flappy_rl::{
    adapters::MsgPackRepository,
    cli::commands::{
        evaluate::{self, EvaluateArgs},
        export::{self, ExportArgs},
        scores::{self, ScoresArgs},
        train::{self, TrainArgs},
    },
    persistence::AgentKind,
    ports::AgentRepository,
};
use tempfile::tempdir;

fn parse_args<I, T>(args: I) -> TrainArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    TrainArgs::parse_from(args)
}

#[test]
fn train_writes_agent_summary_and_observations() {
    let tmp = tempdir().unwrap();
    let agent = tmp.path().join("agent.msgpack");
    let summary_stem = tmp.path().join("run_overview");
    let observations = tmp.path().join("obs.jsonl");

    let args = parse_args([
        "flappy-train",
        "q-learning",
        "--episodes",
        "12",
        "--seed",
        "3",
        "--max-steps",
        "1000",
        "--output",
        agent.to_str().unwrap(),
        "--summary",
        summary_stem.to_str().unwrap(),
        "--observations",
        observations.to_str().unwrap(),
    ]);
    train::execute(args).expect("training should succeed");

    let saved = MsgPackRepository::new().load(&agent).unwrap();
    assert_eq!(saved.kind, AgentKind::QLearning);
    assert_eq!(saved.metadata.episodes_trained, 12);
    assert_eq!(saved.metadata.scores.len(), 12);
    assert_eq!(saved.metadata.seed, Some(3));
    assert_eq!(saved.metadata.representation.as_deref(), Some("gap-offset"));

    let expected_path = summary_stem.with_extension("json");
    let contents = std::fs::read_to_string(&expected_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["run"]["episodes"], 12);
    assert_eq!(parsed["kind"], "q-learning");
    assert_eq!(parsed["episodes_trained"], 12);

    let lines = std::fs::read_to_string(&observations).unwrap();
    assert_eq!(lines.lines().count(), 12);
}

#[test]
fn summary_directory_argument_creates_default_file() {
    let tmp = tempdir().unwrap();
    let summary_dir = tmp.path().join("summaries");
    let summary_arg = format!("{}/", summary_dir.display());

    let args = parse_args([
        "flappy-train",
        "monte-carlo",
        "--episodes",
        "3",
        "--seed",
        "1",
        "--max-steps",
        "500",
        "--summary",
        &summary_arg,
    ]);
    train::execute(args).expect("training with a summary directory should succeed");

    assert!(summary_dir.join("training_summary.json").exists());
}

#[test]
fn continued_training_accumulates_history() {
    let tmp = tempdir().unwrap();
    let agent = tmp.path().join("linear.msgpack");
    let agent_arg = agent.to_str().unwrap();

    let first = parse_args([
        "flappy-train", "linear", "-e", "5", "--seed", "9", "--max-steps", "500", "-O", agent_arg,
    ]);
    train::execute(first).unwrap();

    let second = parse_args([
        "flappy-train",
        "linear",
        "-e",
        "4",
        "--max-steps",
        "500",
        "--load",
        agent_arg,
        "-O",
        agent_arg,
    ]);
    train::execute(second).unwrap();

    let saved = MsgPackRepository::new().load(&agent).unwrap();
    assert_eq!(saved.metadata.episodes_trained, 9);
    assert_eq!(saved.metadata.scores.len(), 9);
    assert_eq!(saved.metadata.seed, Some(9));
}

#[test]
fn loading_the_wrong_kind_fails() {
    let tmp = tempdir().unwrap();
    let agent = tmp.path().join("mc.msgpack");
    let agent_arg = agent.to_str().unwrap();

    train::execute(parse_args([
        "flappy-train", "monte-carlo", "-e", "2", "--max-steps", "300", "-O", agent_arg,
    ]))
    .unwrap();

    let result = train::execute(parse_args([
        "flappy-train", "q-learning", "-e", "2", "--load", agent_arg,
    ]));
    assert!(result.is_err());
}

#[test]
fn saved_agent_feeds_scores_export_and_evaluate() {
    let tmp = tempdir().unwrap();
    let agent = tmp.path().join("agent.msgpack");
    let agent_arg = agent.to_str().unwrap();

    train::execute(parse_args([
        "flappy-train", "q-learning", "-e", "12", "--seed", "5", "--max-steps", "1000", "-O",
        agent_arg,
    ]))
    .unwrap();

    let blocks = tmp.path().join("blocks.csv");
    scores::execute(ScoresArgs::parse_from([
        "flappy-scores",
        agent_arg,
        "--blocks",
        "4",
        "--output",
        blocks.to_str().unwrap(),
    ]))
    .unwrap();
    let csv = std::fs::read_to_string(&blocks).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("episodes,mean"));
    assert_eq!(lines.count(), 4);

    let values = tmp.path().join("values.csv");
    export::execute(ExportArgs::parse_from([
        "flappy-export",
        agent_arg,
        "-o",
        values.to_str().unwrap(),
    ]))
    .unwrap();
    let csv = std::fs::read_to_string(&values).unwrap();
    assert!(csv.lines().count() > 1, "expected at least one state row");

    let report = tmp.path().join("eval.json");
    evaluate::execute(EvaluateArgs::parse_from([
        "flappy-evaluate",
        agent_arg,
        "--episodes",
        "3",
        "--seed",
        "2",
        "--max-steps",
        "1000",
        "--export",
        report.to_str().unwrap(),
    ]))
    .unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(parsed["summary"]["episodes"], 3);
    assert_eq!(parsed["scores"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["metrics"]["episodes"], 3);
    assert!(parsed["metrics"]["mean_steps"].as_f64().unwrap() >= 1.0);
}
