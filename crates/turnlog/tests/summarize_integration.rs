//! End-to-end tests: real files in a temp directory, through discovery,
//! decoding, the engine, and the output sinks. The last section drives the
//! `turnlog` binary itself.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use turnlog::output::{
    JsonSink, OutputFormat, SummaryReport, TextSink, create_output, default_output_path,
    write_json,
};
use turnlog::prelude::*;
use turnlog::source::decode::TextEncoding;
use turnlog::source::{InputSelection, read_sources};

fn write_aged(path: &Path, bytes: &[u8], age_secs: u64) {
    std::fs::write(path, bytes).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

fn utf16_le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
    bytes
}

fn session_csv() -> String {
    [
        "Turn,Category,Message",
        "4,LogTurnManager,Turn start",
        r#"4,LogPlayerMove,"Move to (1,1)""#,
        "5,LogTurnManager,Turn start",
        "5,LogMoveVerbose,step",
        "5,LogPlayerMove,Reserve tile 22",
        "5,LogTemp,idle",
        "6,LogGridPathfinding,Warning no path",
        "6,LogTemp,idle",
        "7,LogPlayerMove,Move done",
    ]
    .join("\n")
}

// ── Library pipeline ───────────────────────────────────────────────

#[test]
fn newest_utf16_log_summarized_to_text() {
    let dir = tempfile::tempdir().unwrap();
    write_aged(&dir.path().join("old.log"), b"LogTemp: Error: stale\n", 600);
    let log = [
        "LogInit: boot",
        "LogTemp: tick 1",
        "LogTemp: tick 2",
        "LogNet: Warning: packet loss",
        "LogTemp: tick 3",
        "LogTemp: tick 4",
    ]
    .join("\r\n");
    let newest = dir.path().join("Lyra.log");
    write_aged(&newest, &utf16_le_with_bom(&log), 5);

    let paths = InputSelection::LatestFromDir {
        dir: dir.path().to_path_buf(),
        ext: "log".into(),
    }
    .resolve()
    .unwrap();
    assert_eq!(paths, vec![newest.clone()]);

    let sources = read_sources(&paths, false).unwrap();
    assert_eq!(sources[0].encoding, TextEncoding::Utf16Le);

    let output = default_output_path(&paths[0], OutputFormat::Text);
    assert_eq!(output, dir.path().join("Lyra_summary.txt"));

    let config = SummaryConfig::new(SelectionPolicy::KeywordDepth(KeywordSelector::new(
        Depth::High,
    )));
    let mut sink = TextSink::new(create_output(&output).unwrap());
    let stats = Summarizer::new(config).run(&sources, &mut sink).unwrap();
    sink.finish().unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "LogTemp: tick 2\nLogNet: Warning: packet loss\nLogTemp: tick 3\n"
    );
    assert_eq!(stats.window.matches.high, 1);
    assert_eq!(stats.lines_total, 6);
}

#[test]
fn session_csv_with_preset_and_turn_range_to_json() {
    let dir = tempfile::tempdir().unwrap();
    write_aged(&dir.path().join("Session_2025.06.01-09.00.00.csv"), b"Turn\n", 1);
    let session = dir.path().join("Session_2025.06.02-21.04.09.csv");
    write_aged(&session, session_csv().as_bytes(), 300);

    let paths = InputSelection::LatestSession {
        dir: dir.path().to_path_buf(),
    }
    .resolve()
    .unwrap();
    assert_eq!(paths, vec![session]);
    let sources = read_sources(&paths, false).unwrap();

    let movement = PresetRegistry::builtin().resolve("movement").unwrap().clone();
    let config = SummaryConfig::new(SelectionPolicy::Preset(PresetSelector::new(movement)))
        .with_turn_filter(Some("5-6".parse().unwrap()));
    let policy = config.describe();

    let mut sink = JsonSink::new();
    let stats = Summarizer::new(config).run(&sources, &mut sink).unwrap();
    let output = dir.path().join("out/summary.json");
    let report = SummaryReport::new(&sources, policy, &stats)
        .with_output(Some(output.clone()), OutputFormat::Json);
    write_json(create_output(&output).unwrap(), &report, sink.lines()).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let lines = doc["lines"].as_array().unwrap();
    let texts: Vec<&str> = lines.iter().map(|l| l["text"].as_str().unwrap()).collect();
    assert_eq!(
        texts,
        vec![
            "5,LogTurnManager,Turn start",
            "5,LogMoveVerbose,step",
            "5,LogPlayerMove,Reserve tile 22",
            "5,LogTemp,idle",
            "6,LogGridPathfinding,Warning no path",
            "6,LogTemp,idle",
        ]
    );
    assert_eq!(lines[2]["category"], "custom");
    assert_eq!(lines[2]["role"], "match");
    assert_eq!(lines[0]["role"], "before");
    assert_eq!(lines[5]["role"], "after");

    let report = &doc["report"];
    assert_eq!(report["turn_filter"]["headers"], 1);
    assert_eq!(report["turn_filter"]["passed"], 7);
    assert_eq!(report["turn_filter"]["excluded"], 3);
    assert_eq!(report["window"]["matches"]["custom"], 1);
    assert_eq!(report["inputs"][0]["structured"], true);
    assert!(report["policy"].as_str().unwrap().starts_with("preset=movement"));
}

#[test]
fn multiple_inputs_concatenate_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.log");
    let second = dir.path().join("b.log");
    std::fs::write(&first, "a0\na1\n").unwrap();
    std::fs::write(&second, "Fatal: b0\nb1\nb2\n").unwrap();

    let paths = InputSelection::Files(vec![first, second]).resolve().unwrap();
    let sources = read_sources(&paths, false).unwrap();
    let config = SummaryConfig::new(SelectionPolicy::KeywordDepth(KeywordSelector::new(
        Depth::Critical,
    )))
    .with_context(ContextPolicy::explicit(1, 1));

    let mut sink = JsonSink::new();
    Summarizer::new(config).run(&sources, &mut sink).unwrap();
    let located: Vec<(usize, usize, usize)> = sink
        .lines()
        .iter()
        .map(|l| (l.index, l.source, l.row))
        .collect();
    // History carries across the file boundary.
    assert_eq!(located, vec![(1, 0, 1), (2, 1, 0), (3, 1, 1)]);
}

#[test]
fn user_preset_file_extends_registry() {
    let dir = tempfile::tempdir().unwrap();
    let presets = dir.path().join("presets.json");
    std::fs::write(
        &presets,
        r#"[{"name": "Barrier", "whitelist": ["[barrier]"], "blacklist": ["heartbeat"]}]"#,
    )
    .unwrap();
    let registry = PresetRegistry::from_json_file(&presets).unwrap();
    let barrier = registry.resolve("barrier").unwrap().clone();

    let sources = vec![SourceText::from_text(
        "game.log",
        "LogTemp: [Barrier] heartbeat\nLogTemp: [Barrier] released\nLogTemp: [Barrier] Ensure failed",
    )];
    let config = SummaryConfig::new(SelectionPolicy::Preset(PresetSelector::new(barrier)))
        .with_context(ContextPolicy::explicit(0, 0));
    let mut kept: Vec<Line> = Vec::new();
    let stats = Summarizer::new(config).run(&sources, &mut kept).unwrap();
    let texts: Vec<&str> = kept.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["LogTemp: [Barrier] released", "LogTemp: [Barrier] Ensure failed"]
    );
    assert_eq!(stats.window.matches.critical, 1);
}

// ── Binary ─────────────────────────────────────────────────────────

fn turnlog() -> Command {
    Command::new(env!("CARGO_BIN_EXE_turnlog"))
}

fn sample_log(dir: &Path) -> PathBuf {
    let path = dir.join("game.log");
    std::fs::write(&path, "a\nb\nLogTemp: Error: x\nc\nd\n").unwrap();
    path
}

#[test]
fn binary_writes_default_summary() {
    let dir = tempfile::tempdir().unwrap();
    let log = sample_log(dir.path());
    let status = turnlog()
        .arg(&log)
        .args(["--depth", "critical", "-C", "1", "-q"])
        .status()
        .unwrap();
    assert!(status.success());
    let summary = std::fs::read_to_string(dir.path().join("game_summary.txt")).unwrap();
    assert_eq!(summary, "b\nLogTemp: Error: x\nc\n");
}

#[test]
fn binary_takes_several_keywords_after_one_flag() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("game.log");
    std::fs::write(
        &log,
        "LogTemp: tick\nLogTurnManager: begin\nLogTemp: tock\nLogAbilities: cast\nLogTemp: idle\n",
    )
    .unwrap();
    let status = turnlog()
        .arg(&log)
        .args(["-C", "0", "-q", "-k", "LogTurnManager", "LogAbilities"])
        .status()
        .unwrap();
    assert!(status.success());
    let summary = std::fs::read_to_string(dir.path().join("game_summary.txt")).unwrap();
    assert_eq!(summary, "LogTurnManager: begin\nLogAbilities: cast\n");
}

#[test]
fn binary_json_and_debug_trace() {
    let dir = tempfile::tempdir().unwrap();
    let log = sample_log(dir.path());
    let out = dir.path().join("report/out.json");
    let trace = dir.path().join("trace.json");
    let status = turnlog()
        .arg(&log)
        .args(["--format", "json", "--debug-trace-limit", "3", "-q"])
        .arg("-o")
        .arg(&out)
        .arg("--debug-trace")
        .arg(&trace)
        .status()
        .unwrap();
    assert!(status.success());

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    // Medium depth, critical defaults: 5 before, 2 after.
    assert_eq!(doc["lines"].as_array().unwrap().len(), 5);
    let trace: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&trace).unwrap()).unwrap();
    assert_eq!(trace["recorded"], 3);
    assert_eq!(trace["limit"], 3);
}

#[test]
fn binary_unknown_preset_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let log = sample_log(dir.path());
    let output = turnlog()
        .arg(&log)
        .args(["--preset", "nosuch", "-q"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: unknown preset 'nosuch'"));
    assert!(stderr.contains("movement"));
    assert!(!dir.path().join("game_summary.txt").exists());
}

#[test]
fn binary_turn_range_on_plain_log_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = sample_log(dir.path());
    let output = turnlog()
        .arg(&log)
        .args(["--turn-range", "1-3", "-q"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn binary_lists_presets() {
    let output = turnlog().arg("--list-presets").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["raw", "movement", "turn_flow", "ai"] {
        assert!(stdout.contains(name), "missing {name}");
    }
}
