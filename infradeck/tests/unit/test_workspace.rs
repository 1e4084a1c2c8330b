//! Workspace manager, process runner and tfvars tests

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use infradeck::deploy::process::{OutputChunk, OutputStream, ProcessRunner};
use infradeck::deploy::tfvars::render_tfvars;
use infradeck::deploy::workspace::{WorkspaceKind, WorkspaceManager};
use infradeck::errors::ProcessError;
use infradeck::filesys::dir::Dir;
use infradeck::models::terraform::Variables;

async fn manager(prefix: &str) -> (Dir, WorkspaceManager) {
    let root = Dir::create_temp_dir(prefix).await.unwrap();
    let manager = WorkspaceManager::new(root.subdir("workspaces"));
    (root, manager)
}

fn drain(mut rx: mpsc::UnboundedReceiver<OutputChunk>) -> Vec<OutputChunk> {
    let mut chunks = Vec::new();
    while let Ok(chunk) = rx.try_recv() {
        chunks.push(chunk);
    }
    chunks
}

// ================================ WORKSPACES ===================================== //

#[tokio::test]
async fn test_back_to_back_workspaces_are_distinct() {
    let (root, manager) = manager("infradeck-ws-unique").await;

    let mut paths = HashSet::new();
    for _ in 0..50 {
        let workspace = manager
            .create_workspace(WorkspaceKind::Terraform, 1)
            .await
            .unwrap();
        assert!(workspace.dir().exists().await);
        assert!(paths.insert(workspace.path().to_path_buf()));
    }
    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_workspaces_are_distinct() {
    let (root, manager) = manager("infradeck-ws-concurrent").await;
    let manager = Arc::new(manager);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .create_workspace(WorkspaceKind::Ansible, 2)
                .await
                .unwrap()
                .path()
                .to_path_buf()
        }));
    }

    let mut paths = HashSet::new();
    for handle in handles {
        assert!(paths.insert(handle.await.unwrap()));
    }
    assert_eq!(paths.len(), 16);
    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_write_file_lands_in_workspace() {
    let (root, manager) = manager("infradeck-ws-write").await;
    let workspace = manager
        .create_workspace(WorkspaceKind::Terraform, 3)
        .await
        .unwrap();

    let file = manager
        .write_file(&workspace, "resource \"null\" \"x\" {}", "main.tf")
        .await
        .unwrap();
    assert_eq!(file.path(), workspace.path().join("main.tf"));
    assert_eq!(
        file.read_string().await.unwrap(),
        "resource \"null\" \"x\" {}"
    );

    // overwrite
    manager.write_file(&workspace, "", "main.tf").await.unwrap();
    assert_eq!(file.read_string().await.unwrap(), "");
    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_prune_removes_only_expired_workspaces() {
    let (root, manager) = manager("infradeck-ws-prune").await;
    assert_eq!(manager.prune(Duration::ZERO).await.unwrap(), 0);

    let workspace = manager
        .create_workspace(WorkspaceKind::Terraform, 4)
        .await
        .unwrap();
    let dir = workspace.dir().clone();
    drop(workspace);
    assert_eq!(manager.prune(Duration::from_secs(3600)).await.unwrap(), 0);
    assert!(dir.exists().await);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.prune(Duration::from_millis(1)).await.unwrap(), 1);
    assert!(!dir.exists().await);
    root.delete().await.unwrap();
}

// ============================== PROCESS RUNNER =================================== //

#[tokio::test]
async fn test_runner_streams_chunks_with_accumulated_output() {
    let dir = Dir::create_temp_dir("infradeck-run-ok").await.unwrap();
    let runner = ProcessRunner::default();
    let (tx, rx) = mpsc::unbounded_channel();

    let output = runner
        .run("echo one; sleep 0.1; echo two", dir.path(), tx)
        .await
        .unwrap();
    assert_eq!(output, "one\ntwo\n");

    let chunks = drain(rx);
    assert!(!chunks.is_empty());
    let mut expected = String::new();
    for chunk in &chunks {
        expected.push_str(&chunk.data);
        assert_eq!(chunk.accumulated, expected);
    }
    assert_eq!(chunks.last().unwrap().accumulated, output);
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_runner_runs_in_working_directory() {
    let dir = Dir::create_temp_dir("infradeck-run-cwd").await.unwrap();
    dir.file("marker.txt").write_string("here").await.unwrap();

    let (tx, _rx) = mpsc::unbounded_channel();
    let output = ProcessRunner::default()
        .run("cat marker.txt", dir.path(), tx)
        .await
        .unwrap();
    assert_eq!(output, "here");
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_runner_nonzero_exit_carries_output() {
    let dir = Dir::create_temp_dir("infradeck-run-fail").await.unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let err = ProcessRunner::default()
        .run("echo partial; echo broken >&2; exit 3", dir.path(), tx)
        .await
        .unwrap_err();

    match &err {
        ProcessError::Exited { code, output } => {
            assert_eq!(*code, Some(3));
            assert!(output.contains("partial"));
            assert!(output.contains("broken"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Command exited with code 3: "));

    let chunks = drain(rx);
    assert!(chunks.iter().any(|c| c.stream == OutputStream::Stderr));
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_runner_interleaves_stderr_in_arrival_order() {
    let dir = Dir::create_temp_dir("infradeck-run-order").await.unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let output = ProcessRunner::default()
        .run(
            "echo out1; sleep 0.2; echo err1 >&2; sleep 0.2; echo out2",
            dir.path(),
            tx,
        )
        .await
        .unwrap();
    assert_eq!(output, "out1\nerr1\nout2\n");

    let streams: Vec<OutputStream> = drain(rx).into_iter().map(|c| c.stream).collect();
    assert_eq!(
        streams,
        vec![OutputStream::Stdout, OutputStream::Stderr, OutputStream::Stdout]
    );
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_runner_spawn_failure() {
    let dir = Dir::create_temp_dir("infradeck-run-spawn").await.unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let err = ProcessRunner::new("/nonexistent/infradeck-shell")
        .run("echo never", dir.path(), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessError::Spawn(_)));
    assert!(drain(rx).is_empty());
    dir.delete().await.unwrap();
}

#[tokio::test]
async fn test_runner_keeps_going_without_listener() {
    let dir = Dir::create_temp_dir("infradeck-run-nolisten").await.unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let output = ProcessRunner::default()
        .run("echo a; echo b", dir.path(), tx)
        .await
        .unwrap();
    assert_eq!(output, "a\nb\n");
    dir.delete().await.unwrap();
}

// ================================== TFVARS ======================================= //

/// Minimal reader for the subset of HCL that `render_tfvars` writes
fn parse_tfvars(text: &str) -> Variables {
    let mut vars = Variables::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let (key, raw) = line.split_once(" = ").unwrap();
        let value = if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            let mut out = String::new();
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    match chars.next().unwrap() {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        other => out.push(other),
                    }
                } else {
                    out.push(c);
                }
            }
            Value::String(out)
        } else {
            serde_json::from_str(raw).unwrap()
        };
        vars.insert(key.to_string(), value);
    }
    vars
}

#[test]
fn test_tfvars_round_trip() {
    let variables = json!({
        "aws_region": "us-west-2",
        "vpc_cidr": "10.0.0.0/16",
        "instance_count": 2,
        "ratio": 0.5,
        "public": false,
        "azs": ["us-west-2a", "us-west-2b"],
        "tags": {"env": "dev"},
        "quoted": "a \"quoted\" \\ value\nnext line",
    })
    .as_object()
    .cloned()
    .unwrap();

    let rendered = render_tfvars(&variables);
    assert_eq!(parse_tfvars(&rendered), variables);

    let keys: Vec<&str> = rendered
        .lines()
        .map(|l| l.split(" = ").next().unwrap())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}
