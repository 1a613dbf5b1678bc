//! End-to-end tests for the Stop hook binary.
//!
//! Spawns `constitution-enforcer`, writes the hook payload to stdin, and
//! checks the exit status and stderr the host would see.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

const APPROVE: i32 = 0;
const MALFORMED_INPUT: i32 = 1;
const REJECT: i32 = 2;

fn invoke(stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_constitution-enforcer"))
        .env_remove("CONSTITUTION_ENFORCER_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn hook");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write payload");
    child.wait_with_output().expect("hook output")
}

fn payload(path: &Path, stop_hook_active: bool) -> String {
    json!({
        "session_id": "test-session",
        "hook_event_name": "Stop",
        "transcript_path": path.to_string_lossy(),
        "stop_hook_active": stop_hook_active,
    })
    .to_string()
}

fn user(text: &str) -> Value {
    json!({"type": "user", "message": {"role": "user", "content": text}})
}

fn assistant(text: &str) -> Value {
    json!({
        "type": "assistant",
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    })
}

fn write_transcript(dir: &Path, entries: &[Value]) -> PathBuf {
    let path = dir.join("t.log");
    let data: String = entries.iter().map(|e| format!("{e}\n")).collect();
    std::fs::write(&path, data).expect("write transcript");
    path
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn rejects_later_and_todo() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(
        temp.path(),
        &[
            user("Handle the edge case"),
            assistant("I'll add this later. // TODO: fix edge case"),
        ],
    );

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(REJECT));
    let message = stderr(&output);
    assert!(message.starts_with("CONSTITUTION VIOLATION DETECTED"), "{message}");
    assert!(message.contains(r#"Deferral: "I'll X later""#), "{message}");
    assert!(message.contains("Code marker: TODO"), "{message}");
    assert!(message.contains("BLOCKER:"), "{message}");
    assert_eq!(message.trim_end().lines().count(), 1);
    assert!(output.stdout.is_empty());
}

#[test]
fn approves_complete_response_silently() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(
        temp.path(),
        &[assistant(
            "I implemented the full retry logic with exponential backoff and tests.",
        )],
    );

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(APPROVE));
    assert!(output.stderr.is_empty(), "{}", stderr(&output));
}

#[test]
fn empty_transcript_path_approves() {
    let output = invoke(r#"{"transcript_path": "", "stop_hook_active": false}"#);
    assert_eq!(output.status.code(), Some(APPROVE));
}

#[test]
fn retry_guard_never_rejects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(temp.path(), &[assistant("TODO: finish this\n// TODO")]);

    let output = invoke(&payload(&path, true));

    assert_eq!(output.status.code(), Some(APPROVE));
    assert!(output.stderr.is_empty());
}

#[test]
fn missing_transcript_approves() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = invoke(&payload(&temp.path().join("missing.jsonl"), false));
    assert_eq!(output.status.code(), Some(APPROVE));
}

#[test]
fn malformed_payload_exits_with_distinct_status() {
    for raw in ["{not json", "", "[]"] {
        let output = invoke(raw);
        assert_eq!(output.status.code(), Some(MALFORMED_INPUT), "{raw:?}");
        assert!(stderr(&output).starts_with("Error parsing input:"));
    }
}

#[test]
fn only_latest_assistant_turn_is_judged() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(
        temp.path(),
        &[
            assistant("Out of scope for now. // FIXME"),
            user("Please finish it"),
            assistant("Done: every branch is handled and covered by tests."),
            user("// TODO this user text is never judged"),
        ],
    );

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(APPROVE), "{}", stderr(&output));
}

#[test]
fn first_person_for_now_is_allowed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let allowed = write_transcript(
        temp.path(),
        &[assistant("For now, I will continue wiring the parser.")],
    );
    assert_eq!(invoke(&payload(&allowed, false)).status.code(), Some(APPROVE));

    let rejected = write_transcript(temp.path(), &[assistant("for now we will skip this")]);
    let output = invoke(&payload(&rejected, false));
    assert_eq!(output.status.code(), Some(REJECT));
    assert!(stderr(&output).contains(r#"Minimization: "for now""#));
}

#[test]
fn report_lists_at_most_five_labels() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(
        temp.path(),
        &[assistant(
            "You might want to retry. This is out of scope. Don't forget to deploy. \
             It is a basic implementation. // XXX\n// STUB\n# FIXME",
        )],
    );

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(REJECT));
    let message = stderr(&output);
    let violations = message
        .split("Violations: ")
        .nth(1)
        .and_then(|rest| rest.split(". You are PROHIBITED").next())
        .expect("violation list");
    assert_eq!(violations.split(", ").count(), 5, "{violations}");
}

#[test]
fn tolerates_garbage_lines_and_crlf() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("t.log");
    let data = format!(
        "{}\r\nnot json at all\r\n\r\n{{\"type\":\"assistant\"\r\n",
        assistant("Consider using a cache.")
    );
    std::fs::write(&path, data).expect("write transcript");

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(REJECT));
    assert!(stderr(&output).contains(r#"Hedging: "consider""#));
}

#[test]
fn tool_use_blocks_are_not_judged() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_transcript(
        temp.path(),
        &[json!({
            "type": "assistant",
            "message": {"content": [
                {"type": "tool_use", "name": "Write", "input": {"content": "// TODO"}},
                {"type": "text", "text": "Wrote the module with complete error handling."}
            ]}
        })],
    );

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(APPROVE));
}

#[test]
fn array_shaped_lines_are_not_records() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("t.log");
    let data = format!(
        "{}\n[\"assistant\", {{\"content\":[{{\"type\":\"text\",\"text\":\"// TODO hidden\"}}]}}]\n",
        assistant("Finished the migration and verified it against production data.")
    );
    std::fs::write(&path, data).expect("write transcript");

    let output = invoke(&payload(&path, false));

    assert_eq!(output.status.code(), Some(APPROVE), "{}", stderr(&output));
}
