//! Stop hook that rejects responses containing deferral language.
//!
//! Reads the hook payload from stdin, pulls the latest assistant response out
//! of the session transcript, and scans it for hedging, postponed work, scope
//! dodging, responsibility shifting, minimization and unresolved code markers.
//! A match exits with status 2 and a report on stderr, which makes the host
//! send Claude back to finish the job. Anything that prevents judging the
//! response (a retry already in progress, an unreadable transcript, no
//! assistant text) lets the response stand.

mod logging;
mod payload;
mod rules;
mod transcript;
mod verdict;

use std::io::{self, Read};
use std::process;
use tracing::{debug, warn};

use payload::{HookInput, Resolution};
use transcript::Extraction;
use verdict::Decision;

fn main() {
    logging::init();
    process::exit(run(io::stdin().lock()));
}

/// Run one invocation and return the exit status for the host.
fn run(stdin: impl Read) -> i32 {
    let input = match HookInput::from_reader(stdin) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("{err}");
            return exit_codes::MALFORMED_INPUT;
        }
    };

    let _span = tracing::debug_span!(
        "stop_hook",
        session = input.session_id.as_deref().unwrap_or("unknown"),
        event = input.hook_event_name.as_deref().unwrap_or("Stop")
    )
    .entered();

    let transcript_path = match input.resolve() {
        Resolution::Proceed(path) => path,
        Resolution::ShortCircuit(reason) => {
            debug!(%reason, "approving without scan");
            return exit_codes::APPROVE;
        }
    };

    let response = match transcript::read_latest_response(&transcript_path) {
        Extraction::Response(text) => text,
        Extraction::Nothing(reason) => {
            debug!(%reason, "approving without scan");
            return exit_codes::APPROVE;
        }
    };

    match verdict::scan(&response) {
        Decision::Approve => {
            debug!("no deferral language found");
            exit_codes::APPROVE
        }
        Decision::Reject(report) => {
            warn!(labels = ?report.labels(), "rejecting response");
            eprintln!("{report}");
            exit_codes::REJECT
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes and errors
// ---------------------------------------------------------------------------

/// Exit statuses the host's Stop hook runner interprets.
mod exit_codes {
    /// The response may stand.
    pub const APPROVE: i32 = 0;
    /// The invocation payload could not be parsed.
    pub const MALFORMED_INPUT: i32 = 1;
    /// The response is rejected. Stderr carries the report and the host re-prompts.
    pub const REJECT: i32 = 2;
}

/// Failures that break the invocation contract with the host.
///
/// Everything that goes wrong after the payload is understood (unreadable
/// transcript, garbage lines) degrades to an approval instead.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Error parsing input: {0}")]
    ReadInput(#[from] io::Error),

    #[error("Error parsing input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Error parsing input: expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
