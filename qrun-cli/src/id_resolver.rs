//! ID resolver module
//!
//! Resolves short, unambiguous prefixes to full job and session IDs by
//! querying the API. A prefix may omit the `job-` / `session-` part.

use anyhow::{Context, Result, anyhow};
use qrun_client::QrunClient;
use uuid::{Uuid, fmt::Hyphenated};

/// Resolve a job ID or prefix to a full job ID
pub async fn resolve_job_id(client: &QrunClient, input: &str) -> Result<String> {
    if is_full_id(input, "job-") {
        return Ok(input.to_string());
    }

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    resolve_prefix("job", "job-", input, jobs.iter().map(|j| j.id.as_str()))
}

/// Resolve a session ID or prefix to a full session ID
pub async fn resolve_session_id(client: &QrunClient, input: &str) -> Result<String> {
    if is_full_id(input, "session-") {
        return Ok(input.to_string());
    }

    let sessions = client
        .list_sessions()
        .await
        .context("Failed to fetch sessions for ID resolution")?;

    resolve_prefix(
        "session",
        "session-",
        input,
        sessions.iter().map(|s| s.id.as_str()),
    )
}

/// Whether `input` is `<kind prefix><uuid>`
fn is_full_id(input: &str, kind_prefix: &str) -> bool {
    input
        .strip_prefix(kind_prefix)
        .is_some_and(|rest| rest.len() == Hyphenated::LENGTH && Uuid::parse_str(rest).is_ok())
}

/// Find the single candidate matching `input`, with or without `kind_prefix`
fn resolve_prefix<'a>(
    kind: &str,
    kind_prefix: &str,
    input: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Result<String> {
    let prefix = input.to_lowercase();

    let matches: Vec<&str> = candidates
        .filter(|id| {
            let id = id.to_lowercase();
            id.starts_with(&prefix)
                || id
                    .strip_prefix(kind_prefix)
                    .is_some_and(|rest| rest.starts_with(&prefix))
        })
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No {} found with ID starting with '{}'", kind, input)),
        [id] => Ok(id.to_string()),
        _ => Err(anyhow!(
            "Ambiguous prefix '{}' matches multiple {}s: {}",
            input,
            kind,
            matches.join(", ")
        )),
    }
}
