//! `paneweave browse`: owns one session until interrupted.

use super::cli::BrowseArgs;
use super::context::AppContext;
use crate::domain::{SessionId, SessionState};
use crate::lifecycle::{find_last_restorable, sweep_stale_sessions, BrowserSession};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::time::Duration;

const DEFAULT_URI: &str = "about:blank";

pub async fn run(ctx: AppContext, args: BrowseArgs) -> Result<()> {
    let repaired = sweep_stale_sessions(&ctx.store, None, Utc::now()).context("end stale sessions")?;
    if repaired > 0 {
        tracing::info!(count = repaired, "ended stale sessions");
    }

    let resume = resume_target(&ctx, &args)?;
    let uris = initial_uris(&args.urls);
    let browser = BrowserSession::start(ctx.store.clone(), resume.as_ref(), &uris)
        .context("start browser session")?;

    if browser.is_resumed() {
        for pane in browser
            .initial_state()
            .tabs
            .iter()
            .filter_map(|tab| tab.workspace.root.as_ref())
            .flat_map(|root| root.leaves())
        {
            tracing::debug!(session_id = %browser.id(), uri = %pane.uri, "reopening pane");
        }
        eprintln!(
            "[paneweave] Resumed session {} ({} tabs)",
            browser.id(),
            browser.initial_state().tab_count()
        );
    } else {
        eprintln!("[paneweave] Started session {}", browser.id());
    }

    let state = browser.initial_state().clone();
    let period = Duration::from_secs(ctx.config.session.snapshot_interval_secs);
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately and the initial state is already saved.
    interval.tick().await;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = browser.checkpoint(&state) {
                    tracing::warn!(session_id = %browser.id(), error = %e, "checkpoint failed");
                }
            }
            signal = &mut interrupt => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "failed to listen for interrupt");
                }
                break;
            }
        }
    }

    let id = browser.id().clone();
    browser.end(&state).context("end browser session")?;
    eprintln!("[paneweave] Session {} saved", id);
    Ok(())
}

fn resume_target(ctx: &AppContext, args: &BrowseArgs) -> Result<Option<SessionId>> {
    if let Some(raw) = &args.restore_session {
        let id = SessionId::parse(raw).ok_or_else(|| anyhow!("Invalid session ID: {}", raw))?;
        return Ok(Some(id));
    }
    if !args.restore_last {
        return Ok(None);
    }
    let found: Option<SessionState> =
        find_last_restorable(&ctx.store, None).context("find last restorable session")?;
    if found.is_none() {
        eprintln!("[paneweave] No restorable session found, starting a new one");
    }
    Ok(found.map(|state| state.session_id))
}

/// URLs from the command line, or a single blank tab.
pub fn initial_uris(urls: &[String]) -> Vec<String> {
    let uris: Vec<String> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();
    if uris.is_empty() {
        vec![DEFAULT_URI.to_string()]
    } else {
        uris
    }
}

#[cfg(test)]
#[path = "tests/browse_tests.rs"]
mod tests;
