//! `paneweave sessions ...` handlers and their text rendering.

use super::cli::SessionsCommand;
use super::context::AppContext;
use crate::catalog::Catalog;
use crate::domain::{
    format_relative_time, PaneNodeSnapshot, SessionId, SessionInfo, SplitDirection,
};
use crate::guard::DeleteGuard;
use crate::lifecycle::{cleanup_exited_sessions, sweep_stale_sessions};
use crate::resolver::resolve;
use crate::restore::RestoreOrchestrator;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Resolution searches this many times the listing cap.
const RESOLVE_UNIVERSE_FACTOR: usize = 5;

pub fn run(ctx: &AppContext, command: SessionsCommand) -> Result<()> {
    match command {
        SessionsCommand::List { json, limit } => list(ctx, json, limit),
        SessionsCommand::Show { id } => show(ctx, &id),
        SessionsCommand::Restore { id } => restore(ctx, &id),
        SessionsCommand::Delete { id } => delete(ctx, &id),
        SessionsCommand::Cleanup => cleanup(ctx),
    }
}

fn catalog(ctx: &AppContext) -> Catalog<'_> {
    Catalog::new(&ctx.store).with_default_limit(ctx.config.session.max_listed_sessions)
}

fn list(ctx: &AppContext, json: bool, limit: usize) -> Result<()> {
    let current = ctx.current_session();
    let infos = catalog(ctx)
        .list(current.as_ref(), limit)
        .context("list sessions")?;

    if json {
        let out = serde_json::to_string_pretty(&infos).context("Failed to encode sessions")?;
        println!("{}", out);
    } else {
        print!("{}", render_table(&infos, Utc::now()));
    }
    Ok(())
}

/// Lists a generous universe and resolves `query` against it.
fn find_session(ctx: &AppContext, current: Option<&SessionId>, query: &str) -> Result<SessionInfo> {
    let universe_limit = ctx.config.session.max_listed_sessions.max(1) * RESOLVE_UNIVERSE_FACTOR;
    let universe = catalog(ctx)
        .list(current, universe_limit)
        .context("list sessions")?;
    Ok(resolve(&universe, query)?.clone())
}

fn show(ctx: &AppContext, query: &str) -> Result<()> {
    let current = ctx.current_session();
    let info = find_session(ctx, current.as_ref(), query)?;
    print!("{}", render_tree(&info, Utc::now()));
    Ok(())
}

fn restore(ctx: &AppContext, query: &str) -> Result<()> {
    let current = ctx.current_session();
    let info = find_session(ctx, current.as_ref(), query)?;
    let spawner = ctx.spawner()?;
    let report = RestoreOrchestrator::new(&ctx.store, &spawner)
        .restore(info.session.id.as_str(), current.as_ref())
        .context("restore session")?;

    println!(
        "Restoring session {} ({} tabs, {} panes, pid {})...",
        report.session_id, report.tabs, report.panes, report.pid
    );
    Ok(())
}

fn delete(ctx: &AppContext, query: &str) -> Result<()> {
    let current = ctx.current_session();
    let info = find_session(ctx, current.as_ref(), query)?;
    DeleteGuard::new(&ctx.store)
        .delete(&info.session.id, current.as_ref())
        .context("delete session")?;

    println!("Session {} deleted.", info.session.id);
    Ok(())
}

fn cleanup(ctx: &AppContext) -> Result<()> {
    let now = Utc::now();
    let repaired =
        sweep_stale_sessions(&ctx.store, None, now).context("end stale sessions")?;
    let report = cleanup_exited_sessions(
        &ctx.store,
        ctx.config.session.max_exited_sessions,
        ctx.config.session.max_exited_session_age_days,
        now,
    )
    .context("clean up exited sessions")?;

    println!(
        "Ended {} stale session(s); deleted {} by age, {} by count.",
        repaired, report.deleted_by_age, report.deleted_by_count
    );
    if report.failed > 0 {
        eprintln!(
            "[paneweave] {} session(s) could not be deleted, see the log for details",
            report.failed
        );
    }
    Ok(())
}

fn status_marker(info: &SessionInfo) -> &'static str {
    if info.is_current {
        "●"
    } else if info.is_active {
        "○"
    } else {
        " "
    }
}

/// Aligned session table, or a notice when there is nothing to show.
pub fn render_table(infos: &[SessionInfo], now: DateTime<Utc>) -> String {
    if infos.is_empty() {
        return "No saved sessions found.\n".to_string();
    }

    let header = ["STATUS", "SESSION ID", "TABS", "PANES", "LAST UPDATED"];
    let rows: Vec<[String; 5]> = infos
        .iter()
        .map(|info| {
            [
                status_marker(info).to_string(),
                info.session.id.to_string(),
                info.tab_count.to_string(),
                info.pane_count.to_string(),
                format_relative_time(info.updated_at, now),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells = header.map(str::to_string);
    for cells in std::iter::once(&header_cells).chain(&rows) {
        let mut line = String::new();
        for (idx, cell) in cells.iter().enumerate() {
            if idx + 1 == cells.len() {
                line.push_str(cell);
            } else {
                let _ = write!(line, "{:<width$}  ", cell, width = widths[idx]);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Depth-first export of every tab's pane tree.
pub fn render_tree(info: &SessionInfo, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Session {} ({}, updated {})",
        info.session.id,
        info.status(),
        format_relative_time(info.updated_at, now)
    );
    let Some(state) = &info.state else {
        out.push_str("  no saved state\n");
        return out;
    };
    if state.tabs.is_empty() {
        out.push_str("  no tabs\n");
    }
    for (idx, tab) in state.tabs.iter().enumerate() {
        let pinned = if tab.is_pinned { " [pinned]" } else { "" };
        let _ = writeln!(out, "  Tab {}: {}{}", idx + 1, tab.display_name(), pinned);
        let Some(root) = &tab.workspace.root else {
            out.push_str("    (empty)\n");
            continue;
        };
        for (depth, node) in root.walk() {
            let indent = "  ".repeat(depth + 2);
            match node {
                PaneNodeSnapshot::Leaf { pane, .. } => {
                    let title = if pane.title.is_empty() { &pane.uri } else { &pane.title };
                    let _ = writeln!(out, "{}- {} <{}>", indent, title, pane.uri);
                }
                PaneNodeSnapshot::Container(container) if container.is_stacked => {
                    let _ = writeln!(out, "{}stacked ({})", indent, container.children.len());
                }
                PaneNodeSnapshot::Container(container) => {
                    let dir = match container.split_dir {
                        SplitDirection::Horizontal => "horizontal",
                        SplitDirection::Vertical => "vertical",
                    };
                    if container.children.len() == 2 {
                        let _ = writeln!(out, "{}split {} {:.2}", indent, dir, container.split_ratio);
                    } else {
                        let _ = writeln!(out, "{}split {} ({})", indent, dir, container.children.len());
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/sessions_cmd_tests.rs"]
mod tests;
