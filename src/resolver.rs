//! Resolves a user-supplied session reference to one catalog entry.
//!
//! Matching runs in three steps and the first step with any match decides:
//! exact id, then exact short id, then unique id suffix. Two or more
//! matches within a step are ambiguous; the resolver never picks one.

use crate::domain::SessionInfo;
use crate::error::SessionError;

pub fn resolve<'a>(universe: &'a [SessionInfo], query: &str) -> Result<&'a SessionInfo, SessionError> {
    if let Some(info) = universe.iter().find(|i| i.session.id.as_str() == query) {
        return Ok(info);
    }

    let by_short_id: Vec<&SessionInfo> = universe.iter().filter(|i| i.short_id() == query).collect();
    if !by_short_id.is_empty() {
        return single(by_short_id, query);
    }

    if query.is_empty() {
        return Err(not_found(query));
    }
    let by_suffix: Vec<&SessionInfo> = universe
        .iter()
        .filter(|i| i.session.id.as_str().ends_with(query))
        .collect();
    if by_suffix.is_empty() {
        return Err(not_found(query));
    }
    single(by_suffix, query)
}

fn single<'a>(matches: Vec<&'a SessionInfo>, query: &str) -> Result<&'a SessionInfo, SessionError> {
    match matches.as_slice() {
        [only] => Ok(*only),
        _ => {
            let mut candidates: Vec<String> =
                matches.iter().map(|i| i.short_id().to_string()).collect();
            candidates.sort();
            Err(SessionError::Ambiguous {
                query: query.to_string(),
                candidates,
            })
        }
    }
}

fn not_found(query: &str) -> SessionError {
    SessionError::NotFound {
        query: query.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
