//! Round-robin selection with cookie-based stickiness.
//!
//! # Responsibilities
//! - Keep a round-robin cursor per proxy context
//! - Remember which backend port each affinity token was sent to
//! - Decide, per request, which port to use and whether the client's cookie
//!   needs to be (re)issued
//!
//! # Design Decisions
//! - One mutex guards both tables, so advancing a cursor and recording the
//!   binding it produced happen atomically
//! - The lock is never held across an `.await`
//! - Bindings are per (token, context): one client token can be pinned to a
//!   different port in each context without the cookie changing
//! - Nothing is ever evicted; `unbind` is the only way a binding goes away

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::http::error::HttpError;
use crate::load_balancer::cookie::new_token;

/// What the request's cookie said about affinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affinity {
    /// The token was already bound in this context.
    Sticky,
    /// The token is known from another context and was bound here just now.
    Joined,
    /// No cookie; a fresh token was minted and bound.
    Fresh,
    /// The cookie carried a token nobody knows; it was replaced.
    Stale { previous: String },
}

impl Affinity {
    /// Whether the response must carry a `Set-Cookie` for the token.
    pub fn issues_cookie(&self) -> bool {
        matches!(self, Affinity::Fresh | Affinity::Stale { .. })
    }
}

/// Backend chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub port: u16,
    pub token: String,
    pub affinity: Affinity,
}

#[derive(Debug, Default)]
struct Tables {
    /// context → index of the last port handed out
    cursors: HashMap<String, usize>,
    /// token → context → port
    bindings: HashMap<String, HashMap<String, u16>>,
}

impl Tables {
    fn next_port(&mut self, context: &str, ports: &[u16]) -> u16 {
        let idx = match self.cursors.get(context) {
            Some(last) => (last + 1) % ports.len(),
            None => 0,
        };
        self.cursors.insert(context.to_string(), idx);
        ports[idx]
    }

    fn unused_token(&self) -> String {
        loop {
            let token = new_token();
            if !self.bindings.contains_key(&token) {
                return token;
            }
        }
    }

    fn bind(&mut self, token: &str, context: &str, port: u16) {
        self.bindings
            .entry(token.to_string())
            .or_default()
            .insert(context.to_string(), port);
    }
}

/// Shared load-balancer state, handed to every connection worker by `Arc`.
#[derive(Debug, Default)]
pub struct AffinityState {
    tables: Mutex<Tables>,
}

impl AffinityState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // every update is a single insert, so a panicking holder cannot leave
        // the tables half-written
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the backend port for a request to `context`.
    pub fn assign(
        &self,
        context: &str,
        ports: &[u16],
        cookie: Option<&str>,
    ) -> Result<Assignment, HttpError> {
        if ports.is_empty() {
            return Err(HttpError::InternalServerError(format!(
                "no backends configured for {}",
                context
            )));
        }

        let mut tables = self.lock();

        let (token, affinity) = match cookie {
            None => (tables.unused_token(), Affinity::Fresh),
            Some(token) => match tables.bindings.get(token) {
                Some(contexts) => {
                    if let Some(&port) = contexts.get(context) {
                        return Ok(Assignment {
                            port,
                            token: token.to_string(),
                            affinity: Affinity::Sticky,
                        });
                    }
                    (token.to_string(), Affinity::Joined)
                }
                None => (
                    tables.unused_token(),
                    Affinity::Stale {
                        previous: token.to_string(),
                    },
                ),
            },
        };

        let port = tables.next_port(context, ports);
        tables.bind(&token, context, port);

        Ok(Assignment {
            port,
            token,
            affinity,
        })
    }

    /// Port `token` is pinned to in `context`, if any.
    pub fn bound_port(&self, token: &str, context: &str) -> Option<u16> {
        self.lock().bindings.get(token)?.get(context).copied()
    }

    /// Forget every binding for `token`.
    pub fn unbind(&self, token: &str) -> bool {
        self.lock().bindings.remove(token).is_some()
    }

    /// Number of tokens currently bound.
    pub fn binding_count(&self) -> usize {
        self.lock().bindings.len()
    }
}
