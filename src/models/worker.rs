//! Worker model.
//!
//! Workers are the interchangeable members of the pool. During a run a
//! worker is attached to at most one task at a time; that attachment is
//! tracked inside the simulation and reported through the scheduler's
//! assignment history, so the worker record itself carries only identity
//! and display fields.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Unique worker identifier, allocated by the scheduler.
pub type WorkerId = u32;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,6}$").expect("static pattern")
    })
}

/// Checks a contact address against the e-mail pattern.
pub fn is_valid_email(address: &str) -> bool {
    email_pattern().is_match(address)
}

/// A member of the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier.
    pub id: WorkerId,
    /// Display name.
    pub name: String,
    /// Contact address. `None` when the supplied address was invalid.
    pub email: Option<String>,
}

impl Worker {
    /// Creates a worker with no contact address.
    pub fn new(id: WorkerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
        }
    }

    /// Sets the contact address if it matches the e-mail pattern.
    ///
    /// An address that fails validation is dropped with a warning rather
    /// than rejected: contact data is display-only and must never block
    /// scheduling.
    pub fn with_contact(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        if is_valid_email(&address) {
            self.email = Some(address);
        } else {
            warn!(worker = self.id, %address, "discarding invalid e-mail address");
        }
        self
    }
}

impl PartialEq for Worker {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Worker {}
