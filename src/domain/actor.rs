//! Acting-user context.
//!
//! Authentication itself is handled upstream; the API layer only receives a
//! verified identity and threads it into every mutating operation so audit
//! stamps are an explicit argument, never ambient state.

use serde::{Deserialize, Serialize};

/// The authenticated user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

impl Actor {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}
