//! HTTP Stub Server
//!
//! Serves canned HTTP responses matched by exact path or regular expression.
//! Rules come from `.json` records or captured `.http` responses on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use http_stub_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load every rule under stubs/
//!     let responder = Responder::from_dir("stubs")?;
//!
//!     Axum::bind(([127, 0, 0, 1], 8080))
//!         .serve(
//!             responder,
//!             async {
//!                 let _ = tokio::signal::ctrl_c().await;
//!             },
//!             Some(|addr| println!("listening on {addr}")),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod adapters;
pub mod entities;
pub mod error;
pub mod use_cases;

pub use error::{InvalidStub, LoadError, RawResponseError, ServeError};

#[cfg(feature = "axum")]
pub use adapters::gateways::{Axum, Responder};

use std::sync::{Mutex, PoisonError};

use entities::{Invocation, Rule};

/// In-memory rule table, kept sorted exact-before-pattern
///
/// Within a match type, rules keep the order they were added in.
#[derive(Debug, Default)]
pub struct Storage {
    rules: Mutex<Vec<Rule>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl use_cases::ports::Repository for Storage {
    fn add(&self, rule: Rule) {
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        rules.push(rule);
        rules.sort_by_key(Rule::match_type);
    }

    fn find(&self, invocation: &Invocation) -> Option<Rule> {
        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let matched: Vec<&Rule> = rules.iter().filter(|rule| rule.matches(invocation)).collect();

        if matched.len() > 1 {
            let types: Vec<String> = matched
                .iter()
                .map(|rule| rule.match_type().to_string())
                .collect();
            tracing::warn!(
                path = %invocation.path,
                method = %invocation.method,
                matches = matched.len(),
                types = ?types,
                "Multiple stub rules matched"
            );
        }

        matched.first().map(|rule| (*rule).clone())
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::entities::{Invocation, MatchType, Method, MethodMatcher, Response, Rule};
    pub use crate::error::{LoadError, ServeError};
    pub use crate::use_cases::load_stubs;
    pub use crate::use_cases::ports::Repository;
    pub use crate::Storage;

    #[cfg(feature = "axum")]
    pub use crate::{Axum, Responder};
}
