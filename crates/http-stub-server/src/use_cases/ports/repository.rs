use crate::entities::{Invocation, Rule};

/// Storage for HTTP rules
///
/// Exact-path rules take precedence over pattern rules whatever the order
/// they were added in.
pub trait Repository: Send + Sync {
    fn add(&self, rule: Rule);

    /// First matching rule in precedence order
    fn find(&self, invocation: &Invocation) -> Option<Rule>;
}
