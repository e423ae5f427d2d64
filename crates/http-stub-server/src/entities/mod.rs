mod invocation;
mod method;
mod raw;
mod response;
mod rule;

pub use invocation::Invocation;
pub use method::{Method, MethodMatcher};
pub use raw::{parse_raw_response, read_raw_response};
pub use response::Response;
pub use rule::{MatchType, PathMatcher, ResponseSource, Rule};
