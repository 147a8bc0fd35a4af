//! Built-in pattern configuration.
//!
//! Three kinds of lists drive an analysis: registration patterns locate
//! workflow registrars, provider patterns locate dependency-injection
//! registration primitives, and the allow/deny sets classify audited calls.
//! They are compiled in for now; every consumer takes them as plain
//! arguments, so tests substitute their own.

use crate::pattern::Pattern;

/// Workflow registration functions.
pub fn registration_patterns() -> Vec<Pattern> {
    vec![
        Pattern::function("go.uber.org/cadence/workflow", "Register"),
        Pattern::function("go.uber.org/cadence/workflow", "RegisterWithOptions"),
    ]
}

/// Dependency-injection providers whose constructor arguments may register
/// workflows as a side effect.
pub fn provider_patterns() -> Vec<Pattern> {
    vec![Pattern::function("go.uber.org/fx", "Provide")]
}

/// Functions workflow code must not reach.
pub fn deny_patterns() -> Vec<Pattern> {
    vec![
        Pattern::function("time", "Now"),
        Pattern::method("go.uber.org/zap", "Logger", "Info"),
    ]
}

/// Trusted wrappers: traversal stops at these without a finding.
pub fn allow_patterns() -> Vec<Pattern> {
    vec![
        Pattern::method("go.uber.org/cadence/internal", "decodeFutureImpl", "Get"),
        Pattern::method("go.uber.org/cadence/internal", "futureImpl", "Get"),
        Pattern::function("go.uber.org/cadence/workflow", "GetLastCompletionResult"),
        Pattern::function("go.uber.org/cadence/workflow", "ExecuteActivity"),
        Pattern::method("sync", "Pool", "Get"),
        Pattern::function("fmt", "Sprintf"),
        Pattern::function("fmt", "Sprint"),
        // Undefined if this is actually safe.
        Pattern::function("sort", "Stable"),
        // The metrics interface doubles as the workflow-safe one, so
        // denying these floods real programs with false positives.
        Pattern::method("github.com/uber-go/tally", "scope", "Tagged"),
        Pattern::method("github.com/uber-go/tally", "scope", "Counter"),
    ]
}
