use super::{AssertionPolicy, SystemContext};
use crate::value::Value;

/// Writes program output to stdout and assertion reports to stderr.
pub struct StdioContext {
    policy: AssertionPolicy,
}

impl StdioContext {
    pub fn new(policy: AssertionPolicy) -> Self {
        Self { policy }
    }
}

impl Default for StdioContext {
    fn default() -> Self {
        Self::new(AssertionPolicy::Halt)
    }
}

impl SystemContext for StdioContext {
    fn writeln(&mut self, text: &str) {
        println!("{text}");
    }

    fn assertion_failed(&mut self, actual: &Value, expected: &Value) -> AssertionPolicy {
        if self.policy == AssertionPolicy::Continue {
            eprintln!(
                "assertion failed: expected {}, got {}",
                expected.inspect(),
                actual.inspect()
            );
        }
        self.policy
    }
}

/// Captures program output and assertion failures in memory.
pub struct BufferedContext {
    buffer: String,
    failures: Vec<String>,
    policy: AssertionPolicy,
}

impl BufferedContext {
    pub fn new() -> Self {
        Self::with_policy(AssertionPolicy::Halt)
    }

    pub fn with_policy(policy: AssertionPolicy) -> Self {
        Self {
            buffer: String::new(),
            failures: Vec::new(),
            policy,
        }
    }

    pub fn get_failures(&self) -> &[String] {
        &self.failures
    }

    pub fn into_data(self) -> String {
        self.buffer
    }
}

impl Default for BufferedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemContext for BufferedContext {
    fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn assertion_failed(&mut self, actual: &Value, expected: &Value) -> AssertionPolicy {
        self.failures
            .push(format!("expected {}, got {}", expected.inspect(), actual.inspect()));
        self.policy
    }
}
