//! Extension priorities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordering value for extensions. Lower values run first; equal values keep
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(0);
    pub const HIGHEST: Priority = Priority(100);
    pub const HIGH: Priority = Priority(200);
    pub const DEFAULT: Priority = Priority(300);
    pub const LOW: Priority = Priority(400);
    pub const LOWEST: Priority = Priority(500);

    pub fn value(self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
