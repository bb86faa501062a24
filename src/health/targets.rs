//! Target enumeration.

/// Source of the current target set. Asked once at the start of every
/// cycle; the monitor never caches the answer.
pub trait TargetSource: Send + Sync {
    fn snapshot(&self) -> Vec<String>;
}

/// A fixed list of targets.
impl TargetSource for Vec<String> {
    fn snapshot(&self) -> Vec<String> {
        self.clone()
    }
}
