//! Response-wait timeout policy.

use std::time::Duration;

/// The single response-wait duration shared by every connection.
///
/// The policy is a value, not a timer: tracking outstanding calls and
/// raising timeout failures belongs to the RPC layer above. The duration is
/// set once at startup and is immutable afterwards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hawser::timeout::TimeoutPolicy;
///
/// let policy = TimeoutPolicy::new(Duration::from_secs(30));
/// assert_eq!(policy.response_wait(), Duration::from_secs(30));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutPolicy {
    response_wait: Duration,
}

impl TimeoutPolicy {
    /// Create a policy with the given response-wait duration.
    #[must_use]
    pub const fn new(response_wait: Duration) -> Self { Self { response_wait } }

    /// The maximum time callers should wait for a server response.
    #[must_use]
    pub const fn response_wait(&self) -> Duration { self.response_wait }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_reports_its_configured_duration() {
        let policy = TimeoutPolicy::new(Duration::from_millis(750));
        assert_eq!(policy.response_wait(), Duration::from_millis(750));
    }
}
