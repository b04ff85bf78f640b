//! Polling loop for in-flight generation operations.
//!
//! The loop sleeps, advances the rotating status message, then polls. A
//! failed poll keeps the loop in progress; whether it ever gives up is a
//! matter of [`PollPolicy`].

use std::time::Duration;

use tokio::time::Instant;

use super::client::{Operation, VideoService};
use super::error::GenerationError;
use super::retry::{is_transient_network_error, Backoff};

/// Default interval between polls (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status messages cycled while a generation is in flight.
pub const LOADING_MESSAGES: [&str; 8] = [
    "Warming up the digital director's chair...",
    "Assembling the pixels...",
    "Choreographing the photons...",
    "Teaching the AI about cinematography...",
    "Rendering the digital dreamscape...",
    "This can take a few minutes, the magic is in the making!",
    "Polishing the final cut...",
    "Adding sound and fury...",
];

/// Rotating status message with wrap-around.
#[derive(Debug, Clone)]
pub struct LoadingMessages {
    messages: &'static [&'static str],
    index: usize,
}

impl Default for LoadingMessages {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingMessages {
    pub fn new() -> Self {
        Self::with_messages(&LOADING_MESSAGES)
    }

    /// Use a custom list. An empty list falls back to the built-in one.
    pub fn with_messages(messages: &'static [&'static str]) -> Self {
        let messages = if messages.is_empty() {
            &LOADING_MESSAGES[..]
        } else {
            messages
        };
        Self { messages, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn current(&self) -> &'static str {
        self.messages[self.index]
    }

    /// Move to the next message, wrapping at the end, and return it.
    pub fn advance(&mut self) -> &'static str {
        self.index = (self.index + 1) % self.messages.len();
        self.current()
    }
}

/// State of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    InProgress,
    Done,
}

impl PollState {
    pub fn of(operation: &Operation) -> Self {
        if operation.done {
            PollState::Done
        } else {
            PollState::InProgress
        }
    }
}

/// How the loop paces itself and when it gives up.
///
/// The default polls every 10 seconds forever and never gives up on poll
/// failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up after this many consecutive failed polls. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
    /// Back off exponentially after failures instead of using `interval`.
    pub backoff: Option<Backoff>,
    /// Overall deadline for the loop. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: None,
            backoff: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// Delay before the next poll given the current consecutive failure count.
    pub fn next_delay(&self, failures: u32) -> Duration {
        match self.backoff {
            Some(backoff) if failures > 0 => backoff.delay_after(failures),
            _ => self.interval,
        }
    }
}

fn describe_failure(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::Http(e) if is_transient_network_error(e) => "network error",
        GenerationError::Request { status, .. } if *status >= 500 => "server error",
        _ => "error",
    }
}

/// Poll `operation` until it reports completion.
///
/// Each tick sleeps, advances `messages` and reports the new message through
/// `on_message`, then polls exactly once.
///
/// # Errors
///
/// Returns `GenerationError::PollFailed` when the policy's failure cap is
/// reached, `GenerationError::Timeout` when its deadline passes, and any
/// non-transient error from the service unchanged.
pub async fn poll_until_done<S, F>(
    service: &S,
    operation: Operation,
    policy: &PollPolicy,
    messages: &mut LoadingMessages,
    on_message: &mut F,
) -> Result<Operation, GenerationError>
where
    S: VideoService,
    F: FnMut(&str),
{
    let start = Instant::now();
    let mut operation = operation;
    let mut failures = 0u32;
    let mut polls = 0u32;

    while PollState::of(&operation) == PollState::InProgress {
        if let Some(timeout) = policy.timeout {
            if start.elapsed() >= timeout {
                log::error!("Generation timed out after {:?}", timeout);
                return Err(GenerationError::Timeout);
            }
        }

        tokio::time::sleep(policy.next_delay(failures)).await;
        on_message(messages.advance());

        polls += 1;
        match service.poll(&operation).await {
            Ok(updated) => {
                failures = 0;
                operation = updated;
                log::debug!("Poll {}: done = {}", polls, operation.done);
            }
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                failures += 1;
                log::warn!(
                    "Polling failed ({}, {} in a row), retrying: {}",
                    describe_failure(&e),
                    failures,
                    e
                );
                if let Some(max) = policy.max_consecutive_failures {
                    if failures >= max {
                        log::error!("Giving up after {} consecutive poll failures", failures);
                        return Err(GenerationError::PollFailed {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    log::info!("Generation complete after {} polls", polls);
    Ok(operation)
}
