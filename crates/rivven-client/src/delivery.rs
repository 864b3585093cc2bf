//! Classifying a broker's produce response
//!
//! After the broker replies, every message in the [`MessageGroup`] ends up in
//! exactly one state:
//!
//! - **Delivered**: its partition reported no error.
//! - **Retry**: its partition reported `LEADER_NOT_AVAILABLE`,
//!   `NOT_LEADER_FOR_PARTITION` or `NOT_ENOUGH_REPLICAS`. No replica holds
//!   the write, so the message must be added to a fresh group for the
//!   partition's current leader.
//! - **Failed**: any other error. The message is settled (not retried here)
//!   and the error is reported.
//!
//! `settled` is delivered plus failed, in the group's add order.

use crate::{MessageGroup, ProducerMessage};
use rivven_protocol::{ErrorCode, ProduceResponse, RetryPolicy};
use tracing::{error, warn};

/// Final state of one message after a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Delivered,
    Retry(ErrorCode),
    Failed(ErrorCode),
}

impl MessageOutcome {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Retry(_))
    }
}

/// A partition-level error reported by a broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionErrorEvent {
    pub broker_id: String,
    pub topic: String,
    pub partition: u32,
    pub error: ErrorCode,
}

/// Result of classifying a produce response against a [`MessageGroup`]
#[derive(Debug, Clone)]
pub struct DeliveryReport<'a> {
    group: &'a MessageGroup,
    /// One entry per message, aligned with the group's add order
    outcomes: Vec<MessageOutcome>,
    /// Positions to retry, by response entry then bucket order
    retry_order: Vec<usize>,
    events: Vec<PartitionErrorEvent>,
}

impl MessageGroup {
    /// Classify the broker's reply to this group's batches
    ///
    /// Response entries for topics or partitions that were never added are
    /// ignored apart from being reported. Never fails.
    pub fn classify(&self, response: &ProduceResponse) -> DeliveryReport<'_> {
        let mut outcomes = vec![MessageOutcome::Delivered; self.messages.len()];
        let mut retry_order = Vec::new();
        let mut events = Vec::new();

        for (topic, partition) in response.entries() {
            let code = partition.error_code;
            if !code.is_error() {
                continue;
            }

            let policy = code.retry_policy();
            match policy {
                RetryPolicy::Retry => warn!(
                    broker = %self.broker_id(),
                    topic = %topic,
                    partition = partition.partition,
                    error = %code,
                    "Retriable produce error, messages will be resent"
                ),
                _ => error!(
                    broker = %self.broker_id(),
                    topic = %topic,
                    partition = partition.partition,
                    error = %code,
                    "Produce failed, messages will not be retried"
                ),
            }
            events.push(PartitionErrorEvent {
                broker_id: self.broker_id().to_string(),
                topic: topic.to_string(),
                partition: partition.partition,
                error: code,
            });

            let Some(positions) = self.positions(topic, partition.partition) else {
                continue;
            };

            for &position in positions {
                let outcome = &mut outcomes[position];
                match (policy, *outcome) {
                    (RetryPolicy::Retry, MessageOutcome::Retry(_)) => {}
                    (RetryPolicy::Retry, _) => {
                        *outcome = MessageOutcome::Retry(code);
                        retry_order.push(position);
                    }
                    (_, MessageOutcome::Delivered) => *outcome = MessageOutcome::Failed(code),
                    _ => {}
                }
            }
        }

        DeliveryReport {
            group: self,
            outcomes,
            retry_order,
            events,
        }
    }
}

impl<'a> DeliveryReport<'a> {
    pub fn broker_id(&self) -> &'a str {
        self.group.broker_id()
    }

    /// Outcome per message, aligned with [`MessageGroup::messages`]
    pub fn outcomes(&self) -> &[MessageOutcome] {
        &self.outcomes
    }

    /// Messages that need no resend (delivered or terminally failed), in add order
    pub fn settled(&self) -> Vec<&'a ProducerMessage> {
        self.select(|o| o.is_settled())
    }

    /// Messages that must be resent
    pub fn retry(&self) -> Vec<&'a ProducerMessage> {
        let messages = self.group.messages();
        self.retry_order.iter().map(|&i| &messages[i]).collect()
    }

    /// Owned copies of [`retry`](Self::retry) for re-enqueueing
    pub fn retry_owned(&self) -> Vec<ProducerMessage> {
        self.retry().into_iter().cloned().collect()
    }

    /// Messages whose partition reported success, in add order
    pub fn delivered(&self) -> Vec<&'a ProducerMessage> {
        self.select(|o| matches!(o, MessageOutcome::Delivered))
    }

    /// Messages dropped after a non-retriable error, in add order
    pub fn failed(&self) -> Vec<(&'a ProducerMessage, ErrorCode)> {
        let messages = self.group.messages();
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, outcome)| match outcome {
                MessageOutcome::Failed(code) => Some((&messages[i], *code)),
                _ => None,
            })
            .collect()
    }

    /// Partition errors in response order
    pub fn events(&self) -> &[PartitionErrorEvent] {
        &self.events
    }

    pub fn has_retries(&self) -> bool {
        !self.retry_order.is_empty()
    }

    /// True when every message was delivered
    pub fn is_fully_delivered(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, MessageOutcome::Delivered))
    }

    fn select(&self, keep: impl Fn(&MessageOutcome) -> bool) -> Vec<&'a ProducerMessage> {
        self.group
            .messages()
            .iter()
            .zip(&self.outcomes)
            .filter(|(_, outcome)| keep(*outcome))
            .map(|(message, _)| message)
            .collect()
    }
}
