//! Fan-out of one send attempt across brokers
//!
//! [`BrokerBatches`] keeps one [`MessageGroup`] per leader broker. The caller
//! resolves the partition and its leader, then adds the message here; groups
//! are created on first use and iterated in first-seen broker order. Groups
//! share no state, so they can be built and sent in parallel.

use crate::{DeliveryReport, MessageGroup, ProducerMessage};
use rivven_protocol::ProduceResponse;
use std::collections::HashMap;

/// Per-broker message groups for a single send attempt
#[derive(Debug, Clone, Default)]
pub struct BrokerBatches {
    groups: Vec<MessageGroup>,
    index: HashMap<String, usize>,
}

impl BrokerBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a message to the group for `broker_id`
    pub fn add(&mut self, broker_id: &str, message: ProducerMessage, partition: u32) {
        let slot = match self.index.get(broker_id) {
            Some(&slot) => slot,
            None => {
                self.groups.push(MessageGroup::new(broker_id));
                let slot = self.groups.len() - 1;
                self.index.insert(broker_id.to_string(), slot);
                slot
            }
        };
        self.groups[slot].add(message, partition);
    }

    pub fn group(&self, broker_id: &str) -> Option<&MessageGroup> {
        self.index.get(broker_id).map(|&slot| &self.groups[slot])
    }

    /// Groups in first-seen broker order
    pub fn groups(&self) -> &[MessageGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<MessageGroup> {
        self.groups
    }

    /// Number of brokers with at least one message
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total messages across all brokers
    pub fn message_count(&self) -> usize {
        self.groups.iter().map(MessageGroup::len).sum()
    }

    /// Classify every group that received a response
    ///
    /// Groups without a response (cancelled or failed sends) are skipped;
    /// their messages are neither settled nor retried here.
    pub fn classify_all<'a>(
        &'a self,
        responses: &HashMap<String, ProduceResponse>,
    ) -> Vec<DeliveryReport<'a>> {
        self.groups
            .iter()
            .filter_map(|group| {
                responses
                    .get(group.broker_id())
                    .map(|response| group.classify(response))
            })
            .collect()
    }

    /// Every message to resend, across brokers in first-seen broker order
    ///
    /// Within a broker the order follows [`DeliveryReport::retry`]. Groups
    /// without a response contribute nothing.
    pub fn retry_messages(
        &self,
        responses: &HashMap<String, ProduceResponse>,
    ) -> Vec<ProducerMessage> {
        self.classify_all(responses)
            .iter()
            .flat_map(|report| report.retry_owned())
            .collect()
    }
}
