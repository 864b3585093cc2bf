//! Property-based tests for grouping and classification invariants
//!
//! Random add sequences and random broker responses must never lose,
//! duplicate or reorder messages.

use proptest::prelude::*;
use rivven_client::{ErrorCode, MessageGroup, NoCompression, ProduceResponse, ProducerMessage};

const TOPICS: [&str; 3] = ["a", "b", "c"];

prop_compose! {
    fn arbitrary_adds(max_len: usize)(
        adds in prop::collection::vec((0usize..TOPICS.len(), 0u32..4), 0..max_len)
    ) -> Vec<(usize, u32)> {
        adds
    }
}

prop_compose! {
    fn arbitrary_response()(
        entries in prop::collection::vec(
            (0usize..TOPICS.len() + 1, 0u32..5, prop::sample::select(vec![0i16, 5, 6, 19, 7, 20, 1234])),
            0..12,
        )
    ) -> ProduceResponse {
        entries.into_iter().fold(ProduceResponse::new(), |response, (topic, partition, code)| {
            let topic = TOPICS.get(topic).copied().unwrap_or("unknown");
            response.with_partition(topic, partition, ErrorCode::from_code(code))
        })
    }
}

/// Messages carry their add index as payload so identity survives cloning
fn build_group(adds: &[(usize, u32)]) -> MessageGroup {
    let mut group = MessageGroup::new("broker-0");
    for (i, (topic, partition)) in adds.iter().enumerate() {
        group.add(ProducerMessage::new(TOPICS[*topic], i.to_string()), *partition);
    }
    group
}

fn index_of(message: &ProducerMessage) -> usize {
    std::str::from_utf8(&message.value).unwrap().parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn test_settled_and_retry_partition_the_input(
        adds in arbitrary_adds(40),
        response in arbitrary_response(),
    ) {
        let group = build_group(&adds);
        let report = group.classify(&response);

        let settled: Vec<usize> = report.settled().into_iter().map(index_of).collect();
        let retry: Vec<usize> = report.retry().into_iter().map(index_of).collect();

        // settled keeps global order
        prop_assert!(settled.windows(2).all(|w| w[0] < w[1]));

        let mut all: Vec<usize> = settled.iter().chain(retry.iter()).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..adds.len()).collect::<Vec<_>>());

        // delivered + failed == settled
        prop_assert_eq!(
            report.delivered().len() + report.failed().len(),
            settled.len()
        );
    }

    #[test]
    fn test_retry_only_for_retriable_buckets(
        adds in arbitrary_adds(40),
        response in arbitrary_response(),
    ) {
        let group = build_group(&adds);
        let report = group.classify(&response);

        for message in report.retry() {
            let partition = adds[index_of(message)].1;
            let retriable = response.entries().any(|(topic, p)| {
                topic == message.topic && p.partition == partition && p.error_code.is_retriable()
            });
            prop_assert!(retriable);
        }

        let error_entries = response.entries().filter(|(_, p)| p.error_code.is_error()).count();
        prop_assert_eq!(report.events().len(), error_entries);
    }

    #[test]
    fn test_wire_batches_cover_every_message_in_order(adds in arbitrary_adds(40)) {
        let group = build_group(&adds);
        let batches = group.build_wire_batches(&NoCompression).unwrap();

        let mut seen = Vec::new();
        for topic in &batches {
            for partition in &topic.partitions {
                prop_assert!(!partition.message_set.is_empty());
                let indices: Vec<usize> = partition
                    .message_set
                    .records()
                    .iter()
                    .map(|r| std::str::from_utf8(&r.value).unwrap().parse().unwrap())
                    .collect();
                prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
                for &i in &indices {
                    prop_assert_eq!(TOPICS[adds[i].0], topic.topic.as_str());
                    prop_assert_eq!(adds[i].1, partition.partition);
                }
                seen.extend(indices);
            }
        }

        seen.sort_unstable();
        prop_assert_eq!(seen, (0..adds.len()).collect::<Vec<_>>());
    }
}
