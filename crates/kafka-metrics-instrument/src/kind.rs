use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every instrumentation event the translator recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    ConnectionRequest,
    ConsumerProcessMessage,
    ConsumerProcessBatch,
    ConsumerFetchBatch,
    ConsumerJoinGroup,
    ConsumerSyncGroup,
    ConsumerLeaveGroup,
    ConsumerPauseStatus,
    ProducerProduceMessage,
    ProducerAckMessage,
    ProducerTopicError,
    ProducerBufferOverflow,
    ProducerDeliverMessages,
    AsyncProducerEnqueueMessage,
    AsyncProducerBufferOverflow,
    AsyncProducerDropMessages,
    FetcherLoop,
}

impl EventKind {
    pub const ALL: [EventKind; 17] = [
        EventKind::ConnectionRequest,
        EventKind::ConsumerProcessMessage,
        EventKind::ConsumerProcessBatch,
        EventKind::ConsumerFetchBatch,
        EventKind::ConsumerJoinGroup,
        EventKind::ConsumerSyncGroup,
        EventKind::ConsumerLeaveGroup,
        EventKind::ConsumerPauseStatus,
        EventKind::ProducerProduceMessage,
        EventKind::ProducerAckMessage,
        EventKind::ProducerTopicError,
        EventKind::ProducerBufferOverflow,
        EventKind::ProducerDeliverMessages,
        EventKind::AsyncProducerEnqueueMessage,
        EventKind::AsyncProducerBufferOverflow,
        EventKind::AsyncProducerDropMessages,
        EventKind::FetcherLoop,
    ];

    /// Event name as emitted by the client.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ConnectionRequest => "request.connection",
            EventKind::ConsumerProcessMessage => "process_message.consumer",
            EventKind::ConsumerProcessBatch => "process_batch.consumer",
            EventKind::ConsumerFetchBatch => "fetch_batch.consumer",
            EventKind::ConsumerJoinGroup => "join_group.consumer",
            EventKind::ConsumerSyncGroup => "sync_group.consumer",
            EventKind::ConsumerLeaveGroup => "leave_group.consumer",
            EventKind::ConsumerPauseStatus => "pause_status.consumer",
            EventKind::ProducerProduceMessage => "produce_message.producer",
            EventKind::ProducerAckMessage => "ack_message.producer",
            EventKind::ProducerTopicError => "topic_error.producer",
            EventKind::ProducerBufferOverflow => "buffer_overflow.producer",
            EventKind::ProducerDeliverMessages => "deliver_messages.producer",
            EventKind::AsyncProducerEnqueueMessage => "enqueue_message.async_producer",
            EventKind::AsyncProducerBufferOverflow => "buffer_overflow.async_producer",
            EventKind::AsyncProducerDropMessages => "drop_messages.async_producer",
            EventKind::FetcherLoop => "loop.fetcher",
        }
    }

    /// Client subsystem emitting the event (`consumer`, `producer`, ...).
    pub fn subsystem(&self) -> &'static str {
        self.name()
            .split_once('.')
            .map(|(_, subsystem)| subsystem)
            .unwrap_or_default()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Unrecognized event: {}", s))
    }
}

impl TryFrom<String> for EventKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_round_trip_and_are_unique() {
        let names: HashSet<_> = EventKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), EventKind::ALL.len());

        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!("topic_error.async_producer".parse::<EventKind>().is_err());
        assert!("".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_subsystem() {
        assert_eq!(EventKind::ConnectionRequest.subsystem(), "connection");
        assert_eq!(EventKind::AsyncProducerDropMessages.subsystem(), "async_producer");
        assert_eq!(EventKind::FetcherLoop.subsystem(), "fetcher");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&EventKind::ProducerAckMessage).unwrap();
        assert_eq!(json, "\"ack_message.producer\"");
        let kind: EventKind = serde_json::from_str("\"loop.fetcher\"").unwrap();
        assert_eq!(kind, EventKind::FetcherLoop);
    }
}
