#![warn(missing_docs)]
//! This module defines the messages exchanged by ring nodes.
//! Most of the messages follow the Ping/Pong pattern, where there is a one-to-one correspondence between them,
//! such as xxxSend and xxxReport messages.

use serde::Deserialize;
use serde::Serialize;

use crate::dht::NodeInfo;
use crate::dht::RingId;

/// Ask the ring for the node responsible for `target`.
/// Forwarded hop by hop, the answer goes straight back to `source`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LookupSend {
    /// id being looked up
    pub target: RingId,
    /// node waiting for the answer
    pub source: NodeInfo,
    /// nodes that forwarded this lookup, in order
    pub visited: Vec<NodeInfo>,
}

/// Sent by the responsible node to the source of a lookup.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResponsibleReport {
    /// id that was looked up
    pub target: RingId,
}

/// The sender proposes itself as predecessor of the receiver.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StabilizeSend;

/// Answer of [StabilizeSend] carrying the receiver's predecessor after the proposal.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PredecessorReport {
    /// The predecessor of the reporting node.
    pub predecessor: Option<NodeInfo>,
}

/// Liveness probe sent to the predecessor.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct KeepAliveSend;

/// Answer of [KeepAliveSend].
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct IsAliveReport;

/// A collection of all messages of the ring protocol.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Message {
    /// Lookup request, see [LookupSend].
    LookupSend(LookupSend),
    /// Lookup answer, see [ResponsibleReport].
    ResponsibleReport(ResponsibleReport),
    /// Stabilize request, see [StabilizeSend].
    StabilizeSend(StabilizeSend),
    /// Stabilize answer, see [PredecessorReport].
    PredecessorReport(PredecessorReport),
    /// Liveness request, see [KeepAliveSend].
    KeepAliveSend(KeepAliveSend),
    /// Liveness answer, see [IsAliveReport].
    IsAliveReport(IsAliveReport),
}

/// Kind tag of a [Message].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[allow(missing_docs)]
    Lookup,
    #[allow(missing_docs)]
    Responsible,
    #[allow(missing_docs)]
    Stabilize,
    #[allow(missing_docs)]
    Predecessor,
    #[allow(missing_docs)]
    KeepAlive,
    #[allow(missing_docs)]
    IsAlive,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            MessageKind::Lookup => "LOOKUP",
            MessageKind::Responsible => "RESPONSIBLE",
            MessageKind::Stabilize => "STABILIZE",
            MessageKind::Predecessor => "PREDECESSOR",
            MessageKind::KeepAlive => "KEEPALIVE",
            MessageKind::IsAlive => "ISALIVE",
        };
        write!(f, "{s}")
    }
}

/// Key used by dispatch to match a message with the subscriptions waiting for it.
/// Lookup answers are keyed by kind and target, every other message by kind alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    /// kind of the message
    pub kind: MessageKind,
    /// target id for lookup class messages
    pub target: Option<RingId>,
}

impl CorrelationKey {
    /// Key matching every message of `kind`.
    pub fn kind(kind: MessageKind) -> Self {
        Self { kind, target: None }
    }

    /// Key of the answer to a lookup of `target`.
    pub fn responsible(target: RingId) -> Self {
        Self {
            kind: MessageKind::Responsible,
            target: Some(target),
        }
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.target {
            Some(target) => write!(f, "{}({})", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Message {
    /// Kind tag of the message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::LookupSend(_) => MessageKind::Lookup,
            Message::ResponsibleReport(_) => MessageKind::Responsible,
            Message::StabilizeSend(_) => MessageKind::Stabilize,
            Message::PredecessorReport(_) => MessageKind::Predecessor,
            Message::KeepAliveSend(_) => MessageKind::KeepAlive,
            Message::IsAliveReport(_) => MessageKind::IsAlive,
        }
    }

    /// The key dispatch files this message under.
    pub fn correlation_key(&self) -> CorrelationKey {
        match self {
            Message::ResponsibleReport(report) => CorrelationKey::responsible(report.target),
            _ => CorrelationKey::kind(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::IdSpace;

    #[test]
    fn test_correlation_keys() {
        let space = IdSpace::new(8).unwrap();
        let target = space.id(100).unwrap();
        let source = NodeInfo::with_id(space.id(10).unwrap(), "127.0.0.1:1".parse().unwrap());

        let lookup = Message::LookupSend(LookupSend {
            target,
            source,
            visited: vec![],
        });
        assert_eq!(lookup.correlation_key(), CorrelationKey::kind(MessageKind::Lookup));

        let report = Message::ResponsibleReport(ResponsibleReport { target });
        assert_eq!(report.correlation_key(), CorrelationKey::responsible(target));
        assert_ne!(
            report.correlation_key(),
            CorrelationKey::responsible(space.id(101).unwrap())
        );
        assert_eq!(report.correlation_key().to_string(), "RESPONSIBLE(100)");

        assert_eq!(
            Message::IsAliveReport(IsAliveReport).correlation_key(),
            CorrelationKey::kind(MessageKind::IsAlive)
        );
    }
}
