use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::dht::NodeInfo;
use crate::error::Error;
use crate::error::Result;
use crate::message::types::CorrelationKey;
use crate::message::types::Message;

/// `MessagePayload` is used to transmit data between nodes.
/// The sender is attached on construction, receivers use it as the reply target.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    /// Node that created the payload.
    pub sender: NodeInfo,
    /// The message itself.
    pub message: Message,
}

impl MessagePayload {
    /// Wrap a message sent by `sender`.
    pub fn new(sender: NodeInfo, message: Message) -> Self {
        Self { sender, message }
    }

    /// Key dispatch uses to route this payload.
    pub fn correlation_key(&self) -> CorrelationKey {
        self.message.correlation_key()
    }

    /// Deserializes a `MessagePayload` instance from the given binary data.
    pub fn from_bincode(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(Error::BincodeDeserialize)
    }

    /// Serializes the `MessagePayload` instance into binary data.
    pub fn to_bincode(&self) -> Result<Bytes> {
        bincode::serialize(self)
            .map(Bytes::from)
            .map_err(Error::BincodeSerialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::IdSpace;
    use crate::message::PredecessorReport;

    #[test]
    fn test_garbage_is_rejected() {
        assert!(MessagePayload::from_bincode(&[0xff, 0xff, 0xff, 0xff, 0x01]).is_err());
    }

    #[test]
    fn test_decode_payload() {
        let space = IdSpace::new(8).unwrap();
        let sender = NodeInfo::new(&space, "127.0.0.1:4000".parse().unwrap());
        let payload = MessagePayload::new(
            sender,
            Message::PredecessorReport(PredecessorReport {
                predecessor: Some(sender),
            }),
        );
        let data = payload.to_bincode().unwrap();
        assert_eq!(MessagePayload::from_bincode(&data).unwrap(), payload);
    }
}
