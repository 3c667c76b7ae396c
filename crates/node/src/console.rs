//! Commands accepted on stdin by a running node.
use std::str::FromStr;

use chordnet_core::dht::RingId;
use chordnet_core::swarm::ChordNode;

use crate::error::Error;
use crate::error::Result;

pub const HELP: &str = "commands:
  lookup <id>    find the node responsible for a ring id (decimal or 0x hex)
  key <text>     hash text into the ring and find the node responsible for it
  inspect        print this node's view of the ring as JSON
  help           print this message
  quit           shut the node down";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Lookup(RingId),
    Key(String),
    Inspect,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };
        match (cmd, arg) {
            ("lookup", "") => Err(Error::InvalidRingId(String::new())),
            ("lookup", id) => id
                .parse()
                .map(ConsoleCommand::Lookup)
                .map_err(|_| Error::InvalidRingId(id.to_string())),
            ("key", key) => Ok(ConsoleCommand::Key(key.to_string())),
            ("inspect", "") => Ok(ConsoleCommand::Inspect),
            ("help", "") => Ok(ConsoleCommand::Help),
            ("quit", "") | ("exit", "") => Ok(ConsoleCommand::Quit),
            _ => Err(Error::UnknownCommand(line.to_string())),
        }
    }
}

/// Run `cmd` against `node` and render the answer.
pub async fn execute(node: &ChordNode, cmd: &ConsoleCommand) -> Result<String> {
    let space = node.dht().space;
    let rendered = match cmd {
        ConsoleCommand::Lookup(id) => {
            let target = space.id(id.value())?;
            render_lookup(target, node.lookup(target).await)
        }
        ConsoleCommand::Key(key) => {
            let target = space.hash_bytes(key.as_bytes());
            render_lookup(target, node.lookup(target).await)
        }
        ConsoleCommand::Inspect => serde_json::to_string_pretty(&node.inspect())
            .map_err(|e| Error::EncodeError(e.to_string()))?,
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => String::new(),
    };
    Ok(rendered)
}

fn render_lookup(target: RingId, found: Option<chordnet_core::dht::NodeInfo>) -> String {
    match found {
        Some(node) => format!("{target} -> {node}"),
        None => format!("{target} -> not found"),
    }
}

#[cfg(test)]
mod tests {
    use chordnet_core::config::ProtocolConfig;
    use chordnet_core::swarm::ChordNodeBuilder;

    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "lookup 42".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Lookup("42".parse().unwrap())
        );
        assert_eq!(
            "  lookup   0xff ".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Lookup("255".parse().unwrap())
        );
        assert_eq!(
            "key hello world".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Key("hello world".to_string())
        );
        assert_eq!(
            "inspect".parse::<ConsoleCommand>().unwrap(),
            ConsoleCommand::Inspect
        );
        assert_eq!("exit".parse::<ConsoleCommand>().unwrap(), ConsoleCommand::Quit);
        assert!(matches!(
            "lookup".parse::<ConsoleCommand>(),
            Err(Error::InvalidRingId(_))
        ));
        assert!(matches!(
            "lookup abc".parse::<ConsoleCommand>(),
            Err(Error::InvalidRingId(_))
        ));
        assert!(matches!(
            "join 1.2.3.4:5".parse::<ConsoleCommand>(),
            Err(Error::UnknownCommand(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_on_single_node() {
        let config = ProtocolConfig {
            ring_bits: 8,
            ..Default::default()
        };
        let node = ChordNodeBuilder::new("127.0.0.1:0".parse().unwrap())
            .config(config)
            .id(10)
            .build()
            .await
            .unwrap();
        node.create_ring().unwrap();

        let out = execute(&node, &"lookup 200".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(out, format!("200 -> {}", node.me()));

        // 300 does not fit in an 8 bit ring.
        assert!(execute(&node, &"lookup 300".parse().unwrap())
            .await
            .is_err());

        let out = execute(&node, &ConsoleCommand::Inspect).await.unwrap();
        assert!(out.contains(&node.me().endpoint.to_string()));
        node.shutdown().await;
    }
}
