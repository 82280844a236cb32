//! `CollectPings`/`CollectJoins`/`CollectCoapMessages` (SPEC_FULL §6).
//! These watch decoded uart-write text for the node-CLI's own reply
//! lines; the dispatcher has no knowledge of the protocol beyond
//! string matching, consistent with §1 treating the child binary as
//! opaque and MAC/CoAP framing as out of scope.

use threadsim_core::{NodeId, SimTime};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingRecord {
    pub node: NodeId,
    pub at: SimTime,
    pub delay_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinRecord {
    pub node: NodeId,
    pub at: SimTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoapMessageRecord {
    pub node: NodeId,
    pub at: SimTime,
    pub uri: String,
}

#[derive(Debug, Default)]
pub struct Collectors {
    pings_enabled: bool,
    joins_enabled: bool,
    coap_enabled: bool,
    pings: Vec<PingRecord>,
    joins: Vec<JoinRecord>,
    coap: Vec<CoapMessageRecord>,
}

impl Collectors {
    pub fn new() -> Self {
        Collectors::default()
    }

    pub fn set_pings_enabled(&mut self, on: bool) {
        self.pings_enabled = on;
    }

    pub fn set_joins_enabled(&mut self, on: bool) {
        self.joins_enabled = on;
    }

    pub fn set_coap_enabled(&mut self, on: bool) {
        self.coap_enabled = on;
    }

    pub fn pings(&self) -> &[PingRecord] {
        &self.pings
    }

    pub fn joins(&self) -> &[JoinRecord] {
        &self.joins
    }

    pub fn coap_messages(&self) -> &[CoapMessageRecord] {
        &self.coap
    }

    pub fn clear(&mut self) {
        self.pings.clear();
        self.joins.clear();
        self.coap.clear();
    }

    /// Feeds one decoded uart-write line, extracting a collector record
    /// if it matches a recognized reply shape.
    pub fn observe_uart_line(&mut self, node: NodeId, line: &str, at: SimTime) {
        if self.pings_enabled {
            if let Some(delay_us) = parse_ping_reply_delay_us(line) {
                self.pings.push(PingRecord { node, at, delay_us });
            }
        }
        if self.joins_enabled && line.contains("Join success") {
            self.joins.push(JoinRecord { node, at });
        }
        if self.coap_enabled {
            if let Some(uri) = parse_coap_uri(line) {
                self.coap.push(CoapMessageRecord { node, at, uri });
            }
        }
    }
}

/// Parses `"... time=<N>ms"` out of an OpenThread-style ping reply line.
fn parse_ping_reply_delay_us(line: &str) -> Option<u64> {
    if !line.contains("bytes from") {
        return None;
    }
    let idx = line.find("time=")?;
    let rest = &line[idx + "time=".len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let ms: u64 = digits.parse().ok()?;
    Some(ms * 1_000)
}

fn parse_coap_uri(line: &str) -> Option<String> {
    let rest = line.strip_prefix("coap ")?;
    Some(rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ping_reply_delay() {
        let line = "16 bytes from fdde:ad00:beef::1: icmp_seq=1 hlim=64 time=7ms";
        assert_eq!(parse_ping_reply_delay_us(line), Some(7_000));
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert_eq!(parse_ping_reply_delay_us("> ping fdde:ad00:beef::1"), None);
    }

    #[test]
    fn collects_enabled_pings_only() {
        let mut c = Collectors::new();
        c.observe_uart_line(NodeId(1), "16 bytes from x: time=3ms", SimTime(0));
        assert!(c.pings().is_empty());
        c.set_pings_enabled(true);
        c.observe_uart_line(NodeId(1), "16 bytes from x: time=3ms", SimTime(0));
        assert_eq!(c.pings().len(), 1);
        assert_eq!(c.pings()[0].delay_us, 3_000);
    }
}
