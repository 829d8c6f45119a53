//! Relay session state machine, free of any socket I/O.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Connecting,
    Relaying,
    Closing,
    Closed,
}

/// Ordering and delivery rules for one realtime session.
///
/// Client messages that arrive while the upstream handshake is in flight are
/// queued and released in arrival order by `upstream_opened`. Upstream
/// messages pass only while the client socket is still open.
#[derive(Debug)]
pub struct RelaySession<M> {
    state: RelayState,
    pending: VecDeque<M>,
    client_open: bool,
}

impl<M> Default for RelaySession<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> RelaySession<M> {
    pub fn new() -> Self {
        Self { state: RelayState::Connecting, pending: VecDeque::new(), client_open: true }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_client_open(&self) -> bool {
        self.client_open
    }

    /// Returns the message when it should go upstream right away.
    pub fn client_message(&mut self, message: M) -> Option<M> {
        match self.state {
            RelayState::Connecting => {
                self.pending.push_back(message);
                None
            },
            RelayState::Relaying => Some(message),
            RelayState::Closing | RelayState::Closed => None,
        }
    }

    /// Handshake finished: switch to relaying and hand back the queue.
    pub fn upstream_opened(&mut self) -> Vec<M> {
        if self.state != RelayState::Connecting {
            return Vec::new();
        }
        self.state = RelayState::Relaying;
        self.pending.drain(..).collect()
    }

    /// Returns the message when the client can still receive it. Upstream
    /// frames are never queued, so their type is independent of `M`.
    pub fn upstream_message<U>(&mut self, message: U) -> Option<U> {
        (self.state == RelayState::Relaying && self.client_open).then_some(message)
    }

    pub fn client_gone(&mut self) {
        self.client_open = false;
        self.begin_close();
    }

    /// Either side is closing; queued messages are discarded.
    pub fn begin_close(&mut self) {
        if self.state != RelayState::Closed {
            self.state = RelayState::Closing;
        }
        self.pending.clear();
    }

    pub fn closed(&mut self) {
        self.state = RelayState::Closed;
        self.client_open = false;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_until_upstream_opens() {
        let mut session = RelaySession::new();
        assert_eq!(session.state(), RelayState::Connecting);
        assert_eq!(session.client_message("a"), None);
        assert_eq!(session.client_message("b"), None);
        assert_eq!(session.pending_len(), 2);

        assert_eq!(session.upstream_opened(), vec!["a", "b"]);
        assert_eq!(session.state(), RelayState::Relaying);
        assert_eq!(session.pending_len(), 0);
        assert_eq!(session.client_message("c"), Some("c"));
    }

    #[test]
    fn test_upstream_opened_only_once() {
        let mut session = RelaySession::new();
        session.client_message(1);
        assert_eq!(session.upstream_opened(), vec![1]);
        assert!(session.upstream_opened().is_empty());
    }

    #[test]
    fn test_upstream_dropped_after_client_gone() {
        let mut session = RelaySession::new();
        session.upstream_opened();
        assert_eq!(session.upstream_message("x"), Some("x"));

        session.client_gone();
        assert_eq!(session.state(), RelayState::Closing);
        assert_eq!(session.upstream_message("y"), None);
        assert_eq!(session.client_message("z"), None);
    }

    #[test]
    fn test_directions_carry_different_frame_types() {
        #[derive(Debug, PartialEq)]
        struct ClientFrame(&'static str);
        #[derive(Debug, PartialEq)]
        struct UpstreamFrame(u8);

        let mut session: RelaySession<ClientFrame> = RelaySession::new();
        assert_eq!(session.client_message(ClientFrame("setup")), None);
        assert_eq!(session.upstream_message(UpstreamFrame(1)), None);
        assert_eq!(session.upstream_opened(), vec![ClientFrame("setup")]);
        assert_eq!(session.upstream_message(UpstreamFrame(2)), Some(UpstreamFrame(2)));
        assert_eq!(session.client_message(ClientFrame("audio")), Some(ClientFrame("audio")));
    }

    #[test]
    fn test_close_discards_pending() {
        let mut session = RelaySession::new();
        session.client_message("queued");
        session.begin_close();
        assert_eq!(session.pending_len(), 0);
        assert!(session.upstream_opened().is_empty());

        session.closed();
        assert_eq!(session.state(), RelayState::Closed);
        assert!(!session.is_client_open());
        session.begin_close();
        assert_eq!(session.state(), RelayState::Closed);
    }
}
