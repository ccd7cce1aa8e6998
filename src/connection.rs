//! Connection lifecycle.
//!
//! Each session runs in one tokio task that owns the transport and the
//! current snapshot. Inbound frames, dispatch commands and the shutdown
//! signal are processed strictly one at a time, so the snapshot needs no
//! lock. Collaborators hold a [`SessionHandle`] to observe snapshots and
//! dispatch; dropping or closing the handle tears the session down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ConfigError, DispatchError, SessionError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::action::Action;
use crate::state::machine::Snapshot;
use crate::state::session::SessionRequest;
use crate::transport::{Connector, Transport, WsConnector};

type Reply = oneshot::Sender<Result<(), DispatchError>>;

/// A dispatch queued for the session task.
#[derive(Debug)]
enum Command {
    Act { action: Action, reply: Reply },
    StartRound { reply: Reply },
}

/// Publishes snapshots, refusing everything after the first terminal one.
struct Publisher {
    tx: watch::Sender<Snapshot>,
    current: Snapshot,
}

impl Publisher {
    fn new(tx: watch::Sender<Snapshot>) -> Self {
        Self {
            tx,
            current: Snapshot::Loading,
        }
    }

    fn current(&self) -> &Snapshot {
        &self.current
    }

    fn is_sealed(&self) -> bool {
        self.current.is_terminal()
    }

    fn publish(&mut self, snapshot: Snapshot) {
        if self.is_sealed() {
            trace!(kind = snapshot.kind(), "dropping snapshot after terminal state");
            return;
        }
        debug!(from = self.current.kind(), to = snapshot.kind(), "publishing snapshot");
        self.current = snapshot.clone();
        self.tx.send_replace(snapshot);
    }

    /// Publish the outcome of a transition, if any.
    fn apply(&mut self, next: Option<Snapshot>) {
        if let Some(next) = next {
            self.publish(next);
        }
    }

    fn fail(&mut self, err: &SessionError) {
        let next = self.current.fail(err);
        self.apply(next);
    }
}

/// Run one session to completion.
async fn session_task<C: Connector>(
    connector: Arc<C>,
    url: Url,
    request: SessionRequest,
    mut cmd_rx: mpsc::Receiver<Command>,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut publisher: Publisher,
) {
    debug!(%url, session = %request.kind, "session task started");

    let connected = tokio::select! {
        biased;
        _ = &mut shutdown_rx => None,
        result = connector.connect(&url) => Some(result),
    };

    let mut transport = match connected {
        None => {
            debug!("shutdown before connect completed");
            publisher.publish(Snapshot::Closed { reason: None });
            return;
        }
        Some(Err(err)) => {
            publisher.fail(&err.into());
            return;
        }
        Some(Ok(transport)) => transport,
    };

    let intro = ClientMessage::Intro {
        player_name: request.player_name.clone(),
    };
    match intro.encode() {
        Ok(frame) => {
            if let Err(err) = transport.send(frame).await {
                publisher.fail(&err.into());
            }
        }
        Err(err) => publisher.fail(&err.into()),
    }

    while !publisher.is_sealed() {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                publisher.publish(Snapshot::Closed { reason: None });
            }

            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => on_command(&mut transport, &mut publisher, cmd).await,
                None => {
                    debug!("session handle dropped");
                    publisher.publish(Snapshot::Closed { reason: None });
                }
            },

            incoming = transport.recv() => match incoming {
                Some(Ok(frame)) => on_frame(&mut publisher, &frame),
                Some(Err(err)) => {
                    error!(error = %err, "transport receive error");
                    publisher.fail(&err.into());
                }
                None => {
                    debug!("transport closed by server");
                    let next = publisher.current().on_transport_closed();
                    publisher.apply(next);
                }
            },
        }
    }

    if let Err(err) = transport.close().await {
        warn!(error = %err, "failed to close transport");
    }
    debug!(session = %request.kind, "session task exited");
}

fn on_frame(publisher: &mut Publisher, frame: &str) {
    trace!(len = frame.len(), "received frame");
    match ServerMessage::decode(frame) {
        Ok(msg) => {
            trace!(tag = msg.tag(), "decoded message");
            let next = publisher.current().handle(msg);
            publisher.apply(next);
        }
        Err(err) => {
            warn!(error = %err, "failed to decode server message");
            publisher.fail(&err.into());
        }
    }
}

/// Validate a dispatch, send its frame and publish the resulting snapshot.
///
/// Nothing is sent and nothing is published when validation fails.
async fn on_command<T: Transport>(transport: &mut T, publisher: &mut Publisher, cmd: Command) {
    let (prepared, msg, reply) = match cmd {
        Command::Act { action, reply } => (
            publisher.current().act(&action),
            ClientMessage::Action(action),
            reply,
        ),
        Command::StartRound { reply } => (
            publisher.current().start_round(),
            ClientMessage::StartRound,
            reply,
        ),
    };

    let result = match prepared {
        Ok(next) => match msg.encode() {
            Ok(frame) => match transport.send(frame).await {
                Ok(()) => {
                    publisher.publish(next);
                    Ok(())
                }
                Err(err) => {
                    error!(error = %err, "transport send error");
                    publisher.fail(&err.into());
                    Err(DispatchError::SessionEnded)
                }
            },
            Err(err) => Err(DispatchError::Encode(err.to_string())),
        },
        Err(err) => {
            debug!(error = %err, "dispatch rejected");
            Err(err)
        }
    };

    // The caller may have stopped waiting
    let _ = reply.send(result);
}

/// A live session.
///
/// Dropping the handle signals the session task to close the transport.
/// Use [`SessionHandle::close`] to wait for that to finish.
pub struct SessionHandle {
    request: SessionRequest,
    cmd_tx: mpsc::Sender<Command>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    snapshots: watch::Receiver<Snapshot>,
    task: Option<JoinHandle<()>>,
    close_timeout: Duration,
}

impl SessionHandle {
    /// Start a session. Must be called inside a tokio runtime.
    pub fn open<C: Connector>(
        config: &ClientConfig,
        connector: Arc<C>,
        request: SessionRequest,
    ) -> Result<Self, ConfigError> {
        let url = config.request_url(&request)?;
        info!(%url, session = %request.kind, player = %request.player_name, "opening session");

        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (snapshot_tx, snapshots) = watch::channel(Snapshot::Loading);

        let task = tokio::spawn(session_task(
            connector,
            url,
            request.clone(),
            cmd_rx,
            shutdown_rx,
            Publisher::new(snapshot_tx),
        ));

        Ok(Self {
            request,
            cmd_tx,
            shutdown_tx: Some(shutdown_tx),
            snapshots,
            task: Some(task),
            close_timeout: config.close_timeout,
        })
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Dispatch a player action.
    pub async fn act(&self, action: Action) -> Result<(), DispatchError> {
        self.dispatch(|reply| Command::Act { action, reply }).await
    }

    /// Ask the server to start a round.
    pub async fn start_round(&self) -> Result<(), DispatchError> {
        self.dispatch(|reply| Command::StartRound { reply }).await
    }

    async fn dispatch(&self, command: impl FnOnce(Reply) -> Command) -> Result<(), DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(command(reply))
            .await
            .map_err(|_| DispatchError::SessionEnded)?;
        rx.await.map_err(|_| DispatchError::SessionEnded)?
    }

    /// Whether the session task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Tear the session down and wait for the transport to close.
    ///
    /// Calling it again is a no-op.
    pub async fn close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            debug!(session = %self.request.kind, "closing session");
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.close_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("session task terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("session task did not exit within timeout; aborting");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("session task aborted: {join_err}");
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("request", &self.request)
            .field("snapshot", &self.snapshots.borrow().kind())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // The task keeps running on the runtime and closes the transport itself
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Keeps at most one session open, following the caller's current request.
pub struct SessionClient<C: Connector = WsConnector> {
    config: ClientConfig,
    connector: Arc<C>,
    current: Option<SessionHandle>,
}

impl SessionClient<WsConnector> {
    pub fn websocket(config: ClientConfig) -> Self {
        Self::new(config, WsConnector)
    }
}

impl<C: Connector> SessionClient<C> {
    pub fn new(config: ClientConfig, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
            current: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Follow a request.
    ///
    /// An equal request keeps the running session. Any other request tears
    /// the running session down before a new one is opened.
    pub async fn request(
        &mut self,
        request: SessionRequest,
    ) -> Result<&SessionHandle, ConfigError> {
        match self.current.take() {
            Some(handle) if handle.request() == &request => {
                let handle: &SessionHandle = self.current.insert(handle);
                Ok(handle)
            }
            previous => {
                if let Some(mut old) = previous {
                    debug!(from = %old.request().kind, to = %request.kind, "request changed");
                    old.close().await;
                }
                let handle =
                    SessionHandle::open(&self.config, Arc::clone(&self.connector), request)?;
                let handle: &SessionHandle = self.current.insert(handle);
                Ok(handle)
            }
        }
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Tear down the running session, if any.
    pub async fn discard(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::protocol::Mode;
    use crate::state::session::{Player, SessionInfo};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    type Script = Vec<Option<Result<String, TransportError>>>;

    /// Records sent frames and replays scripted inbound frames.
    struct MockTransport {
        incoming: VecDeque<Option<Result<String, TransportError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closes: Arc<AtomicUsize>,
        fail_sends: bool,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, frame: String) -> Result<(), TransportError> {
            if self.fail_sends && !self.sent.lock().unwrap().is_empty() {
                return Err(TransportError::Closed);
            }
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            match self.incoming.pop_front() {
                Some(item) => item,
                // Script exhausted, stay open until shutdown
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Hands out scripted transports in order and records the urls used.
    #[derive(Default)]
    struct MockConnector {
        scripts: StdMutex<VecDeque<Script>>,
        urls: Arc<StdMutex<Vec<String>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closes: Arc<AtomicUsize>,
        fail_sends: bool,
    }

    impl MockConnector {
        fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: StdMutex::new(scripts.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Transport = MockTransport;

        async fn connect(&self, url: &Url) -> Result<MockTransport, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(TransportError::Closed)?;
            Ok(MockTransport {
                incoming: script.into(),
                sent: Arc::clone(&self.sent),
                closes: Arc::clone(&self.closes),
                fail_sends: self.fail_sends,
            })
        }
    }

    fn frame(json: &str) -> Option<Result<String, TransportError>> {
        Some(Ok(json.to_string()))
    }

    const INTRO: &str = r#"{"type": "intro", "player-id": 0, "game-id": 7,
        "join-mode": {"status": "open"}, "start-mode": {"status": "open"},
        "players": [{"player-id": 0, "player-name": "jed"}]}"#;

    const START_ROUND: &str = r#"{"type": "start-round"}"#;

    const DEAL: &str = r#"{"type": "gract-list", "gract-list": [
        {"type": "show-type", "type-id": 1, "type-name": "Fire", "type-desc": "", "type-url": ""},
        {"type": "show-coll", "coll-id": 10, "coll-display": "hand", "player-id": 0},
        {"type": "show-coll", "coll-id": 20, "coll-display": "spread", "player-id": null},
        {"type": "show-card", "card-id": 100, "type-id": 1, "coll-id": 10},
        {"type": "possible-actions", "possible-actions": [
            {"type": "next"},
            {"type": "select-coll", "coll-ids": [20]},
            {"type": "select", "card-ids": [100]}
        ]}
    ]}"#;

    fn config() -> ClientConfig {
        ClientConfig::new("ws://localhost:8000").unwrap()
    }

    fn open(connector: &Arc<MockConnector>) -> SessionHandle {
        SessionHandle::open(
            &config(),
            Arc::clone(connector),
            SessionRequest::join(7, "jed"),
        )
        .unwrap()
    }

    async fn wait_for(
        rx: &mut watch::Receiver<Snapshot>,
        f: impl FnMut(&Snapshot) -> bool,
    ) -> Snapshot {
        rx.wait_for(f).await.unwrap().clone()
    }

    fn sent_json(connector: &MockConnector) -> Vec<serde_json::Value> {
        connector
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_intro_sent_first() {
        let connector = Arc::new(MockConnector::new(vec![vec![frame(INTRO)]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.kind() == "waiting").await;
        assert_eq!(snapshot.info().unwrap().game_id, 7);

        assert_eq!(
            connector.urls.lock().unwrap().clone(),
            vec!["ws://localhost:8000/join/7".to_string()]
        );
        assert_eq!(
            sent_json(&connector),
            vec![serde_json::json!({"type": "intro", "player-name": "jed"})]
        );

        handle.close().await;
        assert_eq!(handle.snapshot(), Snapshot::Closed { reason: None });
    }

    #[tokio::test]
    async fn test_server_error_during_loading_is_invalid() {
        let connector = Arc::new(MockConnector::new(vec![vec![frame(
            r#"{"type": "error", "reason": "game does not exist"}"#,
        )]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(
            snapshot,
            Snapshot::Invalid {
                reason: "game does not exist".to_string()
            }
        );

        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        // Terminal snapshot is never replaced
        assert_eq!(handle.snapshot().kind(), "invalid");
    }

    #[tokio::test]
    async fn test_malformed_frame_closes_session() {
        let connector = Arc::new(MockConnector::new(vec![vec![
            frame(INTRO),
            frame("{not json"),
            frame(START_ROUND),
        ]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(snapshot, Snapshot::Closed { reason: None });

        handle.close().await;
        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_server_close_ends_session() {
        let connector = Arc::new(MockConnector::new(vec![vec![frame(INTRO), None]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(snapshot, Snapshot::Closed { reason: None });

        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_closes_session() {
        let connector = Arc::new(MockConnector::new(Vec::new()));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(snapshot, Snapshot::Closed { reason: None });
        assert_eq!(
            handle.act(Action::Next).await,
            Err(DispatchError::SessionEnded)
        );

        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_end_game_reason() {
        let connector = Arc::new(MockConnector::new(vec![vec![
            frame(INTRO),
            frame(r#"{"type": "end-game", "reason": "host left"}"#),
        ]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(
            snapshot,
            Snapshot::Closed {
                reason: Some("host left".to_string())
            }
        );
        handle.close().await;
    }

    #[tokio::test]
    async fn test_end_game_while_playing() {
        let connector = Arc::new(MockConnector::new(vec![vec![
            frame(INTRO),
            frame(START_ROUND),
            frame(DEAL),
            frame(r#"{"type": "end-game", "reason": "jed won"}"#),
            frame(INTRO),
        ]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(
            snapshot,
            Snapshot::Closed {
                reason: Some("jed won".to_string())
            }
        );

        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        assert_eq!(handle.snapshot(), snapshot);
    }

    #[test]
    fn test_publisher_seals_after_terminal() {
        let (tx, rx) = watch::channel(Snapshot::Loading);
        let mut publisher = Publisher::new(tx);

        publisher.publish(Snapshot::Closed {
            reason: Some("host left".to_string()),
        });
        assert!(publisher.is_sealed());

        publisher.publish(Snapshot::Waiting {
            info: Arc::new(SessionInfo::new(0, 7, Mode::Open, Mode::Open, Vec::<Player>::new())),
            reason: None,
            error: None,
        });
        publisher.fail(&SessionError::UnexpectedMessage {
            state: "closed",
            tag: "intro",
        });

        let expected = Snapshot::Closed {
            reason: Some("host left".to_string()),
        };
        assert_eq!(*rx.borrow(), expected);
        assert_eq!(publisher.current(), &expected);
    }

    #[tokio::test]
    async fn test_rejected_dispatch_sends_nothing() {
        let connector = Arc::new(MockConnector::new(vec![vec![
            frame(INTRO),
            frame(START_ROUND),
            frame(DEAL),
        ]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        let before = wait_for(&mut rx, |s| s.round().is_some_and(|r| r.revision == 1)).await;

        assert_eq!(
            handle.act(Action::SelectColl { coll_id: 10 }).await,
            Err(DispatchError::CollectionNotSelectable(10))
        );
        assert_eq!(sent_json(&connector).len(), 1);
        assert_eq!(handle.snapshot(), before);

        handle.close().await;
    }

    #[tokio::test]
    async fn test_accepted_dispatch_clears_markers() {
        let connector = Arc::new(MockConnector::new(vec![vec![
            frame(INTRO),
            frame(START_ROUND),
            frame(DEAL),
        ]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.round().is_some_and(|r| r.revision == 1)).await;

        assert_eq!(handle.act(Action::SelectColl { coll_id: 20 }).await, Ok(()));
        let sent = sent_json(&connector);
        assert_eq!(
            sent[1],
            serde_json::json!({"type": "action", "action-type": "select-coll", "coll-id": 20})
        );

        let snapshot = handle.snapshot();
        let round = snapshot.round().unwrap();
        assert!(!round.has_affordances());
        assert_eq!(round.card_count(), 1);

        // Markers are gone, so a repeat is rejected locally
        assert_eq!(
            handle.act(Action::Next).await,
            Err(DispatchError::NotNextable)
        );
        assert_eq!(sent_json(&connector).len(), 2);

        handle.close().await;
    }

    #[tokio::test]
    async fn test_start_round_dispatch() {
        let connector = Arc::new(MockConnector::new(vec![vec![frame(INTRO)]]));
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.kind() == "waiting").await;
        assert_eq!(handle.start_round().await, Ok(()));
        assert_eq!(handle.snapshot().kind(), "starting");
        assert_eq!(
            sent_json(&connector)[1],
            serde_json::json!({"type": "start-round"})
        );

        handle.close().await;
    }

    #[tokio::test]
    async fn test_failed_send_closes_session() {
        let connector = Arc::new(MockConnector {
            fail_sends: true,
            ..MockConnector::new(vec![vec![frame(INTRO)]])
        });
        let mut handle = open(&connector);
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.kind() == "waiting").await;
        assert_eq!(
            handle.start_round().await,
            Err(DispatchError::SessionEnded)
        );
        assert_eq!(handle.snapshot(), Snapshot::Closed { reason: None });

        handle.close().await;
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_closes_transport() {
        let connector = Arc::new(MockConnector::new(vec![vec![frame(INTRO)]]));
        let handle = open(&connector);
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| s.kind() == "waiting").await;
        drop(handle);

        let snapshot = wait_for(&mut rx, |s| s.is_terminal()).await;
        assert_eq!(snapshot, Snapshot::Closed { reason: None });
        // Sender is dropped once the task exits
        while rx.changed().await.is_ok() {}
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_change_replaces_session() {
        let connector = MockConnector::new(vec![vec![frame(INTRO)], vec![frame(INTRO)]]);
        let urls = Arc::clone(&connector.urls);
        let closes = Arc::clone(&connector.closes);
        let mut client = SessionClient::new(config(), connector);

        let mut rx = client
            .request(SessionRequest::join(7, "jed"))
            .await
            .unwrap()
            .subscribe();
        wait_for(&mut rx, |s| s.kind() == "waiting").await;

        // Same request keeps the session
        client.request(SessionRequest::join(7, "jed")).await.unwrap();
        assert_eq!(urls.lock().unwrap().len(), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        let mut next = client
            .request(SessionRequest::create("rummy", "jed"))
            .await
            .unwrap()
            .subscribe();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(rx.borrow().clone(), Snapshot::Closed { reason: None });

        wait_for(&mut next, |s| s.kind() == "waiting").await;
        assert_eq!(
            urls.lock().unwrap().clone(),
            vec![
                "ws://localhost:8000/join/7".to_string(),
                "ws://localhost:8000/create/rummy".to_string()
            ]
        );

        client.discard().await;
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert!(client.session().is_none());
    }
}
