// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::{EnvisalinkError, Result};
use crate::event::{
    action_channel, event_channel, ActionReceiver, ActionRequest, EventSender, SessionEvent,
    SessionHandle, StateChange,
};
use crate::format::format_message;
use crate::protocol::{Command, RawLine};
use crate::registry::{describe, EventKind, HandlerTag, ResponseDescriptor};
use crate::transport::{CommandSender, LineFramer};

/// Connection lifecycle phase.
///
/// Transitions only move forward through the handshake or fall back to
/// `Disconnected`; any transport failure or close forces `Disconnected`
/// before a new `Connecting` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    AwaitingLogin,
    Authenticated,
}

/// A single panel session: one connection, one login, one line pipeline.
///
/// The session owns its configuration view, its connection and its event
/// channel endpoints; nothing is shared globally, so independent sessions
/// can coexist in one process.
///
/// # Example
///
/// ```no_run
/// use envisalink_bridge::{ActionRequest, Session, SessionConfig, SessionEvent};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = SessionConfig::builder()
///         .host("192.168.0.99")
///         .password("user")
///         .partition_name(1, "Home")
///         .zone_name(1, "Front Door")
///         .build();
///
///     let (session, handle) = Session::new(config);
///     let mut events = handle.subscribe();
///     tokio::spawn(session.run());
///
///     handle.request(ActionRequest::Refresh).await?;
///     while let Ok(event) = events.recv().await {
///         if let SessionEvent::StateChange(change) = event {
///             println!("{}", change.message);
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct Session {
    config: Arc<SessionConfig>,
    event_tx: EventSender,
    actions: ActionReceiver,
    phase: Phase,
    logged_in: bool,
    sender: Option<CommandSender>,
}

impl Session {
    /// Create a session and its external handle.
    pub fn new(config: SessionConfig) -> (Self, SessionHandle) {
        let (event_tx, _event_rx) = event_channel(256);
        let (action_tx, action_rx) = action_channel(32);
        let handle = SessionHandle::new(event_tx.clone(), action_tx);
        let session = Self {
            config: Arc::new(config),
            event_tx,
            actions: action_rx,
            phase: Phase::Disconnected,
            logged_in: false,
            sender: None,
        };
        (session, handle)
    }

    /// Drive the session until it is shut down or fatally rejected.
    ///
    /// Connects with a fixed retry delay, performs the login handshake and
    /// processes inbound lines one at a time, reconnecting on any
    /// transport failure. Returns `Ok(())` once every [`SessionHandle`]
    /// has been dropped, or [`EnvisalinkError::AuthenticationRejected`]
    /// when the panel rejects the configured password — the one failure
    /// that is never retried.
    pub async fn run(mut self) -> Result<()> {
        let mut first_attempt = true;
        loop {
            if !first_attempt {
                match self.wait_retry_delay().await {
                    Ok(()) => {}
                    Err(EnvisalinkError::ChannelClosed) => return Ok(()),
                    Err(e) => return Err(e),
                }
            }
            first_attempt = false;

            self.phase = Phase::Connecting;
            debug!("Connecting to {}:{}", self.config.host, self.config.port);
            let stream = match TcpStream::connect((self.config.host.as_str(), self.config.port))
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        "Connection to {}:{} failed: {}",
                        self.config.host, self.config.port, e
                    );
                    self.phase = Phase::Disconnected;
                    continue;
                }
            };
            info!("Connected to {}:{}", self.config.host, self.config.port);

            let (read_half, write_half) = stream.into_split();
            self.sender = Some(CommandSender::new(write_half));
            self.phase = Phase::AwaitingLogin;
            debug!("Session phase: {:?}", self.phase);
            let _ = self.event_tx.send(SessionEvent::Connected);

            let mut framer = LineFramer::new(read_half);
            let err = self.run_connected(&mut framer).await;

            // Any exit from the connected loop means the transport is gone
            // (or the session is ending); mark logged-out before deciding.
            self.logged_in = false;
            self.sender = None;
            self.phase = Phase::Disconnected;
            let _ = self.event_tx.send(SessionEvent::Disconnected);

            match err {
                EnvisalinkError::ChannelClosed => {
                    info!("All session handles dropped, shutting down");
                    return Ok(());
                }
                e if e.is_fatal() => {
                    error!("Fatal session error: {}", e);
                    return Err(e);
                }
                e => {
                    info!(
                        "Disconnected from {}:{}: {}",
                        self.config.host, self.config.port, e
                    );
                }
            }
        }
    }

    /// Connected-phase loop: one pending read at a time, interleaved with
    /// action requests. Returns the error that ended the connection.
    async fn run_connected<R>(&mut self, framer: &mut LineFramer<R>) -> EnvisalinkError
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            tokio::select! {
                line = framer.read_line() => match line {
                    Ok(line) => {
                        if let Err(e) = self.handle_line(&line).await {
                            return e;
                        }
                    }
                    Err(e) => return e,
                },
                action = self.actions.recv() => match action {
                    Some(action) => self.handle_action(action).await,
                    None => return EnvisalinkError::ChannelClosed,
                },
            }
        }
    }

    /// Fixed reconnect wait. Action requests arriving during the wait are
    /// rejected rather than queued: the connection is not open.
    async fn wait_retry_delay(&mut self) -> Result<()> {
        warn!(
            "Connection lost, retrying in {} seconds",
            self.config.retry_delay_secs
        );
        let delay = sleep(Duration::from_secs(self.config.retry_delay_secs));
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return Ok(()),
                action = self.actions.recv() => match action {
                    Some(action) => {
                        warn!("Rejecting {:?}: {}", action, EnvisalinkError::Disconnected);
                    }
                    None => return Err(EnvisalinkError::ChannelClosed),
                },
            }
        }
    }

    /// Decode and dispatch one inbound line.
    ///
    /// Per-line failures (unknown code, malformed fields, bad checksum
    /// when verification is enabled) are logged and skipped here; only
    /// transport failures and the fatal login rejection propagate.
    async fn handle_line(&mut self, line: &str) -> Result<()> {
        if line.is_empty() {
            return Ok(());
        }

        let raw = match RawLine::parse(line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dropping line: {}", e);
                return Ok(());
            }
        };

        if self.config.verify_inbound_checksum && !raw.checksum_valid() {
            warn!("Dropping line with bad checksum: {:?}", line);
            return Ok(());
        }

        let descriptor = match describe(raw.code) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Skipping line {:?}: {}", line, e);
                return Ok(());
            }
        };

        let message = format_message(descriptor, &raw.parameters, &self.config);
        debug!("RX < {:03} - {}", raw.code, message);

        match descriptor.handler {
            Some(HandlerTag::Login) => self.handle_login(&raw.parameters).await,
            Some(HandlerTag::Zone) => {
                // Parameters are partition digit + zone number; the zone
                // is the target.
                let target = raw.parameters.get(1..).unwrap_or("");
                self.handle_event(descriptor, raw.code, target, &message);
                Ok(())
            }
            Some(HandlerTag::Partition) => {
                // Only the leading partition digit identifies the target;
                // the trailer (usercode or arm mode) is display-only.
                let target = raw.parameters.get(..1).unwrap_or("");
                self.handle_event(descriptor, raw.code, target, &message);
                Ok(())
            }
            None => {
                self.handle_event(descriptor, raw.code, &raw.parameters, &message);
                Ok(())
            }
        }
    }

    /// Login challenge (code 505). The parameter value selects the reply.
    async fn handle_login(&mut self, parameters: &str) -> Result<()> {
        match parameters {
            "3" => {
                // Password requested. Assume success locally; a rejection
                // comes back as another 505 with value 0.
                self.mark_logged_in();
                self.send(&Command::NetworkLogin {
                    password: self.config.password.clone(),
                })
                .await
            }
            "1" => {
                // Already logged in; pull a full status report.
                self.mark_logged_in();
                self.send(&Command::StatusReport).await
            }
            "0" => {
                error!("Incorrect panel password; terminating (not retried)");
                Err(EnvisalinkError::AuthenticationRejected)
            }
            other => {
                debug!("Unhandled login interaction value: {:?}", other);
                Ok(())
            }
        }
    }

    fn mark_logged_in(&mut self) {
        self.phase = Phase::Authenticated;
        if !self.logged_in {
            self.logged_in = true;
            let _ = self.event_tx.send(SessionEvent::LoggedIn);
        }
    }

    /// Generic event handler: publish a state change for configured
    /// targets, drop everything else.
    fn handle_event(
        &self,
        descriptor: &'static ResponseDescriptor,
        code: u16,
        target: &str,
        message: &str,
    ) {
        // Codes without a semantic kind are informational/protocol-only.
        let Some(kind) = descriptor.kind else {
            return;
        };

        let target: u16 = match target.parse() {
            Ok(target) => target,
            Err(_) => {
                warn!(
                    "Dropping event {:03}: non-numeric target {:?}",
                    code, target
                );
                return;
            }
        };

        let configured = match kind {
            EventKind::Zone => self.config.zone_configured(target),
            EventKind::Partition => u8::try_from(target)
                .map(|p| self.config.partition_configured(p))
                .unwrap_or(false),
        };
        if !configured {
            debug!("Ignoring unnamed {} {}", kind.as_str(), target);
            return;
        }

        let _ = self.event_tx.send(SessionEvent::StateChange(StateChange {
            kind,
            code,
            target,
            descriptor,
            message: message.to_string(),
            status: kind.default_status(),
        }));
    }

    /// Translate an external action request into a wire command.
    async fn handle_action(&mut self, action: ActionRequest) {
        let command = match action {
            ActionRequest::Arm => Command::ArmAway,
            ActionRequest::StayArm => Command::ArmStay,
            ActionRequest::ArmWithCode { code } => Command::ArmWithCode { code },
            ActionRequest::Disarm { code } => Command::Disarm {
                code: code.unwrap_or_else(|| self.config.alarm_code.clone()),
            },
            ActionRequest::Refresh => Command::StatusReport,
            ActionRequest::Pgm => {
                // Placeholder: the output-trigger wire command is not
                // implemented yet.
                info!("PGM trigger requested; no wire command is sent");
                return;
            }
        };

        if let Err(e) = self.send(&command).await {
            warn!("Command {:?} failed: {}", command, e);
        }
    }

    async fn send(&self, command: &Command) -> Result<()> {
        match &self.sender {
            Some(sender) => sender.send(command).await,
            None => Err(EnvisalinkError::Disconnected),
        }
    }
}
