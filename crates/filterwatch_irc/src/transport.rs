use crate::{Action, IrcMessage, IrcSettings, Session};
use async_trait::async_trait;
use filterwatch_core::{ChannelName, Nick};
use filterwatch_error::{TransportError, TransportErrorKind};
use filterwatch_interface::{ChatTransport, TransportEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore, crypto};
use tracing::{debug, error, info, instrument, trace, warn};

const MAX_LINE: usize = 512;

type SessionReader = Box<dyn AsyncRead + Send + Unpin>;
type SessionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Client side of a TLS connection to one server.
struct Tls {
    connector: TlsConnector,
    server: ServerName<'static>,
}

impl Tls {
    fn for_settings(settings: &IrcSettings) -> Result<Option<Self>, TransportError> {
        if !*settings.ssl() {
            return Ok(None);
        }
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder_with_provider(Arc::new(crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::new(TransportErrorKind::Tls(e.to_string())))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        let server = ServerName::try_from(settings.host().clone())
            .map_err(|e| TransportError::new(TransportErrorKind::Tls(e.to_string())))?;
        Ok(Some(Self {
            connector: TlsConnector::from(Arc::new(config)),
            server,
        }))
    }
}

struct Shared {
    settings: IrcSettings,
    nick: RwLock<Nick>,
    outbound: Mutex<Option<mpsc::UnboundedSender<IrcMessage>>>,
    quitting: AtomicBool,
    hangup: Notify,
}

/// IRC client connection, plaintext or TLS, that survives disconnects.
///
/// Create it, hand a clone of the `Arc` to the relay, then [`spawn`] the
/// connection with the relay's event sender:
///
/// ```no_run
/// use filterwatch_core::Nick;
/// use filterwatch_irc::{IrcSettings, IrcTransport};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let settings = IrcSettings::builder()
///     .host("irc.libera.chat")
///     .nick(Nick::new("AbuseBot").unwrap())
///     .build();
/// let transport = Arc::new(IrcTransport::new(settings));
/// let (events, _inbound) = mpsc::channel(64);
/// let connection = transport.spawn(events);
/// # connection.abort();
/// # }
/// ```
///
/// [`spawn`]: IrcTransport::spawn
#[derive(Clone)]
pub struct IrcTransport {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for IrcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcTransport")
            .field("host", self.shared.settings.host())
            .field("port", self.shared.settings.port())
            .field("nick", &*self.shared.nick.read())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl IrcTransport {
    /// Creates an idle transport.
    pub fn new(settings: IrcSettings) -> Self {
        let nick = settings.nick().clone();
        Self {
            shared: Arc::new(Shared {
                settings,
                nick: RwLock::new(nick),
                outbound: Mutex::new(None),
                quitting: AtomicBool::new(false),
                hangup: Notify::new(),
            }),
        }
    }

    /// Connection parameters.
    pub fn settings(&self) -> &IrcSettings {
        &self.shared.settings
    }

    /// Whether a session is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.outbound.lock().is_some()
    }

    /// Connect, and keep reconnecting until [`quit`](ChatTransport::quit) or
    /// [`disconnect`](ChatTransport::disconnect). Notifications go to
    /// `events`.
    pub fn spawn(&self, events: mpsc::Sender<TransportEvent>) -> JoinHandle<()> {
        tokio::spawn(supervise(self.shared.clone(), events))
    }

    fn enqueue(&self, msg: IrcMessage) -> Result<(), TransportError> {
        let outbound = self.shared.outbound.lock();
        let queue = outbound
            .as_ref()
            .ok_or_else(|| TransportError::new(TransportErrorKind::Disconnected))?;
        queue
            .send(msg)
            .map_err(|_| TransportError::new(TransportErrorKind::Disconnected))
    }
}

#[async_trait]
impl ChatTransport for IrcTransport {
    async fn join(&self, channel: &ChannelName) -> Result<(), TransportError> {
        self.enqueue(IrcMessage::join(channel.as_str()))
    }

    async fn leave(&self, channel: &ChannelName) -> Result<(), TransportError> {
        self.enqueue(IrcMessage::part(channel.as_str()))
    }

    async fn send(&self, target: &str, text: &str) -> Result<(), TransportError> {
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            self.enqueue(IrcMessage::privmsg(target, line))?;
        }
        Ok(())
    }

    async fn set_identity(&self, nick: &Nick) -> Result<(), TransportError> {
        self.enqueue(IrcMessage::nick(nick.as_str()))
    }

    async fn quit(&self, message: &str) -> Result<(), TransportError> {
        self.shared.quitting.store(true, Ordering::SeqCst);
        self.enqueue(IrcMessage::quit(message))
    }

    async fn disconnect(&self) {
        self.shared.quitting.store(true, Ordering::SeqCst);
        self.shared.hangup.notify_one();
    }

    fn current_nick(&self) -> Nick {
        self.shared.nick.read().clone()
    }
}

#[instrument(
    name = "irc",
    skip_all,
    fields(bot = %shared.settings.nick(), server = %shared.settings.host())
)]
async fn supervise(shared: Arc<Shared>, events: mpsc::Sender<TransportEvent>) {
    let tls = match Tls::for_settings(&shared.settings) {
        Ok(tls) => tls,
        Err(e) => {
            error!(error = %e, "Cannot set up TLS");
            return;
        }
    };

    while !shared.quitting.load(Ordering::SeqCst) {
        let connected = tokio::select! {
            _ = shared.hangup.notified() => break,
            connected = connect(&shared.settings, tls.as_ref()) => connected,
        };
        let stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "Giving up on the server");
                break;
            }
        };
        info!(port = shared.settings.port(), tls = tls.is_some(), "Connected");

        let reason = run_session(&shared, stream, &events).await;
        shared.outbound.lock().take();
        info!(reason = %reason, "Connection closed");

        if events
            .send(TransportEvent::ConnectionLost { reason })
            .await
            .is_err()
            || shared.quitting.load(Ordering::SeqCst)
        {
            break;
        }

        tokio::select! {
            _ = shared.hangup.notified() => break,
            _ = sleep(*shared.settings.initial_backoff()) => {}
        }
    }
    debug!("Connection supervisor stopped");
}

async fn connect(
    settings: &IrcSettings,
    tls: Option<&Tls>,
) -> Result<(SessionReader, SessionWriter), TransportError> {
    // Delays are 2^n * factor ms, so the first one equals initial_backoff.
    let factor = (settings.initial_backoff().as_millis() / 2).max(1) as u64;
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(factor)
        .max_delay(*settings.max_backoff())
        .map(jitter);

    Retry::spawn(strategy, || async move {
        open(settings, tls).await.map_err(|err| {
            warn!(error = %err, "Connection attempt failed, will retry");
            RetryError::Transient {
                err,
                retry_after: None,
            }
        })
    })
    .await
}

async fn open(
    settings: &IrcSettings,
    tls: Option<&Tls>,
) -> Result<(SessionReader, SessionWriter), TransportError> {
    let stream = TcpStream::connect((settings.host().as_str(), *settings.port())).await?;
    match tls {
        None => {
            let (read, write) = stream.into_split();
            Ok((Box::new(read), Box::new(write)))
        }
        Some(tls) => {
            let stream = tls.connector.connect(tls.server.clone(), stream).await?;
            let (read, write) = tokio::io::split(stream);
            Ok((Box::new(read), Box::new(write)))
        }
    }
}

async fn run_session(
    shared: &Shared,
    (read, write): (SessionReader, SessionWriter),
    events: &mpsc::Sender<TransportEvent>,
) -> String {
    let settings = &shared.settings;
    let (queue, queue_rx) = mpsc::unbounded_channel();
    let (urgent, urgent_rx) = mpsc::unbounded_channel();

    let mut session = Session::new(settings.nick().clone(), settings.password().clone());
    for line in session.registration(settings.real_name()) {
        let _ = queue.send(line);
    }
    *shared.nick.write() = session.current().clone();
    *shared.outbound.lock() = Some(queue.clone());

    let mut writer = tokio::spawn(write_lines(write, queue_rx, urgent_rx, *settings.line_rate()));
    let mut reader = BufReader::new(read);
    let mut buffer = Vec::with_capacity(MAX_LINE);

    let reason = 'session: loop {
        buffer.clear();
        let read = tokio::select! {
            _ = shared.hangup.notified() => break 'session "Disconnected locally".to_string(),
            written = &mut writer => break 'session match written {
                Ok(Err(e)) => format!("Write error: {}", e),
                _ => "Writer stopped".to_string(),
            },
            read = reader.read_until(b'\n', &mut buffer) => read,
        };

        match read {
            Ok(0) => break 'session "Connection closed by server".to_string(),
            Ok(_) => {}
            Err(e) => break 'session format!("Read error: {}", e),
        }

        let line = String::from_utf8_lossy(&buffer);
        if line.trim().is_empty() {
            continue;
        }
        let msg = match IrcMessage::parse(&line) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Skipping unparsable line");
                continue;
            }
        };
        trace!(line = %msg, "Received");

        for action in session.handle(&msg) {
            match action {
                Action::Send(reply) => {
                    let _ = queue.send(reply);
                }
                Action::Reply(reply) => {
                    let _ = urgent.send(reply);
                }
                Action::Emit(event) => {
                    if events.send(event).await.is_err() {
                        break 'session "Relay stopped".to_string();
                    }
                }
            }
        }
        *shared.nick.write() = session.current().clone();
    };

    writer.abort();
    reason
}

async fn write_lines(
    mut write: SessionWriter,
    mut queue: mpsc::UnboundedReceiver<IrcMessage>,
    mut urgent: mpsc::UnboundedReceiver<IrcMessage>,
    line_rate: Duration,
) -> std::io::Result<()> {
    let mut pace = interval(line_rate);
    pace.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let msg = tokio::select! {
            biased;
            Some(msg) = urgent.recv() => msg,
            msg = queue.recv() => match msg {
                Some(msg) => {
                    pace.tick().await;
                    msg
                }
                None => break,
            },
        };
        trace!(line = %msg, "Sending");
        let mut line = msg.to_string();
        let mut end = line.len().min(MAX_LINE - 2);
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        line.truncate(end);
        line.push_str("\r\n");
        write.write_all(line.as_bytes()).await?;
    }
    write.shutdown().await
}
