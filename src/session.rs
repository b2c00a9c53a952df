//! Session: one authenticated connection to the simulation server.
//!
//! # Lifecycle
//!
//! ```text
//! 1. Open the TCP connection                  (NetworkError on failure)
//! 2. Send AUTH|<role>:<username>:<password>
//! 3. Read until the first complete line       (AuthenticationError on EOF)
//! 4. Require a RESP|OK... reply               (AuthenticationError otherwise)
//! 5. Spawn the receive thread, seeded with any bytes after the reply
//! 6. disconnect() or connection loss → shared teardown
//! ```
//!
//! `connect` blocks for the handshake only. No timeout applies to the
//! handshake read or to the receive thread; `ConnectOptions::connect_timeout`
//! bounds the TCP connect alone.

use std::fmt;
use std::io::{self, ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::dispatch::{DispatchStats, Dispatcher};
use crate::error::{Result, VahanaError};
use crate::protocol::{FrameBuffer, Message, Role, TelemetrySnapshot};
use crate::shared::{SessionShared, SessionStatus};
use crate::surface::DisplaySurface;
use crate::threads;

/// Default bytes requested per socket read
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Handshake reply prefix that grants access
const AUTH_OK_PREFIX: &str = "RESP|OK";

/// Inputs for [`Session::connect`], produced by a credential supplier.
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Credentials {
    /// Supplier-side checks: non-empty host, username and password, port in 1..=65535.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(VahanaError::Config("Server host cannot be empty".into()));
        }
        if self.port == 0 {
            return Err(VahanaError::Config(
                "Port must be between 1 and 65535".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(VahanaError::Config("Username cannot be empty".into()));
        }
        if self.password.is_empty() {
            return Err(VahanaError::Config("Password cannot be empty".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Transport settings for [`Session::connect_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bound on the TCP connect. `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
    pub read_buffer_size: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// An authenticated connection and its receive thread.
///
/// Methods take `&self`, so a session can be shared between UI callbacks;
/// command writes are serialized internally.
pub struct Session {
    host: String,
    port: u16,
    role: Role,
    username: String,
    shared: Arc<SessionShared>,
    receiver: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Connect and authenticate with default transport settings.
    pub fn connect(credentials: &Credentials, surface: Arc<dyn DisplaySurface>) -> Result<Self> {
        Self::connect_with(credentials, surface, &ConnectOptions::default())
    }

    /// Connect and authenticate, then start the receive thread.
    pub fn connect_with(
        credentials: &Credentials,
        surface: Arc<dyn DisplaySurface>,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let auth = Message::Auth {
            role: credentials.role,
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
        .encode()?;

        let stream = open_stream(&credentials.host, credentials.port, options.connect_timeout)?;
        tracing::info!(
            "Connected to {}:{}, authenticating as {} ({})",
            credentials.host,
            credentials.port,
            credentials.username,
            credentials.role
        );

        let reader = stream.try_clone()?;
        let shared = Arc::new(SessionShared::new(stream, Dispatcher::new(surface))?);

        let frames = match authenticate(&shared, auth.as_bytes(), options.read_buffer_size) {
            Ok(frames) => frames,
            Err(e) => {
                shared.close();
                return Err(e);
            }
        };
        // Nothing else can have moved the status off Connecting yet
        let authenticated = shared.mark_authenticated();
        debug_assert!(authenticated, "handshake finished on a closed session");

        let handle = match threads::spawn_receiver(
            Arc::clone(&shared),
            reader,
            frames,
            options.read_buffer_size,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                shared.close();
                return Err(e.into());
            }
        };

        Ok(Self {
            host: credentials.host.clone(),
            port: credentials.port,
            role: credentials.role,
            username: credentials.username.clone(),
            shared,
            receiver: Mutex::new(Some(handle)),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.status()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_authenticated()
    }

    /// Last telemetry snapshot received on this session.
    pub fn latest_telemetry(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.shared.dispatcher().latest_telemetry()
    }

    pub fn stats(&self) -> DispatchStats {
        self.shared.dispatcher().stats()
    }

    /// Send a control command. Only admins may do so.
    ///
    /// Observers get `PermissionDenied` without touching the socket.
    pub fn send_command<C: AsRef<str>>(&self, command: C) -> Result<()> {
        let command = command.as_ref();
        if self.role != Role::Admin {
            return Err(VahanaError::PermissionDenied(format!(
                "{} sessions cannot send commands",
                self.role
            )));
        }

        let frame = Message::Command(command.to_string()).encode()?;

        if !self.shared.is_authenticated() {
            return Err(VahanaError::Network(io::Error::new(
                ErrorKind::NotConnected,
                "session is disconnected",
            )));
        }

        self.shared.send_frame(frame.as_bytes())?;
        tracing::debug!("Sent command: {}", command);
        Ok(())
    }

    /// Close the connection. Idempotent and returns promptly.
    pub fn disconnect(&self) {
        self.shared.teardown();
    }

    /// Block until the receive thread has exited.
    pub fn wait(&self) {
        if let Some(handle) = self.receiver.lock().take()
            && handle.join().is_err()
        {
            tracing::error!("Receive thread panicked");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("role", &self.role)
            .field("username", &self.username)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn open_stream(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let Some(timeout) = timeout else {
        return TcpStream::connect((host, port));
    };

    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(ErrorKind::NotFound, format!("No address found for {}", host))
    }))
}

/// Send the AUTH frame and wait for the first complete reply line.
///
/// The first line is the reply even when it is empty. Returns the frame
/// buffer holding whatever followed it.
fn authenticate(shared: &SessionShared, auth: &[u8], buffer_size: usize) -> Result<FrameBuffer> {
    shared.send_frame(auth)?;

    let mut frames = FrameBuffer::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut stream = shared.stream();

    let reply = loop {
        if let Some(line) = frames.next_line() {
            break line;
        }
        match stream.read(&mut buffer) {
            Ok(0) => {
                return Err(VahanaError::Authentication(
                    "Connection closed during handshake".into(),
                ));
            }
            Ok(len) => frames.feed(&buffer[..len]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };

    if reply.starts_with(AUTH_OK_PREFIX) {
        tracing::info!("Authenticated: {}", reply);
        return Ok(frames);
    }

    let reason = match Message::decode(&reply) {
        Ok(Message::Response(response)) => response.message,
        _ => format!("Unexpected handshake reply {:?}", reply),
    };
    tracing::warn!("Authentication rejected: {}", reason);
    Err(VahanaError::Authentication(reason))
}
