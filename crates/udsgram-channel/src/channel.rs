//! Bounded datagram IPC channel over Unix domain sockets.
//!
//! A [`DgramChannel`] is one side of a named, message-oriented channel. The
//! server side binds the filesystem name and receives; the client side
//! connects and sends. Message boundaries are preserved end-to-end by the
//! kernel, one datagram per message, with a strict upper bound on message
//! size fixed at construction.
//!
//! Construction is fallible: a value of this type is always ready. Dropping
//! it closes the descriptor and, on the server side, removes the bound
//! filesystem name.

use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::{ChannelError, Result};
use crate::name;
use crate::platform;

/// Hard upper bound on a message, including the trailing NUL.
///
/// This also sizes the receive buffer; the per-channel bound from
/// [`ChannelConfig`] only constrains sends.
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Which side of the channel an endpoint occupies. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    /// Binds the filesystem name; receives.
    Server,
    /// Connects to an existing name; sends.
    Client,
}

/// Blocking behavior requested at construction.
///
/// The channel only offers blocking send/receive with per-call timeouts;
/// requesting `NonBlocking` fails with [`ChannelError::InvalidArguments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Blocking,
    NonBlocking,
}

/// Construction-time channel parameters.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub mode: ChannelMode,
    /// Strict upper bound for sends: `payload length + 1` (the trailing
    /// NUL) must be less than this. At most [`MAX_MESSAGE_SIZE`].
    pub max_message_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            mode: ChannelMode::Blocking,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

/// One endpoint of a bounded datagram IPC channel.
#[derive(Debug)]
pub struct DgramChannel {
    /// Name as supplied by the caller; used in diagnostics.
    name: String,
    path: PathBuf,
    side: ChannelSide,
    max_message_size: usize,
    socket: UnixDatagram,
    /// Identity of the node this server created, so Drop never removes a
    /// path someone else has taken over. `None` on the client side.
    created_inode: Option<(u64, u64)>,
}

impl DgramChannel {
    /// Create an endpoint for `<PATH_PREFIX><name>` with default parameters.
    pub fn create(name: &str, side: ChannelSide) -> Result<Self> {
        Self::create_with_config(name, side, &ChannelConfig::default())
    }

    /// Create an endpoint for `<PATH_PREFIX><name>` with explicit parameters.
    pub fn create_with_config(
        name: &str,
        side: ChannelSide,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let path = name::resolve(name, true)?;
        Self::open(name, path, side, config)
    }

    /// Create an endpoint at a verbatim filesystem path (no prefix applied).
    pub fn create_at(path: &str, side: ChannelSide, config: &ChannelConfig) -> Result<Self> {
        let resolved = name::resolve(path, false)?;
        Self::open(path, resolved, side, config)
    }

    fn open(name: &str, path: String, side: ChannelSide, config: &ChannelConfig) -> Result<Self> {
        if config.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ChannelError::MaxMessageSizeExceeded);
        }
        if config.mode == ChannelMode::NonBlocking {
            return Err(ChannelError::InvalidArguments);
        }

        let path = PathBuf::from(path);
        let (socket, created_inode) = match side {
            ChannelSide::Server => {
                // A previous owner may have crashed without cleanup; the new
                // bind takes over the name.
                let _ = std::fs::remove_file(&path);
                let socket =
                    UnixDatagram::bind(&path).map_err(|err| ChannelError::from_io(&err, name))?;
                let created_inode = match std::fs::symlink_metadata(&path) {
                    Ok(meta) => (meta.dev(), meta.ino()),
                    Err(err) => {
                        // Construction is transactional: the bound name must
                        // not outlive a failed constructor.
                        let translated = ChannelError::from_io(&err, name);
                        let _ = std::fs::remove_file(&path);
                        return Err(translated);
                    }
                };
                (socket, Some(created_inode))
            }
            ChannelSide::Client => {
                // Connected socket: client creation fails immediately when no
                // server is bound, instead of on the first send.
                let socket =
                    UnixDatagram::unbound().map_err(|err| ChannelError::from_io(&err, name))?;
                socket
                    .connect(&path)
                    .map_err(|err| ChannelError::from_io(&err, name))?;
                (socket, None)
            }
        };

        debug!(name, side = ?side, "datagram channel ready");

        Ok(Self {
            name: name.to_string(),
            path,
            side,
            max_message_size: config.max_message_size,
            socket,
            created_inode,
        })
    }

    /// Send one message, blocking until the kernel accepts the datagram.
    ///
    /// Equivalent to [`timed_send`] with a zero duration. The timeout socket
    /// option is sticky, so this clears any deadline a previous timed send
    /// configured.
    ///
    /// [`timed_send`]: Self::timed_send
    pub fn send(&self, msg: &[u8]) -> Result<()> {
        self.timed_send(msg, Duration::ZERO)
    }

    /// Send one message, blocking at most `timeout`.
    ///
    /// A zero duration disables the deadline. The payload travels as a
    /// single datagram with one trailing NUL appended, so
    /// `msg.len() + 1` must be less than the channel's message size bound.
    pub fn timed_send(&self, msg: &[u8], timeout: Duration) -> Result<()> {
        if msg.len() + 1 >= self.max_message_size {
            return Err(ChannelError::MessageTooLong);
        }
        if self.side == ChannelSide::Server {
            error!(
                channel = %self.name,
                "send on the server side is not supported for datagram channels"
            );
            return Err(ChannelError::InternalLogicError);
        }

        let timeout = self.effective_send_timeout(timeout);
        self.socket
            .set_write_timeout(nonzero(timeout))
            .map_err(|err| self.translate(&err))?;

        let mut frame = Vec::with_capacity(msg.len() + 1);
        frame.extend_from_slice(msg);
        frame.push(0);

        self.socket
            .send(&frame)
            .map(drop)
            .map_err(|err| self.translate(&err))
    }

    /// Receive one message, blocking until a datagram arrives.
    ///
    /// Equivalent to [`timed_receive`] with a zero duration.
    ///
    /// [`timed_receive`]: Self::timed_receive
    pub fn receive(&self) -> Result<String> {
        self.timed_receive(Duration::ZERO)
    }

    /// Receive one message, blocking at most `timeout` (zero disables the
    /// deadline).
    ///
    /// Returns the datagram's bytes up to the first NUL. A deadline expiry
    /// reports [`ChannelError::Timeout`]; that is an expected outcome and is
    /// not logged.
    pub fn timed_receive(&self, timeout: Duration) -> Result<String> {
        if self.side == ChannelSide::Client {
            error!(
                channel = %self.name,
                "receive on the client side is not supported for datagram channels"
            );
            return Err(ChannelError::InternalLogicError);
        }

        self.socket
            .set_read_timeout(nonzero(timeout))
            .map_err(|err| self.translate(&err))?;

        let mut buf = [0u8; MAX_MESSAGE_SIZE + 1];
        let received = match self.socket.recv(&mut buf[..MAX_MESSAGE_SIZE]) {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(ChannelError::Timeout);
            }
            Err(err) => return Err(self.translate(&err)),
        };

        // Absolute terminator, independent of what the sender transmitted.
        buf[MAX_MESSAGE_SIZE] = 0;
        let text_end = buf[..received]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(received);

        Ok(String::from_utf8_lossy(&buf[..text_end]).into_owned())
    }

    /// Remove a stale endpoint named `<PATH_PREFIX><name>` from the
    /// filesystem namespace.
    ///
    /// Returns `true` if a node was removed, `false` if none existed. Lets a
    /// fresh server reclaim a name left behind by a crashed predecessor
    /// without constructing a channel first.
    pub fn unlink_if_exists(name: &str) -> Result<bool> {
        let path = name::resolve(name, true)?;
        Self::unlink_path(&path)
    }

    /// Verbatim-path variant of [`unlink_if_exists`](Self::unlink_if_exists).
    pub fn unlink_if_exists_at(path: &str) -> Result<bool> {
        let resolved = name::resolve(path, false)?;
        Self::unlink_path(&resolved)
    }

    fn unlink_path(path: &str) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                error!(path, %err, "unlinking stale channel path failed");
                Err(ChannelError::InternalLogicError)
            }
        }
    }

    /// Name as supplied at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filesystem path this channel is bound or connected to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Which side of the channel this endpoint occupies.
    pub fn side(&self) -> ChannelSide {
        self.side
    }

    /// The strict upper bound on `payload length + 1` for sends.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    fn effective_send_timeout(&self, timeout: Duration) -> Duration {
        if !platform::HAS_SEND_TIMEOUT && !timeout.is_zero() {
            warn!(
                channel = %self.name,
                "send timeouts are not honored for datagram channels on this platform; \
                 sending without a deadline"
            );
            return Duration::ZERO;
        }
        timeout
    }

    fn translate(&self, err: &io::Error) -> ChannelError {
        ChannelError::from_io(err, &self.name)
    }
}

impl Drop for DgramChannel {
    fn drop(&mut self) {
        if let Some((dev, ino)) = self.created_inode {
            match std::fs::symlink_metadata(&self.path) {
                Ok(meta)
                    if meta.file_type().is_socket()
                        && meta.dev() == dev
                        && meta.ino() == ino =>
                {
                    match std::fs::remove_file(&self.path) {
                        Ok(()) => debug!(channel = %self.name, "unlinked channel path"),
                        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                        Err(err) => {
                            warn!(channel = %self.name, %err, "channel path cleanup failed");
                        }
                    }
                }
                Ok(_) => {
                    debug!(channel = %self.name, "channel path identity changed; skipping cleanup");
                }
                Err(_) => {}
            }
        }
        // The descriptor closes when the socket field drops.
    }
}

/// Maps the "zero disables the deadline" convention onto the socket option.
fn nonzero(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() {
        None
    } else {
        Some(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::{LONGEST_VALID_NAME, PATH_PREFIX};

    fn unique_name(tag: &str) -> String {
        format!(
            "udsgram-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        )
    }

    #[test]
    fn client_without_server_fails() {
        let name = unique_name("noserver");
        let err = DgramChannel::create(&name, ChannelSide::Client)
            .expect_err("client creation should fail without a server");
        assert_eq!(err, ChannelError::NoSuchChannel);
    }

    #[test]
    fn round_trip_preserves_payload() {
        let name = unique_name("roundtrip");
        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        let client =
            DgramChannel::create(&name, ChannelSide::Client).expect("client should connect");

        client
            .timed_send(b"ping", Duration::from_secs(1))
            .expect("send should succeed");
        let msg = server
            .timed_receive(Duration::from_secs(1))
            .expect("receive should succeed");
        assert_eq!(msg, "ping");
    }

    #[test]
    fn messages_arrive_in_send_order() {
        let name = unique_name("fifo");
        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        let client =
            DgramChannel::create(&name, ChannelSide::Client).expect("client should connect");

        for payload in ["one", "two", "three"] {
            client
                .timed_send(payload.as_bytes(), Duration::from_secs(1))
                .expect("send should succeed");
        }
        for expected in ["one", "two", "three"] {
            let msg = server
                .timed_receive(Duration::from_secs(1))
                .expect("receive should succeed");
            assert_eq!(msg, expected);
        }
    }

    #[test]
    fn receive_times_out_without_sender() {
        let name = unique_name("rcvtimeout");
        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");

        let err = server
            .timed_receive(Duration::from_millis(10))
            .expect_err("receive should time out");
        assert_eq!(err, ChannelError::Timeout);
    }

    #[test]
    fn stale_endpoint_is_reclaimed_by_new_server() {
        let name = unique_name("stale");
        let first = DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        // Simulate a crash: leak the endpoint so Drop never runs and the
        // filesystem node stays behind.
        std::mem::forget(first);

        let path = format!("{PATH_PREFIX}{name}");
        assert!(Path::new(&path).exists(), "stale node should remain");

        let second =
            DgramChannel::create(&name, ChannelSide::Server).expect("new server should reclaim");
        drop(second);
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn server_owns_bound_path_for_its_lifetime() {
        let name = unique_name("bound");
        let path = format!("{PATH_PREFIX}{name}");

        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        assert!(Path::new(&path).exists());
        assert_eq!(server.path(), Path::new(&path));

        drop(server);
        assert!(!Path::new(&path).exists(), "drop should unlink the path");
    }

    #[test]
    fn drop_skips_replaced_path() {
        let name = unique_name("droprace");
        let path = format!("{PATH_PREFIX}{name}");

        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        assert!(Path::new(&path).exists());

        // Replace the node while the server is alive.
        std::fs::remove_file(&path).expect("path should be removable");
        std::fs::write(&path, b"replacement-file").expect("replacement should be writable");

        drop(server);
        assert!(
            Path::new(&path).exists(),
            "drop must not remove a path whose identity changed"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn client_drop_leaves_path_alone() {
        let name = unique_name("clientdrop");
        let path = format!("{PATH_PREFIX}{name}");

        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        let client =
            DgramChannel::create(&name, ChannelSide::Client).expect("client should connect");

        drop(client);
        assert!(Path::new(&path).exists(), "client must not remove the path");
        drop(server);
    }

    #[test]
    fn payload_and_terminator_must_fit_message_size() {
        let name = unique_name("oversize");
        let config = ChannelConfig {
            max_message_size: 128,
            ..ChannelConfig::default()
        };
        let _server = DgramChannel::create_with_config(&name, ChannelSide::Server, &config)
            .expect("server should bind");
        let client = DgramChannel::create_with_config(&name, ChannelSide::Client, &config)
            .expect("client should connect");

        // 127 + 1 = 128 is not strictly less than 128.
        let err = client
            .timed_send(&[b'x'; 127], Duration::from_secs(1))
            .expect_err("boundary payload should be rejected");
        assert_eq!(err, ChannelError::MessageTooLong);

        client
            .timed_send(&[b'y'; 126], Duration::from_secs(1))
            .expect("126 + 1 = 127 fits below 128");
    }

    #[test]
    fn role_violations_are_internal_errors() {
        let name = unique_name("roles");
        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        let client =
            DgramChannel::create(&name, ChannelSide::Client).expect("client should connect");

        let err = server
            .timed_send(b"nope", Duration::from_secs(1))
            .expect_err("server must not send");
        assert_eq!(err, ChannelError::InternalLogicError);

        let err = client
            .timed_receive(Duration::from_millis(10))
            .expect_err("client must not receive");
        assert_eq!(err, ChannelError::InternalLogicError);
    }

    #[test]
    fn rejects_invalid_names_without_side_effects() {
        let err = DgramChannel::create("", ChannelSide::Server)
            .expect_err("empty name should be rejected");
        assert_eq!(err, ChannelError::InvalidChannelName);

        let overlong = "x".repeat(LONGEST_VALID_NAME + 1);
        let err = DgramChannel::create(&overlong, ChannelSide::Server)
            .expect_err("overlong name should be rejected");
        assert_eq!(err, ChannelError::InvalidChannelName);
    }

    #[test]
    fn rejects_message_size_above_platform_cap() {
        let name = unique_name("cap");
        let config = ChannelConfig {
            max_message_size: MAX_MESSAGE_SIZE + 1,
            ..ChannelConfig::default()
        };
        let err = DgramChannel::create_with_config(&name, ChannelSide::Server, &config)
            .expect_err("size above the cap should be rejected");
        assert_eq!(err, ChannelError::MaxMessageSizeExceeded);
    }

    #[test]
    fn rejects_non_blocking_mode() {
        let name = unique_name("mode");
        let config = ChannelConfig {
            mode: ChannelMode::NonBlocking,
            ..ChannelConfig::default()
        };
        let err = DgramChannel::create_with_config(&name, ChannelSide::Server, &config)
            .expect_err("non-blocking mode should be rejected");
        assert_eq!(err, ChannelError::InvalidArguments);
    }

    #[test]
    fn unlink_if_exists_reports_removal() {
        let name = unique_name("unlink");
        assert_eq!(
            DgramChannel::unlink_if_exists(&name),
            Ok(false),
            "nothing to remove yet"
        );

        let server = DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        std::mem::forget(server);

        assert_eq!(DgramChannel::unlink_if_exists(&name), Ok(true));
        assert_eq!(DgramChannel::unlink_if_exists(&name), Ok(false));
    }

    #[test]
    fn unlink_if_exists_validates_the_name() {
        assert_eq!(
            DgramChannel::unlink_if_exists(""),
            Err(ChannelError::InvalidChannelName)
        );
    }

    #[test]
    fn verbatim_path_round_trip() {
        let dir = std::env::temp_dir().join(format!("udsgram-at-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let path = dir.join("control.sock");
        let path = path.to_str().expect("path should be utf-8");

        let config = ChannelConfig::default();
        let server = DgramChannel::create_at(path, ChannelSide::Server, &config)
            .expect("server should bind verbatim path");
        let client = DgramChannel::create_at(path, ChannelSide::Client, &config)
            .expect("client should connect verbatim path");

        client
            .timed_send(b"direct", Duration::from_secs(1))
            .expect("send should succeed");
        let msg = server
            .timed_receive(Duration::from_secs(1))
            .expect("receive should succeed");
        assert_eq!(msg, "direct");

        drop(client);
        drop(server);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn send_times_out_when_receiver_queue_is_full() {
        let name = unique_name("sndtimeout");
        let server =
            DgramChannel::create(&name, ChannelSide::Server).expect("server should bind");
        let client =
            DgramChannel::create(&name, ChannelSide::Client).expect("client should connect");

        // Never receive; the kernel queue fills after a bounded number of
        // datagrams and the deadline kicks in.
        let payload = [b'z'; 1024];
        let mut outcome = Ok(());
        for _ in 0..10_000 {
            outcome = client.timed_send(&payload, Duration::from_millis(50));
            if outcome.is_err() {
                break;
            }
        }
        assert_eq!(outcome, Err(ChannelError::Timeout));
        drop(server);
    }
}
