use std::io;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use transport::MailboxSend;
use transport_codecs::{decode_datagram, CommandMailbox, DATAGRAM_LEN};

use crate::error::{FabricError, FabricResult};
use crate::metrics::{ReceiverMetrics, ReceiverStats};

/// Upper bound on how long `close` waits for an outstanding receive to unwind.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug)]
pub struct ReceiverOptions {
    /// Wake-up granularity of the blocking receive, used to observe `close`.
    pub receive_timeout: Duration,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }
}

struct Shared {
    closed: AtomicBool,
    metrics: ReceiverMetrics,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Background receiver publishing inbound commands into a mailbox.
///
/// The receive thread never touches the playback engine; the mailbox is the
/// only state it shares with the control loop.
pub struct DatagramReceiver {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DatagramReceiver {
    /// Binds `address:port` and starts receiving immediately.
    pub fn bind(address: &str, port: u16, mailbox: Arc<CommandMailbox>) -> FabricResult<Self> {
        Self::bind_with(address, port, mailbox, ReceiverOptions::default())
    }

    pub fn bind_with(
        address: &str,
        port: u16,
        mailbox: Arc<CommandMailbox>,
        options: ReceiverOptions,
    ) -> FabricResult<Self> {
        if options.receive_timeout.is_zero() {
            return Err(FabricError::InvalidConfig("receive timeout must be non-zero"));
        }
        let ip: IpAddr = address
            .parse()
            .map_err(|_| FabricError::InvalidAddress(address.to_string()))?;
        let addr = SocketAddr::new(ip, port);
        let socket = UdpSocket::bind(addr).map_err(|source| FabricError::Bind { addr, source })?;
        socket.set_read_timeout(Some(options.receive_timeout))?;
        let local_addr = socket.local_addr()?;

        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            metrics: ReceiverMetrics::new(),
        });
        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("datagram-receiver".into())
                .spawn(move || receive_loop(socket, mailbox, shared))?
        };
        info!("command receiver listening on {local_addr}");

        Ok(Self {
            local_addr,
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Endpoint the socket is bound to. Resolves port `0` to the assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> ReceiverStats {
        self.shared.metrics.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stops receiving and waits for the receive thread to finish.
    ///
    /// An outstanding receive unwinds quietly; calling `close` again is a no-op.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("closing command receiver on {}", self.local_addr);
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("command receiver thread panicked");
            }
        }
    }
}

impl Drop for DatagramReceiver {
    fn drop(&mut self) {
        self.close();
    }
}

fn receive_loop(socket: UdpSocket, mailbox: Arc<CommandMailbox>, shared: Arc<Shared>) {
    let mut buf = [0u8; DATAGRAM_LEN];
    loop {
        if shared.is_closed() {
            break;
        }
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => handle_datagram(&mailbox, &shared.metrics, &buf[..len], from),
            Err(err) if is_timeout(&err) => {}
            Err(err) if shared.is_closed() => {
                debug!("receive interrupted by close: {err}");
                break;
            }
            Err(err) => {
                shared.metrics.record_error();
                warn!("command receive failed: {err}");
            }
        }
    }
    info!("command receiver stopped; outstanding receive cancelled by close");
}

fn handle_datagram(
    mailbox: &CommandMailbox,
    metrics: &ReceiverMetrics,
    payload: &[u8],
    from: SocketAddr,
) {
    metrics.record_datagram();
    trace!("RECV {from}: {} byte(s) {payload:02X?}", payload.len());

    let Some(command) = decode_datagram(payload) else {
        metrics.record_ignored();
        debug!("ignoring datagram from {from}: {payload:02X?}");
        return;
    };

    let outcome = mailbox.publish(command);
    metrics.record_publish(outcome);
    if outcome == MailboxSend::Coalesced {
        debug!("{command} from {from} replaced an unread command");
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}
