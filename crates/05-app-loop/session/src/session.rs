use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use app::{ControlLoop, LoopObserver, LoopReport, NoopObserver};
use log::{info, warn};
use service_abi::{EngineError, EngineHost, EngineResult, PlaybackEngine, StreamId, TimingMode};
use transport_codecs::CommandMailbox;
use transport_fabric::{DatagramReceiver, ReceiverOptions, ReceiverStats};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// Resolves the requested stream names against the file.
///
/// An empty request selects every stream the file carries. Every requested
/// stream must be in the file before any is checked for playability.
/// Duplicates are dropped, order is preserved.
pub fn select_streams<H>(host: &H, path: &Path, requested: &[StreamId]) -> EngineResult<Vec<StreamId>>
where
    H: EngineHost + ?Sized,
{
    if !host.is_connected() {
        return Err(EngineError::NotConnected);
    }
    let available = host.file_streams(path)?;
    if requested.is_empty() {
        return Ok(available);
    }

    if let Some(missing) = requested.iter().find(|s| !available.contains(s)) {
        return Err(EngineError::StreamNotInFile(missing.clone()));
    }
    if let Some(unsupported) = requested.iter().find(|s| !host.is_playable(s)) {
        return Err(EngineError::StreamNotSupported(unsupported.clone()));
    }

    let mut selected: Vec<StreamId> = Vec::with_capacity(requested.len());
    for stream in requested {
        if !selected.contains(stream) {
            selected.push(stream.clone());
        }
    }
    Ok(selected)
}

/// An opened, configured engine paired with a listening receiver.
pub struct Session<E> {
    engine: E,
    receiver: DatagramReceiver,
    control: ControlLoop,
}

impl<E> Session<E>
where
    E: PlaybackEngine,
{
    /// Opens the recording, binds the receiver and leaves the engine paused on
    /// its first frame.
    pub fn prepare<H>(host: &H, path: &Path, config: &SessionConfig) -> SessionResult<Self>
    where
        H: EngineHost<Engine = E> + ?Sized,
    {
        if path.as_os_str().is_empty() {
            return Err(SessionError::EmptyPath);
        }
        config.validate()?;
        if !host.is_connected() {
            return Err(EngineError::NotConnected.into());
        }

        let streams = select_streams(host, path, &config.streams)?;
        let mut engine = host.open(path, &streams)?;
        info!("opened {} with streams {:?}", path.display(), streams);

        let mailbox = Arc::new(CommandMailbox::new());
        let receiver = DatagramReceiver::bind_with(
            &config.bind_address,
            config.port,
            Arc::clone(&mailbox),
            ReceiverOptions {
                receive_timeout: config.receive_timeout(),
            },
        )?;
        info!("listening for commands on {}", receiver.local_addr());

        engine.set_end_behavior(config.end_behavior)?;
        engine.set_timing_mode(TimingMode::Disabled)?;
        engine.set_loop_count(config.loop_count)?;
        engine.start_paused()?;

        let control = ControlLoop::new(mailbox, config.step_stream.clone()).with_idle(config.idle);
        Ok(Self {
            engine,
            receiver,
            control,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.receiver.local_addr()
    }

    pub fn receiver_stats(&self) -> ReceiverStats {
        self.receiver.stats()
    }

    /// True once the session has finished running.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn mailbox(&self) -> &Arc<CommandMailbox> {
        self.control.mailbox()
    }

    pub fn run(&mut self) -> SessionResult<LoopReport> {
        self.run_observed(&mut NoopObserver)
    }

    /// Drives the engine to a terminal state. The receiver is closed on every
    /// exit path.
    pub fn run_observed<O>(&mut self, observer: &mut O) -> SessionResult<LoopReport>
    where
        O: LoopObserver + ?Sized,
    {
        let outcome = self.control.run_observed(&mut self.engine, observer);
        self.receiver.close();

        let stats = self.receiver.stats();
        info!(
            "session closed: {} datagram(s), {} published, {} coalesced, {} ignored",
            stats.datagrams, stats.published, stats.coalesced, stats.ignored
        );
        outcome.map_err(|err| {
            warn!("playback ended abnormally: {err}");
            SessionError::Control(err)
        })
    }
}

/// Prepares and runs a session in one go.
pub fn run_session<H>(host: &H, path: &Path, config: &SessionConfig) -> SessionResult<LoopReport>
where
    H: EngineHost + ?Sized,
{
    Session::prepare(host, path, config)?.run()
}
