#![cfg(all(test, not(target_arch = "wasm32")))]

use app::{IdleStrategy, LoopObserver};
use mock::{ClipSpec, EngineCall, SimulatedHost};
use parking_lot::Mutex;
use service_abi::{EngineState, PlaybackEngine, TimingMode};
use session::{Session, SessionConfig};
use std::net::{SocketAddr, UdpSocket};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use transport_codecs::{encode, Command, WireFormat};
use transport_fabric::{DatagramSender, SendOutcome};

const CLIP: &str = "session.xef";

/// Observer sharing what the loop dispatched with the sending thread.
#[derive(Clone, Default)]
struct SharedTrace(Arc<Mutex<Vec<(Command, EngineState)>>>);

impl SharedTrace {
    fn dispatched(&self) -> Vec<(Command, EngineState)> {
        self.0.lock().clone()
    }

    fn dispatch_count(&self) -> usize {
        self.0.lock().len()
    }
}

impl LoopObserver for SharedTrace {
    fn on_dispatch(&mut self, command: Command, state: EngineState) {
        self.0.lock().push((command, state));
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> SessionConfig {
    SessionConfig {
        port: 0,
        receive_timeout_ms: 5,
        idle: IdleStrategy::SleepUs(50),
        ..SessionConfig::default()
    }
}

fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

fn sender_for(addr: SocketAddr) -> DatagramSender {
    DatagramSender::connect(&addr.ip().to_string(), addr.port()).expect("connect sender")
}

fn send(sender: &DatagramSender, command: Command, format: WireFormat) {
    let outcome = sender.send(command, format).expect("send");
    assert!(matches!(outcome, SendOutcome::Sent(_)));
}

#[test]
fn remote_session_steps_plays_and_exits() {
    init_logging();
    let host = SimulatedHost::new()
        .with_busy_polls(3)
        .with_clip(CLIP, ClipSpec::new(200, &["depth", "ir"]));
    let journal = host.journal();
    let mut session = Session::prepare(&host, Path::new(CLIP), &config()).expect("prepare");
    let sender = sender_for(session.local_addr());
    let trace = SharedTrace::default();

    let remote = {
        let trace = trace.clone();
        thread::spawn(move || {
            let script = [
                (Command::Step, WireFormat::Byte),
                (Command::Step, WireFormat::Text),
                (Command::Time, WireFormat::Text),
                (Command::Exit, WireFormat::Byte),
            ];
            for (sent, (command, format)) in script.into_iter().enumerate() {
                send(&sender, command, format);
                wait_until("dispatch", || trace.dispatch_count() > sent);
            }
        })
    };

    let mut observer = trace.clone();
    let report = session.run_observed(&mut observer).expect("normal completion");
    remote.join().expect("remote thread");

    assert_eq!(report.final_state, EngineState::Stopped);
    assert_eq!(
        trace
            .dispatched()
            .into_iter()
            .map(|(command, _)| command)
            .collect::<Vec<_>>(),
        vec![Command::Step, Command::Step, Command::Time, Command::Exit]
    );
    assert!(trace
        .dispatched()
        .iter()
        .all(|(_, state)| *state != EngineState::Busy));
    assert_eq!(session.engine().steps_completed(), 2);
    assert_eq!(session.engine().timing_mode(), TimingMode::Enabled);

    let calls = journal.lock().clone();
    let tail = &calls[calls.len() - 5..];
    assert_eq!(tail[0], EngineCall::StepOnce("depth".into()));
    assert_eq!(tail[1], EngineCall::StepOnce("depth".into()));
    assert_eq!(tail[2], EngineCall::SetTimingMode(TimingMode::Enabled));
    assert_eq!(tail[3], EngineCall::Resume);
    assert_eq!(tail[4], EngineCall::Stop);
    assert_eq!(session.receiver_stats().published, 4);
}

#[test]
fn flood_of_steps_never_reaches_a_busy_engine() {
    init_logging();
    let host = SimulatedHost::new()
        .with_busy_polls(4)
        .with_clip(CLIP, ClipSpec::new(10_000, &["depth"]));
    let mut session = Session::prepare(&host, Path::new(CLIP), &config()).expect("prepare");
    let sender = sender_for(session.local_addr());
    let trace = SharedTrace::default();

    let remote = thread::spawn(move || {
        for _ in 0..200 {
            send(&sender, Command::Step, WireFormat::Byte);
        }
        thread::sleep(Duration::from_millis(50));
        send(&sender, Command::Exit, WireFormat::Text);
    });

    let mut observer = trace.clone();
    let report = session
        .run_observed(&mut observer)
        .expect("no engine operation was rejected");
    remote.join().expect("remote thread");

    assert_eq!(report.final_state, EngineState::Stopped);
    let dispatched = trace.dispatched();
    assert!(dispatched.iter().all(|(_, state)| *state != EngineState::Busy));
    let steps = dispatched
        .iter()
        .filter(|(command, _)| *command == Command::Step)
        .count();
    assert_eq!(steps as u32, session.engine().steps_completed());

    let stats = session.receiver_stats();
    assert!(stats.datagrams <= 201);
    assert_eq!(stats.published, stats.datagrams);
    assert!(u64::from(stats.published) >= report.dispatched);
}

#[test]
fn step_overwrites_unread_play() {
    init_logging();
    let host = SimulatedHost::new().with_clip(CLIP, ClipSpec::new(100, &["depth"]));
    let journal = host.journal();
    let mut session = Session::prepare(&host, Path::new(CLIP), &config()).expect("prepare");
    let sender = sender_for(session.local_addr());

    // Both arrive before the loop starts polling.
    send(&sender, Command::Play, WireFormat::Byte);
    send(&sender, Command::Step, WireFormat::Byte);
    wait_until("both datagrams", || session.receiver_stats().datagrams == 2);
    assert_eq!(session.receiver_stats().coalesced, 1);

    let trace = SharedTrace::default();
    let remote = {
        let trace = trace.clone();
        thread::spawn(move || {
            wait_until("step dispatch", || trace.dispatch_count() == 1);
            send(&sender, Command::Exit, WireFormat::Byte);
        })
    };

    let mut observer = trace.clone();
    session.run_observed(&mut observer).expect("normal completion");
    remote.join().expect("remote thread");

    let commands: Vec<Command> = trace.dispatched().into_iter().map(|(c, _)| c).collect();
    assert_eq!(commands, vec![Command::Step, Command::Exit]);
    assert!(!journal.lock().contains(&EngineCall::Resume));
}

#[test]
fn garbage_datagrams_are_ignored() {
    init_logging();
    let host = SimulatedHost::new().with_clip(CLIP, ClipSpec::new(100, &["depth"]));
    let mut session = Session::prepare(&host, Path::new(CLIP), &config()).expect("prepare");
    let target = session.local_addr();

    let remote = thread::spawn(move || {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("raw socket");
        let payloads: [&[u8]; 5] = [&[0x00], &[0x07], b"step", b"HELLO", &[]];
        for payload in payloads {
            socket.send_to(payload, target).expect("send");
        }
        thread::sleep(Duration::from_millis(30));
        socket
            .send_to(&encode(Command::Exit, WireFormat::Text), target)
            .expect("send exit");
    });

    let report = session.run().expect("normal completion");
    remote.join().expect("remote thread");

    assert_eq!(report.dispatched, 1);
    let stats = session.receiver_stats();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.ignored, stats.datagrams - 1);
}

#[test]
fn finished_session_releases_its_port() {
    init_logging();
    let host = SimulatedHost::new().with_clip(CLIP, ClipSpec::new(100, &["depth"]));
    let mut session = Session::prepare(&host, Path::new(CLIP), &config()).expect("prepare");
    let addr = session.local_addr();
    session.mailbox().publish(Command::Exit);

    session.run().expect("normal completion");
    assert!(session.is_closed());

    let before = session.receiver_stats();
    let socket = UdpSocket::bind("127.0.0.1:0").expect("raw socket");
    socket.send_to(&[Command::Step.code()], addr).ok();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(session.receiver_stats(), before, "closed receiver publishes nothing");

    UdpSocket::bind(addr).expect("port is free again");
}
