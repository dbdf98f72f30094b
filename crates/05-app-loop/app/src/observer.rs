use service_abi::EngineState;
use transport_codecs::Command;

/// Instrumentation hooks called from the loop thread.
pub trait LoopObserver {
    /// Called after every state read, before the mailbox is touched.
    fn on_poll(&mut self, state: EngineState) {
        let _ = state;
    }

    /// Called before a command is handed to the dispatcher, with the state
    /// read on the same iteration.
    fn on_dispatch(&mut self, command: Command, state: EngineState) {
        let _ = (command, state);
    }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl LoopObserver for NoopObserver {}
