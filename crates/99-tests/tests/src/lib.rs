//! End-to-end suite: real loopback datagrams driving the simulated engine.

#[cfg(all(test, not(target_arch = "wasm32")))]
mod native_e2e;

#[cfg(all(test, not(target_arch = "wasm32")))]
mod wire_compat;
