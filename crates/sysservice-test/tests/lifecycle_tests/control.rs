//! Falsification Tests: service control loop
//!
//! # Toyota Way: Jidoka (自働化)
//! Stop immediately when a falsification test fails.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use sysservice_core::{
    ControlLoop, ControlRequest, ServiceState, StatusReporter, StopCause, TracingEventSink,
};

/// Reporter that forwards every state to a channel.
struct ChannelReporter(mpsc::Sender<ServiceState>);

impl StatusReporter for ChannelReporter {
    fn report(&mut self, state: ServiceState) -> sysservice_core::Result<()> {
        let _ = self.0.send(state);
        Ok(())
    }
}

fn spawn_loop() -> (
    mpsc::Sender<ControlRequest>,
    mpsc::Receiver<ServiceState>,
    thread::JoinHandle<sysservice_core::Result<StopCause>>,
) {
    let (req_tx, mut req_rx) = mpsc::channel();
    let (state_tx, state_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let sink = TracingEventSink::new("MyService");
        ControlLoop::new("MyService", &sink)
            .with_interrogate_gap(Duration::from_millis(1))
            .run(&mut req_rx, &mut ChannelReporter(state_tx))
    });
    (req_tx, state_rx, handle)
}

fn next_state(rx: &mpsc::Receiver<ServiceState>) -> ServiceState {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

/// Claim: Stop ends the loop and the run returns success.
#[test]
fn stop_ends_loop() {
    let (tx, states, handle) = spawn_loop();
    assert_eq!(next_state(&states), ServiceState::StartPending);
    assert_eq!(next_state(&states), ServiceState::Running);

    tx.send(ControlRequest::Stop).unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), StopCause::Stop);
    assert_eq!(next_state(&states), ServiceState::StopPending);
}

/// Claim: Pause then Continue keeps the loop alive and responsive to Stop.
#[test]
fn pause_continue_then_stop() {
    let (tx, states, handle) = spawn_loop();
    next_state(&states);
    next_state(&states);

    tx.send(ControlRequest::Pause).unwrap();
    assert_eq!(next_state(&states), ServiceState::Paused);
    tx.send(ControlRequest::Continue).unwrap();
    assert_eq!(next_state(&states), ServiceState::Running);
    assert!(!handle.is_finished());

    tx.send(ControlRequest::Stop).unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), StopCause::Stop);
}

/// Claim: Interrogate answers twice with the current state and keeps going.
#[test]
fn interrogate_reports_current_state() {
    let (tx, states, handle) = spawn_loop();
    next_state(&states);
    next_state(&states);

    tx.send(ControlRequest::Pause).unwrap();
    next_state(&states);
    tx.send(ControlRequest::Interrogate).unwrap();
    assert_eq!(next_state(&states), ServiceState::Paused);
    assert_eq!(next_state(&states), ServiceState::Paused);

    tx.send(ControlRequest::Shutdown).unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), StopCause::Shutdown);
}

/// Claim: unknown requests do not end the loop.
#[test]
fn unknown_request_is_ignored() {
    let (tx, states, handle) = spawn_loop();
    next_state(&states);
    next_state(&states);

    tx.send(ControlRequest::Unknown("ParamChange".into())).unwrap();
    tx.send(ControlRequest::Stop).unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), StopCause::Stop);
    assert_eq!(next_state(&states), ServiceState::StopPending);
}

/// Claim: dropping the request channel ends the loop.
#[test]
fn closed_channel_ends_loop() {
    let (tx, _states, handle) = spawn_loop();
    drop(tx);
    assert_eq!(handle.join().unwrap().unwrap(), StopCause::SourceClosed);
}
