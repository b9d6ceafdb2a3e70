//! Runs a [`SimulationEngine`] on its own thread behind ordered channels.
//!
//! The engine thread owns the store outright; the caller only ever sees reply values.
//! If the engine thread dies the channels close, which is how callers learn the
//! simulation is gone.

use crate::config::WorkerConfig;
use crate::engine::SimulationEngine;
use crate::protocol::{WorkerCommand, WorkerReply};
use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

const WORKER_THREAD_NAME: &str = "particle-worker";

pub struct WorkerHandle {
    commands: Option<Sender<WorkerCommand>>,
    replies: Receiver<WorkerReply>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn spawn(config: &WorkerConfig) -> Result<Self> {
        let engine = SimulationEngine::new(config);
        Self::spawn_engine(engine)
    }

    pub fn spawn_engine(engine: SimulationEngine) -> Result<Self> {
        Self::spawn_loop(move |commands, replies| run_engine(engine, commands, replies))
    }

    fn spawn_loop<F>(worker_loop: F) -> Result<Self>
    where
        F: FnOnce(Receiver<WorkerCommand>, Sender<WorkerReply>) + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_loop(command_rx, reply_tx))
            .context("spawning particle worker thread")?;
        Ok(Self { commands: Some(command_tx), replies: reply_rx, thread: Some(thread) })
    }

    /// Queues a command without waiting. Returns `false` once the worker is gone.
    pub fn send(&self, command: WorkerCommand) -> bool {
        match &self.commands {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    /// Blocks for the next reply; `None` once the worker has stopped.
    pub fn recv(&self) -> Option<WorkerReply> {
        self.replies.recv().ok()
    }

    pub fn try_recv(&self) -> Result<Option<WorkerReply>, WorkerGone> {
        match self.replies.try_recv() {
            Ok(reply) => Ok(Some(reply)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerGone),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerReply>, WorkerGone> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Ok(Some(reply)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerGone),
        }
    }

    /// Closes the command channel and waits for queued commands to drain.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.commands.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("particle worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The worker thread has exited and its reply channel is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("particle worker is no longer running")]
pub struct WorkerGone;

fn run_engine(mut engine: SimulationEngine, commands: Receiver<WorkerCommand>, replies: Sender<WorkerReply>) {
    tracing::debug!("particle worker started");
    for command in commands {
        let kind = command.kind();
        let reply = engine.handle(command);
        if replies.send(reply).is_err() {
            tracing::debug!(%kind, "reply receiver dropped, stopping");
            break;
        }
    }
    tracing::debug!(tick = engine.tick(), "particle worker stopped");
}
