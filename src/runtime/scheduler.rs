//! Thread-per-node scheduler for streaming graphs
//!
//! Spawns a dedicated thread for each node, calls `work()` repeatedly and
//! manages shutdown through a shared stop signal. Receivers wired to the same
//! signal (see [`Scheduler::stop_signal`]) return `Shutdown` while blocked, so
//! a stop request takes effect at the node's next suspension point.

use super::node::ProcessNode;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver as StdReceiver, Sender as StdSender, channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Runtime scheduler that executes streaming nodes
pub struct Scheduler {
    threads: Vec<(String, JoinHandle<()>)>,
    stop_signal: Arc<AtomicBool>,
    completion_tx: StdSender<String>,
    completion_rx: StdReceiver<String>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        let (completion_tx, completion_rx) = channel();
        Self {
            threads: Vec::new(),
            stop_signal: Arc::new(AtomicBool::new(false)),
            completion_tx,
            completion_rx,
        }
    }

    /// Shared stop signal. Hand it to receivers so blocked reads observe `stop()`.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Start a process node in its own thread
    pub fn start_process(&mut self, mut node: Box<dyn ProcessNode>) {
        let stop_signal = Arc::clone(&self.stop_signal);
        let completion_tx = self.completion_tx.clone();
        let name = node.name().to_string();
        let thread_name = name.clone();

        debug!("Starting process node: {}", name);

        let handle = thread::spawn(move || {
            let mut items_produced = 0usize;

            loop {
                if stop_signal.load(Ordering::Relaxed) || node.should_stop() {
                    break;
                }

                match node.work() {
                    Ok(n) => {
                        items_produced += n;
                    }
                    Err(e) if e.is_termination() => {
                        debug!("[{}] {}", thread_name, e);
                        break;
                    }
                    Err(e) => {
                        error!("[{}] Work error: {}", thread_name, e);
                        break;
                    }
                }
            }

            info!(
                "[{}] Shutdown. Produced {} items.",
                thread_name, items_produced
            );

            // Drop the node so its outputs close before completion is reported
            drop(node);

            let _ = completion_tx.send(thread_name);
        });

        self.threads.push((name, handle));
    }

    /// Signal all nodes to stop
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }

    /// Wait for all node threads to complete
    pub fn wait(self) {
        let Scheduler {
            threads,
            completion_tx,
            completion_rx,
            ..
        } = self;

        // Drop our sender so the channel closes once every thread has reported
        drop(completion_tx);

        let total_threads = threads.len();
        let mut completed = 0;

        info!("Waiting for {} threads to complete...", total_threads);

        let mut threads_by_name: HashMap<String, JoinHandle<()>> = threads.into_iter().collect();

        while completed < total_threads {
            match completion_rx.recv() {
                Ok(thread_name) => {
                    completed += 1;
                    if let Some(handle) = threads_by_name.remove(&thread_name) {
                        match handle.join() {
                            Ok(_) => info!(
                                "[{}] Thread completed ({}/{})",
                                thread_name, completed, total_threads
                            ),
                            Err(e) => error!(
                                "[{}] Thread panicked ({}/{}): {:?}",
                                thread_name, completed, total_threads, e
                            ),
                        }
                    }
                }
                Err(_) => break,
            }
        }

        // A panicking node never reports completion
        for (thread_name, handle) in threads_by_name {
            if handle.join().is_err() {
                error!("[{}] Thread panicked", thread_name);
            }
        }

        info!("All {} threads completed", total_threads);
    }

    /// Get the number of started threads
    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    /// Get the names of all started threads
    pub fn thread_names(&self) -> Vec<String> {
        self.threads.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
