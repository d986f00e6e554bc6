//! # Listener Module
//!
//! Runs a pitch feed on a dedicated thread and turns every usable estimate
//! into a [`TuningResult`]. The feed is injected as a [`PitchSource`], so the
//! microphone and the simulator share the same mapping path.
//!
//! ## Architecture
//! - **Listener thread**: builds the source, polls it, maps pitches
//! - **Results**: sent over a crossbeam channel to the presentation side
//! - **Shutdown**: bounded crossbeam channel checked between polls

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, trace, warn};

use crate::{
    TuningResult,
    tuning::{self, ReferenceTable},
};

/// A stream of pitch estimates.
pub trait PitchSource {
    /// Waits for the next estimate.
    ///
    /// # Returns
    /// * `Ok(Some(freq))` - A pitch estimate in Hz, possibly spurious
    /// * `Ok(None)` - Nothing this poll (silence, noise or a timeout)
    /// * `Err(e)` - The source has ended and will not produce more
    fn next_pitch(&mut self) -> Result<Option<f32>>;
}

/// Handle to the listener thread.
///
/// Stopping (or dropping) the handle signals the thread and waits for it.
#[derive(Debug)]
pub struct Listener {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Starts listening on a new thread.
    ///
    /// `make_source` runs on the listener thread, which keeps sources that are
    /// not `Send` (such as audio streams) on the thread that owns them. This
    /// call returns once the source has been built.
    ///
    /// # Arguments
    /// * `make_source` - Builds the pitch feed
    /// * `table` - Shared reference table
    /// * `sender` - Channel receiving one result per in-range pitch
    ///
    /// # Returns
    /// * `Ok(listener)` - The source is up and being polled
    /// * `Err(e)` - The thread could not be spawned or the source failed to start
    pub fn start<F, S>(
        make_source: F,
        table: Arc<ReferenceTable>,
        sender: Sender<TuningResult>,
    ) -> Result<Self>
    where
        F: FnOnce() -> Result<S> + Send + 'static,
        S: PitchSource,
    {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<()>>(1);

        let thread_handle = thread::Builder::new()
            .name("listener".to_string())
            .spawn(move || {
                debug!("Building pitch source...");
                let mut source = match make_source() {
                    Ok(source) => {
                        let _ = ready_tx.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                info!("Listening with {} reference notes", table.len());
                run(&mut source, &table, &sender, &shutdown_rx);
                info!("Listener finished");
            })?;

        let mut listener = Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(listener),
            Ok(Err(e)) => {
                listener.shutdown();
                Err(e.context("pitch source failed to start"))
            }
            Err(_) => {
                listener.shutdown();
                Err(anyhow!("listener thread exited during startup"))
            }
        }
    }

    /// Whether the listener thread is still polling its source.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops listening and waits for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!("Signalling listener shutdown...");
            let _ = self.shutdown_tx.try_send(());
            if handle.join().is_err() {
                error!("Listener thread panicked");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Polls `source` until shutdown, source exhaustion or a dropped receiver.
fn run<S: PitchSource + ?Sized>(
    source: &mut S,
    table: &ReferenceTable,
    sender: &Sender<TuningResult>,
    shutdown_rx: &Receiver<()>,
) {
    loop {
        match shutdown_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => {
                debug!("Received shutdown signal");
                break;
            }
        }

        match source.next_pitch() {
            Ok(Some(freq)) => {
                // Spurious detector output is dropped so the display keeps its last value.
                if !tuning::is_in_range(freq) {
                    trace!("Dropping out-of-range pitch {freq:.2} Hz");
                    continue;
                }
                let result = tuning::compute_tuning_result(freq, table);
                if sender.send(result).is_err() {
                    debug!("Result receiver dropped");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Pitch source ended: {e:#}");
                break;
            }
        }
    }
}
