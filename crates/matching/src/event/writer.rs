// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
	io,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use tokio::{
	io::{AsyncWrite, AsyncWriteExt},
	sync::watch,
	task::JoinHandle,
	time::{Instant, timeout_at},
};
use tracing::{debug, error, info, warn};

use super::MatchingEvent;
use crate::event::buffer::EventConsumer;

/// Configuration for the Event Writer
#[derive(Debug, Clone)]
pub struct EventWriterConfig {
	/// Maximum number of events to batch before flushing
	pub batch_size: usize,
	/// Maximum time to wait before flushing a partial batch (milliseconds)
	pub batch_timeout_ms: u64,
	/// Whether to log detailed batch information
	pub verbose_logging: bool,
}

impl Default for EventWriterConfig {
	fn default() -> Self {
		Self {
			batch_size: 256,
			batch_timeout_ms: 10,
			verbose_logging: false,
		}
	}
}

/// Event Writer - consumes events from the buffer and renders them
///
/// The Event Writer runs as a background task, consuming events produced
/// by the book workers and writing one line per event to an output
/// stream. It batches events to reduce write and flush overhead.
///
/// The writer stops when every producer has been dropped (after writing
/// everything still buffered) or when [`EventWriter::shutdown`] is called
/// (after writing everything already buffered at that point).
pub struct EventWriter {
	task_handle: Option<JoinHandle<()>>,
	shutdown: watch::Sender<bool>,
	written: Arc<AtomicU64>,
}

impl EventWriter {
	/// Start the event writer on the current tokio runtime
	pub fn start<W>(consumer: EventConsumer, output: W, config: EventWriterConfig) -> Self
	where
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let (shutdown, shutdown_rx) = watch::channel(false);
		let written = Arc::new(AtomicU64::new(0));
		let written_clone = written.clone();

		let task_handle = tokio::spawn(async move {
			info!(target: "event_writer", "Event writer started");
			Self::run_writer_loop(consumer, output, &config, shutdown_rx, &written_clone).await;
			info!(
				target: "event_writer",
				events_written = written_clone.load(Ordering::Relaxed),
				"Event writer stopped"
			);
		});

		Self {
			task_handle: Some(task_handle),
			shutdown,
			written,
		}
	}

	/// Main event writer loop
	async fn run_writer_loop<W>(
		mut consumer: EventConsumer,
		mut output: W,
		config: &EventWriterConfig,
		mut shutdown: watch::Receiver<bool>,
		written: &AtomicU64,
	) where
		W: AsyncWrite + Unpin,
	{
		let batch_size = config.batch_size.max(1);
		let batch_timeout = Duration::from_millis(config.batch_timeout_ms);
		let mut pending_events = Vec::with_capacity(batch_size);

		loop {
			let first = tokio::select! {
				biased;
				_ = shutdown.changed() => None,
				event = consumer.recv() => Some(event),
			};

			let first = match first {
				Some(Some(event)) => event,
				Some(None) => break,
				None => {
					pending_events.extend(consumer.drain(usize::MAX));
					if !pending_events.is_empty() {
						let batch_size = pending_events.len();
						Self::commit_batch(&mut output, &mut pending_events, config, written).await;
						info!(
							target: "event_writer",
							batch_size = batch_size,
							"Flushed final batch during shutdown"
						);
					}
					break;
				}
			};
			pending_events.push(first);

			// Fill the batch until it is full, the timeout elapses, or producers are gone
			let deadline = Instant::now() + batch_timeout;
			let mut closed = false;
			while pending_events.len() < batch_size {
				match timeout_at(deadline, consumer.recv()).await {
					Ok(Some(event)) => pending_events.push(event),
					Ok(None) => {
						closed = true;
						break;
					}
					Err(_) => break,
				}
			}

			Self::commit_batch(&mut output, &mut pending_events, config, written).await;

			if closed {
				debug!(target: "event_writer", "All event producers dropped");
				break;
			}
		}
	}

	/// Write a batch of events as lines and flush the output
	async fn commit_batch<W>(
		output: &mut W,
		events: &mut Vec<MatchingEvent>,
		config: &EventWriterConfig,
		written: &AtomicU64,
	) where
		W: AsyncWrite + Unpin,
	{
		let batch_size = events.len();
		let start = std::time::Instant::now();

		match Self::write_lines(output, events).await {
			Ok(()) => {
				written.fetch_add(batch_size as u64, Ordering::Relaxed);
				if config.verbose_logging {
					debug!(
						target: "event_writer",
						batch_size = batch_size,
						latency_us = start.elapsed().as_micros() as u64,
						"Batch written"
					);
				}
			}
			Err(e) => {
				error!(
					target: "event_writer",
					batch_size = batch_size,
					error = %e,
					"Failed to write event batch"
				);
			}
		}
		events.clear();
	}

	async fn write_lines<W>(output: &mut W, events: &[MatchingEvent]) -> io::Result<()>
	where
		W: AsyncWrite + Unpin,
	{
		let mut buf = String::with_capacity(events.len() * 48);
		for event in events {
			buf.push_str(&event.to_string());
			buf.push('\n');
		}
		output.write_all(buf.as_bytes()).await?;
		output.flush().await
	}

	/// Wait for the writer to finish on its own (all producers dropped)
	///
	/// Returns the total number of events written.
	pub async fn join(mut self) -> u64 {
		self.wait().await
	}

	/// Stop the writer after flushing everything already buffered
	///
	/// Returns the total number of events written.
	pub async fn shutdown(mut self) -> u64 {
		info!(target: "event_writer", "Shutting down event writer");
		let _ = self.shutdown.send(true);
		self.wait().await
	}

	async fn wait(&mut self) -> u64 {
		if let Some(handle) = self.task_handle.take()
			&& let Err(e) = handle.await
		{
			warn!(target: "event_writer", error = %e, "Event writer task failed");
		}
		self.written.load(Ordering::Relaxed)
	}
}

impl Drop for EventWriter {
	fn drop(&mut self) {
		let _ = self.shutdown.send(true);
	}
}
