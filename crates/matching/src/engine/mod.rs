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

mod control;
mod state;

pub use control::{BookSnapshot, EngineControlMessage};
pub use state::BookState;

use std::sync::Arc;

use crossbook_sdk::types::Instruction;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{
	clock::now_micros,
	event::{EventSink, MatchingEvent},
	queue::{BookMessage, BookQueue, QueueReceiver, QueueSender},
	types::OrderCommand,
};

/// Error types for routing and book operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Book for {0} has stopped")]
	BookStopped(String),
	#[error("Invalid instruction: {0}")]
	InvalidInstruction(String),
}

/// Configuration shared by every book worker
#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Capacity of each book's inbound queue
	pub book_queue_capacity: usize,
	pub verbose_logging: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			book_queue_capacity: 1024,
			verbose_logging: false,
		}
	}
}

/// Serialized processing context of one instrument
///
/// Each book worker runs its own task, consuming messages from its
/// inbound queue one at a time and publishing the resulting events to
/// the sink before taking the next message.
///
/// Architecture:
/// - One task per instrument; books never share state
/// - Deterministic: same message sequence always produces same events
/// - Event-sourced: every state change produces an event
/// - Backpressure flows both ways: a full queue slows the producers, a
///   slow sink slows this book only
///
/// The worker stops on an [`EngineControlMessage::Stop`], or once every
/// sender of its queue is dropped and the queue is drained.
pub struct BookWorker {
	instrument: String,
	task_handle: Option<JoinHandle<()>>,
}

impl BookWorker {
	/// Start a book worker and return it with the sender feeding it
	pub fn start(
		instrument: String,
		config: &EngineConfig,
		sink: Arc<dyn EventSink>,
	) -> (Self, QueueSender) {
		let (sender, receiver) = BookQueue::new(config.book_queue_capacity).split();
		let state = BookState::new(instrument.clone());
		let config = config.clone();

		let task_instrument = instrument.clone();
		let task_handle = tokio::spawn(async move {
			info!(target: "book", instrument = %task_instrument, "Book worker started");
			let state = Self::run_book_loop(state, &config, receiver, sink).await;
			info!(
				target: "book",
				instrument = %task_instrument,
				processed = state.processed,
				events = state.events_emitted,
				resting = state.orderbook.order_count(),
				"Book worker stopped"
			);
		});

		(
			Self {
				instrument,
				task_handle: Some(task_handle),
			},
			sender,
		)
	}

	pub fn instrument(&self) -> &str {
		&self.instrument
	}

	/// Main book loop
	///
	/// This loop:
	/// 1. Dequeues the next message (suspends while the queue is empty)
	/// 2. Applies the matching algorithm or answers the control request
	/// 3. Publishes every produced event, in order
	async fn run_book_loop(
		mut state: BookState,
		config: &EngineConfig,
		mut receiver: QueueReceiver,
		sink: Arc<dyn EventSink>,
	) -> BookState {
		while let Some(message) = receiver.recv().await {
			match message {
				BookMessage::Order(cmd) => {
					for event in Self::process_command(&mut state, cmd, config) {
						sink.publish(event).await;
					}
				}
				BookMessage::Control(EngineControlMessage::Stop) => break,
				BookMessage::Control(control) => Self::handle_control(&state, control),
			}
		}
		state
	}

	/// Process a single order command against the book
	pub fn process_command(
		state: &mut BookState,
		cmd: OrderCommand,
		config: &EngineConfig,
	) -> Vec<MatchingEvent> {
		let events = match &cmd.instruction {
			Instruction::Place(order) => state.orderbook.place(order, cmd.arrived_at, now_micros),
			Instruction::Cancel(cancel) => {
				vec![
					state
						.orderbook
						.cancel(cancel.order_id, cmd.arrived_at, now_micros),
				]
			}
		};

		state.processed += 1;
		state.events_emitted += events.len() as u64;

		if config.verbose_logging {
			debug!(
				target: "book",
				instrument = %state.orderbook.instrument(),
				order_id = cmd.instruction.order_id(),
				events = events.len(),
				resting = state.orderbook.order_count(),
				"Processed instruction"
			);
		}

		events
	}

	fn handle_control(state: &BookState, control: EngineControlMessage) {
		match control {
			EngineControlMessage::Snapshot { respond_to } => {
				if respond_to.send(state.snapshot()).is_err() {
					debug!(
						target: "book",
						instrument = %state.orderbook.instrument(),
						"Snapshot requester went away"
					);
				}
			}
			EngineControlMessage::Stop => {}
		}
	}

	/// Wait for the worker task to finish
	///
	/// Returns after the worker has handled a stop message, or once every
	/// sender feeding it is dropped.
	pub async fn join(mut self) {
		if let Some(handle) = self.task_handle.take()
			&& let Err(e) = handle.await
		{
			error!(target: "book", instrument = %self.instrument, "Book worker panicked: {}", e);
		}
	}
}
