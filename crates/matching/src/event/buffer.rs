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

use async_trait::async_trait;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TryRecvError};
use tracing::warn;

use super::{EventSink, MatchingEvent};

/// Bounded event buffer between the book workers and the event writer
///
/// This buffer decouples event production (book workers) from event
/// output (event writer). Every book worker holds a clone of the
/// producer; the writer owns the single consumer.
///
/// Properties:
/// - Multiple Producers (one per book worker)
/// - Single Consumer (event writer)
/// - Bounded capacity: a full buffer suspends the publishing book
///   until the writer catches up
pub struct EventBuffer {
	sender: Sender<MatchingEvent>,
	receiver: Receiver<MatchingEvent>,
}

impl EventBuffer {
	/// Create a new event buffer with the specified capacity
	///
	/// Capacity is clamped to at least one slot.
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = mpsc::channel(capacity.max(1));
		Self { sender, receiver }
	}

	/// Split the buffer into producer and consumer ends
	pub fn split(self) -> (EventProducer, EventConsumer) {
		(
			EventProducer {
				sender: self.sender,
			},
			EventConsumer {
				receiver: self.receiver,
			},
		)
	}
}

/// Producer end of the event buffer (shared by book workers)
#[derive(Clone)]
pub struct EventProducer {
	sender: Sender<MatchingEvent>,
}

impl EventProducer {
	/// Push an event, waiting for capacity if the buffer is full
	pub async fn push(&self, event: MatchingEvent) -> Result<(), EventBufferError> {
		self.sender
			.send(event)
			.await
			.map_err(|_| EventBufferError::Disconnected)
	}
}

#[async_trait]
impl EventSink for EventProducer {
	async fn publish(&self, event: MatchingEvent) {
		if let Err(e) = self.push(event).await {
			warn!(target: "event_writer", error = %e, "Dropping event, writer has stopped");
		}
	}
}

/// Consumer end of the event buffer (used by event writer)
pub struct EventConsumer {
	receiver: Receiver<MatchingEvent>,
}

impl EventConsumer {
	/// Receive the next event, waiting until one is available
	///
	/// Returns `None` once every producer has been dropped and the
	/// buffer is empty.
	pub async fn recv(&mut self) -> Option<MatchingEvent> {
		self.receiver.recv().await
	}

	fn try_recv(&mut self) -> Result<MatchingEvent, EventBufferError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => EventBufferError::Empty,
			TryRecvError::Disconnected => EventBufferError::Disconnected,
		})
	}

	/// Drain up to `max_count` events without waiting
	pub fn drain(&mut self, max_count: usize) -> Vec<MatchingEvent> {
		let mut events = Vec::with_capacity(max_count.min(1024));
		while events.len() < max_count {
			match self.try_recv() {
				Ok(event) => events.push(event),
				Err(_) => break,
			}
		}
		events
	}
}

/// Errors that can occur when interacting with the event buffer
#[derive(Debug, thiserror::Error)]
pub enum EventBufferError {
	#[error("Event buffer is empty")]
	Empty,
	#[error("Event buffer disconnected")]
	Disconnected,
}
