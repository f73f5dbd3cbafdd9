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
use tokio::sync::Mutex;

use super::MatchingEvent;

/// Destination for the events produced by book workers
///
/// A book worker awaits `publish` for each event it emits, in emission
/// order, before it takes the next instruction. A sink that applies
/// backpressure therefore throttles only the books publishing into it.
///
/// Implementations:
/// - [`EventProducer`](super::EventProducer): bounded hand-off to an [`EventWriter`](super::EventWriter)
/// - [`MemoryEventSink`]: in-memory recorder for tests and tooling
#[async_trait]
pub trait EventSink: Send + Sync {
	async fn publish(&self, event: MatchingEvent);
}

/// In-memory event sink
///
/// Records every published event in arrival order. Suitable for:
/// - Tests asserting on the exact event stream
/// - Embedding the engine without an output stream
pub struct MemoryEventSink {
	events: Mutex<Vec<MatchingEvent>>,
}

impl MemoryEventSink {
	pub fn new() -> Self {
		Self {
			events: Mutex::new(Vec::new()),
		}
	}

	/// Copy of all events recorded so far
	pub async fn events(&self) -> Vec<MatchingEvent> {
		self.events.lock().await.clone()
	}

	/// Number of events recorded so far
	pub async fn len(&self) -> usize {
		self.events.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.events.lock().await.is_empty()
	}

	/// Remove and return all recorded events
	pub async fn take(&self) -> Vec<MatchingEvent> {
		std::mem::take(&mut *self.events.lock().await)
	}
}

impl Default for MemoryEventSink {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl EventSink for MemoryEventSink {
	async fn publish(&self, event: MatchingEvent) {
		self.events.lock().await.push(event);
	}
}
