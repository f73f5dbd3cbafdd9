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

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::engine::{BookSnapshot, BookWorker, EngineConfig, EngineControlMessage, EngineError};
use crate::event::EventSink;
use crate::queue::{BookMessage, QueueSender};
use crate::types::OrderCommand;

/// Address of a running book worker
///
/// Cheap to clone; every clone feeds the same serialized queue.
#[derive(Debug, Clone)]
pub struct BookHandle {
	instrument: Arc<str>,
	sender: QueueSender,
}

impl BookHandle {
	fn new(instrument: &str, sender: QueueSender) -> Self {
		Self {
			instrument: Arc::from(instrument),
			sender,
		}
	}

	pub fn instrument(&self) -> &str {
		&self.instrument
	}

	/// Hand an order command to the book
	///
	/// Waits while the book's queue is full.
	pub async fn submit(&self, cmd: OrderCommand) -> Result<(), EngineError> {
		self.sender
			.enqueue(BookMessage::Order(cmd))
			.await
			.map_err(|_| EngineError::BookStopped(self.instrument.to_string()))
	}

	/// Request a snapshot of the book
	///
	/// Resolves after every command submitted before it has been processed.
	pub async fn snapshot(&self) -> Result<BookSnapshot, EngineError> {
		let (respond_to, response) = oneshot::channel();
		self.sender
			.enqueue(BookMessage::Control(EngineControlMessage::Snapshot {
				respond_to,
			}))
			.await
			.map_err(|_| EngineError::BookStopped(self.instrument.to_string()))?;
		response
			.await
			.map_err(|_| EngineError::BookStopped(self.instrument.to_string()))
	}

	/// Ask the worker to stop after the messages already queued
	async fn stop(&self) {
		if self
			.sender
			.enqueue(BookMessage::Control(EngineControlMessage::Stop))
			.await
			.is_err()
		{
			debug!(target: "registry", instrument = %self.instrument, "Book already stopped");
		}
	}

	/// Whether both handles address the same book worker
	pub fn same_book(&self, other: &BookHandle) -> bool {
		self.sender.same_queue(&other.sender)
	}
}

/// Instrument registry
///
/// Maps instrument identifiers to their book. A book and its worker are
/// created on first resolution of an unseen instrument and live until the
/// registry is closed. Uses DashMap so that concurrent first-touch of the
/// same instrument converges on exactly one book.
pub struct BookRegistry {
	books: DashMap<String, BookHandle>,
	workers: Mutex<Vec<BookWorker>>,
	config: EngineConfig,
	sink: Arc<dyn EventSink>,
}

impl BookRegistry {
	pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
		Self {
			books: DashMap::new(),
			workers: Mutex::new(Vec::new()),
			config,
			sink,
		}
	}

	/// Get or create the book for an instrument
	///
	/// Must be called from within a tokio runtime, since a new book spawns
	/// its worker task.
	pub fn resolve(&self, instrument: &str) -> BookHandle {
		if let Some(handle) = self.books.get(instrument) {
			return handle.value().clone();
		}

		self.books
			.entry(instrument.to_string())
			.or_insert_with(|| {
				let (worker, sender) =
					BookWorker::start(instrument.to_string(), &self.config, self.sink.clone());
				self.workers
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.push(worker);
				info!(target: "registry", instrument, "Created book");
				BookHandle::new(instrument, sender)
			})
			.value()
			.clone()
	}

	/// Get the book for an instrument without creating it
	pub fn get(&self, instrument: &str) -> Option<BookHandle> {
		self.books.get(instrument).map(|handle| handle.value().clone())
	}

	/// Every book registered so far, ordered by instrument
	pub fn all_books(&self) -> Vec<BookHandle> {
		let mut books: Vec<BookHandle> = self
			.books
			.iter()
			.map(|entry| entry.value().clone())
			.collect();
		books.sort_by(|a, b| a.instrument().cmp(b.instrument()));
		books
	}

	pub fn len(&self) -> usize {
		self.books.len()
	}

	pub fn is_empty(&self) -> bool {
		self.books.is_empty()
	}

	/// Stop every book and wait for the workers to drain
	///
	/// Each worker finishes the commands queued before the stop request.
	/// Handles cloned out of the registry stay valid to hold, but
	/// submitting through them afterwards fails with
	/// [`EngineError::BookStopped`].
	pub async fn close(&self) {
		let books = self.all_books();
		self.books.clear();
		for book in &books {
			book.stop().await;
		}
		drop(books);
		let workers = std::mem::take(
			&mut *self
				.workers
				.lock()
				.unwrap_or_else(PoisonError::into_inner),
		);
		info!(target: "registry", books = workers.len(), "Closing books");
		for worker in workers {
			worker.join().await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{MatchingEvent, MemoryEventSink};
	use crossbook_sdk::types::Instruction;

	fn registry() -> (BookRegistry, Arc<MemoryEventSink>) {
		let sink = Arc::new(MemoryEventSink::new());
		(
			BookRegistry::new(EngineConfig::default(), sink.clone()),
			sink,
		)
	}

	#[tokio::test]
	async fn test_resolve_is_idempotent() {
		let (registry, _sink) = registry();
		assert!(registry.is_empty());

		let first = registry.resolve("GOOG");
		let second = registry.resolve("GOOG");
		let other = registry.resolve("MSFT");

		assert!(first.same_book(&second));
		assert!(!first.same_book(&other));
		assert_eq!(registry.len(), 2);
		assert!(registry.get("AAPL").is_none());

		drop((first, second, other));
		registry.close().await;
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn test_close_with_outstanding_handle() {
		let (registry, sink) = registry();
		let book = registry.resolve("GOOG");
		book.submit(OrderCommand::new(Instruction::buy(1, "GOOG", 10, 5), 1))
			.await
			.unwrap();

		tokio::time::timeout(std::time::Duration::from_secs(5), registry.close())
			.await
			.expect("close waited on a live handle");
		assert_eq!(sink.len().await, 1);

		let result = book
			.submit(OrderCommand::new(Instruction::buy(2, "GOOG", 10, 5), 2))
			.await;
		assert!(matches!(result, Err(EngineError::BookStopped(ref name)) if name == "GOOG"));
		assert!(matches!(book.snapshot().await, Err(EngineError::BookStopped(_))));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_resolve_creates_one_book() {
		let (registry, _sink) = registry();
		let registry = Arc::new(registry);

		let tasks: Vec<_> = (0..32)
			.map(|_| {
				let registry = registry.clone();
				tokio::spawn(async move { registry.resolve("NEW") })
			})
			.collect();

		let mut handles = Vec::new();
		for task in tasks {
			handles.push(task.await.unwrap());
		}

		assert_eq!(registry.len(), 1);
		for handle in &handles {
			assert!(handle.same_book(&handles[0]));
		}

		drop(handles);
		registry.close().await;
	}

	#[tokio::test]
	async fn test_all_books_sorted() {
		let (registry, _sink) = registry();
		registry.resolve("ZM");
		registry.resolve("AAPL");
		registry.resolve("MSFT");

		let names: Vec<String> = registry
			.all_books()
			.iter()
			.map(|b| b.instrument().to_string())
			.collect();
		assert_eq!(names, vec!["AAPL", "MSFT", "ZM"]);

		registry.close().await;
	}

	#[tokio::test]
	async fn test_close_drains_pending_commands() {
		let (registry, sink) = registry();
		let book = registry.resolve("GOOG");
		for id in 1..=10 {
			book.submit(OrderCommand::new(Instruction::buy(id, "GOOG", 10, 1), id as i64))
				.await
				.unwrap();
		}
		drop(book);

		registry.close().await;
		assert_eq!(sink.len().await, 10);
		assert!(
			sink.events()
				.await
				.iter()
				.all(|e| matches!(e, MatchingEvent::Added { .. }))
		);
	}
}
