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

use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::engine::EngineControlMessage;
use crate::types::OrderCommand;

/// Message delivered to a book worker
///
/// Orders and control requests share one queue so that a control request
/// observes every order enqueued before it.
#[derive(Debug)]
pub enum BookMessage {
	Order(OrderCommand),
	Control(EngineControlMessage),
}

/// Bounded FIFO feeding a single book worker
///
/// Properties:
/// - Multiple Producers (router, one per connection)
/// - Single Consumer (the book worker)
/// - Bounded capacity; `enqueue` waits while the queue is full
/// - Messages are delivered in the order they were enqueued
///
/// The queue does NOT reorder, prioritize or drop messages. A slow book
/// slows down its producers and nothing else.
pub struct BookQueue {
	sender: Sender<BookMessage>,
	receiver: Receiver<BookMessage>,
}

impl BookQueue {
	/// Create a new book queue with the specified capacity
	///
	/// Capacity is clamped to at least one slot.
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = mpsc::channel(capacity.max(1));
		Self { sender, receiver }
	}

	/// Split the queue into sender and receiver ends
	///
	/// The sender can be cloned for every producer.
	/// The receiver must remain unique for the book worker.
	pub fn split(self) -> (QueueSender, QueueReceiver) {
		(
			QueueSender {
				sender: self.sender,
			},
			QueueReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of a book queue
#[derive(Debug, Clone)]
pub struct QueueSender {
	sender: Sender<BookMessage>,
}

impl QueueSender {
	/// Enqueue a message, waiting for a free slot if the queue is full
	pub async fn enqueue(&self, message: BookMessage) -> Result<(), QueueError> {
		self.sender
			.send(message)
			.await
			.map_err(|_| QueueError::Disconnected)
	}

	/// Whether two senders feed the same queue
	pub fn same_queue(&self, other: &QueueSender) -> bool {
		self.sender.same_channel(&other.sender)
	}
}

/// Receiver end of a book queue
///
/// Owned by exactly one book worker.
pub struct QueueReceiver {
	receiver: Receiver<BookMessage>,
}

impl QueueReceiver {
	/// Receive the next message
	///
	/// Returns `None` once every sender is gone and the queue is drained.
	pub async fn recv(&mut self) -> Option<BookMessage> {
		self.receiver.recv().await
	}
}

/// Errors that can occur when interacting with a book queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue disconnected")]
	Disconnected,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crossbook_sdk::types::Instruction;

	fn order(order_id: u32) -> BookMessage {
		BookMessage::Order(OrderCommand::new(
			Instruction::buy(order_id, "GOOG", 10, 1),
			1000,
		))
	}

	fn order_id(message: BookMessage) -> u32 {
		match message {
			BookMessage::Order(cmd) => cmd.instruction.order_id(),
			other => panic!("unexpected message {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_enqueue_and_recv() {
		let (sender, mut receiver) = BookQueue::new(10).split();

		sender.enqueue(order(1)).await.unwrap();

		let received = receiver.recv().await.unwrap();
		assert_eq!(order_id(received), 1);
	}

	#[tokio::test]
	async fn test_enqueue_waits_for_space() {
		let (sender, mut receiver) = BookQueue::new(1).split();
		sender.enqueue(order(1)).await.unwrap();

		let pending = {
			let sender = sender.clone();
			tokio::spawn(async move { sender.enqueue(order(2)).await })
		};

		tokio::task::yield_now().await;
		assert!(!pending.is_finished());

		assert_eq!(order_id(receiver.recv().await.unwrap()), 1);
		pending.await.unwrap().unwrap();
		assert_eq!(order_id(receiver.recv().await.unwrap()), 2);
	}

	#[tokio::test]
	async fn test_preserves_enqueue_order() {
		let (sender, mut receiver) = BookQueue::new(100).split();
		for id in 1..=50 {
			sender.enqueue(order(id)).await.unwrap();
		}
		for id in 1..=50 {
			assert_eq!(order_id(receiver.recv().await.unwrap()), id);
		}
		drop(sender);
		assert!(receiver.recv().await.is_none());
	}

	#[tokio::test]
	async fn test_disconnected_after_receiver_dropped() {
		let (sender, receiver) = BookQueue::new(4).split();
		let other = sender.clone();
		assert!(sender.same_queue(&other));
		drop(receiver);

		assert!(matches!(
			sender.enqueue(order(1)).await,
			Err(QueueError::Disconnected)
		));
	}
}
