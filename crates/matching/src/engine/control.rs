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

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::types::RestingOrder;

/// Control messages for a book worker
///
/// Control messages travel on the same queue as order commands, so the
/// worker handles them strictly after every command enqueued before them.
/// No caller ever touches book state directly.
#[derive(Debug)]
pub enum EngineControlMessage {
	/// Request a copy of the current book state
	///
	/// The reply also acts as a barrier: when it arrives, every command
	/// submitted earlier to this book has been matched and published.
	Snapshot {
		respond_to: oneshot::Sender<BookSnapshot>,
	},
	/// Stop the worker once every message queued ahead of this one is done
	///
	/// Messages enqueued after the stop are never processed.
	Stop,
}

/// Point-in-time copy of one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
	pub instrument: String,
	/// Resting buy orders in iteration order
	pub bids: Vec<RestingOrder>,
	/// Resting sell orders in iteration order
	pub asks: Vec<RestingOrder>,
	/// Number of order commands the book has processed
	pub processed: u64,
}

impl BookSnapshot {
	pub fn order_count(&self) -> usize {
		self.bids.len() + self.asks.len()
	}

	pub fn find_order(&self, order_id: u32) -> Option<&RestingOrder> {
		self.bids
			.iter()
			.chain(self.asks.iter())
			.find(|o| o.order_id == order_id)
	}
}
