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

use crate::OrderBook;
use crate::engine::control::BookSnapshot;

/// Book worker state
///
/// This structure holds everything a book worker owns:
/// - Orderbook (all resting orders of the instrument)
/// - Counters for processed commands and emitted events
///
/// It is owned by the worker task and never shared.
pub struct BookState {
	/// The orderbook for this instrument
	pub orderbook: OrderBook,
	/// Order commands processed so far
	pub processed: u64,
	/// Events emitted so far
	pub events_emitted: u64,
}

impl BookState {
	pub fn new(instrument: String) -> Self {
		Self {
			orderbook: OrderBook::new(instrument),
			processed: 0,
			events_emitted: 0,
		}
	}

	/// Copy the current state out for a snapshot reply
	pub fn snapshot(&self) -> BookSnapshot {
		BookSnapshot {
			instrument: self.orderbook.instrument().to_string(),
			bids: self.orderbook.bids().to_vec(),
			asks: self.orderbook.asks().to_vec(),
			processed: self.processed,
		}
	}
}
