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

mod buffer;
mod sink;
mod writer;

use std::fmt;

use crossbook_sdk::types::{OrderId, Price, Quantity, Side, Timestamp};
use serde::{Deserialize, Serialize};

pub use buffer::{EventBuffer, EventConsumer, EventProducer};
pub use sink::{EventSink, MemoryEventSink};
pub use writer::{EventWriter, EventWriterConfig};

/// Events produced by the book workers
///
/// Every state change of a book produces exactly one event, in the order
/// the book applied it. Timestamps pair the arrival time of the
/// instruction that caused the event with the time the book produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingEvent {
	/// A resting order traded with an incoming order
	Executed {
		instrument: String,
		resting_order_id: OrderId,
		incoming_order_id: OrderId,
		/// Per-resting-order fill counter, starting at 1
		execution_seq: u32,
		/// Always the resting order's price
		price: Price,
		quantity: Quantity,
		arrived_at: Timestamp,
		executed_at: Timestamp,
	},

	/// All or the unfilled remainder of an order was placed on the book
	Added {
		instrument: String,
		order_id: OrderId,
		side: Side,
		price: Price,
		quantity: Quantity,
		arrived_at: Timestamp,
		accepted_at: Timestamp,
	},

	/// Result of a cancel request as seen by one book
	Deleted {
		instrument: String,
		order_id: OrderId,
		/// Whether this book held the order and removed it
		found: bool,
		requested_at: Timestamp,
		processed_at: Timestamp,
	},

	/// An order was refused without touching the book
	Rejected {
		instrument: String,
		order_id: OrderId,
		reason: String,
		arrived_at: Timestamp,
		rejected_at: Timestamp,
	},
}

impl MatchingEvent {
	/// Instrument of the book that produced this event
	pub fn instrument(&self) -> &str {
		match self {
			MatchingEvent::Executed { instrument, .. } => instrument,
			MatchingEvent::Added { instrument, .. } => instrument,
			MatchingEvent::Deleted { instrument, .. } => instrument,
			MatchingEvent::Rejected { instrument, .. } => instrument,
		}
	}

	/// The order this event reports on (the incoming order for executions)
	pub fn order_id(&self) -> OrderId {
		match self {
			MatchingEvent::Executed {
				incoming_order_id, ..
			} => *incoming_order_id,
			MatchingEvent::Added { order_id, .. } => *order_id,
			MatchingEvent::Deleted { order_id, .. } => *order_id,
			MatchingEvent::Rejected { order_id, .. } => *order_id,
		}
	}

	/// Time at which the book produced this event
	pub fn emitted_at(&self) -> Timestamp {
		match self {
			MatchingEvent::Executed { executed_at, .. } => *executed_at,
			MatchingEvent::Added { accepted_at, .. } => *accepted_at,
			MatchingEvent::Deleted { processed_at, .. } => *processed_at,
			MatchingEvent::Rejected { rejected_at, .. } => *rejected_at,
		}
	}
}

/// Renders the event as one output line (without the trailing newline)
impl fmt::Display for MatchingEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MatchingEvent::Executed {
				resting_order_id,
				incoming_order_id,
				execution_seq,
				price,
				quantity,
				arrived_at,
				executed_at,
				..
			} => write!(
				f,
				"E {} {} {} {} {} {} {}",
				resting_order_id,
				incoming_order_id,
				execution_seq,
				price,
				quantity,
				arrived_at,
				executed_at
			),
			MatchingEvent::Added {
				instrument,
				order_id,
				side,
				price,
				quantity,
				arrived_at,
				accepted_at,
			} => write!(
				f,
				"{} {} {} {} {} {} {}",
				side.code(),
				order_id,
				instrument,
				price,
				quantity,
				arrived_at,
				accepted_at
			),
			MatchingEvent::Deleted {
				order_id,
				found,
				requested_at,
				processed_at,
				..
			} => write!(
				f,
				"X {} {} {} {}",
				order_id,
				if *found { 'A' } else { 'R' },
				requested_at,
				processed_at
			),
			MatchingEvent::Rejected {
				instrument,
				order_id,
				reason,
				arrived_at,
				rejected_at,
			} => write!(
				f,
				"R {} {} {} {} {}",
				order_id,
				instrument,
				reason.replace(' ', "_"),
				arrived_at,
				rejected_at
			),
		}
	}
}
