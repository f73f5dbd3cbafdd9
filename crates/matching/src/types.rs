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

use crossbook_sdk::types::{Instruction, OrderId, OrderRequest, Price, Quantity, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Instruction handed to a book worker, stamped with its arrival time
///
/// The arrival timestamp is captured by the connection intake when the
/// instruction is read. It is carried as event metadata only and never
/// used to reorder processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCommand {
	pub instruction: Instruction,
	pub arrived_at: Timestamp,
}

impl OrderCommand {
	pub fn new(instruction: Instruction, arrived_at: Timestamp) -> Self {
		Self {
			instruction,
			arrived_at,
		}
	}
}

/// An order currently held in a book, unmatched or partially matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
	/// Unique order ID within the book
	pub order_id: OrderId,
	/// Order side
	pub side: Side,
	/// Limit price; also the execution price of every fill against this order
	pub price: Price,
	/// Quantity still open
	pub remaining_quantity: Quantity,
	/// Number of fills this order has taken part in
	pub execution_count: u32,
	/// Arrival time of the instruction that created the order
	pub arrived_at: Timestamp,
}

impl RestingOrder {
	/// Rest the unfilled part of an incoming order
	pub fn from_request(request: &OrderRequest, remaining: Quantity, arrived_at: Timestamp) -> Self {
		Self {
			order_id: request.order_id,
			side: request.side,
			price: request.price,
			remaining_quantity: remaining,
			execution_count: 0,
			arrived_at,
		}
	}

	/// Whether an incoming order on the other side at `limit` can trade with this order
	pub fn crosses(&self, limit: Price) -> bool {
		match self.side {
			Side::Sell => self.price <= limit,
			Side::Buy => self.price >= limit,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_crosses() {
		let request = OrderRequest {
			side: Side::Sell,
			order_id: 1,
			instrument: "GOOG".to_string(),
			price: 100,
			quantity: 5,
		};
		let ask = RestingOrder::from_request(&request, 5, 0);
		assert!(ask.crosses(100));
		assert!(ask.crosses(101));
		assert!(!ask.crosses(99));

		let bid = RestingOrder {
			side: Side::Buy,
			..ask
		};
		assert!(bid.crosses(100));
		assert!(bid.crosses(99));
		assert!(!bid.crosses(101));
	}
}
