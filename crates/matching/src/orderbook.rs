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

use crossbook_sdk::types::{OrderId, OrderRequest, Quantity, Side, Timestamp};
use serde::{Deserialize, Serialize};

use crate::event::MatchingEvent;
use crate::types::RestingOrder;

/// Reason attached to a rejected order whose ID is already resting
pub const REJECT_DUPLICATE_ORDER_ID: &str = "duplicate order id";

/// Reason attached to a rejected order with nothing to trade
pub const REJECT_ZERO_QUANTITY: &str = "zero quantity";

/// Order book for a single instrument (single-threaded)
///
/// Resting orders are kept per side in arrival order. Matching scans the
/// opposite side in that order and trades with every price-eligible
/// resting order it meets, so priority is by arrival among eligible
/// orders rather than by best price.
///
/// Design characteristics:
/// - Owned by exactly one book worker; no locks, no shared state
/// - Deterministic: the same instruction sequence always yields the same
///   events and the same book
/// - Every operation returns the events it produced, in emission order
///
/// `now` closures supply the emission timestamp of each event and are
/// called once per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
	instrument: String,
	/// Resting buy orders in arrival order
	bids: Vec<RestingOrder>,
	/// Resting sell orders in arrival order
	asks: Vec<RestingOrder>,
}

impl OrderBook {
	/// Create an empty order book for an instrument
	pub fn new(instrument: impl Into<String>) -> Self {
		Self {
			instrument: instrument.into(),
			bids: Vec::new(),
			asks: Vec::new(),
		}
	}

	/// Get the instrument identifier
	pub fn instrument(&self) -> &str {
		&self.instrument
	}

	/// Match an incoming buy or sell order and rest any remainder
	///
	/// Scans the opposite side in arrival order. Each crossable resting
	/// order trades `min(remaining, resting.remaining_quantity)` at the
	/// resting order's price and has its execution counter bumped; fully
	/// filled resting orders leave the book. A non-zero remainder rests
	/// on the order's own side and is reported with one `Added` event.
	pub fn place<F>(
		&mut self,
		order: &OrderRequest,
		arrived_at: Timestamp,
		mut now: F,
	) -> Vec<MatchingEvent>
	where
		F: FnMut() -> Timestamp,
	{
		if let Some(reason) = self.validate(order) {
			return vec![MatchingEvent::Rejected {
				instrument: self.instrument.clone(),
				order_id: order.order_id,
				reason: reason.to_string(),
				arrived_at,
				rejected_at: now(),
			}];
		}

		let mut events = Vec::new();
		let mut remaining = order.quantity;

		let resting = match order.side {
			Side::Buy => &mut self.asks,
			Side::Sell => &mut self.bids,
		};

		let mut index = 0;
		while index < resting.len() && remaining > 0 {
			let maker = &mut resting[index];
			if !maker.crosses(order.price) {
				index += 1;
				continue;
			}

			let fill = remaining.min(maker.remaining_quantity);
			maker.remaining_quantity -= fill;
			maker.execution_count += 1;
			remaining -= fill;

			events.push(MatchingEvent::Executed {
				instrument: self.instrument.clone(),
				resting_order_id: maker.order_id,
				incoming_order_id: order.order_id,
				execution_seq: maker.execution_count,
				price: maker.price,
				quantity: fill,
				arrived_at,
				executed_at: now(),
			});

			if maker.remaining_quantity == 0 {
				resting.remove(index);
			} else {
				index += 1;
			}
		}

		if remaining > 0 {
			self.rest(order, remaining, arrived_at);
			events.push(MatchingEvent::Added {
				instrument: self.instrument.clone(),
				order_id: order.order_id,
				side: order.side,
				price: order.price,
				quantity: remaining,
				arrived_at,
				accepted_at: now(),
			});
		}

		events
	}

	/// Remove a resting order by ID
	///
	/// Bids are searched before asks. Returns a `Deleted` event with
	/// `found` telling whether this book held the order.
	pub fn cancel<F>(
		&mut self,
		order_id: OrderId,
		requested_at: Timestamp,
		mut now: F,
	) -> MatchingEvent
	where
		F: FnMut() -> Timestamp,
	{
		let found = self.remove_order(order_id).is_some();

		MatchingEvent::Deleted {
			instrument: self.instrument.clone(),
			order_id,
			found,
			requested_at,
			processed_at: now(),
		}
	}

	/// Remove a resting order from whichever side holds it
	pub fn remove_order(&mut self, order_id: OrderId) -> Option<RestingOrder> {
		if let Some(pos) = self.bids.iter().position(|o| o.order_id == order_id) {
			return Some(self.bids.remove(pos));
		}
		if let Some(pos) = self.asks.iter().position(|o| o.order_id == order_id) {
			return Some(self.asks.remove(pos));
		}
		None
	}

	/// Find a resting order by ID
	pub fn find_order(&self, order_id: OrderId) -> Option<&RestingOrder> {
		self.bids
			.iter()
			.chain(self.asks.iter())
			.find(|o| o.order_id == order_id)
	}

	/// Whether an order with this ID is resting in the book
	pub fn contains(&self, order_id: OrderId) -> bool {
		self.find_order(order_id).is_some()
	}

	/// Resting buy orders in arrival order
	pub fn bids(&self) -> &[RestingOrder] {
		&self.bids
	}

	/// Resting sell orders in arrival order
	pub fn asks(&self) -> &[RestingOrder] {
		&self.asks
	}

	/// Highest resting buy price
	pub fn best_bid(&self) -> Option<u32> {
		self.bids.iter().map(|o| o.price).max()
	}

	/// Lowest resting sell price
	pub fn best_ask(&self) -> Option<u32> {
		self.asks.iter().map(|o| o.price).min()
	}

	/// Total open quantity on one side
	///
	/// Summed as `u64` since many resting orders can exceed a single quantity.
	pub fn depth(&self, side: Side) -> u64 {
		let orders = match side {
			Side::Buy => &self.bids,
			Side::Sell => &self.asks,
		};
		orders.iter().map(|o| u64::from(o.remaining_quantity)).sum()
	}

	/// Get total number of orders in the book
	pub fn order_count(&self) -> usize {
		self.bids.len() + self.asks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bids.is_empty() && self.asks.is_empty()
	}

	fn validate(&self, order: &OrderRequest) -> Option<&'static str> {
		if order.quantity == 0 {
			Some(REJECT_ZERO_QUANTITY)
		} else if self.contains(order.order_id) {
			Some(REJECT_DUPLICATE_ORDER_ID)
		} else {
			None
		}
	}

	fn rest(&mut self, order: &OrderRequest, remaining: Quantity, arrived_at: Timestamp) {
		let resting = RestingOrder::from_request(order, remaining, arrived_at);
		match order.side {
			Side::Buy => self.bids.push(resting),
			Side::Sell => self.asks.push(resting),
		}
	}
}
