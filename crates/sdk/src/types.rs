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

use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-assigned order identifier
pub type OrderId = u32;

/// Limit price in integer ticks
pub type Price = u32;

/// Order quantity in whole units
pub type Quantity = u32;

/// Monotonic timestamp in microseconds
pub type Timestamp = i64;

/// Maximum instrument symbol length accepted on the wire
pub const MAX_INSTRUMENT_LEN: usize = 8;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// Single-letter wire code (`B` or `S`)
	pub fn code(self) -> char {
		match self {
			Side::Buy => 'B',
			Side::Sell => 'S',
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Buy => write!(f, "buy"),
			Side::Sell => write!(f, "sell"),
		}
	}
}

/// Request to place a limit order on an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
	/// Order side
	pub side: Side,
	/// Client-assigned order ID
	pub order_id: OrderId,
	/// Instrument symbol (e.g., "GOOG")
	pub instrument: String,
	/// Limit price
	pub price: Price,
	/// Quantity to trade
	pub quantity: Quantity,
}

/// Request to cancel a resting order
///
/// A cancel carries no instrument: the engine looks for the target order
/// in every book it knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRequest {
	/// ID of the order to remove
	pub order_id: OrderId,
}

/// A decoded order instruction as read off a client connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
	Place(OrderRequest),
	Cancel(CancelRequest),
}

impl Instruction {
	/// Build a buy instruction
	pub fn buy(
		order_id: OrderId,
		instrument: impl Into<String>,
		price: Price,
		quantity: Quantity,
	) -> Self {
		Instruction::Place(OrderRequest {
			side: Side::Buy,
			order_id,
			instrument: instrument.into(),
			price,
			quantity,
		})
	}

	/// Build a sell instruction
	pub fn sell(
		order_id: OrderId,
		instrument: impl Into<String>,
		price: Price,
		quantity: Quantity,
	) -> Self {
		Instruction::Place(OrderRequest {
			side: Side::Sell,
			order_id,
			instrument: instrument.into(),
			price,
			quantity,
		})
	}

	/// Build a cancel instruction
	pub fn cancel(order_id: OrderId) -> Self {
		Instruction::Cancel(CancelRequest { order_id })
	}

	/// Order ID carried by the instruction
	pub fn order_id(&self) -> OrderId {
		match self {
			Instruction::Place(order) => order.order_id,
			Instruction::Cancel(cancel) => cancel.order_id,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_instruction_builders() {
		let buy = Instruction::buy(7, "GOOG", 100, 5);
		assert_eq!(buy.order_id(), 7);
		match buy {
			Instruction::Place(order) => {
				assert_eq!(order.side, Side::Buy);
				assert_eq!(order.instrument, "GOOG");
			}
			Instruction::Cancel(_) => panic!("expected place"),
		}

		assert_eq!(
			Instruction::cancel(9),
			Instruction::Cancel(CancelRequest { order_id: 9 })
		);
	}
}
