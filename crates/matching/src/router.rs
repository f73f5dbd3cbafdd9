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

use std::sync::Arc;

use crossbook_sdk::types::{Instruction, MAX_INSTRUMENT_LEN, Timestamp};
use tracing::debug;

use crate::engine::EngineError;
use crate::registry::BookRegistry;
use crate::types::OrderCommand;

/// Routes decoded instructions to their books
///
/// Buy and sell instructions go to the book of their instrument, which is
/// created on first use. Cancel instructions carry no instrument and are
/// broadcast to every known book; each book answers with its own
/// `Deleted` event, so a cancel yields one `found` answer from the owning
/// book and a not-found answer from every other book.
///
/// `submit` returns once the instruction is queued, not once it is
/// matched. Instructions submitted sequentially by one caller reach each
/// book in submission order.
#[derive(Clone)]
pub struct OrderRouter {
	registry: Arc<BookRegistry>,
}

impl OrderRouter {
	pub fn new(registry: Arc<BookRegistry>) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &Arc<BookRegistry> {
		&self.registry
	}

	/// Submit one instruction stamped with its arrival time
	pub async fn submit(
		&self,
		instruction: Instruction,
		arrived_at: Timestamp,
	) -> Result<(), EngineError> {
		match &instruction {
			Instruction::Place(order) => {
				if order.instrument.is_empty() || order.instrument.len() > MAX_INSTRUMENT_LEN {
					return Err(EngineError::InvalidInstruction(format!(
						"instrument {:?} must be 1 to {} bytes",
						order.instrument, MAX_INSTRUMENT_LEN
					)));
				}
				let book = self.registry.resolve(&order.instrument);
				book.submit(OrderCommand::new(instruction, arrived_at)).await
			}
			Instruction::Cancel(cancel) => {
				let books = self.registry.all_books();
				debug!(
					target: "router",
					order_id = cancel.order_id,
					books = books.len(),
					"Broadcasting cancel"
				);
				for book in books {
					book.submit(OrderCommand::new(instruction.clone(), arrived_at))
						.await?;
				}
				Ok(())
			}
		}
	}
}
