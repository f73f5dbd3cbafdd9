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

use crossbook_sdk::types::{Instruction, OrderId};

pub const INSTRUMENTS: &[&str] = &["AAPL", "GOOG", "MSFT", "AMZN", "NVDA", "META", "TSLA", "NFLX"];

#[derive(Clone, Copy)]
pub enum Scenario {
	/// Bids far below asks; every order rests
	NoCross,
	/// Alternating buy and sell at one price; nearly every order trades
	CrossHeavy,
	/// Many resting makers across levels, with an occasional large sweeping taker
	DeepBook,
}

pub struct OrderGenerator {
	counter: u32,
	scenario: Scenario,
	instruments: &'static [&'static str],
}

impl OrderGenerator {
	pub fn new(scenario: Scenario) -> Self {
		Self::with_instruments(scenario, &INSTRUMENTS[..1])
	}

	pub fn with_instruments(scenario: Scenario, instruments: &'static [&'static str]) -> Self {
		Self {
			counter: 0,
			scenario,
			instruments,
		}
	}

	fn next_id(&mut self) -> OrderId {
		self.counter = self.counter.wrapping_add(1);
		self.counter
	}

	fn instrument(&self) -> &'static str {
		self.instruments[self.counter as usize % self.instruments.len()]
	}

	pub fn next_order(&mut self) -> Instruction {
		let id = self.next_id();
		let instrument = self.instrument();

		match self.scenario {
			Scenario::NoCross => {
				if id.is_multiple_of(2) {
					Instruction::buy(id, instrument, 4_000 + id % 100, 1)
				} else {
					Instruction::sell(id, instrument, 6_000 + id % 100, 1)
				}
			}
			Scenario::CrossHeavy => {
				if id.is_multiple_of(2) {
					Instruction::buy(id, instrument, 5_000, 10)
				} else {
					Instruction::sell(id, instrument, 5_000, 10)
				}
			}
			Scenario::DeepBook => {
				if id.is_multiple_of(100) {
					// Extreme limit so the taker crosses every level
					if (id / 100).is_multiple_of(2) {
						Instruction::buy(id, instrument, u32::MAX, 5_000)
					} else {
						Instruction::sell(id, instrument, 1, 5_000)
					}
				} else {
					let offset = id % 200;
					if id.is_multiple_of(2) {
						Instruction::buy(id, instrument, 4_900 - offset, 100)
					} else {
						Instruction::sell(id, instrument, 5_100 + offset, 100)
					}
				}
			}
		}
	}

	/// Two-sided resting depth that does not cross itself
	pub fn warmup_orders(&mut self, count: usize) -> Vec<Instruction> {
		(0..count)
			.map(|i| {
				let id = self.next_id();
				let instrument = self.instrument();
				let level = (i as u32 / 2) % 200;
				if i.is_multiple_of(2) {
					Instruction::buy(id, instrument, 4_899 - level, 100)
				} else {
					Instruction::sell(id, instrument, 5_101 + level, 100)
				}
			})
			.collect()
	}
}
