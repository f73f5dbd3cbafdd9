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

//! Line codec for order instructions
//!
//! Each instruction is one newline-terminated ASCII line with
//! whitespace-separated fields:
//!
//! ```text
//! B <order_id> <instrument> <price> <quantity>
//! S <order_id> <instrument> <price> <quantity>
//! C <order_id>
//! ```
//!
//! Tokens after the order ID of a cancel are ignored.

use std::str::SplitWhitespace;

use thiserror::Error;

use crate::types::{CancelRequest, Instruction, MAX_INSTRUMENT_LEN, OrderRequest, Side};

/// Errors produced while decoding an instruction line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
	#[error("Empty instruction")]
	Empty,
	#[error("Unknown instruction type: {0}")]
	UnknownCommand(String),
	#[error("Missing field: {0}")]
	MissingField(&'static str),
	#[error("Invalid {field}: {value}")]
	InvalidNumber { field: &'static str, value: String },
	#[error("Order quantity must be greater than 0")]
	ZeroQuantity,
	#[error("Instrument {0} exceeds {max} bytes", max = MAX_INSTRUMENT_LEN)]
	InstrumentTooLong(String),
}

/// Decode a single instruction line
pub fn decode_instruction(line: &str) -> Result<Instruction, CodecError> {
	let mut fields = line.split_whitespace();
	let command = fields.next().ok_or(CodecError::Empty)?;

	match command {
		"B" | "b" => decode_order(Side::Buy, &mut fields),
		"S" | "s" => decode_order(Side::Sell, &mut fields),
		"C" | "c" => {
			let order_id = next_number(&mut fields, "order_id")?;
			Ok(Instruction::Cancel(CancelRequest { order_id }))
		}
		other => Err(CodecError::UnknownCommand(other.to_string())),
	}
}

/// Encode an instruction as a line (without the trailing newline)
pub fn encode_instruction(instruction: &Instruction) -> String {
	match instruction {
		Instruction::Place(order) => format!(
			"{} {} {} {} {}",
			order.side.code(),
			order.order_id,
			order.instrument,
			order.price,
			order.quantity
		),
		Instruction::Cancel(cancel) => format!("C {}", cancel.order_id),
	}
}

fn decode_order(side: Side, fields: &mut SplitWhitespace<'_>) -> Result<Instruction, CodecError> {
	let order_id = next_number(fields, "order_id")?;
	let instrument = fields
		.next()
		.ok_or(CodecError::MissingField("instrument"))?;
	if instrument.len() > MAX_INSTRUMENT_LEN {
		return Err(CodecError::InstrumentTooLong(instrument.to_string()));
	}
	let price = next_number(fields, "price")?;
	let quantity = next_number(fields, "quantity")?;
	if quantity == 0 {
		return Err(CodecError::ZeroQuantity);
	}

	Ok(Instruction::Place(OrderRequest {
		side,
		order_id,
		instrument: instrument.to_string(),
		price,
		quantity,
	}))
}

fn next_number(fields: &mut SplitWhitespace<'_>, field: &'static str) -> Result<u32, CodecError> {
	let raw = fields.next().ok_or(CodecError::MissingField(field))?;
	raw.parse().map_err(|_| CodecError::InvalidNumber {
		field,
		value: raw.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_buy_and_sell() {
		assert_eq!(
			decode_instruction("B 123 GOOG 2705 30").unwrap(),
			Instruction::buy(123, "GOOG", 2705, 30)
		);
		assert_eq!(
			decode_instruction("  S 124   GOOG 2700 10\r").unwrap(),
			Instruction::sell(124, "GOOG", 2700, 10)
		);
	}

	#[test]
	fn test_decode_cancel_ignores_trailing_fields() {
		assert_eq!(
			decode_instruction("C 123").unwrap(),
			Instruction::cancel(123)
		);
		assert_eq!(
			decode_instruction("C 123 GOOG 10 10").unwrap(),
			Instruction::cancel(123)
		);
	}

	#[test]
	fn test_decode_errors() {
		assert_eq!(decode_instruction("   "), Err(CodecError::Empty));
		assert!(matches!(
			decode_instruction("X 1"),
			Err(CodecError::UnknownCommand(cmd)) if cmd == "X"
		));
		assert_eq!(
			decode_instruction("B 1 GOOG 10"),
			Err(CodecError::MissingField("quantity"))
		);
		assert!(matches!(
			decode_instruction("S 1 GOOG ten 5"),
			Err(CodecError::InvalidNumber { field: "price", .. })
		));
		assert_eq!(
			decode_instruction("B 1 GOOG 10 0"),
			Err(CodecError::ZeroQuantity)
		);
		assert!(matches!(
			decode_instruction("B 1 TOOLONGSYM 10 1"),
			Err(CodecError::InstrumentTooLong(_))
		));
		assert!(matches!(
			decode_instruction("C -4"),
			Err(CodecError::InvalidNumber { field: "order_id", .. })
		));
	}

	#[test]
	fn test_encoded_line_decodes_to_same_instruction() {
		let instruction = Instruction::sell(42, "AAPL", 150, 7);
		let line = encode_instruction(&instruction);
		assert_eq!(line, "S 42 AAPL 150 7");
		assert_eq!(decode_instruction(&line).unwrap(), instruction);
		assert_eq!(encode_instruction(&Instruction::cancel(42)), "C 42");
	}
}
