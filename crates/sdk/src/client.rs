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

//! TCP client for the matching engine order port

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::codec::encode_instruction;
use crate::types::{Instruction, OrderId, Price, Quantity};

/// Error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Connection closed")]
	Closed,
}

/// Client for submitting instructions to the matching engine
///
/// Instructions are written in the line format understood by the engine's
/// connection intake. Writes are buffered; call [`Client::flush`] to push
/// them onto the socket. The engine
/// processes instructions from one connection in the order they were
/// written.
pub struct Client {
	writer: BufWriter<TcpStream>,
	peer: SocketAddr,
}

impl Client {
	/// Connect to a matching engine order port
	pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
		let stream = TcpStream::connect(addr)
			.await
			.map_err(|e| ClientError::Network(format!("Connect failed: {}", e)))?;
		stream
			.set_nodelay(true)
			.map_err(|e| ClientError::Network(format!("Failed to set TCP_NODELAY: {}", e)))?;
		let peer = stream
			.peer_addr()
			.map_err(|e| ClientError::Network(format!("Failed to read peer address: {}", e)))?;

		Ok(Self {
			writer: BufWriter::new(stream),
			peer,
		})
	}

	/// Address of the engine this client is connected to
	pub fn peer_addr(&self) -> SocketAddr {
		self.peer
	}

	/// Queue an instruction for sending
	pub async fn submit(&mut self, instruction: &Instruction) -> Result<(), ClientError> {
		let mut line = encode_instruction(instruction);
		line.push('\n');
		self.writer
			.write_all(line.as_bytes())
			.await
			.map_err(|e| ClientError::Network(format!("Write failed: {}", e)))
	}

	/// Queue a buy order
	pub async fn buy(
		&mut self,
		order_id: OrderId,
		instrument: &str,
		price: Price,
		quantity: Quantity,
	) -> Result<(), ClientError> {
		self.submit(&Instruction::buy(order_id, instrument, price, quantity))
			.await
	}

	/// Queue a sell order
	pub async fn sell(
		&mut self,
		order_id: OrderId,
		instrument: &str,
		price: Price,
		quantity: Quantity,
	) -> Result<(), ClientError> {
		self.submit(&Instruction::sell(order_id, instrument, price, quantity))
			.await
	}

	/// Queue a cancel for a resting order
	pub async fn cancel(&mut self, order_id: OrderId) -> Result<(), ClientError> {
		self.submit(&Instruction::cancel(order_id)).await
	}

	/// Flush buffered instructions onto the socket
	pub async fn flush(&mut self) -> Result<(), ClientError> {
		self.writer.flush().await.map_err(|e| match e.kind() {
			std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
				ClientError::Closed
			}
			_ => ClientError::Network(format!("Flush failed: {}", e)),
		})
	}

	/// Flush pending instructions and close the write side of the connection
	pub async fn close(mut self) -> Result<(), ClientError> {
		self.flush().await?;
		self.writer
			.shutdown()
			.await
			.map_err(|e| ClientError::Network(format!("Shutdown failed: {}", e)))
	}
}
