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

//! TCP intake for the matching engine
//!
//! This module implements the connection layer, which is concurrent
//! across connections and sequential within each one:
//! - Accepting client connections
//! - Reading newline-terminated instructions in order
//! - Stamping each instruction with its arrival time at read time
//! - Decoding and handing instructions to the router
//!
//! The intake does NOT perform matching. A connection task waits on the
//! router only while a book queue is full.

use std::{io, net::SocketAddr};

use crossbook_sdk::codec::decode_instruction;
use tokio::{
	io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader},
	net::TcpListener,
	sync::watch,
	task::JoinSet,
};
use tracing::{debug, error, info, warn};

use crate::{clock::now_micros, engine::EngineError, router::OrderRouter};

/// Per-connection counters, logged when the connection closes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
	pub lines: u64,
	pub submitted: u64,
	pub malformed: u64,
}

/// Matching TCP server
///
/// Owns the listener. Each accepted connection runs in its own task and
/// submits through a clone of the router.
pub struct MatchingServer {
	listener: TcpListener,
	router: OrderRouter,
}

impl MatchingServer {
	/// Bind the listener
	pub async fn bind(addr: SocketAddr, router: OrderRouter) -> io::Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		Ok(Self { listener, router })
	}

	pub fn local_addr(&self) -> io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	/// Accept connections until `shutdown` flips to `true` or its sender is dropped
	///
	/// On shutdown, stops accepting, tells every connection to stop reading
	/// and waits for the connection tasks to finish. Books are left running.
	pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
		let addr = self.listener.local_addr()?;
		info!(target: "server", "Accepting connections on {}", addr);

		let mut connections = JoinSet::new();

		loop {
			if *shutdown.borrow() {
				break;
			}

			tokio::select! {
				biased;
				changed = shutdown.changed() => {
					if changed.is_err() {
						break;
					}
				}
				Some(finished) = connections.join_next(), if !connections.is_empty() => {
					if let Err(e) = finished {
						error!(target: "server", "Connection task failed: {}", e);
					}
				}
				accepted = self.listener.accept() => match accepted {
					Ok((stream, peer)) => {
						debug!(target: "server", %peer, "Accepted connection");
						connections.spawn(handle_connection(
							stream,
							peer,
							self.router.clone(),
							shutdown.clone(),
						));
					}
					Err(e) => {
						// Per-connection accept failures (e.g. reset before accept) are not fatal
						warn!(target: "server", "Accept failed: {}", e);
					}
				},
			}
		}

		info!(
			target: "server",
			open_connections = connections.len(),
			"Stopped accepting connections"
		);
		while let Some(finished) = connections.join_next().await {
			if let Err(e) = finished {
				error!(target: "server", "Connection task failed: {}", e);
			}
		}

		Ok(())
	}
}

/// Longest instruction line accepted, excluding the newline
pub const MAX_LINE_LEN: usize = 1024;

/// Outcome of reading one line off a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
	/// A full line (possibly unterminated at end of stream) is in the buffer
	Line,
	/// The line exceeded `max_len` and was discarded through its newline
	TooLong,
	Eof,
}

/// Read one newline-terminated line into `buf`, capped at `max_len` bytes
///
/// Bytes already in `buf` count toward the cap, so a read interrupted by
/// `select!` resumes where it left off.
async fn read_line_capped<R>(
	reader: &mut R,
	buf: &mut Vec<u8>,
	max_len: usize,
) -> io::Result<LineRead>
where
	R: AsyncBufRead + Unpin,
{
	let limit = (max_len + 1).saturating_sub(buf.len()) as u64;
	(&mut *reader).take(limit).read_until(b'\n', buf).await?;

	if buf.last() == Some(&b'\n') {
		return Ok(LineRead::Line);
	}
	if buf.len() > max_len {
		discard_through_newline(reader).await?;
		return Ok(LineRead::TooLong);
	}
	if buf.is_empty() {
		return Ok(LineRead::Eof);
	}
	Ok(LineRead::Line)
}

async fn discard_through_newline<R>(reader: &mut R) -> io::Result<()>
where
	R: AsyncBufRead + Unpin,
{
	loop {
		let available = reader.fill_buf().await?;
		if available.is_empty() {
			return Ok(());
		}
		let newline = available.iter().position(|b| *b == b'\n');
		let len = available.len();
		match newline {
			Some(pos) => {
				reader.consume(pos + 1);
				return Ok(());
			}
			None => reader.consume(len),
		}
	}
}

/// Read instructions off one connection until end of stream, I/O error or shutdown
///
/// Lines that are not UTF-8, longer than [`MAX_LINE_LEN`] or fail to
/// decode are counted as malformed and skipped.
pub async fn handle_connection<S>(
	stream: S,
	peer: SocketAddr,
	router: OrderRouter,
	mut shutdown: watch::Receiver<bool>,
) -> ConnectionStats
where
	S: AsyncRead + Unpin,
{
	let mut stats = ConnectionStats::default();
	let mut reader = BufReader::new(stream);
	let mut buf = Vec::with_capacity(128);

	loop {
		if *shutdown.borrow() {
			debug!(target: "server", %peer, "Closing connection on shutdown");
			break;
		}

		let read = tokio::select! {
			biased;
			changed = shutdown.changed() => {
				if changed.is_err() {
					break;
				}
				continue;
			}
			read = read_line_capped(&mut reader, &mut buf, MAX_LINE_LEN) => read,
		};

		match read {
			Ok(LineRead::Line) => {}
			Ok(LineRead::TooLong) => {
				stats.lines += 1;
				stats.malformed += 1;
				warn!(target: "server", %peer, max = MAX_LINE_LEN, "Skipping oversized line");
				buf.clear();
				continue;
			}
			Ok(LineRead::Eof) => break,
			Err(e) => {
				warn!(target: "server", %peer, "Read failed: {}", e);
				break;
			}
		}
		let arrived_at = now_micros();
		stats.lines += 1;

		let decoded = match std::str::from_utf8(&buf) {
			Ok(line) if line.trim().is_empty() => None,
			Ok(line) => Some(decode_instruction(line).map_err(|e| e.to_string())),
			Err(e) => Some(Err(format!("invalid UTF-8: {}", e))),
		};
		let instruction = match decoded {
			None => {
				buf.clear();
				continue;
			}
			Some(Ok(instruction)) => instruction,
			Some(Err(reason)) => {
				stats.malformed += 1;
				warn!(
					target: "server",
					%peer,
					line = %String::from_utf8_lossy(&buf).trim(),
					"Skipping malformed instruction: {}",
					reason
				);
				buf.clear();
				continue;
			}
		};
		buf.clear();

		match router.submit(instruction, arrived_at).await {
			Ok(()) => stats.submitted += 1,
			Err(EngineError::InvalidInstruction(reason)) => {
				stats.malformed += 1;
				warn!(target: "server", %peer, "Skipping invalid instruction: {}", reason);
			}
			Err(e) => {
				error!(target: "server", %peer, "Failed to submit instruction: {}", e);
				break;
			}
		}
	}

	info!(
		target: "server",
		%peer,
		lines = stats.lines,
		submitted = stats.submitted,
		malformed = stats.malformed,
		"Connection closed"
	);
	stats
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	use tokio::io::AsyncWriteExt;

	use crate::{
		engine::EngineConfig,
		event::{MatchingEvent, MemoryEventSink},
		registry::BookRegistry,
	};

	async fn run_connection(input: &[u8]) -> (ConnectionStats, Vec<u32>, Arc<BookRegistry>) {
		let sink = Arc::new(MemoryEventSink::new());
		let registry = Arc::new(BookRegistry::new(EngineConfig::default(), sink.clone()));
		let router = OrderRouter::new(registry.clone());
		let (_shutdown_tx, shutdown_rx) = watch::channel(false);

		let (mut client, server) = tokio::io::duplex(64 * 1024);
		client.write_all(input).await.unwrap();
		drop(client);

		let stats = handle_connection(
			server,
			"127.0.0.1:9000".parse().unwrap(),
			router,
			shutdown_rx,
		)
		.await;

		if let Some(book) = registry.get("GOOG") {
			book.snapshot().await.unwrap();
		}
		let added = sink
			.events()
			.await
			.iter()
			.filter_map(|e| match e {
				MatchingEvent::Added { order_id, .. } => Some(*order_id),
				_ => None,
			})
			.collect();
		(stats, added, registry)
	}

	#[tokio::test]
	async fn test_invalid_utf8_line_is_skipped() {
		let (stats, added, registry) =
			run_connection(b"B 1 GOOG 10 5\nB 2 GO\xffOG 10 5\nB 3 GOOG 10 5\n").await;

		assert_eq!(
			stats,
			ConnectionStats {
				lines: 3,
				submitted: 2,
				malformed: 1,
			}
		);
		assert_eq!(added, vec![1, 3]);
		registry.close().await;
	}

	#[tokio::test]
	async fn test_oversized_line_is_skipped() {
		let mut input = b"B 1 GOOG 10 5\n".to_vec();
		input.extend(std::iter::repeat_n(b'x', MAX_LINE_LEN * 5));
		input.extend_from_slice(b"\nB 3 GOOG 10 5\n");

		let (stats, added, registry) = run_connection(&input).await;

		assert_eq!(
			stats,
			ConnectionStats {
				lines: 3,
				submitted: 2,
				malformed: 1,
			}
		);
		assert_eq!(added, vec![1, 3]);
		registry.close().await;
	}

	#[tokio::test]
	async fn test_line_at_cap_and_unterminated_tail_are_read() {
		// Padding with spaces keeps the line decodable at exactly the cap
		let mut input = b"B 1 GOOG 10 5".to_vec();
		input.resize(MAX_LINE_LEN, b' ');
		input.extend_from_slice(b"\nB 2 GOOG 10 5");

		let (stats, added, registry) = run_connection(&input).await;

		assert_eq!(stats.submitted, 2);
		assert_eq!(stats.malformed, 0);
		assert_eq!(added, vec![1, 2]);
		registry.close().await;
	}
}
