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

//! Matching engine service entry point
//!
//! This binary wires up all components of the matching engine:
//! - Event Buffer (books -> event writer)
//! - Event Writer (event lines on stdout)
//! - Book Registry and Order Router (one worker per instrument)
//! - TCP Server (one task per connection)

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{signal, sync::watch};
use tracing::{info, warn};

use crossbook_matching::{
	BookRegistry, EventBuffer, EventWriter, MatchingServer, OrderRouter, config::MatchingConfig,
	logging::init_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
	dotenv::dotenv().ok();

	// Initialize logging first
	init_logging()?;

	let config = MatchingConfig::load().context("Failed to load matching configuration")?;

	info!(target: "server", "Starting Crossbook Matching Engine");
	info!(target: "server", "Listening on: {}", config.bind_addr);
	info!(target: "server", "Book queue capacity: {}", config.book_queue_capacity);
	info!(target: "server", "Event buffer size: {}", config.event_buffer_size);

	// Phase 1: Event buffer and writer on stdout
	let (event_producer, event_consumer) = EventBuffer::new(config.event_buffer_size).split();
	let event_writer = EventWriter::start(
		event_consumer,
		tokio::io::stdout(),
		config.writer_config(),
	);

	// Phase 2: Registry and router; books are created on demand
	let registry = Arc::new(BookRegistry::new(
		config.engine_config(),
		Arc::new(event_producer),
	));
	let router = OrderRouter::new(registry.clone());

	// Phase 3: TCP server
	let server = MatchingServer::bind(config.bind_addr, router)
		.await
		.with_context(|| format!("Failed to bind {}", config.bind_addr))?;
	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let mut server_task = tokio::spawn(server.serve(shutdown_rx));

	tokio::select! {
		result = &mut server_task => {
			result
				.context("Server task panicked")?
				.context("Server error")?;
			warn!(target: "server", "Server stopped unexpectedly");
		}
		_ = signal::ctrl_c() => {
			info!(target: "server", "Shutting down...");
			shutdown_tx.send(true).ok();
			match server_task.await {
				Ok(Ok(())) => {}
				Ok(Err(e)) => warn!(target: "server", "Server error during shutdown: {}", e),
				Err(e) => warn!(target: "server", "Server task failed during shutdown: {}", e),
			}
		}
	}

	// Closing the books and dropping the registry releases the last event
	// producers, so the writer drains the buffer and stops on its own.
	registry.close().await;
	drop(registry);
	let events_written = event_writer.join().await;

	info!(target: "server", events_written, "Shutdown complete");
	Ok(())
}
