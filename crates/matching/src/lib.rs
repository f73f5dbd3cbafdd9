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

//! Crossbook Matching Engine
//!
//! This crate provides a concurrent, per-instrument matching engine for
//! limit orders. Every instrument gets its own order book, owned by a
//! dedicated worker task; books are created on first use and run fully in
//! parallel with each other.
//!
//! Architecture:
//! - Registry: instrument -> book, create-if-absent on a concurrent map
//! - Router: buy/sell to one book, cancel broadcast to every book
//! - Book worker: serialized processing of one instrument's instructions
//! - Order book: arrival-order scan among price-eligible resting orders
//! - Event sink: async publish contract, with a bounded buffer and a
//!   batching line writer behind it
//! - Server: TCP intake reading one instruction per line

pub mod clock;
pub mod config;
pub mod engine;
pub mod event;
pub mod logging;
pub mod orderbook;
pub mod queue;
pub mod registry;
pub mod router;
pub mod server;
pub mod types;

pub use engine::{BookSnapshot, BookState, BookWorker, EngineConfig, EngineError};
pub use event::{
	EventBuffer, EventConsumer, EventProducer, EventSink, EventWriter, EventWriterConfig,
	MatchingEvent, MemoryEventSink,
};
pub use orderbook::OrderBook;
pub use queue::{BookMessage, BookQueue, QueueReceiver, QueueSender};
pub use registry::{BookHandle, BookRegistry};
pub use router::OrderRouter;
pub use server::MatchingServer;
pub use types::*;
