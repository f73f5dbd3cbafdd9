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

use std::{
	env,
	net::{Ipv4Addr, SocketAddr},
};

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::event::EventWriterConfig;

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "matching";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Prefix of every configuration environment variable
pub const ENV_PREFIX: &str = "MATCHING";

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "MATCHING_CONFIG";

// Server configuration constants
/// Default TCP bind address (can be overridden by MATCHING_BIND_ADDR)
pub const DEFAULT_BIND_PORT: u16 = 50051;

/// Default capacity of each book's inbound queue (MATCHING_BOOK_QUEUE_CAPACITY)
pub const DEFAULT_BOOK_QUEUE_CAPACITY: usize = 1_024;

/// Default capacity of the outbound event buffer (MATCHING_EVENT_BUFFER_SIZE)
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 65_536;

/// Default number of events per writer batch (MATCHING_EVENT_BATCH_SIZE)
pub const DEFAULT_EVENT_BATCH_SIZE: usize = 256;

/// Default writer batch timeout in milliseconds (MATCHING_EVENT_BATCH_TIMEOUT_MS)
pub const DEFAULT_EVENT_BATCH_TIMEOUT_MS: u64 = 10;

/// Matching engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
	/// TCP server bind address
	pub bind_addr: SocketAddr,
	/// Capacity of each book's inbound queue
	pub book_queue_capacity: usize,
	/// Capacity of the buffer between books and the event writer
	pub event_buffer_size: usize,
	/// Maximum events per writer batch
	pub event_batch_size: usize,
	/// Maximum time the writer waits to fill a batch
	pub event_batch_timeout_ms: u64,
	/// Log every processed instruction at debug level
	pub verbose_logging: bool,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_BIND_PORT)),
			book_queue_capacity: DEFAULT_BOOK_QUEUE_CAPACITY,
			event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
			event_batch_size: DEFAULT_EVENT_BATCH_SIZE,
			event_batch_timeout_ms: DEFAULT_EVENT_BATCH_TIMEOUT_MS,
			verbose_logging: false,
		}
	}
}

impl MatchingConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(Self::env_source())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file, overridden by environment variables
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(Self::env_source())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load from the file named by `MATCHING_CONFIG` if set, else from the environment
	pub fn load() -> Result<Self, config::ConfigError> {
		match env::var(CONFIG_FILE_ENV) {
			Ok(path) if !path.is_empty() => Self::from_file(&path),
			_ => Self::from_env(),
		}
	}

	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			book_queue_capacity: self.book_queue_capacity,
			verbose_logging: self.verbose_logging,
		}
	}

	pub fn writer_config(&self) -> EventWriterConfig {
		EventWriterConfig {
			batch_size: self.event_batch_size,
			batch_timeout_ms: self.event_batch_timeout_ms,
			verbose_logging: self.verbose_logging,
		}
	}

	fn env_source() -> config::Environment {
		config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)
	}
}
