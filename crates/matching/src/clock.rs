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

//! Process-wide monotonic clock in microseconds

use std::sync::OnceLock;
use std::time::Instant;

use crossbook_sdk::types::Timestamp;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Microseconds elapsed since the first clock reading in this process
///
/// Readings never go backwards and are comparable across threads.
pub fn now_micros() -> Timestamp {
	let epoch = EPOCH.get_or_init(Instant::now);
	Timestamp::try_from(epoch.elapsed().as_micros()).unwrap_or(Timestamp::MAX)
}
