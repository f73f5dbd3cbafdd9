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

//! Crossbook SDK - shared instruction types and client for order submission
//!
//! This crate provides the order instruction model shared by the matching
//! engine and its clients, the line-oriented wire codec used on the order
//! port, and an async TCP client.
//!
//! The SDK is designed to be lightweight and embeddable:
//! - No background threads
//! - No runtime initialization
//! - No environment or configuration loading

pub mod client;
pub mod codec;
pub mod types;

pub use client::{Client, ClientError};
pub use codec::{CodecError, decode_instruction, encode_instruction};
pub use types::*;
