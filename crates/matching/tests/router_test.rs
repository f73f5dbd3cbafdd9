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

//! Router behaviour across books: cancel broadcast, book creation and
//! ordering guarantees

use std::{collections::HashMap, sync::Arc};

use crossbook_matching::{
	BookRegistry, EngineConfig, MatchingEvent, MemoryEventSink, OrderRouter,
};
use crossbook_sdk::types::Instruction;

fn setup() -> (OrderRouter, Arc<BookRegistry>, Arc<MemoryEventSink>) {
	let sink = Arc::new(MemoryEventSink::new());
	let registry = Arc::new(BookRegistry::new(EngineConfig::default(), sink.clone()));
	(OrderRouter::new(registry.clone()), registry, sink)
}

/// Wait until every book has processed everything submitted so far
async fn settle(registry: &BookRegistry) {
	for book in registry.all_books() {
		book.snapshot().await.unwrap();
	}
}

fn deletions(events: &[MatchingEvent]) -> Vec<(String, u32, bool)> {
	events
		.iter()
		.filter_map(|e| match e {
			MatchingEvent::Deleted {
				instrument,
				order_id,
				found,
				..
			} => Some((instrument.clone(), *order_id, *found)),
			_ => None,
		})
		.collect()
}

#[tokio::test]
async fn test_cancel_found_in_one_book_only() {
	let (router, registry, sink) = setup();

	router.submit(Instruction::sell(3, "X", 10, 5), 1).await.unwrap();
	router.submit(Instruction::buy(4, "Y", 20, 1), 2).await.unwrap();
	router.submit(Instruction::sell(5, "Y", 21, 1), 3).await.unwrap();
	settle(&registry).await;
	sink.take().await;

	router.submit(Instruction::cancel(3), 10).await.unwrap();
	settle(&registry).await;

	let mut deleted = deletions(&sink.take().await);
	deleted.sort();
	assert_eq!(
		deleted,
		vec![("X".to_string(), 3, true), ("Y".to_string(), 3, false)]
	);

	let x = registry.get("X").unwrap().snapshot().await.unwrap();
	assert_eq!(x.order_count(), 0);
	let y = registry.get("Y").unwrap().snapshot().await.unwrap();
	assert_eq!(y.order_count(), 2);

	registry.close().await;
}

#[tokio::test]
async fn test_cancel_unknown_order_everywhere_not_found() {
	let (router, registry, sink) = setup();

	for (id, instrument) in ["A", "B", "C"].iter().enumerate() {
		router
			.submit(Instruction::buy(id as u32 + 1, *instrument, 10, 1), 0)
			.await
			.unwrap();
	}
	settle(&registry).await;
	sink.take().await;

	router.submit(Instruction::cancel(999), 5).await.unwrap();
	settle(&registry).await;

	let deleted = deletions(&sink.take().await);
	assert_eq!(deleted.len(), 3);
	assert!(deleted.iter().all(|(_, id, found)| *id == 999 && !found));

	registry.close().await;
}

#[tokio::test]
async fn test_filled_order_not_found_by_cancel() {
	let (router, registry, sink) = setup();

	router.submit(Instruction::buy(1, "X", 10, 5), 1).await.unwrap();
	router.submit(Instruction::sell(2, "X", 10, 5), 2).await.unwrap();
	router.submit(Instruction::buy(3, "Y", 10, 5), 3).await.unwrap();
	router.submit(Instruction::cancel(1), 4).await.unwrap();
	settle(&registry).await;

	let deleted = deletions(&sink.events().await);
	assert_eq!(deleted.len(), 2);
	assert!(deleted.iter().all(|(_, _, found)| !found));

	registry.close().await;
}

#[tokio::test]
async fn test_same_id_on_two_instruments_both_cancelled() {
	let (router, registry, sink) = setup();

	router.submit(Instruction::buy(7, "X", 10, 5), 1).await.unwrap();
	router.submit(Instruction::buy(7, "Y", 10, 5), 2).await.unwrap();
	router.submit(Instruction::cancel(7), 3).await.unwrap();
	settle(&registry).await;

	let deleted = deletions(&sink.events().await);
	assert_eq!(deleted.iter().filter(|(_, _, found)| *found).count(), 2);

	registry.close().await;
}

#[tokio::test]
async fn test_single_caller_order_preserved() {
	let (router, registry, sink) = setup();

	for id in 1..=1_000u32 {
		router
			.submit(Instruction::buy(id, "GOOG", id % 50 + 1, 1), id as i64)
			.await
			.unwrap();
	}
	settle(&registry).await;

	let ids: Vec<u32> = sink.events().await.iter().map(|e| e.order_id()).collect();
	assert_eq!(ids, (1..=1_000).collect::<Vec<_>>());

	registry.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_keep_their_own_order() {
	const CALLERS: u32 = 8;
	const PER_CALLER: u32 = 500;
	const INSTRUMENTS: [&str; 4] = ["A", "B", "C", "D"];

	let (router, registry, sink) = setup();

	let tasks: Vec<_> = (0..CALLERS)
		.map(|caller| {
			let router = router.clone();
			tokio::spawn(async move {
				for seq in 0..PER_CALLER {
					let id = caller * 100_000 + seq;
					let instrument = INSTRUMENTS[(seq % 4) as usize];
					// Buys only, so nothing trades and every order is Added
					router
						.submit(Instruction::buy(id, instrument, 10, 1), seq as i64)
						.await
						.unwrap();
				}
			})
		})
		.collect();
	for task in tasks {
		task.await.unwrap();
	}
	settle(&registry).await;

	assert_eq!(registry.len(), INSTRUMENTS.len());

	let events = sink.events().await;
	assert_eq!(events.len(), (CALLERS * PER_CALLER) as usize);

	// Per (instrument, caller), ids must appear in submission order
	let mut last: HashMap<(String, u32), u32> = HashMap::new();
	for event in &events {
		let id = event.order_id();
		let key = (event.instrument().to_string(), id / 100_000);
		if let Some(previous) = last.insert(key, id) {
			assert!(previous < id, "order {} processed after {}", previous, id);
		}
	}

	registry.close().await;
}

#[tokio::test]
async fn test_duplicate_id_rejected_per_book() {
	let (router, registry, sink) = setup();

	router.submit(Instruction::buy(1, "X", 10, 5), 1).await.unwrap();
	router.submit(Instruction::buy(1, "X", 11, 5), 2).await.unwrap();
	// Same id on another instrument is independent
	router.submit(Instruction::sell(1, "Y", 10, 5), 3).await.unwrap();
	settle(&registry).await;

	let events = sink.events().await;
	let rejected: Vec<_> = events
		.iter()
		.filter(|e| matches!(e, MatchingEvent::Rejected { .. }))
		.collect();
	assert_eq!(rejected.len(), 1);
	assert_eq!(rejected[0].instrument(), "X");

	let x = registry.get("X").unwrap().snapshot().await.unwrap();
	assert_eq!(x.bids.len(), 1);
	assert_eq!(x.bids[0].price, 10);

	registry.close().await;
}
