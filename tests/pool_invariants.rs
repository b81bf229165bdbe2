//! Property tests: random scroll, resize and delivery sequences never break
//! the window.
//!
//! Checked after every tick:
//! 1. Pool size equals the window size and matches the surface
//! 2. No two live slots share a coordinate
//! 3. Frozen slots keep frozen labels, scrollable slots never take one
//! 4. Every element sits where its label and the scroll offset put it
//! 5. Filled slots show their own coordinate's content
//! 6. In-flight batches never exceed the cap
//! 7. Frozen slots keep the ids and labels they had after the last
//!    allocation
//!
//! And once everything settles, one rebuild fills every in-bounds slot.

use std::collections::HashSet;

use infinite_grid::core::fetch::{FetchBatch, StoreCommand};
use infinite_grid::core::pool::{ContentState, SlotId};
use infinite_grid::core::{
    ContentEntry, Coord, Delivery, Dimensions, GridEngine, GridSettings, MemorySurface, RenderingMode,
    SlotContent,
};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Scroll(u64, u64),
    Resize(u32, u32),
    Deliver(usize),
    Tick,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..=600, 0u64..=800).prop_map(|(x, y)| Op::Scroll(x, y)),
        1 => (20u32..=90, 20u32..=70).prop_map(|(w, h)| Op::Resize(w, h)),
        3 => any::<usize>().prop_map(Op::Deliver),
        2 => Just(Op::Tick),
    ]
}

#[derive(Debug, Clone, Copy)]
struct Shape {
    frozen_rows: u32,
    frozen_columns: u32,
    buffer_x: u32,
    buffer_y: u32,
    requests: usize,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    (0u32..=2, 0u32..=2, 1u32..=3, 1u32..=4, 1usize..=3).prop_map(
        |(frozen_rows, frozen_columns, buffer_x, buffer_y, requests)| Shape {
            frozen_rows,
            frozen_columns,
            buffer_x,
            buffer_y,
            requests,
        },
    )
}

// ── Harness ───────────────────────────────────────────────────────────

struct Harness {
    engine: GridEngine<MemorySurface>,
    outstanding: Vec<FetchBatch>,
    pinned: Vec<(SlotId, Coord)>,
}

impl Harness {
    fn new(shape: Shape) -> Self {
        let dims =
            Dimensions::new(10, 10, 60, 80, shape.frozen_rows, shape.frozen_columns).unwrap();
        let settings = GridSettings::new(
            dims,
            shape.buffer_x,
            shape.buffer_y,
            RenderingMode::PlainText,
            shape.requests,
        )
        .unwrap();
        let mut harness = Self {
            engine: GridEngine::new(settings, MemorySurface::new(), 50, 40),
            outstanding: Vec::new(),
            pinned: Vec::new(),
        };
        harness.pin();
        harness.collect();
        harness
    }

    /// Snapshot of every frozen slot; only an allocation may change it.
    fn pin(&mut self) {
        let pool = self.engine.pool();
        self.pinned = pool.frozen_slots().map(|id| (id, pool.slot(id).coord)).collect();
    }

    fn check(&self) -> Result<(), TestCaseError> {
        check(&self.engine)?;
        let pool = self.engine.pool();
        let now: Vec<_> = pool.frozen_slots().map(|id| (id, pool.slot(id).coord)).collect();
        prop_assert_eq!(&now, &self.pinned, "frozen slots moved");
        Ok(())
    }

    fn collect(&mut self) {
        for command in self.engine.drain_commands() {
            if let StoreCommand::Fetch(batch) = command {
                self.outstanding.push(batch);
            }
        }
    }

    fn deliver(&mut self, index: usize) {
        if self.outstanding.is_empty() {
            return;
        }
        let batch = self.outstanding.remove(index % self.outstanding.len());
        let delivery = Delivery {
            entries: batch
                .coords
                .iter()
                .map(|c| ContentEntry::text(c.x, c.y, label(c.x, c.y)))
                .collect(),
            resources: Vec::new(),
        };
        self.engine.on_delivered(batch.id, delivery);
    }

    fn run(&mut self, op: Op) {
        match op {
            Op::Scroll(x, y) => self.engine.on_scroll(x, y),
            Op::Resize(w, h) => {
                if self.engine.resize(w, h) {
                    self.pin();
                }
            }
            Op::Deliver(i) => self.deliver(i),
            Op::Tick => {
                self.engine.tick();
            }
        }
        self.collect();
    }

    fn settle(&mut self) {
        while !self.outstanding.is_empty() {
            self.deliver(0);
        }
        self.engine.tick();
        self.collect();
    }
}

fn label(x: i64, y: i64) -> String {
    format!("({x}, {y})")
}

fn check(engine: &GridEngine<MemorySurface>) -> Result<(), TestCaseError> {
    let pool = engine.pool();
    let frozen = engine.frozen();
    let viewport = engine.viewport();
    let (scroll_left, _) = engine.scroll_offset();

    prop_assert_eq!(pool.len(), viewport.max_x() * viewport.max_y());
    prop_assert_eq!(engine.surface().len(), pool.len());
    prop_assert!(engine.in_progress() <= engine.requests_allowed());

    let coords: HashSet<_> = pool.slots().iter().map(|s| s.coord).collect();
    prop_assert_eq!(coords.len(), pool.len(), "duplicate labels");

    for (id, slot) in pool.slots().iter().enumerate() {
        let c = slot.coord;
        prop_assert_eq!(slot.header, frozen.is_header_row(c.y), "row label {}", c);
        prop_assert_eq!(slot.leading, frozen.is_leading_column(c.x), "column label {}", c);

        let element = engine.surface().element(id).unwrap();
        let expected = frozen.offset(slot, scroll_left);
        prop_assert_eq!((element.left, element.top), expected, "slot {} at {}", id, c);

        if slot.state == ContentState::Filled {
            prop_assert_eq!(
                element.content.clone(),
                Some(SlotContent::Text(label(c.x, c.y)))
            );
        }
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// Invariants under random input
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_invariants_hold(shape in arb_shape(), ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut harness = Harness::new(shape);
        harness.check()?;
        for op in ops {
            let ticked = matches!(op, Op::Tick);
            harness.run(op);
            if ticked {
                harness.check()?;
            }
        }
        harness.engine.tick();
        harness.collect();
        harness.check()?;
        prop_assert_eq!(harness.engine.fetch_stats().overflows, 0);
    }

    #[test]
    fn rebuild_after_settling_fills_the_window(
        shape in arb_shape(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let mut harness = Harness::new(shape);
        for op in ops {
            harness.run(op);
        }
        harness.engine.tick();
        harness.collect();
        harness.settle();
        prop_assert_eq!(harness.engine.in_progress(), 0);

        harness.engine.rebuild();
        harness.collect();
        harness.settle();
        harness.check()?;

        let dims = *harness.engine.settings().dimensions();
        for slot in harness.engine.pool().slots() {
            let expected = if dims.contains(slot.coord) {
                ContentState::Filled
            } else {
                ContentState::Empty
            };
            prop_assert_eq!(slot.state, expected, "slot at {}", slot.coord);
        }
    }

    #[test]
    fn scrolling_keeps_element_count(ys in prop::collection::vec(0u64..=800, 1..30)) {
        let shape = Shape { frozen_rows: 1, frozen_columns: 1, buffer_x: 1, buffer_y: 2, requests: 2 };
        let mut harness = Harness::new(shape);
        let created = harness.engine.surface().created();
        for y in ys {
            harness.run(Op::Scroll(y / 2, y));
            harness.run(Op::Tick);
            harness.settle();
        }
        prop_assert_eq!(harness.engine.surface().created(), created);
    }
}
