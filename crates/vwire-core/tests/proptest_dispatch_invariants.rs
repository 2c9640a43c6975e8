//! Property-based invariant tests for edge-triggered dispatch.
//!
//! A reference model (registered set + edge flag + per-observer delivery
//! counts) is driven alongside a real [`Dispatcher`] by arbitrary operation
//! sequences. Invariants checked:
//!
//! 1. Delivery happens only when the edge flag was armed.
//! 2. An armed notify delivers exactly once to each registered observer.
//! 3. Registration is idempotent; `count_observers` is exact.
//! 4. Teardown empties the registry and is always safe.
//! 5. The edge flag state matches the model after any sequence.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::rc::Rc;

use proptest::prelude::*;
use vwire_core::dispatch::Dispatcher;
use vwire_core::observe::Aspect;
use vwire_core::testkit::Probe;

const POOL: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Delete(usize),
    Mark,
    Notify,
    Emit,
    Teardown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..POOL).prop_map(Op::Add),
        (0..POOL).prop_map(Op::Delete),
        Just(Op::Mark),
        Just(Op::Notify),
        Just(Op::Emit),
        Just(Op::Teardown),
    ]
}

#[derive(Default)]
struct ModelState {
    registered: BTreeSet<usize>,
    changed: bool,
    delivered: [usize; POOL],
}

impl ModelState {
    fn notify(&mut self) {
        if !self.changed {
            return;
        }
        self.changed = false;
        for &i in &self.registered {
            self.delivered[i] += 1;
        }
    }
}

proptest! {
    #[test]
    fn dispatch_matches_reference_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
        let dispatcher = Dispatcher::new();
        let probes: Vec<Rc<Probe>> = (0..POOL).map(|_| Probe::new()).collect();
        let mut model = ModelState::default();

        for op in ops {
            match op {
                Op::Add(i) => {
                    dispatcher.add_observer(&probes[i].as_observer());
                    model.registered.insert(i);
                }
                Op::Delete(i) => {
                    dispatcher.delete_observer(probes[i].id());
                    model.registered.remove(&i);
                }
                Op::Mark => {
                    dispatcher.mark_changed();
                    model.changed = true;
                }
                Op::Notify => {
                    prop_assert!(dispatcher.notify(&Aspect::VALUE).is_ok());
                    model.notify();
                }
                Op::Emit => {
                    prop_assert!(dispatcher.emit(&Aspect::VALUE).is_ok());
                    model.changed = true;
                    model.notify();
                }
                Op::Teardown => {
                    dispatcher.teardown();
                    model.registered.clear();
                }
            }

            prop_assert_eq!(dispatcher.count_observers(), model.registered.len());
            prop_assert_eq!(dispatcher.has_changed(), model.changed);
            for (i, probe) in probes.iter().enumerate() {
                prop_assert_eq!(probe.count(), model.delivered[i]);
            }
        }
    }
}
