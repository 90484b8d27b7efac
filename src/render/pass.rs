//! One render pass over a node's children.

use log::trace;

use crate::child::{Child, SlotKey};
use crate::error::{DanglingMarkError, RenderError};
use crate::render::node::RenderNode;
use crate::traits::{CachePolicy, ChildCache};

/// What happened to a slot during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// A cached child with an equal shape was kept.
    Reused,
    /// Nothing was cached for the slot; a new child was inserted.
    Created,
    /// The cached child did not fit and was disposed in favour of a new one.
    Replaced,
}

/// Result of rendering one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildOutcome {
    /// Key the child is stored under. For minted keys, pass this back on the
    /// next pass to reuse the child.
    pub key: Option<SlotKey>,
    /// Whether the slot was reused, created or replaced.
    pub status: ChildStatus,
}

/// Handle for emitting children during [`RenderNode::render`].
///
/// Every method consumes exactly one slot: a keyed slot, or the next
/// positional one.
pub struct Pass<'a, S, P: CachePolicy> {
    node: &'a mut RenderNode<S, P>,
}

impl<'a, S, P: CachePolicy> Pass<'a, S, P> {
    pub(crate) fn new(node: &'a mut RenderNode<S, P>) -> Self {
        Self { node }
    }

    /// Shape of the node being rendered.
    pub fn shape(&self) -> &S {
        self.node.shape()
    }

    /// Registers a removal hook on the node being rendered.
    pub fn on_removed(&mut self, hook: impl FnOnce() + 'static) {
        self.node.on_removed(hook);
    }

    /// Per-node state of the node being rendered.
    pub fn bucket_mut<V: 'static>(&mut self) -> Option<&mut V> {
        self.node.bucket_mut()
    }

    /// Stores per-node state on the node being rendered.
    pub fn set_bucket<V: 'static>(&mut self, value: V) {
        self.node.set_bucket(value);
    }

    /// Leaves the next positional slot empty for this pass.
    ///
    /// Whatever was cached there is swept at the end of the pass.
    pub fn skip(&mut self) {
        let children = &mut self.node.children;
        if children.get_child(None).is_none() {
            // Keep the lookup and mark cursors on the same position.
            children.put_child(None, Child::Placeholder, false);
        }
        children.skip();
    }

    /// Emits a placeholder at the next positional slot.
    pub fn placeholder(&mut self) -> Result<ChildStatus, RenderError> {
        let children = &mut self.node.children;
        let status = match children.get_child(None) {
            Some(Child::Placeholder) => ChildStatus::Reused,
            Some(Child::Payload(_)) => ChildStatus::Replaced,
            None => ChildStatus::Created,
        };

        match status {
            ChildStatus::Reused => {},
            ChildStatus::Replaced => {
                if let Some(Child::Payload(old)) = children.replace_child(None, Child::Placeholder) {
                    old.dispose();
                }
            },
            ChildStatus::Created => {
                children.put_child(None, Child::Placeholder, false);
            },
        }

        children.mark(None)?;
        Ok(status)
    }
}

impl<S: PartialEq, P: CachePolicy> Pass<'_, S, P> {
    /// Emits a child node and renders its own children with `f`.
    ///
    /// With `key`, the child lives in the keyed namespace. Without one it
    /// takes the next position, unless the tree suggests keys, in which
    /// case a key is minted and returned in the outcome.
    ///
    /// A cached child is reused when its shape equals `shape`; otherwise it
    /// is disposed and replaced in the same slot.
    pub fn child<F>(
        &mut self,
        key: Option<SlotKey>,
        shape: S,
        f: F,
    ) -> Result<ChildOutcome, RenderError>
    where
        F: FnOnce(&mut Pass<'_, S, P>) -> Result<(), RenderError>,
    {
        // Minted keys are only reusable through the key the caller gets back,
        // so a keyless request in suggest mode never consults a position.
        let mint = key.is_none() && self.node.options.suggest_keys;

        let status = if mint {
            ChildStatus::Created
        } else {
            match self.node.children.get_child(key.as_ref()) {
                Some(Child::Payload(existing)) if existing.shape() == &shape => ChildStatus::Reused,
                Some(_) => ChildStatus::Replaced,
                None => ChildStatus::Created,
            }
        };

        let key = match status {
            ChildStatus::Reused => key,
            ChildStatus::Replaced => {
                let fresh = self.node.spawn(shape, key.clone());
                let displaced = self
                    .node
                    .children
                    .replace_child(key.as_ref(), Child::Payload(fresh));
                if let Some(Child::Payload(old)) = displaced {
                    old.dispose();
                }
                key
            },
            ChildStatus::Created => {
                let fresh = self.node.spawn(shape, key.clone());
                self.node
                    .children
                    .put_child(key, Child::Payload(fresh), mint)
            },
        };

        self.node.children.mark(key.as_ref())?;
        trace!("render pass: child {key:?} {status:?}");

        let Some(Child::Payload(child)) = self.node.children.retained_mut(key.as_ref()) else {
            return Err(DanglingMarkError::new(key, "marked slot holds no child node").into());
        };
        if status == ChildStatus::Created {
            child.set_key(key.clone());
        }
        child.render(f)?;

        Ok(ChildOutcome { key, status })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::policy::mark_sweep::MarkSweep;
    use crate::render::node::RenderOptions;

    type Node = RenderNode<&'static str, MarkSweep>;

    fn root() -> Node {
        RenderNode::root("root", MarkSweep::default(), RenderOptions::default())
    }

    fn suggesting_root() -> Node {
        RenderNode::root("root", MarkSweep::default(), RenderOptions { suggest_keys: true })
    }

    fn leaf(pass: &mut Pass<'_, &'static str, MarkSweep>, shape: &'static str) -> ChildStatus {
        pass.child(None, shape, |_| Ok(())).unwrap().status
    }

    fn counting_hook(pass: &mut Pass<'_, &'static str, MarkSweep>, counter: &Rc<Cell<u32>>) {
        let counter = Rc::clone(counter);
        pass.on_removed(move || counter.set(counter.get() + 1));
    }

    // ==============================================
    // Positional children
    // ==============================================

    mod positional {
        use super::*;

        #[test]
        fn first_pass_creates_second_reuses() {
            let mut node = root();
            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Created);
                assert_eq!(leaf(pass, "b"), ChildStatus::Created);
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Reused);
                assert_eq!(leaf(pass, "b"), ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
            assert_eq!(node.child_count(), 2);
        }

        #[test]
        fn shape_change_replaces_and_disposes() {
            let removed = Rc::new(Cell::new(0));
            let mut node = root();
            node.render(|pass| {
                pass.child(None, "a", |inner| {
                    counting_hook(inner, &removed);
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                assert_eq!(leaf(pass, "b"), ChildStatus::Replaced);
                Ok(())
            })
            .unwrap();

            assert_eq!(removed.get(), 1);
            assert_eq!(node.child_count(), 1);
        }

        #[test]
        fn trailing_children_are_swept() {
            let removed = Rc::new(Cell::new(0));
            let mut node = root();
            node.render(|pass| {
                for shape in ["a", "b", "c"] {
                    pass.child(None, shape, |inner| {
                        counting_hook(inner, &removed);
                        Ok(())
                    })?;
                }
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                leaf(pass, "a");
                Ok(())
            })
            .unwrap();

            assert_eq!(removed.get(), 2);
            assert_eq!(node.child_count(), 1);
        }

        #[test]
        fn skip_drops_one_position_and_keeps_alignment() {
            let removed = Rc::new(Cell::new(0));
            let mut node = root();
            node.render(|pass| {
                for shape in ["a", "b", "c"] {
                    pass.child(None, shape, |inner| {
                        counting_hook(inner, &removed);
                        Ok(())
                    })?;
                }
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Reused);
                pass.skip();
                assert_eq!(leaf(pass, "c"), ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
            assert_eq!(removed.get(), 1);

            // "c" moved up to position 1.
            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Reused);
                assert_eq!(leaf(pass, "c"), ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
        }

        #[test]
        fn skip_past_the_end_is_harmless() {
            let mut node = root();
            node.render(|pass| {
                pass.skip();
                assert_eq!(leaf(pass, "a"), ChildStatus::Created);
                Ok(())
            })
            .unwrap();
            assert_eq!(node.child_count(), 1);

            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
        }
    }

    // ==============================================
    // Placeholders
    // ==============================================

    mod placeholders {
        use super::*;

        #[test]
        fn placeholder_is_reused_across_passes() {
            let mut node = root();
            node.render(|pass| {
                assert_eq!(pass.placeholder()?, ChildStatus::Created);
                Ok(())
            })
            .unwrap();
            node.render(|pass| {
                assert_eq!(pass.placeholder()?, ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
            assert_eq!(node.child_count(), 1);
        }

        #[test]
        fn placeholder_replaces_payload() {
            let removed = Rc::new(Cell::new(0));
            let mut node = root();
            node.render(|pass| {
                pass.child(None, "a", |inner| {
                    counting_hook(inner, &removed);
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                assert_eq!(pass.placeholder()?, ChildStatus::Replaced);
                Ok(())
            })
            .unwrap();
            assert_eq!(removed.get(), 1);

            node.render(|pass| {
                assert_eq!(leaf(pass, "a"), ChildStatus::Replaced);
                Ok(())
            })
            .unwrap();
        }
    }

    // ==============================================
    // Keyed children
    // ==============================================

    mod keyed {
        use super::*;

        #[test]
        fn keyed_children_survive_reordering() {
            let mut node = root();
            node.render(|pass| {
                for k in ["x", "y", "z"] {
                    pass.child(Some(k.into()), "row", |_| Ok(()))?;
                }
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                for k in ["z", "x", "y"] {
                    let outcome = pass.child(Some(k.into()), "row", |_| Ok(()))?;
                    assert_eq!(outcome.status, ChildStatus::Reused);
                    assert_eq!(outcome.key, Some(SlotKey::from(k)));
                }
                Ok(())
            })
            .unwrap();
            assert_eq!(node.children().keyed_count(), 3);
        }

        #[test]
        fn keyed_child_keeps_its_key() {
            let mut node = root();
            node.render(|pass| {
                pass.child(Some("k".into()), "row", |_| Ok(()))?;
                Ok(())
            })
            .unwrap();

            let key = SlotKey::from("k");
            let child = node.children.get_child(Some(&key));
            match child {
                Some(Child::Payload(child)) => assert_eq!(child.key(), Some(&key)),
                other => panic!("expected payload, got {other:?}"),
            }
            node.children.reset();
        }

        #[test]
        fn unrendered_key_is_disposed() {
            let removed = Rc::new(Cell::new(0));
            let mut node = root();
            node.render(|pass| {
                for k in ["x", "y"] {
                    pass.child(Some(k.into()), "row", |inner| {
                        counting_hook(inner, &removed);
                        Ok(())
                    })?;
                }
                Ok(())
            })
            .unwrap();

            node.render(|pass| {
                pass.child(Some("y".into()), "row", |_| Ok(()))?;
                Ok(())
            })
            .unwrap();
            assert_eq!(removed.get(), 1);
            assert_eq!(node.child_count(), 1);
        }
    }

    // ==============================================
    // Suggested keys
    // ==============================================

    mod suggested {
        use super::*;

        #[test]
        fn keyless_child_gets_minted_key() {
            let mut node = suggesting_root();
            let mut minted = None;
            node.render(|pass| {
                let outcome = pass.child(None, "row", |_| Ok(()))?;
                assert_eq!(outcome.status, ChildStatus::Created);
                minted = outcome.key;
                Ok(())
            })
            .unwrap();
            assert!(minted.as_ref().is_some_and(SlotKey::is_auto));

            // Passing the minted key back reuses the child.
            node.render(|pass| {
                let outcome = pass.child(minted.clone(), "row", |_| Ok(()))?;
                assert_eq!(outcome.status, ChildStatus::Reused);
                Ok(())
            })
            .unwrap();
            assert_eq!(node.children().keyed_count(), 1);
            assert_eq!(node.children().unkeyed_count(), 0);
        }

        #[test]
        fn key_minted_by_another_tree_does_not_collide() {
            let removed = Rc::new(Cell::new(0));

            let mut other = suggesting_root();
            let mut foreign = None;
            other
                .render(|pass| {
                    foreign = pass.child(None, "row", |_| Ok(()))?.key;
                    Ok(())
                })
                .unwrap();

            let mut node = suggesting_root();
            node.render(|pass| {
                let first = pass.child(foreign.clone(), "row", |inner| {
                    counting_hook(inner, &removed);
                    Ok(())
                })?;
                let second = pass.child(None, "row", |inner| {
                    counting_hook(inner, &removed);
                    Ok(())
                })?;
                assert_eq!(first.status, ChildStatus::Created);
                assert_eq!(second.status, ChildStatus::Created);
                assert_ne!(first.key, second.key);
                Ok(())
            })
            .unwrap();

            assert_eq!(node.child_count(), 2);
            assert_eq!(removed.get(), 0);
            node.dispose();
            assert_eq!(removed.get(), 2);
        }

        #[test]
        fn placeholders_stay_positional() {
            let mut node = suggesting_root();
            node.render(|pass| {
                pass.placeholder()?;
                pass.child(None, "row", |_| Ok(()))?;
                pass.placeholder()?;
                Ok(())
            })
            .unwrap();
            assert_eq!(node.children().unkeyed_count(), 2);
            assert_eq!(node.children().keyed_count(), 1);
        }

        #[test]
        fn children_inherit_suggest_mode() {
            let mut node = suggesting_root();
            node.render(|pass| {
                pass.child(None, "list", |inner| {
                    let outcome = inner.child(None, "row", |_| Ok(()))?;
                    assert!(outcome.key.is_some_and(|k| k.is_auto()));
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        }
    }

    // ==============================================
    // Nesting and failure
    // ==============================================

    mod nesting {
        use super::*;

        #[test]
        fn grandchildren_are_cached_independently() {
            let mut node = root();
            for _ in 0..2 {
                node.render(|pass| {
                    pass.child(None, "list", |inner| {
                        leaf(inner, "row");
                        leaf(inner, "row");
                        Ok(())
                    })?;
                    Ok(())
                })
                .unwrap();
            }

            match node.children.get_child(None) {
                Some(Child::Payload(list)) => {
                    assert_eq!(list.child_count(), 2);
                    assert_eq!(list.passes(), 2);
                },
                other => panic!("expected list node, got {other:?}"),
            }
            node.children.reset();
        }

        #[test]
        fn nested_failure_propagates() {
            let mut node = root();
            let err = node
                .render(|pass| {
                    pass.child(None, "list", |_| Err(RenderError::template("bad row")))?;
                    Ok(())
                })
                .unwrap_err();
            assert_eq!(err, RenderError::template("bad row"));
            assert_eq!(node.passes(), 0);
        }

        #[test]
        fn bucket_persists_on_reused_child() {
            let mut node = root();
            for expected in 1..=3u32 {
                node.render(|pass| {
                    pass.child(None, "counter", |inner| {
                        match inner.bucket_mut::<u32>() {
                            Some(count) => *count += 1,
                            None => inner.set_bucket(1u32),
                        }
                        assert_eq!(inner.bucket_mut::<u32>().copied(), Some(expected));
                        Ok(())
                    })?;
                    Ok(())
                })
                .unwrap();
            }
        }
    }
}
