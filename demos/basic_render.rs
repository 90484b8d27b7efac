//! Example demonstrating a render tree reusing its children across passes.
//!
//! A todo list is rendered three times. Rows are keyed by id, so reordering
//! reuses them and removed rows are disposed at the end of the pass. A
//! footer is shown only when something is done; a placeholder keeps the
//! slots after it aligned while it is hidden.
//!
//! Run with: cargo run --example basic_render

use slotkit::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    App,
    Row,
    Footer,
    Status,
}

fn render(
    root: &mut RenderNode<Shape, MarkSweep>,
    todos: &[(&str, bool)],
) -> Result<(), RenderError> {
    root.render(|pass| {
        for &(id, _) in todos {
            let name = id.to_string();
            let outcome = pass.child(Some(id.into()), Shape::Row, |row| {
                row.on_removed(move || println!("  disposed row {name}"));
                Ok(())
            })?;
            println!("  row {id}: {:?}", outcome.status);
        }

        if todos.iter().any(|&(_, done)| done) {
            let outcome = pass.child(None, Shape::Footer, |_| Ok(()))?;
            println!("  footer: {:?}", outcome.status);
        } else {
            println!("  footer hidden: {:?}", pass.placeholder()?);
        }

        let outcome = pass.child(None, Shape::Status, |_| Ok(()))?;
        println!("  status: {:?}", outcome.status);
        Ok(())
    })
}

fn main() -> Result<(), RenderError> {
    println!("=== Render Tree Example ===\n");

    let policy = MarkSweep {
        keyed_capacity: 16,
        unkeyed_capacity: 4,
    };
    let mut root = RenderNode::root(Shape::App, policy, RenderOptions::default());

    println!("Pass 1: three todos, none done");
    render(&mut root, &[("milk", false), ("eggs", false), ("bread", false)])?;

    println!("\nPass 2: reordered, one done");
    render(&mut root, &[("bread", false), ("milk", true), ("eggs", false)])?;

    println!("\nPass 3: eggs removed");
    render(&mut root, &[("bread", false), ("milk", true)])?;

    println!(
        "\nCached children: {} keyed, {} positional",
        root.children().keyed_count(),
        root.children().unkeyed_count()
    );

    println!("\nTearing down");
    root.dispose();

    println!("\n=== Example Complete ===");
    Ok(())
}
