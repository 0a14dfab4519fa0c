//! Diagnostic cycle scan over ownership edges.
//!
//! Depth-first search with a global visited set and a recursion stack. When a
//! child is already on the stack the closed cycle is reported and the node's
//! remaining children are skipped, so each branch reports at most one cycle.
//! The result never feeds tree construction.

use std::collections::{HashMap, HashSet};

use tracing::{instrument, warn};

use crate::domain::graph::Link;

struct Frame<'a> {
    id: &'a str,
    next_child: usize,
}

/// Report ownership cycles as closed id sequences, e.g. `[A, B, C, A]`.
///
/// Start nodes are visited in order of first appearance in `links`.
#[instrument(level = "debug", skip(links), fields(links = links.len()))]
pub fn detect_cycles(links: &[Link]) -> Vec<Vec<String>> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut ids: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for link in links.iter().filter(|l| l.is_ownership()) {
        children
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        for id in [link.source.as_str(), link.target.as_str()] {
            if seen.insert(id) {
                ids.push(id);
            }
        }
    }

    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();

    for start in ids {
        if !visited.insert(start) {
            continue;
        }
        on_stack.insert(start);
        path.push(start);
        frames.push(Frame {
            id: start,
            next_child: 0,
        });

        while let Some(frame) = frames.last_mut() {
            let kids = children.get(frame.id).map(Vec::as_slice).unwrap_or(&[]);

            if frame.next_child >= kids.len() {
                on_stack.remove(frame.id);
                path.pop();
                frames.pop();
                continue;
            }

            let child = kids[frame.next_child];
            frame.next_child += 1;

            if on_stack.contains(child) {
                let start_at = path.iter().position(|&p| p == child).unwrap_or(0);
                let mut cycle: Vec<String> = path[start_at..].iter().map(|s| s.to_string()).collect();
                cycle.push(child.to_string());
                warn!("ownership cycle: {}", cycle.join(" -> "));
                cycles.push(cycle);
                // first cycle ends this node's exploration
                frame.next_child = kids.len();
            } else if visited.insert(child) {
                on_stack.insert(child);
                path.push(child);
                frames.push(Frame {
                    id: child,
                    next_child: 0,
                });
            }
        }
    }

    cycles
}
