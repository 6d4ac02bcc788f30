//! Thread-local circular dependency detection
//!
//! Every resolver entered during a resolution chain is recorded in a
//! per-thread set keyed by resolver identity. Re-entering a resolver that is
//! already on the chain is a cycle; the chain is also bounded by
//! [`InjectorSettings::max_resolution_depth`](crate::InjectorSettings).
//!
//! Cleanup happens through [`ResolutionGuard`], so an error anywhere in the
//! chain leaves the state consistent for the next top-level resolution.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::settings;

/// Identity of a resolver on the resolution chain
pub type ResolutionKey = usize;

struct CycleDetectionState {
	/// Resolvers currently being resolved (O(1) circular detection)
	resolution_set: HashSet<ResolutionKey>,
	/// Resolution depth counter
	resolution_depth: usize,
	/// Resolution path (for displaying circular paths)
	resolution_path: Vec<(ResolutionKey, &'static str)>,
}

impl CycleDetectionState {
	fn new() -> Self {
		Self {
			resolution_set: HashSet::new(),
			resolution_depth: 0,
			resolution_path: Vec::new(),
		}
	}
}

thread_local! {
	static CYCLE_STATE: RefCell<CycleDetectionState> = RefCell::new(CycleDetectionState::new());
}

/// Record the start of a resolution.
///
/// The returned guard removes the entry again when dropped.
pub fn begin_resolution(
	key: ResolutionKey,
	name: &'static str,
) -> Result<ResolutionGuard, CycleError> {
	let limit = settings::with_current(|s| s.max_resolution_depth);
	CYCLE_STATE.with(|state| {
		let mut s = state.borrow_mut();
		let depth = s.resolution_depth + 1;
		if depth > limit {
			return Err(CycleError::MaxDepthExceeded(depth));
		}
		if s.resolution_set.contains(&key) {
			return Err(CycleError::CircularDependency {
				type_name: name.to_string(),
				path: build_cycle_path(&s, key, name),
			});
		}
		s.resolution_depth = depth;
		s.resolution_set.insert(key);
		s.resolution_path.push((key, name));
		Ok(ResolutionGuard { key })
	})
}

/// Current nesting depth on this thread
pub fn resolution_depth() -> usize {
	CYCLE_STATE.with(|state| state.borrow().resolution_depth)
}

/// Whether the resolver identified by `key` is on the current chain
pub fn is_resolving(key: ResolutionKey) -> bool {
	CYCLE_STATE.with(|state| state.borrow().resolution_set.contains(&key))
}

/// RAII guard: removes its resolver from the chain on drop
#[derive(Debug)]
pub struct ResolutionGuard {
	key: ResolutionKey,
}

impl Drop for ResolutionGuard {
	fn drop(&mut self) {
		let _ = CYCLE_STATE.try_with(|state| {
			let mut s = state.borrow_mut();
			s.resolution_set.remove(&self.key);
			if let Some(pos) = s.resolution_path.iter().rposition(|(k, _)| *k == self.key) {
				s.resolution_path.remove(pos);
			}
			s.resolution_depth = s.resolution_depth.saturating_sub(1);
		});
	}
}

fn build_cycle_path(state: &CycleDetectionState, key: ResolutionKey, name: &str) -> String {
	match state.resolution_path.iter().position(|(k, _)| *k == key) {
		Some(start) => {
			let cycle: Vec<&str> = state.resolution_path[start..]
				.iter()
				.map(|(_, n)| *n)
				.collect();
			format!("{} -> {}", cycle.join(" -> "), name)
		}
		None => format!("Unknown cycle involving {}", name),
	}
}

/// Circular dependency error
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
	/// Circular dependency detected
	#[error("Circular dependency detected: {type_name}\n  Path: {path}")]
	CircularDependency {
		/// Name of the contract involved in the cycle
		type_name: String,
		/// Circular path (format: A -> B -> C -> A)
		path: String,
	},

	/// Maximum resolution depth exceeded
	#[error("Maximum resolution depth exceeded: {0}")]
	MaxDepthExceeded(usize),
}
