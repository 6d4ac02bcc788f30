//! Injector settings
//!
//! Settings are thread-local, like the containers they tune. They can be
//! built in code or parsed from a TOML document:
//!
//! ```toml
//! max_resolution_depth = 64
//! trace_resolution = true
//! ```

use std::cell::RefCell;

use serde::Deserialize;

use crate::error::DiResult;

/// Default limit on nested resolutions
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// Tunables for resolution behaviour
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InjectorSettings {
	/// Maximum number of nested resolutions before failing
	pub max_resolution_depth: usize,
	/// Emit a `trace` event for every activation
	pub trace_resolution: bool,
}

impl Default for InjectorSettings {
	fn default() -> Self {
		Self {
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
			trace_resolution: false,
		}
	}
}

impl InjectorSettings {
	/// Parse settings from a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> DiResult<Self> {
		Ok(toml::from_str(source)?)
	}
}

thread_local! {
	static CURRENT: RefCell<InjectorSettings> = RefCell::new(InjectorSettings::default());
}

/// Replace the settings used by containers on the current thread
pub fn configure(settings: InjectorSettings) {
	tracing::debug!(?settings, "injector settings configured");
	CURRENT.with(|current| *current.borrow_mut() = settings);
}

/// Snapshot of the settings in effect on the current thread
pub fn current() -> InjectorSettings {
	CURRENT.with(|current| current.borrow().clone())
}

pub(crate) fn with_current<R>(f: impl FnOnce(&InjectorSettings) -> R) -> R {
	CURRENT.with(|current| f(&current.borrow()))
}
