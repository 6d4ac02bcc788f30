//! Error types for binding, resolution and scope lifecycle

use crate::cycle_detection::CycleError;

/// Result alias used across the container
pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while declaring bindings, building scopes or resolving objects
#[derive(Debug, thiserror::Error)]
pub enum DiError {
	/// A resolver declaration has zero or several generation sources, or an
	/// instance source on a non-singleton lifetime
	#[error("Invalid resolver specification: {0}")]
	InvalidResolverSpec(String),

	/// An alias whose source and target contracts are the same type
	#[error("Alias binding of `{type_name}` points at itself")]
	SelfAlias {
		/// Contract named on both sides of the alias
		type_name: String,
	},

	/// One or more aliases never found a concrete target
	#[error("No binding can be fit for alias(es): {}", pending.join(", "))]
	UnresolvableAlias {
		/// Aliases still waiting for a target, rendered as `From -> To`
		pending: Vec<String>,
	},

	/// Scope builder used out of its prepare/generate/reset sequence
	#[error("Scope builder used out of sequence: {0}")]
	BuilderState(&'static str),

	/// No structure description is known for a type
	#[error("Type `{0}` has no analysed structure")]
	UnknownType(String),

	/// A required member or parameter has no binding in the scope
	#[error("Dependency unsatisfied: `{target}` needs `{contract}` for `{member}`")]
	DependencyUnsatisfied {
		/// Type being activated or injected
		target: String,
		/// Member or parameter that could not be satisfied
		member: String,
		/// Contract that was looked up
		contract: String,
	},

	/// A resolver was re-entered while producing its own value
	#[error("Circular dependency detected: {type_name}\n  Path: {path}")]
	CircularDependency {
		/// Contract whose resolution looped
		type_name: String,
		/// Resolution path (format: A -> B -> A)
		path: String,
	},

	/// Nested resolution went deeper than the configured limit
	#[error("Maximum resolution depth exceeded: {0}")]
	MaxDepthExceeded(usize),

	/// A produced value cannot be viewed as the requested contract
	#[error("Cannot view `{actual}` as `{expected}`")]
	TypeMismatch {
		/// Requested contract
		expected: String,
		/// Concrete type of the produced value
		actual: String,
	},

	/// The type offers no way to allocate a fresh object
	#[error("Activation impossible for `{0}`: no blank allocator declared")]
	ActivationImpossible(String),

	/// A constructor, method or activator body reported a failure
	#[error("Activation failed: {0}")]
	Activation(String),

	/// Operation requires an initialized container
	#[error("Container {0} has not been initialized")]
	ScopeUninitialized(u32),

	/// Operation on a container that has been disposed
	#[error("Container {0} has already been disposed")]
	ScopeDisposed(u32),

	/// The super-empty root container can not be disposed
	#[error("The super-empty container can not be disposed")]
	SuperEmptyForbidden,

	/// Injector settings could not be parsed
	#[error("Invalid injector settings: {0}")]
	Settings(#[from] toml::de::Error),
}

impl DiError {
	pub(crate) fn mismatch(expected: &str, actual: &str) -> Self {
		Self::TypeMismatch {
			expected: expected.to_string(),
			actual: actual.to_string(),
		}
	}
}

impl From<CycleError> for DiError {
	fn from(err: CycleError) -> Self {
		match err {
			CycleError::CircularDependency { type_name, path } => {
				Self::CircularDependency { type_name, path }
			}
			CycleError::MaxDepthExceeded(depth) => Self::MaxDepthExceeded(depth),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_cycle_error_maps_to_circular_dependency() {
		// Arrange
		let err = CycleError::CircularDependency {
			type_name: "A".to_string(),
			path: "A -> B -> A".to_string(),
		};

		// Act
		let converted: DiError = err.into();

		// Assert
		match converted {
			DiError::CircularDependency { type_name, path } => {
				assert_eq!(type_name, "A");
				assert_eq!(path, "A -> B -> A");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	fn test_unresolvable_alias_lists_pending() {
		// Arrange
		let err = DiError::UnresolvableAlias {
			pending: vec!["A -> B".to_string(), "C -> D".to_string()],
		};

		// Act
		let message = err.to_string();

		// Assert
		assert!(message.contains("A -> B, C -> D"));
	}

	#[rstest]
	fn test_settings_error_from_toml() {
		// Arrange
		let parse = toml::from_str::<toml::Table>("max_resolution_depth = ");

		// Act
		let err: DiError = parse.unwrap_err().into();

		// Assert
		assert!(matches!(err, DiError::Settings(_)));
	}
}
