//! Field constraints for decoded request bodies.
//!
//! Body types declare their constraints by implementing [`Validate`]. Each
//! field is checked with [`Validator::field`] followed by one or more
//! [`FieldCheck::tag`] calls. A tag pairs a tag key with a comma-separated
//! rule list, and only the tags whose key equals the configured
//! `validation_tag` are applied. One body type can therefore carry rule sets
//! for several consumers.
//!
//! Supported rules:
//!
//! | Rule | Meaning |
//! |------|---------|
//! | `required` | the value must not be its zero value (see [`IsZero`]) |
//! | `omitempty` | no-op, accepted for compatibility |
//!
//! Any other rule name fails the field and is reported under that name.
//!
//! # Example
//!
//! ```rust
//! use hrr::{Validate, Validator};
//!
//! struct Monster {
//!     name: String,
//!     cuteness: i32,
//! }
//!
//! impl Validate for Monster {
//!     fn validate(&self, v: &mut Validator<'_>) {
//!         v.field("Name", &self.name).tag("validate", "required");
//!         v.field("Cuteness", &self.cuteness).tag("validate", "required");
//!     }
//! }
//!
//! let monster = Monster { name: String::new(), cuteness: 3 };
//! let errors = Validator::run(&monster, "validate").unwrap_err();
//!
//! assert_eq!(errors.to_string(), "Name failed due to required");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Separator placed between the fragments of an aggregated message.
pub const FRAGMENT_SEPARATOR: &str = "; ";

/// Constraint declaration for a request body type.
///
/// Every decode target implements this trait, whether or not the pipeline
/// validates it. The default implementation declares no constraints, so a
/// type that is only decoded needs nothing more than:
///
/// ```rust
/// # use hrr::Validate;
/// # struct Ping;
/// impl Validate for Ping {}
/// ```
///
/// Untyped JSON (`serde_json::Value`) is accepted as is, and a `Vec` checks
/// each of its elements.
pub trait Validate {
    /// Reports every field of `self` to `v`.
    fn validate(&self, v: &mut Validator<'_>) {
        let _ = v;
    }
}

impl Validate for serde_json::Value {}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, v: &mut Validator<'_>) {
        for item in self {
            item.validate(v);
        }
    }
}

/// Zero-value test used by the `required` rule.
pub trait IsZero {
    /// Returns true if `self` is the zero value of its type.
    fn is_zero(&self) -> bool;
}

macro_rules! impl_is_zero_for_numbers {
    ($($t:ty),* $(,)?) => {
        $(
            impl IsZero for $t {
                fn is_zero(&self) -> bool {
                    *self == <$t>::default()
                }
            }
        )*
    };
}

impl_is_zero_for_numbers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl IsZero for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl IsZero for str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T> IsZero for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsZero for [T] {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsZero for HashMap<K, V, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsZero for BTreeMap<K, V> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl IsZero for serde_json::Value {
    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl<T: IsZero + ?Sized> IsZero for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: IsZero + ?Sized> IsZero for Box<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as declared by the body type.
    pub field: String,
    /// Rule that failed.
    pub rule: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed due to {}", self.field, self.rule)
    }
}

/// All failed constraints of one body, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_fragments(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join_fragments(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

impl ValidationErrors {
    /// Returns the failed constraints in report order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Returns the number of failed constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Collects constraint failures for one body.
#[derive(Debug)]
pub struct Validator<'t> {
    tag_name: &'t str,
    failures: Vec<FieldError>,
}

impl<'t> Validator<'t> {
    /// Creates a validator that applies rules declared under `tag_name`.
    #[must_use]
    pub fn new(tag_name: &'t str) -> Self {
        Self {
            tag_name,
            failures: Vec::new(),
        }
    }

    /// Validates `value` and returns every failure.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] if at least one field failed.
    pub fn run<T: Validate + ?Sized>(value: &T, tag_name: &str) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new(tag_name);
        value.validate(&mut validator);
        validator.finish()
    }

    /// Returns the tag key whose rules are applied.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.tag_name
    }

    /// Starts the checks for one field.
    pub fn field<'v, T: IsZero + ?Sized>(
        &'v mut self,
        name: &str,
        value: &T,
    ) -> FieldCheck<'v, 't> {
        FieldCheck {
            validator: self,
            name: name.to_string(),
            is_zero: value.is_zero(),
            failed: false,
        }
    }

    /// Records a failure directly, for constraints [`FieldCheck`] cannot express.
    pub fn fail(&mut self, field: impl Into<String>, rule: impl Into<String>) {
        self.failures.push(FieldError {
            field: field.into(),
            rule: rule.into(),
        });
    }

    /// Consumes the validator.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] if at least one failure was recorded.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.failures))
        }
    }
}

/// Pending checks for one field; see [`Validator::field`].
///
/// A field reports at most one failure: the first rule it violates.
pub struct FieldCheck<'v, 't> {
    validator: &'v mut Validator<'t>,
    name: String,
    is_zero: bool,
    failed: bool,
}

impl FieldCheck<'_, '_> {
    /// Applies `rules` if `key` is the configured tag key.
    pub fn tag(mut self, key: &str, rules: &str) -> Self {
        if self.failed || key != self.validator.tag_name {
            return self;
        }

        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let ok = match rule {
                "required" => !self.is_zero,
                "omitempty" => true,
                _ => false,
            };
            if !ok {
                self.validator.fail(self.name.clone(), rule);
                self.failed = true;
                break;
            }
        }
        self
    }
}
