use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide interner shared by every identifier type.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind generated identifiers (`rect_3`, `text_12`, ...).
static COUNTER: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern `s`, returning the existing id when already known.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh id such as `rect_7`.
            pub fn with_prefix(prefix: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{prefix}_{n}"))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $sigil, self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Stable identifier of a node in the scene tree. 4 bytes, `Copy`, O(1) `Eq`/`Hash`.
    NodeId,
    "@"
);

interned_id!(
    /// Identifier of a document variable (design token).
    VariableId,
    "$"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let a = NodeId::intern("card");
        let b = NodeId::intern("card");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "card");
        assert_eq!(format!("{a:?}"), "@card");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = NodeId::with_prefix("rect");
        let b = NodeId::with_prefix("rect");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rect_"));
    }

    #[test]
    fn variable_ids_share_the_interner_but_not_the_type() {
        let v = VariableId::intern("brand");
        assert_eq!(format!("{v:?}"), "$brand");
        assert_eq!(v.to_string(), "brand");
    }
}
