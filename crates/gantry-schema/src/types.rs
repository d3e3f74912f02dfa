//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings for backward compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Stable per-application identity. Two manifests with the same scope key
    /// describe the same logical application, possibly at different versions.
    ScopeKey
);

string_newtype!(
    /// Runtime SDK version an application was published against,
    /// `"NN.0.0"` or `"UNVERSIONED"` for development builds.
    SdkVersion
);

string_newtype!(
    /// Opaque identifier of a single published revision of an application.
    RevisionId
);

string_newtype!(
    /// Full 64-character hex cache identity for a manifest's bundle,
    /// derived by [`compute_bundle_key`](crate::compute_bundle_key).
    BundleKey
);

impl BundleKey {
    /// Truncated 12-character prefix, used for display.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_key_display_and_as_ref() {
        let key = ScopeKey::new("@user/app-1");
        assert_eq!(key.to_string(), "@user/app-1");
        assert_eq!(key.as_str(), "@user/app-1");
        assert_eq!(AsRef::<str>::as_ref(&key), "@user/app-1");
    }

    #[test]
    fn scope_key_serde_roundtrip() {
        let key = ScopeKey::new("@user/app-1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"@user/app-1\"");
        let back: ScopeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn sdk_version_from_str() {
        let v = SdkVersion::from("44.0.0");
        assert_eq!(v.as_str(), "44.0.0");
    }

    #[test]
    fn revision_id_into_inner() {
        let r = RevisionId::new("rev-2020".to_owned());
        assert_eq!(r.into_inner(), "rev-2020");
    }

    #[test]
    fn bundle_key_short_is_prefix() {
        let k = BundleKey::new("abcdef0123456789abcdef0123456789");
        assert_eq!(k.short(), "abcdef012345");
        assert!(k.as_str().starts_with(k.short()));
    }

    #[test]
    fn bundle_key_short_of_short_key() {
        let k = BundleKey::new("abc");
        assert_eq!(k.short(), "abc");
    }

    #[test]
    fn bundle_key_equality() {
        let a = BundleKey::new("same");
        let b = BundleKey::new("same");
        let c = BundleKey::new("diff");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
