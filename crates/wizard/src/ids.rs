use std::fmt;

use uuid::Uuid;

// Macro keeps all ID wrappers structurally identical.
macro_rules! define_wizard_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Mints a fresh time-ordered identifier with the default prefix.
            pub fn generate() -> Self {
                Self::generate_with_prefix($prefix)
            }

            pub fn generate_with_prefix(prefix: &str) -> Self {
                Self(format!("{prefix}_{}", Uuid::now_v7().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

define_wizard_id!(AssetId, "asset");
define_wizard_id!(HistoryId, "history");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let first = AssetId::generate_with_prefix("upload");
        let second = AssetId::generate_with_prefix("upload");

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("upload_"));
        assert!(HistoryId::generate().to_string().starts_with("history_"));
    }
}
