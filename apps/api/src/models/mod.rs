//! Row models for the five user-owned entities.
//!
//! Every model implements [`crate::store::Entity`], which describes how the
//! generic store adapters and bindings handle it.

/// Declares a closed text enumeration stored as TEXT.
///
/// Decoding is lenient on both the JSON and the Postgres side: a missing, null or
/// unrecognised value becomes the declared default variant instead of an error.
macro_rules! lenient_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parses a stored value, falling back to the default variant.
            pub fn parse_lenient(raw: Option<&str>) -> Self {
                let lowered = raw.map(|r| r.trim().to_ascii_lowercase());
                match lowered.as_deref() {
                    $(Some($text) => $name::$variant,)+
                    _ => $name::$default,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<Option<String>> for $name {
            fn from(raw: Option<String>) -> Self {
                Self::parse_lenient(raw.as_deref())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <Option<String> as serde::Deserialize>::deserialize(deserializer).map(Self::from)
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self::parse_lenient(Some(raw)))
            }
        }
    };
}

pub mod application;
pub mod contact;
pub mod cover_letter;
pub mod profile;
pub mod skill;

pub use application::{ApplicationStatus, JobApplication};
pub use contact::Contact;
pub use cover_letter::CoverLetter;
pub use profile::Profile;
pub use skill::Skill;

/// Rejects blank required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    Ok(())
}

/// Like [`require_text`], for optional patch fields: absent is fine, blank is not.
pub(crate) fn require_text_if_set(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::contact::ConnectionStrength;
    use super::*;

    #[test]
    fn test_lenient_enum_falls_back_on_unknown_and_missing() {
        assert_eq!(ConnectionStrength::parse_lenient(None), ConnectionStrength::Weak);
        assert_eq!(
            ConnectionStrength::parse_lenient(Some("best-friends")),
            ConnectionStrength::Weak
        );
        assert_eq!(
            ConnectionStrength::parse_lenient(Some(" Strong ")),
            ConnectionStrength::Strong
        );
        assert_eq!(
            ApplicationStatus::parse_lenient(Some("ghosted")),
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_lenient_enum_json_null_becomes_default() {
        let strength: ConnectionStrength = serde_json::from_str("null").unwrap();
        assert_eq!(strength, ConnectionStrength::Weak);

        let status: ApplicationStatus = serde_json::from_str("\"offer\"").unwrap();
        assert_eq!(status, ApplicationStatus::Offer);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"offer\"");
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Ada").is_ok());
        assert_eq!(require_text("name", "   ").unwrap_err(), "name cannot be empty");
        assert!(require_text_if_set("name", None).is_ok());
        assert!(require_text_if_set("name", Some("")).is_err());
    }
}
