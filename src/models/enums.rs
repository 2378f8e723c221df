use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident $(#[$serde_attr:meta])* { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        $(#[$serde_attr])*
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(PatientStatus {
    Inquiry => "Inquiry",
    Onboarding => "Onboarding",
    Active => "Active",
    Churned => "Churned",
});

str_enum!(AuditAction #[serde(rename_all = "SCREAMING_SNAKE_CASE")] {
    Create => "CREATE",
    Update => "UPDATE",
    Delete => "DELETE",
    StatusChange => "STATUS_CHANGE",
});
