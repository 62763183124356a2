use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is both the stored column value and the JSON wire value.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ItemCategory {
    Checkup => "checkup",
    Frames => "frames",
    Lenses => "lenses",
    Medicines => "medicines",
    Other => "other",
});

str_enum!(InvoiceStatus {
    Paid => "paid",
    Pending => "pending",
    Cancelled => "cancelled",
});

str_enum!(ReminderType {
    Visit => "visit",
    GlassChange => "glass_change",
    Checkup => "checkup",
});

str_enum!(ReminderStatus {
    Pending => "pending",
    Completed => "completed",
});

str_enum!(Role {
    Staff => "staff",
    Admin => "admin",
});

impl Role {
    /// Admin satisfies every role requirement; staff only its own.
    pub fn satisfies(self, required: Role) -> bool {
        self == Role::Admin || self == required
    }
}
