use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

str_enum!(ProcessingStatus {
    Unprocessed => "unprocessed",
    Processed => "processed",
    ProcessedWithError => "processed_with_error",
});

str_enum!(Language {
    En => "en",
    Sw => "sw",
});

impl Language {
    /// Every language the pipeline produces summaries in.
    pub const ALL: [Language; 2] = [Language::En, Language::Sw];

    /// Human-readable name, used in generation prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Sw => "Swahili",
        }
    }
}
