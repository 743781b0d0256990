//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "menu_tag_kind", rename_all = "snake_case")]
pub enum TagKind {
    #[default]
    Dietary,
    Allergen,
    Spice,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "rental_status", rename_all = "snake_case")]
pub enum RentalStatus {
    #[default]
    New,
    Pending,
    Approved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "musician_status", rename_all = "snake_case")]
pub enum MusicianStatus {
    #[default]
    New,
    Contacted,
    Booked,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "review_source", rename_all = "snake_case")]
pub enum ReviewSource {
    Yelp,
    Google,
    Facebook,
    #[default]
    Manual,
}

/// Day of the week as stored in the weekly hours table, declared Monday first so
/// that the database ordering matches the display ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "day_of_week", rename_all = "snake_case")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

macro_rules! keyword_enum {
    ($ty:ident, $entity:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(DomainError::validation(format!(
                        "unknown {} `{other}`",
                        $entity
                    ))),
                }
            }
        }
    };
}

keyword_enum!(TagKind, "tag kind", {
    Dietary => "dietary",
    Allergen => "allergen",
    Spice => "spice",
    Other => "other",
});

keyword_enum!(RentalStatus, "rental status", {
    New => "new",
    Pending => "pending",
    Approved => "approved",
    Closed => "closed",
});

keyword_enum!(MusicianStatus, "musician status", {
    New => "new",
    Contacted => "contacted",
    Booked => "booked",
    Closed => "closed",
});

keyword_enum!(ReviewSource, "review source", {
    Yelp => "yelp",
    Google => "google",
    Facebook => "facebook",
    Manual => "manual",
});

keyword_enum!(Weekday, "day of week", {
    Mon => "mon",
    Tue => "tue",
    Wed => "wed",
    Thu => "thu",
    Fri => "fri",
    Sat => "sat",
    Sun => "sun",
});
