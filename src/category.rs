//! Closed categorical domains with a storage form and a presentation form.
//!
//! The storage form is the exact upper-case token found in the normalized
//! dataset (`FALLECIDO`, `NO INDICA`, `30-44`). The presentation form is what
//! charts and tables show. Both directions are total over `ALL`.

use std::fmt;

use serde::{Serialize, Serializer};

pub trait Category: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn storage(self) -> &'static str;

    fn display(self) -> &'static str;

    /// Exact, case-sensitive match against the storage form.
    fn from_storage(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.storage() == value)
    }

    fn from_display(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.display() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Fatal,
    Injured,
    Unharmed,
    Unknown,
}

impl Category for Severity {
    const ALL: &'static [Self] = &[
        Severity::Fatal,
        Severity::Injured,
        Severity::Unharmed,
        Severity::Unknown,
    ];

    fn storage(self) -> &'static str {
        match self {
            Severity::Fatal => "FALLECIDO",
            Severity::Injured => "LESIONADO",
            Severity::Unharmed => "ILESO",
            Severity::Unknown => "NO SE CONOCE",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Severity::Fatal => "Fallecido",
            Severity::Injured => "Lesionado",
            Severity::Unharmed => "Ileso",
            Severity::Unknown => "No se conoce",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Male,
    Female,
    NotStated,
}

impl Category for Sex {
    const ALL: &'static [Self] = &[Sex::Male, Sex::Female, Sex::NotStated];

    fn storage(self) -> &'static str {
        match self {
            Sex::Male => "MASCULINO",
            Sex::Female => "FEMENINO",
            Sex::NotStated => "NO INDICA",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Sex::Male => "Masculino",
            Sex::Female => "Femenino",
            Sex::NotStated => "No indica",
        }
    }
}

/// Age bucket. Declaration order is chart order, with `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeRange {
    Under18,
    From18To29,
    From30To44,
    From45To59,
    From60To74,
    From75,
    Unknown,
}

impl AgeRange {
    pub fn is_known(self) -> bool {
        self != AgeRange::Unknown
    }
}

impl Category for AgeRange {
    const ALL: &'static [Self] = &[
        AgeRange::Under18,
        AgeRange::From18To29,
        AgeRange::From30To44,
        AgeRange::From45To59,
        AgeRange::From60To74,
        AgeRange::From75,
        AgeRange::Unknown,
    ];

    fn storage(self) -> &'static str {
        match self {
            AgeRange::Under18 => "0-17",
            AgeRange::From18To29 => "18-29",
            AgeRange::From30To44 => "30-44",
            AgeRange::From45To59 => "45-59",
            AgeRange::From60To74 => "60-74",
            AgeRange::From75 => "75+",
            AgeRange::Unknown => "EDAD DESCONOCIDA",
        }
    }

    fn display(self) -> &'static str {
        match self {
            AgeRange::Unknown => "Edad desconocida",
            known => known.storage(),
        }
    }
}

macro_rules! category_impls {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.display())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.storage())
                }
            }
        )+
    };
}

category_impls!(Severity, Sex, AgeRange);
