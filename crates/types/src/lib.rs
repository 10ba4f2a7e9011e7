/// Errors that can occur when parsing validated flag types.
#[derive(Debug, thiserror::Error)]
pub enum FlagError {
    /// The input did not match any recognised code for the flag
    #[error("unrecognised flag value {0:?}")]
    Unrecognised(String),
}

/// A yes/no clinical flag with a defined equality contract.
///
/// Source datasets encode these flags inconsistently (`"Y"`, `"y"`, `"N"`,
/// blank). This type collapses all of those spellings into three variants so
/// that filter comparisons are plain enum equality rather than sentinel
/// string checks. `Unspecified` never matches an affirmative filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YesNo {
    /// The flag was affirmative.
    Yes,
    /// The flag was explicitly negative.
    No,
    /// The flag was blank or unrecognised.
    #[default]
    Unspecified,
}

impl YesNo {
    /// Parses a raw dataset field.
    ///
    /// The input is trimmed and matched case-insensitively; anything other
    /// than a recognised yes/no code maps to `Unspecified`. This is the
    /// lenient entry point used when ingesting free-form records.
    pub fn from_raw(input: impl AsRef<str>) -> Self {
        let value = input.as_ref().trim();
        if value.eq_ignore_ascii_case("y") || value.eq_ignore_ascii_case("yes") {
            YesNo::Yes
        } else if value.eq_ignore_ascii_case("n") || value.eq_ignore_ascii_case("no") {
            YesNo::No
        } else {
            YesNo::Unspecified
        }
    }

    /// Returns true iff the flag is affirmative.
    pub fn is_yes(self) -> bool {
        matches!(self, YesNo::Yes)
    }

    /// Canonical code used in serialised output.
    pub fn as_code(self) -> &'static str {
        match self {
            YesNo::Yes => "Y",
            YesNo::No => "N",
            YesNo::Unspecified => "",
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl std::str::FromStr for YesNo {
    type Err = FlagError;

    /// Strict parse for operator-supplied values.
    ///
    /// Blank input is `Unspecified`; a non-blank value that is not a
    /// recognised yes/no code is an error rather than silently falling back.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match YesNo::from_raw(s) {
            YesNo::Unspecified if !s.trim().is_empty() => {
                Err(FlagError::Unrecognised(s.trim().to_owned()))
            }
            parsed => Ok(parsed),
        }
    }
}

impl serde::Serialize for YesNo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> serde::Deserialize<'de> for YesNo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(YesNo::from_raw(&s))
    }
}

/// Patient sex as recorded in the source dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    /// Blank or unrecognised in the source record.
    #[default]
    Unspecified,
}

impl Sex {
    /// Parses a raw dataset field, trimmed and case-insensitive; anything
    /// other than a recognised code maps to `Unspecified`.
    pub fn from_raw(input: impl AsRef<str>) -> Self {
        let value = input.as_ref().trim();
        if value.eq_ignore_ascii_case("m") || value.eq_ignore_ascii_case("male") {
            Sex::Male
        } else if value.eq_ignore_ascii_case("f") || value.eq_ignore_ascii_case("female") {
            Sex::Female
        } else {
            Sex::Unspecified
        }
    }

    /// Canonical single-letter code, as shown next to the patient's age.
    pub fn as_code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unspecified => "",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl std::str::FromStr for Sex {
    type Err = FlagError;

    /// Strict parse: blank is `Unspecified`, unrecognised non-blank input is
    /// an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Sex::from_raw(s) {
            Sex::Unspecified if !s.trim().is_empty() => {
                Err(FlagError::Unrecognised(s.trim().to_owned()))
            }
            parsed => Ok(parsed),
        }
    }
}

impl serde::Serialize for Sex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_code())
    }
}

impl<'de> serde::Deserialize<'de> for Sex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Sex::from_raw(&s))
    }
}
