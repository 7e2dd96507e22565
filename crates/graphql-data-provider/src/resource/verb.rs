use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// The data request verbs resources know how to turn into operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr, strum::VariantArray,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    GetOne,
    GetMany,
    GetManyReference,
    GetList,
    Create,
    Update,
    UpdateMany,
    Delete,
    /// Recognized, but no resource implements it.
    DeleteMany,
}

impl Verb {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// The verb whose selection settings apply when none are configured for this one.
    pub fn selection_fallback(&self) -> Option<Verb> {
        match self {
            Verb::GetMany => Some(Verb::GetOne),
            Verb::GetManyReference => Some(Verb::GetList),
            _ => None,
        }
    }
}

impl Serialize for Verb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Verb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use strum::VariantArray;

        let s = String::deserialize(deserializer)?;

        Verb::from_str(&s).map_err(|_| {
            let expected = Verb::VARIANTS.iter().map(Verb::as_str).collect::<Vec<_>>().join(", ");
            serde::de::Error::custom(format!(r#""{s}" is not a valid verb (expected one of {expected})."#))
        })
    }
}
