use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidateLength;

/// Tri-state field for PATCH requests.
///
/// - `Unchanged` → key absent from the body
/// - `SetToNull` → key present with `null`
/// - `SetToValue` → key present with a value
///
/// Structs using it must carry `#[serde(default)]` so absent keys fall back
/// to `Unchanged`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum OptionField<T> {
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<T> Default for OptionField<T> {
    fn default() -> Self {
        OptionField::Unchanged
    }
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => OptionField::SetToValue(value),
            None => OptionField::SetToNull,
        })
    }
}

// ---------------------- Validation support ----------------------

impl<T> ValidateLength<u64> for OptionField<T>
where
    T: ValidateLength<u64>,
{
    fn length(&self) -> Option<u64> {
        match self {
            OptionField::SetToValue(value) => value.length(),
            _ => None,
        }
    }

    fn validate_length(&self, min: Option<u64>, max: Option<u64>, equal: Option<u64>) -> bool {
        match self {
            OptionField::SetToValue(value) => value.validate_length(min, max, equal),
            _ => true,
        }
    }
}

// ---------------------- Core helpers ----------------------

impl<T> OptionField<T> {
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn is_set_to_null(&self) -> bool {
        matches!(self, Self::SetToNull)
    }

    pub fn value_ref(&self) -> Option<&T> {
        if let Self::SetToValue(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// If `SetToValue`, consumes and returns inner value.
    pub fn take_value(self) -> Option<T> {
        if let Self::SetToValue(v) = self {
            Some(v)
        } else {
            None
        }
    }
}

impl<T> From<Option<Option<T>>> for OptionField<T> {
    fn from(opt: Option<Option<T>>) -> Self {
        match opt {
            None => OptionField::Unchanged,
            Some(None) => OptionField::SetToNull,
            Some(Some(v)) => OptionField::SetToValue(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Default)]
    #[serde(default)]
    struct Patch {
        excerpt: OptionField<String>,
        category: OptionField<String>,
        tags: OptionField<Vec<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let patch: Patch = serde_json::from_str(r#"{"excerpt": null, "category": "News"}"#).unwrap();

        assert!(patch.excerpt.is_set_to_null());
        assert_eq!(patch.category, OptionField::SetToValue("News".to_string()));
        assert!(patch.tags.is_unchanged());
    }

    #[test]
    fn into_option_nests() {
        assert_eq!(OptionField::<u8>::Unchanged.into_option(), None);
        assert_eq!(OptionField::<u8>::SetToNull.into_option(), Some(None));
        assert_eq!(OptionField::SetToValue(3u8).into_option(), Some(Some(3)));
    }

    #[test]
    fn length_only_applies_to_values() {
        let value = OptionField::SetToValue("abc".to_string());
        assert!(!value.validate_length(Some(5), None, None));
        assert!(OptionField::<String>::SetToNull.validate_length(Some(5), None, None));
    }
}
