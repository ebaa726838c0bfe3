//! Lookups shared by the entity mappers: picking one translation out of a
//! `TranslatedString`, and naming the wire values of the typed status codes.

use std::fmt;

use crate::error::MappingError;
use crate::gtfs_rt::translated_string::Translation;
use crate::gtfs_rt::{TranslatedString, alert, trip_descriptor, vehicle_position};

/// Picks one text out of a set of per-language alternatives.
///
/// A single translation is returned whatever its language. Otherwise the first
/// translation in `preferred` wins, falling back to the first translation that
/// carries no language at all.
pub fn resolve_translation(translations: &[Translation], preferred: &str) -> Option<String> {
    if let [only] = translations {
        return Some(only.text.clone());
    }

    let mut untranslated: Option<&str> = None;
    for t in translations {
        match t.language.as_deref() {
            Some(lang) if lang == preferred => return Some(t.text.clone()),
            None | Some("") if untranslated.is_none() => untranslated = Some(t.text.as_str()),
            _ => {}
        }
    }
    untranslated.map(str::to_string)
}

/// [`resolve_translation`] over an optional field.
pub fn translate(string: Option<&TranslatedString>, preferred: &str) -> Option<String> {
    string.and_then(|s| resolve_translation(&s.translation, preferred))
}

/// The enumerations whose symbolic names are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    ScheduleRelationship,
    Cause,
    Effect,
    OccupancyStatus,
}

impl EnumKind {
    /// Value a reader sees when the field is absent on the wire.
    pub fn default_value(&self) -> i32 {
        match self {
            EnumKind::ScheduleRelationship => trip_descriptor::ScheduleRelationship::Scheduled as i32,
            EnumKind::Cause => alert::Cause::UnknownCause as i32,
            EnumKind::Effect => alert::Effect::UnknownEffect as i32,
            EnumKind::OccupancyStatus => vehicle_position::OccupancyStatus::Empty as i32,
        }
    }

    /// Resolves an optional wire value, substituting the declared default when unset.
    pub fn name_of(&self, value: Option<i32>) -> Result<&'static str, MappingError> {
        resolve_enum(*self, value.unwrap_or_else(|| self.default_value()))
    }
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EnumKind::ScheduleRelationship => "TripDescriptor.ScheduleRelationship",
            EnumKind::Cause => "Alert.Cause",
            EnumKind::Effect => "Alert.Effect",
            EnumKind::OccupancyStatus => "VehiclePosition.OccupancyStatus",
        })
    }
}

/// Maps a wire value to the name declared for it in the feed schema.
///
/// # Errors
///
/// Returns [`MappingError::UnknownEnumValue`] when `value` is not a member of `kind`.
pub fn resolve_enum(kind: EnumKind, value: i32) -> Result<&'static str, MappingError> {
    let name = match kind {
        EnumKind::ScheduleRelationship => {
            trip_descriptor::ScheduleRelationship::try_from(value).map(|e| e.as_str_name())
        }
        EnumKind::Cause => alert::Cause::try_from(value).map(|e| e.as_str_name()),
        EnumKind::Effect => alert::Effect::try_from(value).map(|e| e.as_str_name()),
        EnumKind::OccupancyStatus => {
            vehicle_position::OccupancyStatus::try_from(value).map(|e| e.as_str_name())
        }
    };
    name.map_err(|_| MappingError::UnknownEnumValue { kind, value })
}
