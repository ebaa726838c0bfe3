use crate::error::MappingError;
use crate::gtfs_rt;
use crate::model::{Alert, EntitySelector};
use crate::resolve::{EnumKind, translate};

/// Builds one [`Alert`] owning one [`EntitySelector`] per informed entity.
///
/// Only the first active period is kept. An alert without any active period
/// is rejected rather than stored with an invented window.
pub fn map_alert(
    entity_id: &str,
    alert: &gtfs_rt::Alert,
    language: &str,
) -> Result<Alert, MappingError> {
    let period = alert
        .active_period
        .first()
        .ok_or_else(|| MappingError::NoActivePeriod {
            entity_id: entity_id.to_string(),
        })?;

    let informed_entities = alert
        .informed_entity
        .iter()
        .map(|ie| {
            let trip = ie.trip.as_ref();
            EntitySelector {
                agency_id: ie.agency_id.clone(),
                route_id: ie.route_id.clone(),
                route_type: ie.route_type,
                stop_id: ie.stop_id.clone(),
                trip_id: trip.and_then(|t| t.trip_id.clone()),
                trip_route_id: trip.and_then(|t| t.route_id.clone()),
                trip_start_time: trip.and_then(|t| t.start_time.clone()),
                trip_start_date: trip.and_then(|t| t.start_date.clone()),
            }
        })
        .collect();

    Ok(Alert {
        start: period.start.map(epoch_secs).transpose()?,
        end: period.end.map(epoch_secs).transpose()?,
        cause: EnumKind::Cause.name_of(alert.cause)?.to_string(),
        effect: EnumKind::Effect.name_of(alert.effect)?.to_string(),
        url: translate(alert.url.as_ref(), language),
        header_text: translate(alert.header_text.as_ref(), language),
        description_text: translate(alert.description_text.as_ref(), language),
        informed_entities,
    })
}

fn epoch_secs(secs: u64) -> Result<i64, MappingError> {
    i64::try_from(secs).map_err(|_| MappingError::Timestamp(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::translated_string::Translation;
    use crate::gtfs_rt::{TimeRange, TranslatedString, TripDescriptor};

    fn text(pairs: &[(&str, Option<&str>)]) -> Option<TranslatedString> {
        Some(TranslatedString {
            translation: pairs
                .iter()
                .map(|(text, lang)| Translation {
                    text: text.to_string(),
                    language: lang.map(str::to_string),
                })
                .collect(),
        })
    }

    fn sample_alert() -> gtfs_rt::Alert {
        gtfs_rt::Alert {
            active_period: vec![
                TimeRange {
                    start: Some(100),
                    end: Some(200),
                },
                TimeRange {
                    start: Some(300),
                    end: Some(400),
                },
            ],
            informed_entity: vec![
                gtfs_rt::EntitySelector {
                    agency_id: Some("agency".to_string()),
                    route_id: Some("R1".to_string()),
                    route_type: Some(3),
                    ..Default::default()
                },
                gtfs_rt::EntitySelector {
                    stop_id: Some("S9".to_string()),
                    trip: Some(TripDescriptor {
                        trip_id: Some("T1".to_string()),
                        route_id: Some("R2".to_string()),
                        start_time: Some("10:00:00".to_string()),
                        start_date: Some("20240102".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
            cause: Some(9),
            effect: Some(4),
            url: text(&[("https://example.com/alert", None)]),
            header_text: text(&[("Umleitung", Some("de")), ("Detour", Some("en"))]),
            description_text: text(&[("Bauarbeiten", Some("de")), ("Roadworks", None)]),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_first_period_and_all_informed_entities() {
        let row = map_alert("a1", &sample_alert(), "en").unwrap();

        assert_eq!(row.start, Some(100));
        assert_eq!(row.end, Some(200));
        assert_eq!(row.cause, "MAINTENANCE");
        assert_eq!(row.effect, "DETOUR");
        assert_eq!(row.informed_entities.len(), 2);
        assert_eq!(row.informed_entities[0].route_type, Some(3));
        assert_eq!(row.informed_entities[1].stop_id.as_deref(), Some("S9"));
        assert_eq!(row.informed_entities[1].trip_route_id.as_deref(), Some("R2"));
    }

    #[test]
    fn resolves_texts_in_preferred_language() {
        let row = map_alert("a1", &sample_alert(), "en").unwrap();
        assert_eq!(row.url.as_deref(), Some("https://example.com/alert"));
        assert_eq!(row.header_text.as_deref(), Some("Detour"));
        assert_eq!(row.description_text.as_deref(), Some("Roadworks"));

        let row = map_alert("a1", &sample_alert(), "de").unwrap();
        assert_eq!(row.header_text.as_deref(), Some("Umleitung"));
        assert_eq!(row.description_text.as_deref(), Some("Bauarbeiten"));
    }

    #[test]
    fn alert_without_active_period_is_a_mapping_error() {
        let mut alert = sample_alert();
        alert.active_period.clear();

        let err = map_alert("a1", &alert, "en").unwrap_err();
        assert!(matches!(err, MappingError::NoActivePeriod { entity_id } if entity_id == "a1"));
    }

    #[test]
    fn unset_cause_and_effect_use_declared_defaults() {
        let mut alert = sample_alert();
        alert.cause = None;
        alert.effect = None;

        let row = map_alert("a1", &alert, "en").unwrap();
        assert_eq!(row.cause, "UNKNOWN_CAUSE");
        assert_eq!(row.effect, "UNKNOWN_EFFECT");
    }
}
