//! Property-name dispatch from SMW subjects into substance records.
//!
//! Property names encode their target as underscore-joined segments, e.g.
//! `oral_common_min_dose` or `Time_to_half_tolerance`. Each name is matched
//! against the anchored patterns below in order, first match wins; flat and
//! mapped meta-properties are dispatched independently, so a name can in
//! principle take both paths.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::smw::{SmwSlot, SmwSubject, SmwValue};
use crate::substance::{SubstanceRecord, is_roa_name};
use crate::wikitext;

static ROA_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_(.+?)_(.+?)_time$").expect("valid regex"));
static ROA_DOSE_BOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_(.+?)_(.+?)_dose$").expect("valid regex"));
static ROA_DOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_(.+?)_dose$").expect("valid regex"));
static ROA_BIOAVAILABILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_(.+?)_bioavailability$").expect("valid regex"));
static ROA_DOSE_UNITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_dose_units$").expect("valid regex"));
static ROA_TIME_UNITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)_(.+?)_time_units$").expect("valid regex"));
static TOLERANCE_TIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Time_to_(.+?)_tolerance$").expect("valid regex"));

/// Parses a transformed subject into a structured record.
///
/// Parsing is pure: the same subject always yields a structurally equal
/// record.
pub fn parse_substance(subject: &SmwSubject) -> SubstanceRecord {
    let mut record = SubstanceRecord::default();
    for (name, slot) in &subject.properties {
        dispatch_pattern(&mut record, name, slot);
        dispatch_meta(&mut record, name, slot);
    }
    record
}

/// Matches `name` against the pattern table, first match wins.
fn dispatch_pattern(record: &mut SubstanceRecord, name: &str, slot: &SmwSlot) {
    if let Some(caps) = ROA_TIME.captures(name) {
        let (roa, stage, bound) = (lower(&caps[1]), lower(&caps[2]), lower(&caps[3]));
        if is_roa_name(&roa)
            && let Some(value) = first_f64(slot)
        {
            let stage = record
                .roa_mut(&roa)
                .duration
                .entry(stage)
                .or_default();
            match bound.as_str() {
                "min" => stage.min = Some(value),
                "max" => stage.max = Some(value),
                _ => {}
            }
        }
    } else if let Some(caps) = ROA_DOSE_BOUND.captures(name) {
        let (roa, intensity, bound) = (lower(&caps[1]), lower(&caps[2]), lower(&caps[3]));
        if is_roa_name(&roa)
            && let Some(value) = first_f64(slot)
        {
            let entry = record.roa_mut(&roa).dose.entry_mut(&intensity);
            match bound.as_str() {
                "min" => entry.min = Some(value),
                "max" => entry.max = Some(value),
                _ => {}
            }
        }
    } else if let Some(caps) = ROA_DOSE.captures(name) {
        let (roa, intensity) = (lower(&caps[1]), lower(&caps[2]));
        if is_roa_name(&roa)
            && let Some(value) = first_f64(slot)
        {
            record.roa_mut(&roa).dose.entry_mut(&intensity).value = Some(value);
        }
    } else if let Some(caps) = ROA_BIOAVAILABILITY.captures(name) {
        let (roa, bound) = (lower(&caps[1]), lower(&caps[2]));
        if is_roa_name(&roa)
            && let Some(value) = first_f64(slot)
        {
            record.roa_mut(&roa).bioavailability.set(&bound, value);
        }
    } else if let Some(caps) = ROA_DOSE_UNITS.captures(name) {
        let roa = lower(&caps[1]);
        if is_roa_name(&roa)
            && let Some(units) = first_text(slot)
        {
            record.roa_mut(&roa).dose.units = Some(units);
        }
    } else if let Some(caps) = ROA_TIME_UNITS.captures(name) {
        let (roa, stage) = (lower(&caps[1]), lower(&caps[2]));
        if is_roa_name(&roa)
            && let Some(units) = first_text(slot)
        {
            record
                .roa_mut(&roa)
                .duration
                .entry(stage)
                .or_default()
                .units = Some(units);
        }
    } else if let Some(caps) = TOLERANCE_TIER.captures(name) {
        let tier = lower(&caps[1]);
        if let Some(text) = first_text(slot) {
            record.tolerance.insert(tier, text);
        }
    }
}

/// Dispatches the flat and mapped meta-properties.
fn dispatch_meta(record: &mut SubstanceRecord, name: &str, slot: &SmwSlot) {
    match name.to_lowercase().as_str() {
        "addiction_potential" => {
            record.addiction_potential = first_text(slot).map(|s| wikitext::sanitize(&s));
        }
        "systematic_name" => {
            record.systematic_name = first_text(slot).map(|s| wikitext::sanitize(&s));
        }
        "uncertaininteraction" => record.uncertain_interactions = Some(text_list(slot)),
        "unsafeinteraction" => record.unsafe_interactions = Some(text_list(slot)),
        "dangerousinteraction" => record.dangerous_interactions = Some(text_list(slot)),
        "effect" => record.effects = Some(text_list(slot)),
        "common_name" => {
            record.common_names = Some(
                text_list(slot)
                    .iter()
                    .map(|s| wikitext::clean_page_name(s))
                    .collect(),
            );
        }
        "cross-tolerance" => {
            record.cross_tolerances = Some(
                text_list(slot)
                    .iter()
                    .flat_map(|s| wikitext::link_targets(s))
                    .collect(),
            );
        }
        "featured" => {
            record.featured = first_text(slot).map(|s| s == "t");
        }
        "toxicity" => {
            record.toxicity = Some(
                text_list(slot)
                    .iter()
                    .map(|s| wikitext::sanitize(s))
                    .collect(),
            );
        }
        "psychoactive_class" => {
            record.class.psychoactive = Some(
                text_list(slot)
                    .iter()
                    .map(|s| wikitext::clean_page_name(s))
                    .collect(),
            );
        }
        "chemical_class" => {
            record.class.chemical = Some(
                text_list(slot)
                    .iter()
                    .map(|s| wikitext::clean_page_name(s))
                    .collect(),
            );
        }
        _ => {}
    }
}

fn lower(segment: &str) -> String {
    segment.to_lowercase()
}

fn first_f64(slot: &SmwSlot) -> Option<f64> {
    slot.first().and_then(SmwValue::as_f64)
}

fn first_text(slot: &SmwSlot) -> Option<String> {
    slot.first().and_then(SmwValue::as_text)
}

/// Forces a slot into a list of texts, normalizing scalar arity.
fn text_list(slot: &SmwSlot) -> Vec<String> {
    slot.values()
        .into_iter()
        .filter_map(SmwValue::as_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::smw::{SmwSlot, SmwSubject, SmwValue};
    use crate::substance::Bounds;

    use super::*;

    fn one(value: SmwValue) -> SmwSlot {
        SmwSlot::One(value)
    }

    fn text(value: &str) -> SmwSlot {
        one(SmwValue::Text(value.to_owned()))
    }

    fn number(value: f64) -> SmwSlot {
        one(SmwValue::Number(value))
    }

    fn subject(properties: Vec<(&str, SmwSlot)>) -> SmwSubject {
        SmwSubject {
            subject: "Testium".to_owned(),
            properties: properties
                .into_iter()
                .map(|(name, slot)| (name.to_owned(), slot))
                .collect(),
        }
    }

    #[test]
    fn dose_duration_tolerance_and_classes() {
        let subject = subject(vec![
            ("Oral_common_min_dose", number(10.0)),
            ("Oral_common_max_dose", number(20.0)),
            ("Oral_dose_units", text("mg")),
            ("Time_to_half_tolerance", text("3 days")),
            ("Psychoactive_class", text("stimulant_")),
            (
                "Dangerousinteraction",
                SmwSlot::Many(vec![
                    SmwValue::Page("Alcohol".to_owned()),
                    SmwValue::Page("Cocaine".to_owned()),
                ]),
            ),
        ]);

        let record = parse_substance(&subject);

        let oral = record.roa.get("oral").expect("oral roa");
        assert_eq!(
            oral.dose.range("common"),
            Some(Bounds {
                min: Some(10.0),
                max: Some(20.0)
            })
        );
        assert_eq!(oral.dose.units.as_deref(), Some("mg"));
        assert_eq!(record.tolerance_tier("half"), Some("3 days"));
        assert_eq!(
            record.class.psychoactive,
            Some(vec!["stimulant".to_owned()])
        );
        assert_eq!(
            record.dangerous_interactions,
            Some(vec!["Alcohol".to_owned(), "Cocaine".to_owned()])
        );

        // The keyed map is mirrored into the named list.
        let roas = record.roas();
        assert_eq!(roas.len(), 1);
        assert_eq!(roas[0].name, "oral");
    }

    #[test]
    fn duration_stages_with_units() {
        let subject = subject(vec![
            ("Oral_onset_min_time", number(15.0)),
            ("Oral_onset_max_time", number(30.0)),
            ("Oral_onset_time_units", text("minutes")),
            ("Oral_total_min_time", number(6.0)),
            ("Oral_total_max_time", number(10.0)),
            ("Oral_total_time_units", text("hours")),
        ]);

        let record = parse_substance(&subject);
        let oral = record.roa.get("oral").expect("oral roa");

        let onset = oral.stage("onset").expect("onset stage");
        assert_eq!(onset.min, Some(15.0));
        assert_eq!(onset.max, Some(30.0));
        assert_eq!(onset.units.as_deref(), Some("minutes"));

        let total = oral.stage("total").expect("total stage");
        assert_eq!(total.units.as_deref(), Some("hours"));
    }

    #[test]
    fn scalar_dose_intensities() {
        let subject = subject(vec![
            ("Oral_threshold_dose", number(5.0)),
            ("Oral_heavy_dose", number(100.0)),
        ]);

        let record = parse_substance(&subject);
        let dose = &record.roa.get("oral").expect("oral roa").dose;
        assert_eq!(dose.scalar("threshold"), Some(5.0));
        assert_eq!(dose.scalar("heavy"), Some(100.0));
        assert_eq!(dose.range("threshold"), None);
    }

    #[test]
    fn unknown_roa_names_are_dropped() {
        let subject = subject(vec![
            ("Vaporized_common_min_dose", number(5.0)),
            ("Oral_common_min_dose", number(10.0)),
        ]);

        let record = parse_substance(&subject);
        assert_eq!(record.roa.len(), 1);
        assert!(record.roa.contains_key("oral"));
    }

    #[test]
    fn bioavailability_bounds() {
        let subject = subject(vec![
            ("Insufflated_min_bioavailability", number(25.0)),
            ("Insufflated_max_bioavailability", number(43.0)),
        ]);

        let record = parse_substance(&subject);
        let roa = record.roa.get("insufflated").expect("insufflated roa");
        assert_eq!(roa.bioavailability.min, Some(25.0));
        assert_eq!(roa.bioavailability.max, Some(43.0));
    }

    #[test]
    fn scalar_interaction_is_forced_to_array() {
        let subject = subject(vec![(
            "Uncertaininteraction",
            one(SmwValue::Page("Cannabis".to_owned())),
        )]);

        let record = parse_substance(&subject);
        assert_eq!(
            record.uncertain_interactions,
            Some(vec!["Cannabis".to_owned()])
        );
    }

    #[test]
    fn effect_and_common_name_properties() {
        let subject = subject(vec![
            ("Effect", one(SmwValue::Page("Euphoria".to_owned()))),
            ("Common_name", text("acid_")),
        ]);

        let record = parse_substance(&subject);
        assert_eq!(record.effects, Some(vec!["Euphoria".to_owned()]));
        assert_eq!(record.common_names, Some(vec!["acid".to_owned()]));
    }

    #[test]
    fn cross_tolerance_links_are_extracted() {
        let subject = subject(vec![(
            "Cross-tolerance",
            text("[[Psychedelics|psychedelics]] and [[Stimulants]]"),
        )]);

        let record = parse_substance(&subject);
        assert_eq!(
            record.cross_tolerances,
            Some(vec!["Psychedelics".to_owned(), "Stimulants".to_owned()])
        );
    }

    #[test]
    fn cross_tolerance_without_links_is_empty() {
        let subject = subject(vec![("Cross-tolerance", text("none known"))]);
        let record = parse_substance(&subject);
        assert_eq!(record.cross_tolerances, Some(Vec::new()));
    }

    #[test]
    fn featured_flag() {
        let record = parse_substance(&subject(vec![("Featured", text("t"))]));
        assert_eq!(record.featured, Some(true));

        let record = parse_substance(&subject(vec![("Featured", text("f"))]));
        assert_eq!(record.featured, Some(false));
    }

    #[test]
    fn wikitext_is_stripped_from_flat_fields() {
        let subject = subject(vec![
            (
                "Addiction_potential",
                text("low with [[Tolerance|rapid tolerance]]"),
            ),
            ("Systematic_name", text("6-methyl-<sub>2</sub>something")),
        ]);

        let record = parse_substance(&subject);
        assert_eq!(
            record.addiction_potential.as_deref(),
            Some("low with rapid tolerance")
        );
        assert_eq!(
            record.systematic_name.as_deref(),
            Some("6-methyl-2something")
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        let subject = subject(vec![
            ("Oral_common_min_dose", number(10.0)),
            ("Oral_common_max_dose", number(20.0)),
            ("Oral_dose_units", text("mg")),
            ("Time_to_zero_tolerance", text("2 weeks")),
            ("Chemical_class", text("Lysergamides#")),
        ]);

        assert_eq!(parse_substance(&subject), parse_substance(&subject));
    }

    #[test]
    fn bioavailability_min_does_not_collide_with_dose_patterns() {
        // `oral_min_bioavailability` must not be swallowed by the lazier
        // dose/time patterns.
        let subject = subject(vec![("Oral_min_bioavailability", number(50.0))]);
        let record = parse_substance(&subject);
        assert_eq!(
            record.roa.get("oral").expect("oral").bioavailability.min,
            Some(50.0)
        );
    }
}
