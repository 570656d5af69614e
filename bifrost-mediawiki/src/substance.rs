//! Structured substance records produced by the property parser.
//!
//! Sub-keys the wiki invents (dose intensities, duration stages, tolerance
//! tiers) are kept as ordered maps so nothing is lost between parsing and
//! projection; route-of-administration names outside [`ROA_NAMES`] are the
//! one thing the parser drops.

use indexmap::IndexMap;

/// The closed set of route-of-administration names.
pub const ROA_NAMES: [&str; 10] = [
    "oral",
    "sublingual",
    "buccal",
    "insufflated",
    "rectal",
    "transdermal",
    "subcutaneous",
    "intramuscular",
    "intravenous",
    "smoked",
];

/// Whether `name` is one of the known routes of administration.
pub fn is_roa_name(name: &str) -> bool {
    ROA_NAMES.contains(&name)
}

/// A `min`/`max` pair where either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

impl Bounds {
    /// Whether neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub(crate) fn set(&mut self, bound: &str, value: f64) {
        match bound {
            "min" => self.min = Some(value),
            "max" => self.max = Some(value),
            _ => {}
        }
    }
}

/// A dose figure for one intensity: either a single value (threshold,
/// heavy) or a range (light, common, strong), depending on which property
/// shapes the wiki carries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoseValue {
    /// Scalar form, from `{roa}_{intensity}_dose`.
    pub value: Option<f64>,
    /// Range lower bound, from `{roa}_{intensity}_min_dose`.
    pub min: Option<f64>,
    /// Range upper bound, from `{roa}_{intensity}_max_dose`.
    pub max: Option<f64>,
}

/// Dosing information for one route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoaDose {
    /// Unit shared by all intensities, e.g. `mg`.
    pub units: Option<String>,
    /// Intensity name to figure, in property order.
    pub entries: IndexMap<String, DoseValue>,
}

impl RoaDose {
    /// Whether no dose property was seen at all.
    pub fn is_empty(&self) -> bool {
        self.units.is_none() && self.entries.is_empty()
    }

    /// The scalar figure for an intensity, if one was recorded.
    pub fn scalar(&self, intensity: &str) -> Option<f64> {
        self.entries.get(intensity)?.value
    }

    /// The range figure for an intensity, if any bound was recorded.
    pub fn range(&self, intensity: &str) -> Option<Bounds> {
        let entry = self.entries.get(intensity)?;
        let bounds = Bounds {
            min: entry.min,
            max: entry.max,
        };
        (!bounds.is_empty()).then_some(bounds)
    }

    pub(crate) fn entry_mut(&mut self, intensity: &str) -> &mut DoseValue {
        self.entries.entry(intensity.to_owned()).or_default()
    }
}

/// One duration stage (onset, comeup, peak, ...) with its own units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationStage {
    /// Lower bound in `units`.
    pub min: Option<f64>,
    /// Upper bound in `units`.
    pub max: Option<f64>,
    /// Unit for both bounds, e.g. `minutes`.
    pub units: Option<String>,
}

/// Everything known about one route of administration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roa {
    /// Route name, one of [`ROA_NAMES`].
    pub name: String,
    /// Dosing by intensity.
    pub dose: RoaDose,
    /// Duration stages in property order.
    pub duration: IndexMap<String, DurationStage>,
    /// Bioavailability range in percent.
    pub bioavailability: Bounds,
}

impl Roa {
    /// A duration stage by name.
    pub fn stage(&self, name: &str) -> Option<&DurationStage> {
        self.duration.get(name)
    }
}

/// Classification groupings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstanceClass {
    /// Chemical classes, cleaned of wiki page-name artifacts.
    pub chemical: Option<Vec<String>>,
    /// Psychoactive classes, cleaned the same way.
    pub psychoactive: Option<Vec<String>>,
}

impl SubstanceClass {
    /// Whether neither grouping was seen.
    pub fn is_empty(&self) -> bool {
        self.chemical.is_none() && self.psychoactive.is_none()
    }
}

/// The structured result of parsing one subject's semantic properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstanceRecord {
    /// Whether the page is featured (`featured` property equals `"t"`).
    pub featured: Option<bool>,
    /// Human-readable addiction potential, wikitext stripped.
    pub addiction_potential: Option<String>,
    /// IUPAC-style name, wikitext stripped.
    pub systematic_name: Option<String>,
    /// Street and common names.
    pub common_names: Option<Vec<String>>,
    /// Toxicity notes, wikitext stripped.
    pub toxicity: Option<Vec<String>>,
    /// Substances sharing tolerance, extracted from wiki links.
    pub cross_tolerances: Option<Vec<String>>,
    /// Substance names with uncertain interaction risk.
    pub uncertain_interactions: Option<Vec<String>>,
    /// Substance names with unsafe interaction risk.
    pub unsafe_interactions: Option<Vec<String>>,
    /// Substance names with dangerous interaction risk.
    pub dangerous_interactions: Option<Vec<String>>,
    /// Effect page names attached to the subject.
    pub effects: Option<Vec<String>>,
    /// Classification groupings.
    pub class: SubstanceClass,
    /// Tolerance tier (`full`, `half`, `zero`, ...) to duration text.
    pub tolerance: IndexMap<String, String>,
    /// Routes of administration keyed by name, in property order.
    pub roa: IndexMap<String, Roa>,
}

impl SubstanceRecord {
    /// The keyed routes as a list; each entry already carries its name.
    pub fn roas(&self) -> Vec<&Roa> {
        self.roa.values().collect()
    }

    /// A tolerance tier's text.
    pub fn tolerance_tier(&self, tier: &str) -> Option<&str> {
        self.tolerance.get(tier).map(String::as_str)
    }

    pub(crate) fn roa_mut(&mut self, name: &str) -> &mut Roa {
        self.roa
            .entry(name.to_owned())
            .or_insert_with(|| Roa {
                name: name.to_owned(),
                ..Roa::default()
            })
    }
}
