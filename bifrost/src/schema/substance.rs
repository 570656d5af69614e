//! The `Substance` object and its projection types.

use async_graphql::{Context, Object, Result, SimpleObject};
use futures::future::join_all;

use bifrost_mediawiki::substance::{Roa, RoaDose, SubstanceRecord};
use bifrost_mediawiki::{Gateway, SubstanceData};

use super::effect::Effect;
use super::pagination;

/// Classification groupings of a substance.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceClass {
    /// Chemical classes, e.g. `Lysergamides`.
    pub chemical: Option<Vec<String>>,
    /// Psychoactive classes, e.g. `Psychedelics`.
    pub psychoactive: Option<Vec<String>>,
}

/// Time until tolerance decays, per tier.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceTolerance {
    /// Time to full tolerance.
    pub full: Option<String>,
    /// Time to half tolerance.
    pub half: Option<String>,
    /// Time to baseline.
    pub zero: Option<String>,
}

/// A plain numeric range.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoaRange {
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
}

/// A duration range with its own unit.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoaDurationRange {
    /// Lower bound in `units`.
    pub min: Option<f64>,
    /// Upper bound in `units`.
    pub max: Option<f64>,
    /// Unit for both bounds.
    pub units: Option<String>,
}

/// Dosing tiers for one route.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoaDose {
    /// Unit shared by all tiers.
    pub units: Option<String>,
    /// Minimum perceptible dose.
    pub threshold: Option<f64>,
    /// Heavy dose floor.
    pub heavy: Option<f64>,
    /// Light dose range.
    pub light: Option<SubstanceRoaRange>,
    /// Common dose range.
    pub common: Option<SubstanceRoaRange>,
    /// Strong dose range.
    pub strong: Option<SubstanceRoaRange>,
}

/// Duration stages for one route.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoaDuration {
    /// Time until first effects.
    pub onset: Option<SubstanceRoaDurationRange>,
    /// Ramp-up phase.
    pub comeup: Option<SubstanceRoaDurationRange>,
    /// Peak phase.
    pub peak: Option<SubstanceRoaDurationRange>,
    /// Comedown phase.
    pub offset: Option<SubstanceRoaDurationRange>,
    /// Residual effects.
    pub afterglow: Option<SubstanceRoaDurationRange>,
    /// Total duration.
    pub total: Option<SubstanceRoaDurationRange>,
    /// Catch-all duration range.
    pub duration: Option<SubstanceRoaDurationRange>,
}

/// One route of administration.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoa {
    /// Route name, e.g. `oral`.
    pub name: String,
    /// Dosing tiers.
    pub dose: Option<SubstanceRoaDose>,
    /// Duration stages.
    pub duration: Option<SubstanceRoaDuration>,
    /// Bioavailability range in percent.
    pub bioavailability: Option<SubstanceRoaRange>,
}

/// The routes of administration keyed by name.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceRoaTypes {
    pub oral: Option<SubstanceRoa>,
    pub sublingual: Option<SubstanceRoa>,
    pub buccal: Option<SubstanceRoa>,
    pub insufflated: Option<SubstanceRoa>,
    pub rectal: Option<SubstanceRoa>,
    pub transdermal: Option<SubstanceRoa>,
    pub subcutaneous: Option<SubstanceRoa>,
    pub intramuscular: Option<SubstanceRoa>,
    pub intravenous: Option<SubstanceRoa>,
    pub smoked: Option<SubstanceRoa>,
}

/// A thumbnail/full-size image URL pair.
#[derive(Debug, Clone, SimpleObject)]
pub struct SubstanceImage {
    /// Thumbnail URL.
    pub thumb: String,
    /// Full-size URL.
    pub image: String,
}

impl From<bifrost_mediawiki::SubstanceImage> for SubstanceImage {
    fn from(image: bifrost_mediawiki::SubstanceImage) -> Self {
        Self {
            thumb: image.thumb,
            image: image.image,
        }
    }
}

/// A substance page, possibly enriched with its semantic record.
pub struct Substance {
    data: SubstanceData,
}

impl Substance {
    /// Wraps resolver-layer substance data.
    pub fn new(data: SubstanceData) -> Self {
        Self { data }
    }

    fn record(&self) -> Option<&SubstanceRecord> {
        self.data.record.as_ref()
    }
}

#[Object]
impl Substance {
    /// Page title, unique within the wiki.
    async fn name(&self) -> &str {
        &self.data.name
    }

    /// Canonical page URL.
    async fn url(&self) -> Option<&str> {
        self.data.url.as_deref()
    }

    /// Whether the page is featured.
    async fn featured(&self) -> Option<bool> {
        self.record()?.featured
    }

    /// Chemical and psychoactive classification.
    async fn class(&self) -> Option<SubstanceClass> {
        let class = &self.record()?.class;
        (!class.is_empty()).then(|| SubstanceClass {
            chemical: class.chemical.clone(),
            psychoactive: class.psychoactive.clone(),
        })
    }

    /// Tolerance onset and decay.
    async fn tolerance(&self) -> Option<SubstanceTolerance> {
        let record = self.record()?;
        (!record.tolerance.is_empty()).then(|| SubstanceTolerance {
            full: record.tolerance_tier("full").map(str::to_owned),
            half: record.tolerance_tier("half").map(str::to_owned),
            zero: record.tolerance_tier("zero").map(str::to_owned),
        })
    }

    /// All known routes of administration.
    async fn roas(&self) -> Option<Vec<SubstanceRoa>> {
        let record = self.record()?;
        (!record.roa.is_empty()).then(|| record.roas().into_iter().map(roa_object).collect())
    }

    /// The routes of administration, keyed by name.
    async fn roa(&self) -> Option<SubstanceRoaTypes> {
        let record = self.record()?;
        let by_name = |name: &str| record.roa.get(name).map(roa_object);
        (!record.roa.is_empty()).then(|| SubstanceRoaTypes {
            oral: by_name("oral"),
            sublingual: by_name("sublingual"),
            buccal: by_name("buccal"),
            insufflated: by_name("insufflated"),
            rectal: by_name("rectal"),
            transdermal: by_name("transdermal"),
            subcutaneous: by_name("subcutaneous"),
            intramuscular: by_name("intramuscular"),
            intravenous: by_name("intravenous"),
            smoked: by_name("smoked"),
        })
    }

    async fn addiction_potential(&self) -> Option<&str> {
        self.record()?.addiction_potential.as_deref()
    }

    async fn toxicity(&self) -> Option<&Vec<String>> {
        self.record()?.toxicity.as_ref()
    }

    async fn cross_tolerances(&self) -> Option<&Vec<String>> {
        self.record()?.cross_tolerances.as_ref()
    }

    async fn common_names(&self) -> Option<&Vec<String>> {
        self.record()?.common_names.as_ref()
    }

    async fn systematic_name(&self) -> Option<&str> {
        self.record()?.systematic_name.as_deref()
    }

    /// Interaction entries with uncertain risk, resolved to substances.
    async fn uncertain_interactions(&self, ctx: &Context<'_>) -> Result<Option<Vec<Substance>>> {
        let names = self.record().and_then(|r| r.uncertain_interactions.as_ref());
        resolve_interactions(ctx, names).await
    }

    /// Interaction entries considered unsafe, resolved to substances.
    async fn unsafe_interactions(&self, ctx: &Context<'_>) -> Result<Option<Vec<Substance>>> {
        let names = self.record().and_then(|r| r.unsafe_interactions.as_ref());
        resolve_interactions(ctx, names).await
    }

    /// Interaction entries considered dangerous, resolved to substances.
    async fn dangerous_interactions(&self, ctx: &Context<'_>) -> Result<Option<Vec<Substance>>> {
        let names = self.record().and_then(|r| r.dangerous_interactions.as_ref());
        resolve_interactions(ctx, names).await
    }

    /// Effects attached to this substance's page.
    async fn effects(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Effect>> {
        let gateway = ctx.data::<Gateway>()?;
        let pages = gateway
            .effects_by_substance(&self.data.name, pagination(limit, offset))
            .await
            .map_err(super::upstream_error)?;
        Ok(pages.into_iter().map(Effect::from_page).collect())
    }

    /// Two-paragraph abstract of the substance page.
    async fn summary(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        let gateway = ctx.data::<Gateway>()?;
        Ok(gateway.summary(&self.data.name).await)
    }

    /// Images on the substance page.
    async fn images(&self, ctx: &Context<'_>) -> Result<Option<Vec<SubstanceImage>>> {
        let gateway = ctx.data::<Gateway>()?;
        Ok(gateway
            .images(&self.data.name)
            .await
            .map(|images| images.into_iter().map(Into::into).collect()))
    }
}

/// Resolves raw interaction names concurrently, keeping input order.
async fn resolve_interactions(
    ctx: &Context<'_>,
    names: Option<&Vec<String>>,
) -> Result<Option<Vec<Substance>>> {
    let Some(names) = names else {
        return Ok(None);
    };
    let gateway = ctx.data::<Gateway>()?;
    let resolved = join_all(names.iter().map(|name| gateway.resolve_interaction(name))).await;

    let mut substances = Vec::with_capacity(names.len());
    for outcome in resolved {
        let outcome = outcome.map_err(super::upstream_error)?;
        substances.push(Substance::new(outcome.into_data()));
    }
    Ok(Some(substances))
}

fn roa_object(roa: &Roa) -> SubstanceRoa {
    SubstanceRoa {
        name: roa.name.clone(),
        dose: dose_object(&roa.dose),
        duration: duration_object(roa),
        bioavailability: (!roa.bioavailability.is_empty()).then(|| SubstanceRoaRange {
            min: roa.bioavailability.min,
            max: roa.bioavailability.max,
        }),
    }
}

fn dose_object(dose: &RoaDose) -> Option<SubstanceRoaDose> {
    if dose.is_empty() {
        return None;
    }
    let range = |intensity: &str| {
        dose.range(intensity).map(|bounds| SubstanceRoaRange {
            min: bounds.min,
            max: bounds.max,
        })
    };
    Some(SubstanceRoaDose {
        units: dose.units.clone(),
        threshold: dose.scalar("threshold"),
        heavy: dose.scalar("heavy"),
        light: range("light"),
        common: range("common"),
        strong: range("strong"),
    })
}

fn duration_object(roa: &Roa) -> Option<SubstanceRoaDuration> {
    if roa.duration.is_empty() {
        return None;
    }
    let stage = |name: &str| {
        roa.stage(name).map(|stage| SubstanceRoaDurationRange {
            min: stage.min,
            max: stage.max,
            units: stage.units.clone(),
        })
    };
    Some(SubstanceRoaDuration {
        onset: stage("onset"),
        comeup: stage("comeup"),
        peak: stage("peak"),
        offset: stage("offset"),
        afterglow: stage("afterglow"),
        total: stage("total"),
        duration: stage("duration"),
    })
}
