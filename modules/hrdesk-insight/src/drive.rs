use anyhow::{bail, ensure, Result};
use hrdesk_resolver::{OptionSource, Resolver, Selection};

/// Start `resolver` and apply the requested selections stage by stage,
/// waiting for each stage's fetches to settle. `None` keeps whatever the
/// stage selected by itself.
pub async fn walk<S: OptionSource>(resolver: &mut Resolver<S>, picks: &[Option<String>]) -> Result<()> {
    ensure!(
        picks.len() <= resolver.stages().len(),
        "{} selections given for a {}-stage chain",
        picks.len(),
        resolver.stages().len()
    );

    resolver.start();
    resolver.settle().await;

    for (stage, pick) in picks.iter().enumerate() {
        if let Some(err) = resolver.last_error() {
            return Err(err.clone().into());
        }
        let Some(value) = pick else { continue };

        let options = resolver.options(stage);
        if !options.contains(value) {
            bail!(
                "{value:?} is not a {} option (available: {})",
                resolver.stages()[stage].name,
                options.join(", ")
            );
        }

        resolver.select(stage, Selection::value(value.as_str()))?;
        resolver.settle().await;
    }

    match resolver.last_error() {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}
