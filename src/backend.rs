use crate::{
    aggregate::{Filters, aggregate},
    build::Build,
    circle_ci,
    config::{Mode, Settings},
    error::Result,
    jenkins, travis,
    transport::Transport,
};

/// Runs the adapter selected by `mode` and returns its raw builds.
pub async fn fetch_builds(
    mode: Mode,
    transport: &dyn Transport,
    server_url: &str,
    token: Option<&str>,
) -> Result<Vec<Build>> {
    match mode {
        Mode::Circle => circle_ci::fetch(transport, server_url, token).await,
        Mode::Travis => travis::fetch(transport, server_url, token).await,
        Mode::Jenkins => jenkins::fetch(transport, server_url, token).await,
    }
}

/// One pipeline run: fetch from the configured service, then filter,
/// deduplicate and sort. Configuration errors surface before any request.
pub async fn run(settings: &Settings, transport: &dyn Transport) -> Result<Vec<Build>> {
    let filters = Filters::new(settings.repositories.as_deref(), settings.branch.as_deref())?;
    let server_url = settings.server_url()?;
    let raw = fetch_builds(settings.mode, transport, &server_url, settings.token()).await?;
    let builds = aggregate(raw, &filters);
    tracing::info!(
        backend = settings.mode.display_name(),
        builds = builds.len(),
        "fetched builds"
    );
    Ok(builds)
}
