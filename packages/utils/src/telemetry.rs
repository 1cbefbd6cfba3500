use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

/// Build a filter from the default env (RUST_LOG) plus explicit directives.
pub fn tracing_env_filter<'a>(directives: impl IntoIterator<Item = &'a str>) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();
    for directive in directives {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(err) => bail!("{}: {}", err, directive),
        }
    }

    Ok(filter)
}

/// Install a stdout subscriber for the whole process.
/// Call once, early in main
pub fn init_tracing<'a>(directives: impl IntoIterator<Item = &'a str>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_env_filter(directives)?)
        .init();
    Ok(())
}
