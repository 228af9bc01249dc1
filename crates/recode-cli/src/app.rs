//! Registry assembly, execution and error reporting

use crate::cli::{Action, Invocation};
use crate::settings::Settings;
use anyhow::Context;
use clap::Command;
use recode_core::{display_chain, find_argument_error, Recoder, Registry, RegistryError};
use recode_import::{Remotes, VarFilesFilter};
use recode_template::TemplateCodec;
use std::io::{Read, Write};
use std::sync::Arc;

/// Exit status for failed runs
pub const EXIT_FAILURE: u8 = 1;

/// Exit status for usage errors
pub const EXIT_USAGE: u8 = 2;

/// Remote stores selected by the settings
///
/// # Errors
/// - S3 requested but unavailable in this build, or its client cannot be set up
pub fn remotes(settings: &Settings) -> anyhow::Result<Remotes> {
    let remotes = Remotes::new().with_fetcher_config(settings.fetch.clone());
    if settings.s3.enabled {
        with_s3(remotes)
    } else {
        Ok(remotes)
    }
}

#[cfg(feature = "s3")]
fn with_s3(remotes: Remotes) -> anyhow::Result<Remotes> {
    remotes
        .with_s3_from_env()
        .context("cannot configure S3 access")
}

#[cfg(not(feature = "s3"))]
fn with_s3(_remotes: Remotes) -> anyhow::Result<Remotes> {
    anyhow::bail!("S3 access requested, but recode was built without the 's3' feature")
}

/// Built-in codecs, `varfiles` and `tpl`, initialized
///
/// # Errors
/// - `RegistryError` on name collision or failed codec setup
pub fn build_registry(settings: &Settings, remotes: Remotes) -> Result<Arc<Registry>, RegistryError> {
    let mut registry = Registry::with_builtin_codecs()?;

    let mut varfiles = VarFilesFilter::new();
    let mut template = TemplateCodec::new().with_remotes(remotes);
    if let Some(dir) = &settings.base_dir {
        varfiles = varfiles.with_base_dir(dir);
        template = template.with_base_dir(dir);
    }
    registry.register_filter(varfiles)?;
    registry.register(template)?;

    registry.initialize()
}

/// Write the codec and filter listing
///
/// # Errors
/// - write failures
pub fn list(registry: &Registry, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "codecs:")?;
    for codec in registry.codecs() {
        let mut capabilities = Vec::new();
        if codec.decoder().is_some() {
            capabilities.push("decode");
        }
        if codec.encoder().is_some() {
            capabilities.push("encode");
        }
        writeln!(
            out,
            "  {:<18}{:<15}{}",
            codec.names().join(", "),
            capabilities.join(" "),
            codec.description()
        )?;
    }

    writeln!(out, "filters:")?;
    for filter in registry.filters() {
        writeln!(
            out,
            "  {:<33}{}",
            filter.names().join(", "),
            filter.description()
        )?;
    }
    out.flush()
}

/// Run one invocation against already opened streams
///
/// # Errors
/// - setup failures, recoding failures (with the `ArgumentError` kept in the chain)
pub fn execute(
    invocation: &Invocation,
    settings: &Settings,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> anyhow::Result<()> {
    let registry = build_registry(settings, remotes(settings)?).context("cannot set up codecs")?;

    match &invocation.action {
        Action::List => list(&registry, output).context("cannot write codec list"),
        Action::Recode(config) => {
            tracing::debug!(decoder = %config.decoder, encoder = %config.encoder, filters = config.filters.len(), "recoding");
            Recoder::new(registry).run(config, input, output)?;
            Ok(())
        }
    }
}

/// Print a failure and pick the exit status
///
/// An `ArgumentError` anywhere in the chain prints the usage text and exits
/// with [`EXIT_USAGE`]; anything else prints the cause chain.
pub fn report(err: &anyhow::Error, command: &mut Command, stderr: &mut dyn Write) -> u8 {
    let err: &(dyn std::error::Error + 'static) = err.as_ref();
    // stderr write failures leave nothing else to report to
    if let Some(argument) = find_argument_error(err) {
        let _ = writeln!(stderr, "error: {argument}\n\n{}", command.render_usage());
        EXIT_USAGE
    } else {
        let _ = writeln!(stderr, "error: {}", display_chain(err));
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command;
    use recode_core::ArgumentError;

    #[test]
    fn registry_has_every_component() {
        let registry = build_registry(&Settings::default(), Remotes::new()).unwrap();
        assert!(registry.decoder("yaml").is_some());
        assert!(registry.encoder("tpl").is_some());
        assert!(registry.decoder("tpl").is_none());
        assert!(registry.filter("v").is_some());
    }

    #[test]
    fn listing_names_codecs_and_filters() {
        let registry = build_registry(&Settings::default(), Remotes::new()).unwrap();
        let mut out = Vec::<u8>::new();
        list(&registry, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("codecs:\n"));
        assert!(text.contains("yaml, yml, y"));
        assert!(text.lines().any(|l| l.starts_with("  null, n") && l.contains("decode ")));
        assert!(text.contains("filters:\n  varfiles, v"));
    }

    #[cfg(not(feature = "s3"))]
    #[test]
    fn s3_requires_feature() {
        let err = remotes(&Settings::default().with_s3_enabled(true)).unwrap_err();
        assert!(err.to_string().contains("'s3' feature"));
    }

    #[test]
    fn argument_errors_print_usage() {
        let err = anyhow::Error::new(ArgumentError::new("JSON", "invalid argument 'x'"));
        let mut out = Vec::<u8>::new();
        let code = report(&err, &mut command(), &mut out);
        let text = String::from_utf8(out).unwrap();

        assert_eq!(code, EXIT_USAGE);
        assert!(text.contains("JSON: invalid argument 'x'"));
        assert!(text.contains("Usage:"));
    }

    #[test]
    fn other_errors_print_chain() {
        let err = anyhow::Error::new(std::io::Error::other("disk full")).context("cannot write");
        let mut out = Vec::<u8>::new();
        let code = report(&err, &mut command(), &mut out);

        assert_eq!(code, EXIT_FAILURE);
        assert_eq!(String::from_utf8(out).unwrap(), "error: cannot write: disk full\n");
    }
}
