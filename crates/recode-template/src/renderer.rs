//! Template environment and rendering
//!
//! Each render builds a fresh environment so that paths and side metadata
//! seen by the template functions belong to the template being rendered.
//!
//! Functions available in templates:
//! - `decode_<name>(text, args...)` for every decoder of the registry
//! - `encode_<name>(value, args...)` for every encoder of the registry
//! - `import(url, options...)`, relative to the template's directory
//! - `include(path, ctx?)`, relative to the template's directory
//! - `metadata()`, side metadata of the value being encoded

use crate::error::TemplateError;
use minijinja::value::Rest;
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, Value as TplValue};
use recode_core::{Registry, Value};
use recode_import::{ImportOptions, Importer, Remotes};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum nesting of `include` calls
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Renders template files against a registry
#[derive(Debug, Clone)]
pub struct Renderer {
    registry: Arc<Registry>,
    remotes: Remotes,
}

impl Renderer {
    /// Renderer whose templates import through `remotes`
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<Registry>, remotes: Remotes) -> Self {
        Self { registry, remotes }
    }

    /// Render the template at `path` with `input` bound to `input`
    ///
    /// # Errors
    /// - `TemplateError::Read` / `TemplateError::Parse` for the template file
    /// - `TemplateError::Render` when evaluation or a template function fails
    pub fn render(
        &self,
        path: &Path,
        input: &Value,
        metadata: Option<&Value>,
    ) -> Result<String, TemplateError> {
        self.render_nested(path, input, metadata, 0)
    }

    fn render_nested(
        &self,
        path: &Path,
        input: &Value,
        metadata: Option<&Value>,
        depth: usize,
    ) -> Result<String, TemplateError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(TemplateError::IncludeDepth {
                path: path.to_path_buf(),
                limit: MAX_INCLUDE_DEPTH,
            });
        }

        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::debug!(template = %name, depth, "rendering template");

        let env = self.environment(&dir, input, metadata, depth);
        let template = env
            .template_from_named_str(name.as_str(), source.as_str())
            .map_err(|source| TemplateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        template
            .render(context! { input => TplValue::from_serialize(input) })
            .map_err(|source| TemplateError::Render {
                path: path.to_path_buf(),
                source,
            })
    }

    fn environment<'source>(
        &self,
        dir: &Path,
        input: &Value,
        metadata: Option<&Value>,
        depth: usize,
    ) -> Environment<'source> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        for name in self.registry.decoder_names() {
            add_decode_function(&mut env, &self.registry, name);
        }
        for name in self.registry.encoder_names() {
            add_encode_function(&mut env, &self.registry, name);
        }

        let importer = Importer::new(Arc::clone(&self.registry))
            .with_remotes(self.remotes.clone())
            .with_base_dir(dir);
        env.add_function(
            "import",
            move |url: String, options: Rest<String>| -> Result<TplValue, Error> {
                let options = ImportOptions::parse(&options.0)
                    .map_err(|e| function_error("invalid import options", e))?;
                let imported = importer
                    .import(&url, options)
                    .map_err(|e| function_error(format!("cannot import '{url}'"), e))?;
                Ok(TplValue::from_serialize(imported.to_value()))
            },
        );

        let renderer = self.clone();
        let include_dir = dir.to_path_buf();
        let include_input = input.clone();
        let include_metadata = metadata.cloned();
        env.add_function(
            "include",
            move |path: String, ctx: Option<TplValue>| -> Result<String, Error> {
                let ctx = match ctx {
                    Some(ctx) => to_json(&ctx)?,
                    None => include_input.clone(),
                };
                let target: PathBuf = include_dir.join(&path);
                renderer
                    .render_nested(&target, &ctx, include_metadata.as_ref(), depth + 1)
                    .map_err(|e| function_error(format!("cannot include '{path}'"), e))
            },
        );

        let metadata = TplValue::from_serialize(metadata);
        env.add_function("metadata", move || metadata.clone());

        env
    }
}

fn add_decode_function(env: &mut Environment<'_>, registry: &Arc<Registry>, name: &str) {
    let registry = Arc::clone(registry);
    let codec = name.to_string();
    env.add_function(
        format!("decode_{name}"),
        move |text: String, args: Rest<String>| -> Result<TplValue, Error> {
            let decoder = registry
                .decoder(&codec)
                .ok_or_else(|| Error::new(ErrorKind::UnknownFunction, format!("no decoder '{codec}'")))?;
            let decoded = decoder
                .decode(&mut text.as_bytes(), &args.0)
                .map_err(|e| function_error(format!("error while decoding {codec}"), e))?;
            Ok(TplValue::from_serialize(&decoded.value))
        },
    );
}

fn add_encode_function(env: &mut Environment<'_>, registry: &Arc<Registry>, name: &str) {
    let registry = Arc::clone(registry);
    let codec = name.to_string();
    env.add_function(
        format!("encode_{name}"),
        move |value: TplValue, args: Rest<String>| -> Result<String, Error> {
            let encoder = registry
                .encoder(&codec)
                .ok_or_else(|| Error::new(ErrorKind::UnknownFunction, format!("no encoder '{codec}'")))?;
            let value = to_json(&value)?;
            let mut out = Vec::<u8>::new();
            encoder
                .encode(&mut out, &value, None, &args.0)
                .map_err(|e| function_error(format!("error while encoding {codec}"), e))?;
            String::from_utf8(out).map_err(|e| function_error(format!("{codec} output is not text"), e))
        },
    );
}

fn to_json(value: &TplValue) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|e| function_error("value cannot be converted", e))
}

fn function_error(
    message: impl Into<Cow<'static, str>>,
    source: impl std::error::Error + Send + Sync + 'static,
) -> Error {
    Error::new(ErrorKind::InvalidOperation, message).with_source(source)
}
