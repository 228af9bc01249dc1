//! `tpl` encoder

use crate::renderer::Renderer;
use recode_core::{ArgumentError, Codec, CodecError, Encode, Registry, Value};
use recode_import::Remotes;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, Weak};

const NAME: &str = "tpl";

/// Renders the value through a template file
///
/// Takes exactly one argument, the template path. The registry handle is
/// weak: the codec is owned by the registry it renders with.
#[derive(Debug, Default)]
pub struct TemplateCodec {
    remotes: Remotes,
    base_dir: Option<PathBuf>,
    registry: OnceLock<Weak<Registry>>,
}

impl TemplateCodec {
    /// Templates can only import local files
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote stores available to `import`
    #[inline]
    #[must_use]
    pub fn with_remotes(mut self, remotes: Remotes) -> Self {
        self.remotes = remotes;
        self
    }

    /// Resolve relative template paths against `dir`
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn registry(&self) -> Result<Arc<Registry>, CodecError> {
        self.registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or(CodecError::Unavailable(NAME))
    }
}

impl Codec for TemplateCodec {
    fn names(&self) -> &[&'static str] {
        &[NAME]
    }

    fn description(&self) -> &str {
        "render a template file (encoder argument: template path)"
    }

    fn initialize(&self, registry: &Arc<Registry>) -> Result<(), CodecError> {
        self.registry
            .set(Arc::downgrade(registry))
            .map_err(|_| CodecError::Initialize("tpl is already bound to a registry".to_string()))
    }

    fn encoder(&self) -> Option<&dyn Encode> {
        Some(self)
    }
}

impl Encode for TemplateCodec {
    fn encode(
        &self,
        output: &mut dyn Write,
        value: &Value,
        metadata: Option<&Value>,
        args: &[String],
    ) -> Result<(), CodecError> {
        let [path] = args else {
            return Err(ArgumentError::new(NAME, "expecting one argument: template file").into());
        };

        let path = match &self.base_dir {
            Some(base) if Path::new(path).is_relative() => base.join(path),
            _ => PathBuf::from(path),
        };
        let renderer = Renderer::new(self.registry()?, self.remotes.clone());
        let rendered = renderer
            .render(&path, value, metadata)
            .map_err(|e| CodecError::encode(NAME, e))?;
        output.write_all(rendered.as_bytes())?;
        Ok(())
    }
}
