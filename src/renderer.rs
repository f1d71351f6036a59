//! View rendering
//!
//! Views are compiled once at startup and are read-only afterwards, so one
//! [`TemplateRenderer`] is shared by every request without locking. The
//! renderer knows view names and payload shapes only; it has no notion of
//! stores or HTTP.

use minijinja::{AutoEscape, Environment};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{RenderError, StartupError};
use crate::model::ViewPayload;

pub const INDEX_VIEW: &str = "index";
pub const SONG_VIEW: &str = "song";

/// The fixed set of views a renderer can serve
pub const VIEWS: [&str; 2] = [INDEX_VIEW, SONG_VIEW];

pub trait ViewRenderer: Send + Sync + 'static {
    /// Renders `view` against `payload` straight into `writer`.
    ///
    /// An unknown view fails before anything is written. Template and write
    /// errors are reported to the caller; a failed write may leave partial
    /// output behind.
    fn render(&self, view: &str, writer: &mut dyn io::Write, payload: &ViewPayload) -> Result<(), RenderError>;
}

/// Template sources for every view in [`VIEWS`]
#[derive(Debug, Clone)]
pub struct Pages {
    pub index: String,
    pub song: String,
}

impl Pages {
    /// Reads `index.html` and `song.html` from a directory
    pub fn load(dir: &Path) -> Result<Self, StartupError> {
        Ok(Self {
            index: std::fs::read_to_string(dir.join("index.html"))?,
            song: std::fs::read_to_string(dir.join("song.html"))?,
        })
    }
}

pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Compiles every page. Any syntax error aborts with `TemplateCompileFailed`.
    pub fn compile(pages: Pages) -> Result<Self, StartupError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        for (view, source) in [(INDEX_VIEW, pages.index), (SONG_VIEW, pages.song)] {
            env.add_template_owned(view, source)
                .map_err(|source| StartupError::TemplateCompileFailed {
                    view: view.to_string(),
                    source,
                })?;
        }

        Ok(Self { env })
    }

    pub fn from_dir(dir: &Path) -> Result<Self, StartupError> {
        Self::compile(Pages::load(dir)?)
    }
}

impl ViewRenderer for TemplateRenderer {
    fn render(&self, view: &str, writer: &mut dyn io::Write, payload: &ViewPayload) -> Result<(), RenderError> {
        if !VIEWS.contains(&view) {
            return Err(RenderError::UnknownView(view.to_string()));
        }

        let template = self
            .env
            .get_template(view)
            .map_err(|_| RenderError::UnknownView(view.to_string()))?;
        let rendered = template.render(payload)?;
        writer.write_all(rendered.as_bytes())?;

        Ok(())
    }
}
