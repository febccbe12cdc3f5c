use axum::response::Html;
use minijinja::Environment;
use serde::Serialize;

use crate::error::ApiError;

/// Page templates, embedded at compile time.
const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("browse.html", include_str!("../templates/browse.html")),
    ("product.html", include_str!("../templates/product.html")),
    ("messages.html", include_str!("../templates/messages.html")),
    ("add_product.html", include_str!("../templates/add_product.html")),
    ("login.html", include_str!("../templates/login.html")),
];

/// Renders server-side pages.
///
/// Names ending in `.html` are auto-escaped by minijinja, so submitted product
/// and message fields cannot inject markup.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, ApiError> {
        let tmpl = self.env.get_template(name)?;
        Ok(Html(tmpl.render(ctx)?))
    }
}
