//! HTML page templates
//!
//! Pages are thin shells: they initialize ECharts and fetch the option JSON
//! from the matching data route.

use minijinja::{context, Environment};

use crate::charts::THEME;
use crate::CboeIndex;

pub const OPTIONS_TEMPLATE: &str = "options.html";
pub const VIX_TEMPLATE: &str = "vix.html";

/// Build the template environment with the embedded pages
pub fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(OPTIONS_TEMPLATE, include_str!("../templates/options.html"))?;
    env.add_template(VIX_TEMPLATE, include_str!("../templates/vix.html"))?;
    Ok(env)
}

/// Options IV page for one product, with a tab per configured product
pub fn render_options(
    env: &Environment<'_>,
    product: &str,
    date: &str,
    tabs: &[String],
) -> Result<String, minijinja::Error> {
    env.get_template(OPTIONS_TEMPLATE)?.render(context! {
        product => product,
        date => date,
        tabs => tabs,
        theme => THEME,
    })
}

/// CBOE page: term structure plus one panel per index
pub fn render_vix(env: &Environment<'_>) -> Result<String, minijinja::Error> {
    let indices: Vec<&str> = CboeIndex::ALL.iter().map(|i| i.as_str()).collect();
    env.get_template(VIX_TEMPLATE)?.render(context! {
        indices => indices,
        theme => THEME,
    })
}
