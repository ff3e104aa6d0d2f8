use std::collections::BTreeMap;

use template::{ExpandMode, Template};
use time::TimeContext;

use super::{FieldSpec, RegridSpec};

/// Settings read by the tool's own config file through environment variables.
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    pub file_type: Option<String>,
    pub description: Option<String>,
    pub regrid: RegridSpec,
    pub fields: Vec<FieldSpec>,
    /// skip runtimes when no fields are configured
    pub fields_required: bool,
    pub verification_mask: Option<Template>,
    /// extra `[env]` entries; may override the built-in variables
    pub env: Vec<(String, Template)>,
}

/// Build the environment overlay for one invocation. Pure; the caller
/// applies it to the child process only.
pub fn build_env(
    options: &ToolOptions,
    ctx: &TimeContext,
    data_field: &str,
    verif_mask: Option<&str>,
) -> Result<BTreeMap<String, String>, template::Error> {
    let mut env = BTreeMap::new();

    let file_type = options
        .file_type
        .as_deref()
        .map(|t| format!("file_type = {t};"))
        .unwrap_or_default();
    env.insert("DATA_FILE_TYPE".to_owned(), file_type);
    env.insert("DATA_FIELD".to_owned(), data_field.to_owned());
    env.insert("REGRID_DICT".to_owned(), options.regrid.dict());

    let desc = options
        .description
        .as_deref()
        .map(|d| format!("desc = \"{}\";", d.trim_matches(['"', '\''])))
        .unwrap_or_default();
    env.insert("DESC".to_owned(), desc);

    let mask = verif_mask
        .map(|m| format!("poly = {m};"))
        .unwrap_or_default();
    env.insert("VERIF_MASK".to_owned(), mask);

    for (key, value) in &options.env {
        env.insert(key.clone(), value.expand(ctx, ExpandMode::AllowWildcards)?);
    }
    Ok(env)
}
