use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::cli::commands::{ConfigAction, ConfigCmd, ConfigInitArgs, ConfigSetArgs};
use crate::io::config_io::{self, CONFIG_TEMPLATE};
use crate::io::session;
use crate::model::config::ClientConfig;

#[derive(Serialize)]
struct ConfigJson<'a> {
    config_dir: String,
    logged_in: bool,
    #[serde(flatten)]
    config: &'a ClientConfig,
}

pub fn cmd_config(config_dir: &Path, args: ConfigCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => cmd_config_show(config_dir, json),
        ConfigAction::Set(set) => cmd_config_set(config_dir, set),
        ConfigAction::Init(init) => cmd_config_init(config_dir, init),
        ConfigAction::Path => {
            println!("{}", config_dir.display());
            Ok(())
        }
    }
}

fn cmd_config_show(config_dir: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_io::read_config(config_dir)?;
    let logged_in = session::read_session(config_dir).is_some_and(|s| !s.is_expired());

    if json {
        let out = ConfigJson {
            config_dir: config_dir.display().to_string(),
            logged_in,
            config: &config,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("config dir: {}", config_dir.display());
    println!("api.base_url = {}", config.api.base_url);
    println!("api.timeout_secs = {}", config.api.timeout_secs);
    println!("ui.column_width = {}", config.ui.column_width);
    println!("ui.show_ids = {}", config.ui.show_ids);
    println!("session: {}", if logged_in { "logged in" } else { "not logged in" });
    Ok(())
}

fn cmd_config_set(config_dir: &Path, args: ConfigSetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = config_io::read_config_doc(config_dir)?;
    config_io::set_value(&mut doc, &args.key, &args.value)?;
    config_io::write_config_doc(config_dir, &doc)?;
    tracing::debug!(key = %args.key, "config updated");
    println!("{} = {}", args.key, doc_value(&doc, &args.key));
    Ok(())
}

/// The value as written, for echoing back
fn doc_value(doc: &toml_edit::DocumentMut, key: &str) -> String {
    key.split_once('.')
        .and_then(|(table, field)| doc.get(table)?.get(field))
        .and_then(|item| item.as_value())
        .map(|v| v.to_string().trim().to_string())
        .unwrap_or_default()
}

fn cmd_config_init(config_dir: &Path, args: ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_io::config_path(config_dir);
    if path.exists() && !args.force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    fs::create_dir_all(config_dir)?;
    fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Wrote {}", path.display());
    Ok(())
}
