use anyhow::Result;
use casker_core::configs::project::CaskerConfig;

pub fn execute() -> Result<()> {
    let schema = schemars::schema_for!(CaskerConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
