use anyhow::Result;
use serde_json::Value;

pub fn print_json(doc: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)?;
    println!("{}", json);
    Ok(())
}
