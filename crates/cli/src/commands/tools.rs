//! `stepwise tools` — List the tools the agent can call.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let registry = stepwise_tools::registry_from_config(&config.tools);
    let force_stop = &config.agent.force_stop_tools;

    println!("Available tools:\n");
    for def in registry.definitions() {
        let params: Vec<&str> = def.parameters["required"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        let marker = if force_stop.contains(&def.name) {
            "  (answers immediately on success)"
        } else {
            ""
        };
        println!("  {}({}){marker}", def.name, params.join(", "));
        println!("      {}", def.description);
    }

    Ok(())
}
