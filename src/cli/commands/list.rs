//! List-modules command

use super::CommandContext;
use anyhow::Result;

/// Execute the list-modules command
pub fn execute(ctx: &CommandContext) -> Result<i32> {
    let modules: Vec<(&str, &str)> = ctx
        .registry
        .names()
        .into_iter()
        .filter_map(|name| ctx.registry.get(name).map(|m| (name, m.description())))
        .collect();
    ctx.output.module_list(&modules);
    Ok(0)
}
