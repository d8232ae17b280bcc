//! Output formatting module
//!
//! Results go to stdout, either as colored human-readable lines or as a single
//! JSON document in the Ansible module result shape. Logs go to stderr.

use colored::Colorize;
use ec2_serial_console::error::Error;
use ec2_serial_console::modules::{ModuleOutput, ModuleStatus};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);

        Self {
            use_color,
            json_mode,
        }
    }

    fn status_label(&self, status: ModuleStatus) -> String {
        let label = status.to_string();
        if !self.use_color {
            return label;
        }
        match status {
            ModuleStatus::Ok => label.green().to_string(),
            ModuleStatus::Changed => label.yellow().to_string(),
            ModuleStatus::Failed => label.red().bold().to_string(),
        }
    }

    /// Render a module result
    pub fn render_result(&self, module: &str, output: &ModuleOutput) -> String {
        if self.json_mode {
            return output.to_result_json().to_string();
        }

        let mut lines = vec![format!(
            "{}: [{}] => {}",
            self.status_label(output.status),
            module,
            output.msg
        )];

        let mut keys: Vec<&String> = output.data.keys().collect();
        keys.sort();
        for key in keys {
            let value = match &output.data[key] {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(format!("    {}: {}", key, value));
        }

        if let Some(diff) = &output.diff {
            for line in diff.before.lines() {
                let line = format!("-{}", line);
                lines.push(if self.use_color {
                    line.red().to_string()
                } else {
                    line
                });
            }
            for line in diff.after.lines() {
                let line = format!("+{}", line);
                lines.push(if self.use_color {
                    line.green().to_string()
                } else {
                    line
                });
            }
        }

        lines.join("\n")
    }

    /// Render a module failure
    pub fn render_failure(&self, module: &str, error: &Error) -> String {
        let output = ModuleOutput::failed(error.to_string());
        if self.json_mode {
            return output.to_result_json().to_string();
        }
        format!(
            "{}: [{}] => {}",
            self.status_label(ModuleStatus::Failed),
            module,
            output.msg
        )
    }

    /// Render a list of `(name, description)` pairs
    pub fn render_module_list(&self, modules: &[(&str, &str)]) -> String {
        if self.json_mode {
            let entries: Vec<serde_json::Value> = modules
                .iter()
                .map(|(name, description)| {
                    serde_json::json!({ "name": name, "description": description })
                })
                .collect();
            return serde_json::Value::Array(entries).to_string();
        }

        let width = modules.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        modules
            .iter()
            .map(|(name, description)| {
                let padded = format!("{:<width$}", name, width = width);
                if self.use_color {
                    format!("{}  {}", padded.bold(), description)
                } else {
                    format!("{}  {}", padded, description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Print a module result
    pub fn module_result(&self, module: &str, output: &ModuleOutput) {
        println!("{}", self.render_result(module, output));
    }

    /// Print a module failure
    pub fn module_failure(&self, module: &str, error: &Error) {
        println!("{}", self.render_failure(module, error));
    }

    /// Print a list of modules
    pub fn module_list(&self, modules: &[(&str, &str)]) {
        println!("{}", self.render_module_list(modules));
    }
}
