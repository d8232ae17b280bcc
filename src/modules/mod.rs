//! Module system for ec2-serial-console
//!
//! This module provides the core traits, types, and registry for the module system.
//! A module validates its parameters, inspects remote state, and reports whether it
//! changed anything.

pub mod cloud;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of keys injected by the host automation framework rather than the user.
pub const FRAMEWORK_PARAM_PREFIX: &str = "_ansible_";

/// Errors that can occur during module execution
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A call to a remote service failed. `operation` names the API that was invoked.
    #[error("{operation} failed: {message}")]
    RemoteCall { operation: String, message: String },
}

impl ModuleError {
    /// Whether this error was raised before any remote interaction took place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ModuleError::InvalidParameter(_) | ModuleError::MissingParameter(_)
        )
    }
}

/// Result type for module operations
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Status of a module execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// Module executed successfully and made changes
    Changed,
    /// Module executed successfully but no changes were needed
    Ok,
    /// Module execution failed
    Failed,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleStatus::Changed => write!(f, "changed"),
            ModuleStatus::Ok => write!(f, "ok"),
            ModuleStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Represents a difference between current and desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    /// Description of the state before the module ran
    pub before: String,
    /// Description of the state after the module ran
    pub after: String,
}

impl Diff {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// Result of a module execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Whether the module changed anything
    pub changed: bool,
    /// Human-readable message about what happened
    pub msg: String,
    /// Status of the execution
    pub status: ModuleStatus,
    /// Optional diff showing what changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    /// Additional data returned by the module
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
}

impl ModuleOutput {
    fn with_status(changed: bool, msg: impl Into<String>, status: ModuleStatus) -> Self {
        Self {
            changed,
            msg: msg.into(),
            status,
            diff: None,
            data: HashMap::new(),
        }
    }

    /// Create a new successful output with no changes
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::with_status(false, msg, ModuleStatus::Ok)
    }

    /// Create a new successful output with changes
    pub fn changed(msg: impl Into<String>) -> Self {
        Self::with_status(true, msg, ModuleStatus::Changed)
    }

    /// Create a failed output
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::with_status(false, msg, ModuleStatus::Failed)
    }

    /// Add a diff to the output
    pub fn with_diff(mut self, diff: Diff) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Add data to the output
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Render the output the way an Ansible module reports its result: module data
    /// sits at the top level next to `changed` and `msg`.
    pub fn to_result_json(&self) -> serde_json::Value {
        let mut result = serde_json::Map::new();
        result.insert("changed".to_string(), serde_json::Value::Bool(self.changed));
        if self.status == ModuleStatus::Failed {
            result.insert("failed".to_string(), serde_json::Value::Bool(true));
        }
        result.insert("msg".to_string(), serde_json::Value::String(self.msg.clone()));
        if let Some(diff) = &self.diff {
            result.insert(
                "diff".to_string(),
                serde_json::json!({ "before": diff.before, "after": diff.after }),
            );
        }
        for (key, value) in &self.data {
            result.insert(key.clone(), value.clone());
        }
        serde_json::Value::Object(result)
    }
}

/// Parameters passed to a module
pub type ModuleParams = HashMap<String, serde_json::Value>;

/// Context for module execution
#[derive(Debug, Clone, Default)]
pub struct ModuleContext {
    /// Whether to run in check mode (dry run)
    pub check_mode: bool,
    /// Whether to show diffs
    pub diff_mode: bool,
}

impl ModuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    pub fn with_diff_mode(mut self, diff_mode: bool) -> Self {
        self.diff_mode = diff_mode;
        self
    }

    /// Removes framework-level keys (`_ansible_*`) from `params` and folds the ones
    /// that affect execution into the context. A framework flag can only switch a
    /// mode on; it never turns off a mode requested on the command line.
    pub fn absorb_framework_params(mut self, params: &mut ModuleParams) -> ModuleResult<Self> {
        if params.get_bool("_ansible_check_mode")?.unwrap_or(false) {
            self.check_mode = true;
        }
        if params.get_bool("_ansible_diff")?.unwrap_or(false) {
            self.diff_mode = true;
        }
        params.retain(|key, _| !key.starts_with(FRAMEWORK_PARAM_PREFIX));
        Ok(self)
    }
}

/// Trait that all modules must implement
pub trait Module: Send + Sync {
    /// Returns the name of the module
    fn name(&self) -> &'static str;

    /// Returns a description of what the module does
    fn description(&self) -> &'static str;

    /// Execute the module with the given parameters
    fn execute(&self, params: &ModuleParams, context: &ModuleContext)
        -> ModuleResult<ModuleOutput>;

    /// Check what would change without making changes (for check mode)
    fn check(&self, params: &ModuleParams, context: &ModuleContext) -> ModuleResult<ModuleOutput> {
        let check_context = ModuleContext {
            check_mode: true,
            ..context.clone()
        };
        self.execute(params, &check_context)
    }

    /// Validate the parameters before execution
    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let _ = params;
        Ok(())
    }

    /// Returns the list of required parameters
    fn required_params(&self) -> &[&'static str] {
        &[]
    }
}

/// Helper trait for extracting parameters
pub trait ParamExt {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>>;
    fn get_string_required(&self, key: &str) -> ModuleResult<String>;
    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>>;
}

impl ParamExt for ModuleParams {
    fn get_string(&self, key: &str) -> ModuleResult<Option<String>> {
        match self.get(key) {
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(v) => Ok(Some(v.to_string().trim_matches('"').to_string())),
        }
    }

    fn get_string_required(&self, key: &str) -> ModuleResult<String> {
        self.get_string(key)?
            .ok_or_else(|| ModuleError::MissingParameter(key.to_string()))
    }

    fn get_bool(&self, key: &str) -> ModuleResult<Option<bool>> {
        match self.get(key) {
            Some(serde_json::Value::Bool(b)) => Ok(Some(*b)),
            Some(serde_json::Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Ok(Some(true)),
                "false" | "no" | "0" | "off" => Ok(Some(false)),
                _ => Err(ModuleError::InvalidParameter(format!(
                    "{} must be a boolean",
                    key
                ))),
            },
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(_) => Err(ModuleError::InvalidParameter(format!(
                "{} must be a boolean",
                key
            ))),
        }
    }
}

/// Registry for looking up modules by name
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
    aliases: HashMap<String, String>,
}

impl ModuleRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Create a registry with all built-in modules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(
            cloud::aws::serial_console::Ec2SerialConsoleModule::new(),
        ));
        registry.register_alias(
            cloud::aws::serial_console::COLLECTION_NAME,
            cloud::aws::serial_console::MODULE_NAME,
        );
        registry
    }

    /// Register a module
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.insert(module.name().to_string(), module);
    }

    /// Make `alias` (for example a fully qualified collection name) resolve to `name`
    pub fn register_alias(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases.insert(alias.into(), name.into());
    }

    /// Get a module by name or alias
    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        let name = self.aliases.get(name).map_or(name, String::as_str);
        self.modules.get(name).cloned()
    }

    /// Check if a module exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get all module names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a module by name
    pub fn execute(
        &self,
        name: &str,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let module = self
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;

        // Check required parameters
        for param in module.required_params() {
            if params.get_string(param)?.is_none() {
                return Err(ModuleError::MissingParameter((*param).to_string()));
            }
        }

        module.validate_params(params)?;

        if context.check_mode {
            module.check(params, context)
        } else {
            module.execute(params, context)
        }
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct TestModule {
        executions: AtomicU32,
    }

    impl Module for TestModule {
        fn name(&self) -> &'static str {
            "test"
        }

        fn description(&self) -> &'static str {
            "A test module"
        }

        fn execute(
            &self,
            params: &ModuleParams,
            context: &ModuleContext,
        ) -> ModuleResult<ModuleOutput> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if context.check_mode {
                return Ok(ModuleOutput::ok("Would do something"));
            }

            let msg = params
                .get_string("msg")?
                .unwrap_or_else(|| "Hello".to_string());
            Ok(ModuleOutput::changed(msg))
        }

        fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
            match params.get_string("msg")?.as_deref() {
                Some("") => Err(ModuleError::InvalidParameter("msg is empty".to_string())),
                _ => Ok(()),
            }
        }

        fn required_params(&self) -> &[&'static str] {
            &["msg"]
        }
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> ModuleParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_module_registry() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::default()));
        registry.register_alias("vendor.collection.test", "test");

        assert!(registry.contains("test"));
        assert!(registry.contains("vendor.collection.test"));
        assert!(!registry.contains("nonexistent"));
        assert_eq!(registry.names(), vec!["test"]);

        let module = registry.get("vendor.collection.test").unwrap();
        assert_eq!(module.name(), "test");
    }

    #[test]
    fn test_builtins_contain_serial_console() {
        let registry = ModuleRegistry::with_builtins();
        assert!(registry.contains("ec2_serial_console"));
        assert!(registry.contains("amazon.aws.ec2_serial_console"));
    }

    #[test]
    fn test_registry_rejects_missing_required_param() {
        let module = Arc::new(TestModule::default());
        let mut registry = ModuleRegistry::new();
        registry.register(module.clone());

        let err = registry
            .execute("test", &ModuleParams::new(), &ModuleContext::new())
            .unwrap_err();
        assert!(matches!(err, ModuleError::MissingParameter(ref p) if p == "msg"));
        assert!(err.is_validation());
        assert_eq!(module.executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registry_validates_before_execute() {
        let module = Arc::new(TestModule::default());
        let mut registry = ModuleRegistry::new();
        registry.register(module.clone());

        let err = registry
            .execute(
                "test",
                &params(&[("msg", serde_json::json!(""))]),
                &ModuleContext::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ModuleError::InvalidParameter(_)));
        assert_eq!(module.executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registry_dispatches_check_mode() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule::default()));

        let output = registry
            .execute(
                "test",
                &params(&[("msg", serde_json::json!("hi"))]),
                &ModuleContext::new().with_check_mode(true),
            )
            .unwrap();
        assert!(!output.changed);
        assert_eq!(output.status, ModuleStatus::Ok);
    }

    #[test]
    fn test_registry_unknown_module() {
        let registry = ModuleRegistry::new();
        let err = registry
            .execute("missing", &ModuleParams::new(), &ModuleContext::new())
            .unwrap_err();
        assert!(matches!(err, ModuleError::NotFound(_)));
    }

    #[test]
    fn test_module_output() {
        let output = ModuleOutput::changed("Something changed")
            .with_data("key", serde_json::json!("value"))
            .with_diff(Diff::new("old", "new"));

        assert!(output.changed);
        assert_eq!(output.status, ModuleStatus::Changed);
        assert!(output.diff.is_some());
        assert!(output.data.contains_key("key"));
    }

    #[test]
    fn test_result_json_flattens_data() {
        let output = ModuleOutput::ok("nothing to do").with_data("account_id", serde_json::json!("1"));
        let json = output.to_result_json();
        assert_eq!(json["changed"], serde_json::json!(false));
        assert_eq!(json["account_id"], serde_json::json!("1"));
        assert!(json.get("failed").is_none());

        let failed = ModuleOutput::failed("boom").to_result_json();
        assert_eq!(failed["failed"], serde_json::json!(true));
        assert_eq!(failed["msg"], serde_json::json!("boom"));
    }

    #[test]
    fn test_absorb_framework_params() {
        let mut p = params(&[
            ("state", serde_json::json!("enabled")),
            ("_ansible_check_mode", serde_json::json!(true)),
            ("_ansible_diff", serde_json::json!("yes")),
            ("_ansible_verbosity", serde_json::json!(2)),
        ]);

        let context = ModuleContext::new().absorb_framework_params(&mut p).unwrap();
        assert!(context.check_mode);
        assert!(context.diff_mode);
        assert_eq!(p.len(), 1);
        assert!(p.contains_key("state"));
    }

    #[test]
    fn test_framework_params_do_not_disable_cli_modes() {
        let mut p = params(&[("_ansible_check_mode", serde_json::json!(false))]);
        let context = ModuleContext::new()
            .with_check_mode(true)
            .absorb_framework_params(&mut p)
            .unwrap();
        assert!(context.check_mode);
    }

    #[test]
    fn test_param_ext() {
        let p = params(&[
            ("string", serde_json::json!("hello")),
            ("bool_true", serde_json::json!(true)),
            ("bool_str", serde_json::json!("yes")),
            ("number", serde_json::json!(42)),
            ("null", serde_json::Value::Null),
        ]);

        assert_eq!(p.get_string("string").unwrap(), Some("hello".to_string()));
        assert_eq!(p.get_string("number").unwrap(), Some("42".to_string()));
        assert_eq!(p.get_string("null").unwrap(), None);
        assert_eq!(p.get_bool("bool_true").unwrap(), Some(true));
        assert_eq!(p.get_bool("bool_str").unwrap(), Some(true));
        assert!(p.get_bool("number").is_err());
        assert!(matches!(
            p.get_string_required("absent"),
            Err(ModuleError::MissingParameter(_))
        ));
    }
}
