//! Shared test utilities for the ec2-serial-console test suite.
//!
//! Provides an in-memory [`SerialConsoleApi`] that records every call, plus helpers
//! for building module parameters and registries around it.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use ec2_serial_console::modules::cloud::aws::serial_console::{
    Ec2SerialConsoleModule, SerialConsoleApi,
};
use ec2_serial_console::modules::{ModuleError, ModuleParams, ModuleRegistry, ModuleResult};

pub const ACCOUNT_ID: &str = "123456789123";

/// Fake account whose serial console setting lives in memory
pub struct FakeSerialConsole {
    enabled: AtomicBool,
    fail_operation: Option<&'static str>,
    pub identity_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub enable_calls: AtomicU32,
    pub disable_calls: AtomicU32,
}

impl FakeSerialConsole {
    pub fn new(enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(enabled),
            fail_operation: None,
            identity_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            enable_calls: AtomicU32::new(0),
            disable_calls: AtomicU32::new(0),
        })
    }

    /// Fake whose `operation` call fails with an access-denied error
    pub fn failing(enabled: bool, operation: &'static str) -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(enabled),
            fail_operation: Some(operation),
            identity_calls: AtomicU32::new(0),
            status_calls: AtomicU32::new(0),
            enable_calls: AtomicU32::new(0),
            disable_calls: AtomicU32::new(0),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u32 {
        self.enable_calls.load(Ordering::SeqCst) + self.disable_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.identity_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.writes()
    }

    fn check_failure(&self, operation: &str) -> ModuleResult<()> {
        if self.fail_operation == Some(operation) {
            return Err(ModuleError::RemoteCall {
                operation: operation.to_string(),
                message: "AccessDenied: not authorized".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SerialConsoleApi for FakeSerialConsole {
    async fn caller_account_id(&self) -> ModuleResult<String> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("GetCallerIdentity")?;
        Ok(ACCOUNT_ID.to_string())
    }

    async fn serial_console_access_enabled(&self) -> ModuleResult<bool> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("GetSerialConsoleAccessStatus")?;
        Ok(self.is_enabled())
    }

    async fn enable_serial_console_access(&self) -> ModuleResult<bool> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("EnableSerialConsoleAccess")?;
        self.enabled.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn disable_serial_console_access(&self) -> ModuleResult<bool> {
        self.disable_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure("DisableSerialConsoleAccess")?;
        self.enabled.store(false, Ordering::SeqCst);
        Ok(false)
    }
}

/// Registry whose serial console module talks to `api`
pub fn registry_with(api: Arc<FakeSerialConsole>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::with_builtins();
    registry.register(Arc::new(Ec2SerialConsoleModule::with_api(api)));
    registry
}

/// Create ModuleParams from key/value pairs
pub fn make_params(pairs: &[(&str, serde_json::Value)]) -> ModuleParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn state_params(state: &str) -> ModuleParams {
    make_params(&[("state", serde_json::json!(state))])
}
