//! EC2 serial console access module.
//!
//! Enables or disables the account-level EC2 serial console access setting and
//! reports the resulting status together with the caller's account id.
//!
//! ### Parameters
//!
//! | Parameter | Required | Description |
//! |-----------|----------|-------------|
//! | `state` | Yes | Desired state: enabled, disabled |
//! | `region` | No | AWS region (default: from environment/config) |
//! | `profile` | No | Named AWS profile (default: from environment/config) |
//!
//! ### Returns
//!
//! | Key | Description |
//! |-----|-------------|
//! | `changed` | Whether the setting was modified |
//! | `account_id` | Account the setting applies to |
//! | `serial_console_status` | Status after the run: enabled, disabled |
//!
//! ### Example
//!
//! ```yaml
//! - name: Enabling Serial Console
//!   ec2_serial_console:
//!     state: enabled
//! ```
//!
//! The setting is read, compared and written in three separate API calls. Two
//! concurrent runs against the same account can both observe the old status and
//! both issue a write; the service offers no conditional update to prevent it.

use super::{block_on_module, create_sdk_config, AwsClientOptions};
use crate::modules::{
    Diff, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleResult,
    ParamExt, FRAMEWORK_PARAM_PREFIX,
};
use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registered module name.
pub const MODULE_NAME: &str = "ec2_serial_console";

/// Fully qualified collection name the module is also reachable under.
pub const COLLECTION_NAME: &str = "amazon.aws.ec2_serial_console";

const ACCEPTED_PARAMS: &[&str] = &["state", "region", "profile"];

/// Serial console access status, used both for the desired state and for the
/// status reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialConsoleState {
    Enabled,
    Disabled,
}

impl SerialConsoleState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for SerialConsoleState {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ModuleError::InvalidParameter(format!(
                "value of state must be one of: enabled, disabled, got: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for SerialConsoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record returned by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConsoleReport {
    pub changed: bool,
    pub account_id: String,
    pub serial_console_status: SerialConsoleState,
}

/// A completed read-compare-write pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub report: SerialConsoleReport,
    /// Status observed before any write.
    pub previous: SerialConsoleState,
    pub desired: SerialConsoleState,
    pub check_mode: bool,
}

impl Reconciliation {
    /// Whether the desired state differs from what was observed.
    pub fn needs_change(&self) -> bool {
        self.previous != self.desired
    }

    pub fn into_output(self, diff_mode: bool) -> ModuleOutput {
        let account = &self.report.account_id;
        let verb = if self.desired.is_enabled() {
            "enable"
        } else {
            "disable"
        };

        let mut output = if self.report.changed {
            ModuleOutput::changed(format!(
                "Serial console access {} for account {}",
                self.report.serial_console_status, account
            ))
        } else if self.check_mode && self.needs_change() {
            ModuleOutput::ok(format!(
                "Would {} serial console access for account {} (check mode)",
                verb, account
            ))
        } else {
            ModuleOutput::ok(format!(
                "Serial console access already {} for account {}",
                self.report.serial_console_status, account
            ))
        };

        if diff_mode && self.needs_change() {
            let after = if self.report.changed {
                self.report.serial_console_status
            } else {
                self.desired
            };
            output = output.with_diff(Diff::new(
                format!("serial_console_status: {}\n", self.previous),
                format!("serial_console_status: {}\n", after),
            ));
        }

        output
            .with_data("account_id", serde_json::json!(self.report.account_id))
            .with_data(
                "serial_console_status",
                serde_json::json!(self.report.serial_console_status.as_str()),
            )
    }
}

/// Remote calls the module depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SerialConsoleApi: Send + Sync {
    /// Account id of the authenticated caller (STS `GetCallerIdentity`).
    async fn caller_account_id(&self) -> ModuleResult<String>;

    /// Whether access is currently enabled (EC2 `GetSerialConsoleAccessStatus`).
    async fn serial_console_access_enabled(&self) -> ModuleResult<bool>;

    /// Turn access on and return the status the service reports afterwards.
    async fn enable_serial_console_access(&self) -> ModuleResult<bool>;

    /// Turn access off and return the status the service reports afterwards.
    async fn disable_serial_console_access(&self) -> ModuleResult<bool>;
}

/// [`SerialConsoleApi`] backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsSerialConsoleApi {
    ec2: aws_sdk_ec2::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsSerialConsoleApi {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            ec2: aws_sdk_ec2::Client::new(config),
            sts: aws_sdk_sts::Client::new(config),
        }
    }

    pub async fn from_options(options: &AwsClientOptions) -> Self {
        Self::new(&create_sdk_config(options).await)
    }
}

fn remote_error<E: std::error::Error>(operation: &str, err: E) -> ModuleError {
    ModuleError::RemoteCall {
        operation: operation.to_string(),
        message: DisplayErrorContext(err).to_string(),
    }
}

fn missing_field(operation: &str, field: &str) -> ModuleError {
    ModuleError::RemoteCall {
        operation: operation.to_string(),
        message: format!("response did not include {}", field),
    }
}

#[async_trait]
impl SerialConsoleApi for AwsSerialConsoleApi {
    async fn caller_account_id(&self) -> ModuleResult<String> {
        const OP: &str = "GetCallerIdentity";
        debug!("calling sts:{}", OP);
        let resp = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        resp.account()
            .map(str::to_string)
            .ok_or_else(|| missing_field(OP, "Account"))
    }

    async fn serial_console_access_enabled(&self) -> ModuleResult<bool> {
        const OP: &str = "GetSerialConsoleAccessStatus";
        debug!("calling ec2:{}", OP);
        let resp = self
            .ec2
            .get_serial_console_access_status()
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        resp.serial_console_access_enabled()
            .ok_or_else(|| missing_field(OP, "SerialConsoleAccessEnabled"))
    }

    async fn enable_serial_console_access(&self) -> ModuleResult<bool> {
        const OP: &str = "EnableSerialConsoleAccess";
        debug!("calling ec2:{}", OP);
        let resp = self
            .ec2
            .enable_serial_console_access()
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        Ok(resp.serial_console_access_enabled().unwrap_or_else(|| {
            warn!("{} response did not include the new status, assuming enabled", OP);
            true
        }))
    }

    async fn disable_serial_console_access(&self) -> ModuleResult<bool> {
        const OP: &str = "DisableSerialConsoleAccess";
        debug!("calling ec2:{}", OP);
        let resp = self
            .ec2
            .disable_serial_console_access()
            .send()
            .await
            .map_err(|e| remote_error(OP, e))?;
        Ok(resp.serial_console_access_enabled().unwrap_or_else(|| {
            warn!("{} response did not include the new status, assuming disabled", OP);
            false
        }))
    }
}

/// Bring the account's serial console access to `desired`.
///
/// Reads identity and current status, then issues at most one write. In check
/// mode both reads still happen so the report reflects the live account, but the
/// write is skipped and `changed` stays false.
pub async fn reconcile(
    api: &dyn SerialConsoleApi,
    desired: SerialConsoleState,
    check_mode: bool,
) -> ModuleResult<Reconciliation> {
    let account_id = api.caller_account_id().await?;
    let previous = SerialConsoleState::from_enabled(api.serial_console_access_enabled().await?);
    debug!(%account_id, current = %previous, %desired, check_mode, "serial console status read");

    let mut report = SerialConsoleReport {
        changed: false,
        account_id,
        serial_console_status: previous,
    };

    if check_mode || previous == desired {
        return Ok(Reconciliation {
            report,
            previous,
            desired,
            check_mode,
        });
    }

    let enabled = match desired {
        SerialConsoleState::Enabled => api.enable_serial_console_access().await?,
        SerialConsoleState::Disabled => api.disable_serial_console_access().await?,
    };
    report.changed = true;
    report.serial_console_status = SerialConsoleState::from_enabled(enabled);
    if report.serial_console_status != desired {
        warn!(
            account_id = %report.account_id,
            reported = %report.serial_console_status,
            %desired,
            "service reported a status different from the one requested"
        );
    }
    info!(
        account_id = %report.account_id,
        from = %previous,
        to = %report.serial_console_status,
        "serial console access changed"
    );

    Ok(Reconciliation {
        report,
        previous,
        desired,
        check_mode,
    })
}

/// Parsed module parameters
#[derive(Debug, Clone, PartialEq, Eq)]
struct SerialConsoleConfig {
    state: SerialConsoleState,
    client: AwsClientOptions,
}

impl SerialConsoleConfig {
    fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        Ok(Self {
            state: params.get_string_required("state")?.parse()?,
            client: AwsClientOptions::from_params(params)?,
        })
    }
}

/// Module toggling EC2 serial console access for the caller's account
#[derive(Default)]
pub struct Ec2SerialConsoleModule {
    api: Option<Arc<dyn SerialConsoleApi>>,
}

impl Ec2SerialConsoleModule {
    /// Module that builds AWS SDK clients from its `region`/`profile` parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module that talks to `api` instead of constructing SDK clients.
    pub fn with_api(api: Arc<dyn SerialConsoleApi>) -> Self {
        Self { api: Some(api) }
    }

    async fn execute_async(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        let config = SerialConsoleConfig::from_params(params)?;

        let api: Arc<dyn SerialConsoleApi> = match &self.api {
            Some(api) => Arc::clone(api),
            None => Arc::new(AwsSerialConsoleApi::from_options(&config.client).await),
        };

        let reconciliation = reconcile(api.as_ref(), config.state, context.check_mode).await?;
        Ok(reconciliation.into_output(context.diff_mode))
    }
}

impl Module for Ec2SerialConsoleModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn description(&self) -> &'static str {
        "Modify EC2 serial console access for an account"
    }

    fn required_params(&self) -> &[&'static str] {
        &["state"]
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        block_on_module(self.execute_async(params, context))
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        let mut unsupported: Vec<&str> = params
            .keys()
            .map(String::as_str)
            .filter(|k| !ACCEPTED_PARAMS.contains(k) && !k.starts_with(FRAMEWORK_PARAM_PREFIX))
            .collect();
        if !unsupported.is_empty() {
            unsupported.sort_unstable();
            return Err(ModuleError::InvalidParameter(format!(
                "Unsupported parameters: {}. Supported parameters include: {}",
                unsupported.join(", "),
                ACCEPTED_PARAMS.join(", ")
            )));
        }

        SerialConsoleConfig::from_params(params).map(|_| ())
    }
}
