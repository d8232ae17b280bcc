//! AWS (Amazon Web Services) modules.
//!
//! ## Available Modules
//!
//! - [`Ec2SerialConsoleModule`](serial_console::Ec2SerialConsoleModule): account-level
//!   EC2 serial console access
//!
//! ## Authentication
//!
//! AWS credentials are loaded from the standard AWS credential chain:
//!
//! 1. Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//! 2. AWS credentials file (`~/.aws/credentials`), optionally a named `profile`
//! 3. IAM instance profile (when running on EC2)
//! 4. ECS task role (when running in ECS)
//!
//! The region can be specified via:
//! - Module parameter (`region`)
//! - Environment variable (`AWS_REGION` or `AWS_DEFAULT_REGION`)
//! - AWS config file (`~/.aws/config`)

pub mod serial_console;

pub use serial_console::Ec2SerialConsoleModule;

use crate::modules::{ModuleError, ModuleParams, ModuleResult, ParamExt};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ec2::config::Region;
use std::future::Future;
use tracing::debug;

/// Region and profile selection shared by every AWS module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsClientOptions {
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl AwsClientOptions {
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        Ok(Self {
            region: params.get_string("region")?.filter(|r| !r.is_empty()),
            profile: params.get_string("profile")?.filter(|p| !p.is_empty()),
        })
    }
}

/// Load shared SDK configuration, letting explicit options win over the
/// environment and the default provider chains.
pub async fn create_sdk_config(options: &AwsClientOptions) -> SdkConfig {
    debug!(region = ?options.region, profile = ?options.profile, "loading AWS configuration");
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &options.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// Drive an async AWS call chain to completion from the synchronous `Module` API.
///
/// Inside a tokio runtime the future runs on a scoped helper thread through the
/// ambient handle, since blocking a runtime worker directly would panic. Outside
/// any runtime a private current-thread runtime is built for the call.
///
/// The ambient runtime must be multi-threaded. On a current-thread runtime the
/// helper thread cannot drive the IO driver and SDK calls never complete.
pub(crate) fn block_on_module<F, T>(future: F) -> ModuleResult<T>
where
    F: Future<Output = ModuleResult<T>> + Send,
    T: Send,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => std::thread::scope(|s| {
            s.spawn(|| handle.block_on(future))
                .join()
                .map_err(|_| ModuleError::ExecutionFailed("AWS task panicked".to_string()))?
        }),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    ModuleError::ExecutionFailed(format!("Failed to start tokio runtime: {}", e))
                })?;
            runtime.block_on(future)
        }
    }
}
