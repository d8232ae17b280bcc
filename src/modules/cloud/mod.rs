//! Cloud provider modules.
//!
//! Cloud modules run entirely on the control node: they call provider APIs
//! directly instead of executing anything on a managed host.
//!
//! ## Example
//!
//! ```yaml
//! - name: Enable serial console access
//!   ec2_serial_console:
//!     state: enabled
//!     region: us-west-2
//! ```

pub mod aws;

pub use aws::Ec2SerialConsoleModule;
