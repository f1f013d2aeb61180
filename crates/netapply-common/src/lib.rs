//! Common infrastructure for the netapply reconciliation engine.
//!
//! - [`shell`]: Shell command execution with proper quoting
//! - [`backend`]: Network backends and the [`SystemControl`] seam for
//!   everything that touches services, udev and links, plus the
//!   [`ArtifactProbe`] seam for generated files
//! - [`device`]: The [`DeviceInventory`] seam and its sysfs implementation
//! - [`error`]: Error types shared by every netapply crate
//!
//! # Example
//!
//! ```ignore
//! use netapply_common::{
//!     shell::{self, IP_CMD, shellquote},
//!     error::ApplyResult,
//! };
//!
//! async fn rename(dev: &str, name: &str) -> ApplyResult<()> {
//!     let cmd = format!("{} link set dev {} name {}",
//!         IP_CMD, shellquote(dev), shellquote(name));
//!     shell::exec_or_throw(&cmd).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod shell;

// Re-export commonly used items at crate root
pub use backend::{ArtifactProbe, Backend, BackendAction, SystemControl};
pub use device::{DeviceInventory, SysfsInventory};
pub use error::{ApplyError, ApplyResult};
