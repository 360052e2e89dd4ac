//! sysservice: Cross-Platform Native Service Management
//!
//! Part of the PAIML Sovereign AI Stack.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sysservice::prelude::*;
//!
//! # async fn demo() -> sysservice::core::Result<()> {
//! let desc = ServiceDescriptor::new("MyService", "com.myservice", "/usr/local/bin/agent")
//!     .with_args(["run"]);
//! let service = SystemService::new(desc)?;
//! service.install(true).await?;
//! # Ok(())
//! # }
//! ```

pub use sysservice_core as core;

/// Prelude module for common imports.
pub mod prelude {
    pub use sysservice_core::{
        Platform, PlatformAdapter, ServiceDescriptor, ServiceError, ServiceStatus, SystemService,
    };
}
