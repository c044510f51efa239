// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod format;
pub mod forms;
pub mod ids;
pub mod model;
pub mod session;
pub mod valuation;
pub mod workspace;

pub use ids::*;
pub use model::*;
pub use session::*;
pub use workspace::*;
