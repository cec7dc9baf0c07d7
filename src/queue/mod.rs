// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

pub mod health;
pub mod types;

pub use health::{aggregate_health, QueueHealth};
pub use types::{NodeRange, QueueDefinition};
