// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tocsin reset-state` command implementation.

use tocsin_config::TocsinConfig;
use tocsin_core::TocsinError;
use tocsin_store::StateStore;

/// Empties the snapshot file named by `storage.state_path`.
///
/// Refuses to touch anything unless `confirmed`. The bot should not be
/// running at the same time; its next save would restore the old records.
pub async fn reset_state(config: &TocsinConfig, confirmed: bool) -> Result<(), TocsinError> {
    if !confirmed {
        return Err(TocsinError::Validation(format!(
            "refusing to empty {} without --yes",
            config.storage.state_path
        )));
    }

    let store = StateStore::new(&config.storage.state_path);
    let before = store.load().await;
    store.reset().await?;
    println!(
        "tocsin: cleared {} alarm(s), {} maintenance window(s) and {} pending reminder(s) from {}",
        before.alarms, before.maintenances, before.reminders, config.storage.state_path
    );
    Ok(())
}
