// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use dd_cli::settings::{user_settings_path, Settings, SettingsSources};
use dd_cli::{commands, Cli, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.logging.init("dd-cli")?;

    let settings = Settings::load(&SettingsSources {
        user_file: user_settings_path(),
        settings_file: cli.settings.as_deref(),
        overrides: &cli.setting_overrides,
    })?;

    commands::run(cli.command, &settings).await
}
