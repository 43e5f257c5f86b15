// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bootstrap_common::cmd::fatal;
use clap::Parser;
use wazuh_bootstrap::BootstrapApp;

#[tokio::main]
async fn main() {
    let app = BootstrapApp::parse();
    let log = match BootstrapApp::setup_log(app.log_path()) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("failed to set up logging: {err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = app.exec(&log).await {
        fatal(err);
    }
}
