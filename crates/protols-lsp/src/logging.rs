// protols - Protocol Buffers Language Server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Log destination for the server binary.
//!
//! The LSP transport owns stdout, so logs go to a file by default. A
//! previous log file is kept once as `<name>.bak`.

use crate::constants::DEFAULT_LOG_FILE;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Target for the `--logs` argument.
    ///
    /// An empty argument selects stderr. Without an argument the log file
    /// lives in `home`; with no home directory either, stderr is used.
    pub fn from_arg(arg: Option<&Path>, home: Option<&Path>) -> Self {
        match arg {
            Some(path) if path.as_os_str().is_empty() => LogTarget::Stderr,
            Some(path) => LogTarget::File(path.to_path_buf()),
            None => match home {
                Some(home) => LogTarget::File(home.join(DEFAULT_LOG_FILE)),
                None => LogTarget::Stderr,
            },
        }
    }
}

/// Renames an existing log at `path` to `<path>.bak`, replacing any older backup.
pub fn rotate(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    fs::rename(path, PathBuf::from(backup))
}

fn open_log(path: &Path) -> io::Result<File> {
    rotate(path)?;
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` refines the default `protols_lsp=info` filter. A log file
/// that cannot be opened falls back to stderr; the returned error says why.
pub fn init(target: &LogTarget) -> Result<(), io::Error> {
    let filter = EnvFilter::from_default_env()
        .add_directive("protols_lsp=info".parse().expect("valid log directive"))
        .add_directive("tower_lsp=info".parse().expect("valid log directive"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => {
            builder.with_writer(io::stderr).init();
            Ok(())
        }
        LogTarget::File(path) => match open_log(path) {
            Ok(file) => {
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
                Ok(())
            }
            Err(err) => {
                builder.with_writer(io::stderr).init();
                Err(err)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_target_from_arg() {
        let home = Path::new("/home/dev");
        assert_eq!(
            LogTarget::from_arg(None, Some(home)),
            LogTarget::File(PathBuf::from("/home/dev/.protols.log"))
        );
        assert_eq!(LogTarget::from_arg(None, None), LogTarget::Stderr);
        assert_eq!(
            LogTarget::from_arg(Some(Path::new("")), Some(home)),
            LogTarget::Stderr
        );
        assert_eq!(
            LogTarget::from_arg(Some(Path::new("/tmp/p.log")), Some(home)),
            LogTarget::File(PathBuf::from("/tmp/p.log"))
        );
    }

    #[test]
    fn test_rotate_keeps_one_backup() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("protols.log");

        rotate(&log).unwrap();
        assert!(!dir.path().join("protols.log.bak").exists());

        fs::write(&log, "first run").unwrap();
        rotate(&log).unwrap();
        fs::write(&log, "second run").unwrap();
        rotate(&log).unwrap();

        assert!(!log.exists());
        let backup = fs::read_to_string(dir.path().join("protols.log.bak")).unwrap();
        assert_eq!(backup, "second run");
    }

    #[test]
    fn test_open_log_truncates() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("protols.log");
        fs::write(&log, "old").unwrap();
        drop(open_log(&log).unwrap());
        assert_eq!(fs::read_to_string(&log).unwrap(), "");
        assert_eq!(fs::read_to_string(dir.path().join("protols.log.bak")).unwrap(), "old");
    }
}
