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

//! Formatting through an external `clang-format` process.
//!
//! The document text goes in on stdin; the formatted text that comes back
//! replaces the whole document in a single edit.

use crate::error::{LspError, LspResult};
use crate::utils::decode_text;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tower_lsp::lsp_types::{Position, Range, TextEdit};
use tracing::debug;

/// Command-line arguments for one formatter run.
///
/// `lines` is a 1-based inclusive line range.
pub fn formatter_args(file_name: &str, lines: Option<(u32, u32)>) -> Vec<String> {
    let mut args = vec![format!("--assume-filename={}", file_name)];
    if let Some((start, end)) = lines {
        args.push(format!("--lines={}:{}", start, end));
    }
    args
}

/// Runs `formatter` over `text`.
///
/// # Error Handling
///
/// A missing executable, a failed pipe or a non-zero exit status is
/// reported as `LspError::Formatter`.
pub async fn run_formatter(formatter: &str, args: &[String], text: &str) -> LspResult<String> {
    let mut child = Command::new(formatter)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| LspError::Formatter(format!("{}: {}", formatter, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| LspError::Formatter(format!("writing stdin: {}", e)))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| LspError::Formatter(e.to_string()))?;
    if !output.status.success() {
        return Err(LspError::Formatter(format!(
            "{} exited with {}: {}",
            formatter,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    debug!("{} produced {} bytes", formatter, output.stdout.len());
    Ok(decode_text(output.stdout))
}

/// Formats `text` and returns one edit replacing the whole document.
///
/// # Arguments
///
/// * `line_count` - number of lines in `text`, used for the edit range
/// * `lines` - optional 1-based inclusive range passed as `--lines`
pub async fn format_document(
    formatter: &str,
    file_name: &str,
    text: &str,
    line_count: u32,
    lines: Option<(u32, u32)>,
) -> LspResult<Vec<TextEdit>> {
    let args = formatter_args(file_name, lines);
    let formatted = run_formatter(formatter, &args, text).await?;
    if formatted == text {
        return Ok(Vec::new());
    }
    let range = Range::new(Position::new(0, 0), Position::new(line_count, 0));
    Ok(vec![TextEdit::new(range, formatted)])
}
