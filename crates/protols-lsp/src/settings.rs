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

//! Client-supplied settings.
//!
//! Read from `initializationOptions` and from
//! `workspace/didChangeConfiguration`. Both may wrap the object in a
//! `"protols"` section. Unknown keys are ignored.
//!
//! ```json
//! {
//!   "additional-proto-dirs": ["third_party/protos", "/opt/include"],
//!   "generated-dirs": ["bazel-out/k8-fastbuild/bin/"],
//!   "formatter": "clang-format"
//! }
//! ```

use crate::constants::{DEFAULT_FORMATTER, DEFAULT_GENERATED_DIR};
use crate::error::{LspError, LspResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const SECTION: &str = "protols";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Extra import search roots, tried before the ancestor walk.
    pub additional_proto_dirs: Vec<String>,
    /// Generated-output prefixes stripped when mapping `.pb.h` to `.proto`.
    pub generated_dirs: Vec<String>,
    /// Formatter executable.
    pub formatter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            additional_proto_dirs: Vec::new(),
            generated_dirs: vec![DEFAULT_GENERATED_DIR.to_string()],
            formatter: DEFAULT_FORMATTER.to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON value.
    ///
    /// `null` yields the defaults.
    ///
    /// # Error Handling
    ///
    /// Returns `LspError::Settings` when the value is not an object or a
    /// known key has the wrong type.
    pub fn from_value(value: Value) -> LspResult<Self> {
        let value = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(mut map) => match map.remove(SECTION) {
                Some(section @ Value::Object(_)) => section,
                Some(Value::Null) | None => Value::Object(map),
                Some(other) => {
                    return Err(LspError::Settings(format!(
                        "\"{}\" should be an object, got {}",
                        SECTION, other
                    )))
                }
            },
            other => {
                return Err(LspError::Settings(format!(
                    "settings should be an object, got {}",
                    other
                )))
            }
        };
        serde_json::from_value(value).map_err(|e| LspError::Settings(e.to_string()))
    }

    /// Configured proto dirs as absolute paths; relative entries are joined
    /// onto `workspace_root` when one is known.
    pub fn proto_dirs(&self, workspace_root: Option<&Path>) -> Vec<PathBuf> {
        self.additional_proto_dirs
            .iter()
            .map(|dir| {
                let path = PathBuf::from(dir);
                match workspace_root {
                    Some(root) if path.is_relative() => root.join(path),
                    _ => path,
                }
            })
            .collect()
    }
}
