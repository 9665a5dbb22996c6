//! JavaScript scripts for the primary runtime.
//!
//! Scripts are passed inline (`-e` / `eval`) and read a single JSON payload
//! from their last argument. They only use `node:` modules through dynamic
//! `import()`, which Node, Bun and Deno all accept.

use std::path::Path;

use serde_json::Value;

/// Reads the payload and defines the `{"output"}` / `{"error"}` envelope helpers.
const PRELUDE: &str = r"
const __args = typeof Deno !== 'undefined' ? Deno.args : process.argv;
const __input = JSON.parse(__args[__args.length - 1]);
const __emit = (value) =>
  console.log(JSON.stringify({ output: value === undefined ? null : value }));
const __fail = (err) => {
  console.log(JSON.stringify({ error: String((err && err.message) || err) }));
  if (typeof Deno !== 'undefined') { Deno.exit(1); } else { process.exit(1); }
};
";

const HASH: &str = r"
Promise.all([import('node:crypto'), import('node:fs')])
  .then(([crypto, fs]) => new Promise((resolve, reject) => {
    const hash = crypto.createHash(__input.algorithm);
    fs.createReadStream(__input.path)
      .on('error', reject)
      .on('data', (chunk) => hash.update(chunk))
      .on('end', () => resolve(hash.digest('hex')));
  }))
  .then((digest) => __emit({ algorithm: __input.algorithm, digest, path: __input.path }))
  .catch(__fail);
";

const SYSTEM_INFO: &str = r"
import('node:os')
  .then((os) => __emit({
    platform: os.platform(),
    release: os.release(),
    arch: os.arch(),
    cpus: os.cpus().length,
    totalMemory: os.totalmem(),
    freeMemory: os.freemem(),
    uptime: Math.round(os.uptime()),
    hostname: os.hostname(),
  }))
  .catch(__fail);
";

const TRANSFORM: &str = r"
try {
  const data = JSON.parse(__input.json);
  const transform = new Function('data', 'return (' + __input.expression + ');');
  Promise.resolve(transform(data)).then(__emit).catch(__fail);
} catch (err) {
  __fail(err);
}
";

/// How a runtime binary takes an inline script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFlavor {
    /// `node -e <script> <payload>`.
    Node,
    /// `bun -e <script> <payload>`.
    Bun,
    /// `deno eval <script> <payload>`.
    Deno,
}

impl RuntimeFlavor {
    /// Infers the flavor from a binary name or path; unknown names are treated as Node.
    #[must_use]
    pub fn detect(runtime: &str) -> Self {
        let stem = Path::new(runtime)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(runtime)
            .to_ascii_lowercase();
        match stem.as_str() {
            "deno" => Self::Deno,
            "bun" => Self::Bun,
            _ => Self::Node,
        }
    }

    fn eval_flag(self) -> &'static str {
        match self {
            Self::Node | Self::Bun => "-e",
            Self::Deno => "eval",
        }
    }
}

/// A script ready to hand to a runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    body: &'static str,
    payload: Value,
}

impl Script {
    /// Hashes the file at `path` with `algorithm` (a `crypto.createHash` name).
    #[must_use]
    pub fn hash(path: &str, algorithm: &str) -> Self {
        Self {
            body: HASH,
            payload: serde_json::json!({ "path": path, "algorithm": algorithm }),
        }
    }

    /// Reports platform, release, architecture, CPUs, memory, uptime and hostname.
    #[must_use]
    pub fn system_info() -> Self {
        Self {
            body: SYSTEM_INFO,
            payload: serde_json::json!({}),
        }
    }

    /// Parses `json` into `data` and evaluates the JavaScript `expression` over it.
    #[must_use]
    pub fn transform(json: &str, expression: &str) -> Self {
        Self {
            body: TRANSFORM,
            payload: serde_json::json!({ "json": json, "expression": expression }),
        }
    }

    /// Full source text, prelude included.
    #[must_use]
    pub fn source(&self) -> String {
        format!("{PRELUDE}{}", self.body)
    }

    /// Arguments for running this script with `runtime`.
    #[must_use]
    pub fn args_for(&self, runtime: &str) -> Vec<String> {
        vec![
            RuntimeFlavor::detect(runtime).eval_flag().to_string(),
            self.source(),
            self.payload.to_string(),
        ]
    }
}

/// Arguments that make any supported runtime print its version.
#[must_use]
pub fn version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flavor_from_name_or_path() {
        assert_eq!(RuntimeFlavor::detect("deno"), RuntimeFlavor::Deno);
        assert_eq!(RuntimeFlavor::detect("/home/u/.bun/bin/bun"), RuntimeFlavor::Bun);
        assert_eq!(RuntimeFlavor::detect(r"C:\Program Files\nodejs\node.exe"), RuntimeFlavor::Node);
        assert_eq!(RuntimeFlavor::detect("nodejs"), RuntimeFlavor::Node);
    }

    #[test]
    fn payload_is_the_last_argument() {
        let args = Script::hash("/tmp/O'Brien.txt", "sha256").args_for("node");
        assert_eq!(args[0], "-e");
        assert!(args[1].contains("createHash"));
        let payload: Value = serde_json::from_str(&args[2]).unwrap();
        assert_eq!(payload["path"], "/tmp/O'Brien.txt");
        assert_eq!(payload["algorithm"], "sha256");
    }

    #[test]
    fn deno_uses_eval_subcommand() {
        let args = Script::system_info().args_for("/usr/local/bin/deno");
        assert_eq!(args[0], "eval");
        assert!(args[1].starts_with(PRELUDE));
    }

    #[test]
    fn transform_passes_json_as_text() {
        let args = Script::transform(r#"{"a":1}"#, "data.a + 1").args_for("bun");
        let payload: Value = serde_json::from_str(&args[2]).unwrap();
        assert_eq!(payload["json"], r#"{"a":1}"#);
        assert_eq!(payload["expression"], "data.a + 1");
    }
}
