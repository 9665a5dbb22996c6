//! PowerShell scripts for the platform-shell fallback.
//!
//! Every untrusted value goes through [`quote`], which produces a
//! single-quoted literal. Inside one, the only special characters are the
//! single quotes, and a quote is written by doubling it.

use super::HashAlgorithm;

/// Characters PowerShell treats as a single quote inside `'...'` literals.
const SINGLE_QUOTES: [char; 5] = ['\'', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// Escapes `text` for use inside a PowerShell single-quoted literal.
///
/// ```
/// use sigma_demo::script::powershell::escape_single_quoted;
/// assert_eq!(escape_single_quoted("O'Brien's file.txt"), "O''Brien''s file.txt");
/// ```
#[must_use]
pub fn escape_single_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if SINGLE_QUOTES.contains(&ch) {
            escaped.push(ch);
        }
        escaped.push(ch);
    }
    escaped
}

/// Wraps `text` in a single-quoted literal.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("'{}'", escape_single_quoted(text))
}

/// Emits `$expr` wrapped as `{"output": ...}` on success, `{"error": ...}` and
/// exit code 1 on failure.
fn envelope(body: &str, output: &str, depth: u8) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         try {{\n{body}\n\
         [pscustomobject]@{{ output = {output} }} | ConvertTo-Json -Compress -Depth {depth}\n\
         }} catch {{\n\
         [pscustomobject]@{{ error = $_.Exception.Message }} | ConvertTo-Json -Compress\n\
         exit 1\n\
         }}"
    )
}

/// Hashes the file at `path` with `Get-FileHash`.
#[must_use]
pub fn hash_script(path: &str, algorithm: HashAlgorithm) -> String {
    let body = format!(
        "$path = {path}\n$hash = Get-FileHash -LiteralPath $path -Algorithm {alg}",
        path = quote(path),
        alg = algorithm.powershell_name(),
    );
    let output = format!(
        "[pscustomobject]@{{ algorithm = {name}; \
         digest = $hash.Hash.ToLowerInvariant(); path = $path }}",
        name = quote(algorithm.as_str()),
    );
    envelope(&body, &output, 4)
}

/// Collects the same facts as the runtime's system-info script via CIM.
#[must_use]
pub fn system_info_script() -> String {
    let body = "$os = Get-CimInstance -ClassName Win32_OperatingSystem\n\
                $cs = Get-CimInstance -ClassName Win32_ComputerSystem";
    let output = "[pscustomobject]@{ \
                  platform = 'win32'; \
                  release = $os.Version; \
                  arch = $env:PROCESSOR_ARCHITECTURE; \
                  cpus = [Environment]::ProcessorCount; \
                  totalMemory = [int64]$cs.TotalPhysicalMemory; \
                  freeMemory = [int64]$os.FreePhysicalMemory * 1024; \
                  uptime = [int64]((Get-Date) - $os.LastBootUpTime).TotalSeconds; \
                  hostname = [Environment]::MachineName }";
    envelope(body, output, 4)
}

/// Evaluates `expression` as a PowerShell scriptblock over the parsed `json`
/// (bound to `$data`).
#[must_use]
pub fn transform_script(json: &str, expression: &str) -> String {
    let body = format!(
        "$data = {json} | ConvertFrom-Json\n\
         $transform = [scriptblock]::Create('param($data) ' + {expr})\n\
         $result = & $transform $data",
        json = quote(json),
        expr = quote(expression),
    );
    envelope(&body, "$result", 20)
}
