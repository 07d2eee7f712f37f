//! Variable substitution for pipeline text
//!
//! A [`SubstitutionMap`] is built once per invocation from the manifest and the
//! build target, then used to replace `${{key}}` placeholders in step commands
//! and template inputs. Lookups never fall back to an empty string: a
//! placeholder whose key is absent is an error.

use crate::error::{FetchError, Result};
use crate::manifest::Configuration;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

pub const PACKAGE_NAME: &str = "package.name";
pub const PACKAGE_VERSION: &str = "package.version";
pub const PACKAGE_EPOCH: &str = "package.epoch";
pub const PACKAGE_FULL_VERSION: &str = "package.full-version";
pub const PACKAGE_DESCRIPTION: &str = "package.description";
pub const TARGETS_OUTDIR: &str = "targets.outdir";
pub const TARGETS_DESTDIR: &str = "targets.destdir";
pub const TARGETS_CONTEXTDIR: &str = "targets.contextdir";
pub const BUILD_ARCH: &str = "build.arch";
pub const BUILD_GOARCH: &str = "build.goarch";
pub const BUILD_LIBC: &str = "build.libc";
pub const HOST_TRIPLET_GNU: &str = "host.triplet.gnu";
pub const HOST_TRIPLET_RUST: &str = "host.triplet.rust";

const OUTPUT_ROOT: &str = "/home/build/melange-out";

/// Target CPU architecture. Accepts both Go (`amd64`) and apk (`x86_64`) spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Aarch64,
    Armv7,
    X86,
    Riscv64,
    Ppc64le,
    S390x,
}

impl Arch {
    pub fn apk(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Armv7 => "armv7",
            Arch::X86 => "x86",
            Arch::Riscv64 => "riscv64",
            Arch::Ppc64le => "ppc64le",
            Arch::S390x => "s390x",
        }
    }

    pub fn go(&self) -> &'static str {
        match self {
            Arch::X86_64 => "amd64",
            Arch::Aarch64 => "arm64",
            Arch::Armv7 => "arm",
            Arch::X86 => "386",
            Arch::Riscv64 => "riscv64",
            Arch::Ppc64le => "ppc64le",
            Arch::S390x => "s390x",
        }
    }

    fn gnu_cpu_vendor(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64-pc",
            Arch::Aarch64 => "aarch64-unknown",
            Arch::Armv7 => "armv7-unknown",
            Arch::X86 => "i686-pc",
            Arch::Riscv64 => "riscv64-unknown",
            Arch::Ppc64le => "powerpc64le-unknown",
            Arch::S390x => "s390x-ibm",
        }
    }

    fn rust_cpu(&self) -> &'static str {
        match self {
            Arch::X86 => "i686",
            Arch::Riscv64 => "riscv64gc",
            Arch::Ppc64le => "powerpc64le",
            other => other.apk(),
        }
    }

    /// GNU-style triplet, e.g. `x86_64-pc-linux-gnu`.
    pub fn gnu_triplet(&self, libc: LibcFlavor) -> String {
        format!("{}-linux-{}", self.gnu_cpu_vendor(), self.abi(libc))
    }

    /// Rust target triple, e.g. `x86_64-unknown-linux-musl`.
    pub fn rust_triplet(&self, libc: LibcFlavor) -> String {
        format!("{}-unknown-linux-{}", self.rust_cpu(), self.abi(libc))
    }

    fn abi(&self, libc: LibcFlavor) -> String {
        match self {
            Arch::Armv7 => format!("{}eabihf", libc.abi()),
            _ => libc.abi().to_string(),
        }
    }
}

impl FromStr for Arch {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" => Ok(Arch::X86_64),
            "arm64" | "aarch64" => Ok(Arch::Aarch64),
            "arm" | "armv7" | "arm/v7" => Ok(Arch::Armv7),
            "386" | "x86" | "i686" => Ok(Arch::X86),
            "riscv64" => Ok(Arch::Riscv64),
            "ppc64le" => Ok(Arch::Ppc64le),
            "s390x" => Ok(Arch::S390x),
            _ => Err(FetchError::Configuration(format!(
                "unknown architecture '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.apk())
    }
}

/// C library the package is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibcFlavor {
    Gnu,
    Musl,
}

impl LibcFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibcFlavor::Gnu => "gnu",
            LibcFlavor::Musl => "musl",
        }
    }

    fn abi(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for LibcFlavor {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gnu" | "glibc" => Ok(LibcFlavor::Gnu),
            "musl" => Ok(LibcFlavor::Musl),
            _ => Err(FetchError::Configuration(format!(
                "unknown libc flavor '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for LibcFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\$\{\{\s*([^{}\s]+)\s*\}\}").expect("Invalid placeholder regex")
    })
}

/// Immutable mapping from variable name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionMap {
    values: BTreeMap<String, String>,
}

impl SubstitutionMap {
    /// Builds the map for one invocation. Overrides win over every computed entry.
    pub fn new(
        config: &Configuration,
        arch: Arch,
        libc: LibcFlavor,
        overrides: Option<&BTreeMap<String, String>>,
    ) -> Result<Self> {
        let package = &config.package;
        if package.name.trim().is_empty() {
            return Err(FetchError::Configuration(
                "package.name is required".to_string(),
            ));
        }
        if package.version.trim().is_empty() {
            return Err(FetchError::Configuration(format!(
                "package.version is required for package '{}'",
                package.name
            )));
        }

        let mut values = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            values.insert(key.to_string(), value);
        };

        set(PACKAGE_NAME, package.name.clone());
        set(PACKAGE_VERSION, package.version.clone());
        set(PACKAGE_EPOCH, package.epoch.to_string());
        set(
            PACKAGE_FULL_VERSION,
            format!("{}-r{}", package.version, package.epoch),
        );
        set(
            PACKAGE_DESCRIPTION,
            package.description.clone().unwrap_or_default(),
        );
        set(TARGETS_OUTDIR, OUTPUT_ROOT.to_string());
        set(TARGETS_DESTDIR, format!("{}/{}", OUTPUT_ROOT, package.name));
        set(TARGETS_CONTEXTDIR, format!("{}/{}", OUTPUT_ROOT, package.name));
        set(BUILD_ARCH, arch.apk().to_string());
        set(BUILD_GOARCH, arch.go().to_string());
        set(BUILD_LIBC, libc.to_string());
        set(HOST_TRIPLET_GNU, arch.gnu_triplet(libc));
        set(HOST_TRIPLET_RUST, arch.rust_triplet(libc));
        for flavor in [LibcFlavor::Gnu, LibcFlavor::Musl] {
            let suffix = match flavor {
                LibcFlavor::Gnu => "glibc",
                LibcFlavor::Musl => "musl",
            };
            set(
                &format!("cross.triplet.gnu.{}", suffix),
                arch.gnu_triplet(flavor),
            );
            set(
                &format!("cross.triplet.rust.{}", suffix),
                arch.rust_triplet(flavor),
            );
        }

        let mut map = Self { values };
        map.apply_overrides(overrides);

        for (key, raw) in &config.vars {
            let value = map.substitute(raw, &format!("vars.{}", key))?;
            map.values.insert(format!("vars.{}", key), value);
        }

        for transform in &config.var_transforms {
            let label = format!("var-transforms.{}", transform.to);
            let source = map.substitute(&transform.from, &label)?;
            let re = Regex::new(&transform.pattern).map_err(|e| {
                FetchError::Configuration(format!(
                    "invalid match expression in {}: {}",
                    label, e
                ))
            })?;
            let value = re
                .replace_all(&source, transform.replace.as_str())
                .into_owned();
            map.values.insert(format!("vars.{}", transform.to), value);
        }

        map.apply_overrides(overrides);
        debug!(entries = map.len(), arch = %arch, libc = %libc, "Built substitution map");
        Ok(map)
    }

    /// A map containing exactly the given entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn apply_overrides(&mut self, overrides: Option<&BTreeMap<String, String>>) {
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a child map with `inputs.<name>` entries layered on top.
    ///
    /// `self` is left untouched, so a parent scope never observes a child's inputs.
    pub fn with_inputs(&self, inputs: &BTreeMap<String, String>) -> Self {
        let mut values = self.values.clone();
        for (name, value) in inputs {
            values.insert(format!("inputs.{}", name), value.clone());
        }
        Self { values }
    }

    /// Replaces every `${{key}}` in `text`. `step` only labels the error.
    pub fn substitute(&self, text: &str, step: &str) -> Result<String> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let key = &caps[1];
            let literal = &text[last..whole.start()];
            check_unterminated(literal, step)?;
            output.push_str(literal);

            let value = self
                .values
                .get(key)
                .ok_or_else(|| FetchError::UnresolvedVariable {
                    variable: key.to_string(),
                    step: step.to_string(),
                })?;
            output.push_str(value);
            last = whole.end();
        }

        let tail = &text[last..];
        check_unterminated(tail, step)?;
        output.push_str(tail);
        Ok(output)
    }
}

fn check_unterminated(literal: &str, step: &str) -> Result<()> {
    if let Some(pos) = literal.find("${{") {
        let fragment: String = literal[pos..].chars().take(40).collect();
        return Err(FetchError::UnresolvedVariable {
            variable: fragment,
            step: step.to_string(),
        });
    }
    Ok(())
}
