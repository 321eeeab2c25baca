//! GN stanza rendering.
//!
//! Turns a guarded source set into a GN conditional block:
//!
//! ```text
//! if ((is_win && current_cpu == "x86") || (use_linux_config && ffmpeg_branding == "Chrome")) {
//!   ffmpeg_c_sources += [
//!     "libavcodec/foo.c",
//!   ]
//! }
//! ```
//!
//! How each attribute value is spelled in GN is configuration data held in a
//! [`StanzaTable`]; this module only looks values up and joins strings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;

use crate::condition::{AttrValue, Condition};
use crate::pipeline::Group;
use crate::source_set::SourceSet;

// ---------------------------------------------------------------------------
// StanzaTable
// ---------------------------------------------------------------------------

/// GN spelling of one architecture value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchClause {
    /// Accepted `current_cpu` values; more than one renders as an `||` group.
    pub cpus: Vec<String>,
    /// Extra boolean clauses ANDed after the CPU comparison.
    pub flags: Vec<String>,
}

impl ArchClause {
    pub fn cpu(cpu: impl Into<String>) -> Self {
        Self {
            cpus: vec![cpu.into()],
            flags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }
}

/// Lookup tables used to render conditions and source lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StanzaTable {
    /// GN variable compared against architectures.
    pub cpu_variable: String,
    /// Architecture overrides; unlisted values compare `cpu_variable` to the
    /// value itself.
    pub architectures: BTreeMap<String, ArchClause>,
    /// Platform overrides; unlisted values render as `is_<platform>`.
    pub platforms: BTreeMap<String, String>,
    /// GN variable compared against brandings.
    pub branding_variable: String,
    /// Source list variable per file extension.
    pub source_lists: BTreeMap<String, String>,
    /// Source list for extensions not in `source_lists`.
    pub default_source_list: String,
    /// Files imported at the top of a generated GN file.
    pub imports: Vec<String>,
    /// Verbatim lines emitted after the source list declarations.
    pub prelude: Vec<String>,
}

impl Default for StanzaTable {
    fn default() -> Self {
        let architectures = BTreeMap::from([
            ("ia32".to_owned(), ArchClause::cpu("x86")),
            ("arm-neon".to_owned(), ArchClause::cpu("arm").with_flag("arm_use_neon")),
            (
                "mipsel".to_owned(),
                ArchClause {
                    cpus: vec!["mipsel".to_owned(), "mips64el".to_owned()],
                    flags: Vec::new(),
                },
            ),
        ]);
        let platforms = BTreeMap::from([
            ("linux".to_owned(), "use_linux_config".to_owned()),
            ("mac".to_owned(), "is_apple".to_owned()),
        ]);
        let source_lists = BTreeMap::from([
            ("c".to_owned(), "ffmpeg_c_sources".to_owned()),
            ("S".to_owned(), "ffmpeg_gas_sources".to_owned()),
            ("asm".to_owned(), "ffmpeg_asm_sources".to_owned()),
        ]);

        Self {
            cpu_variable: "current_cpu".to_owned(),
            architectures,
            platforms,
            branding_variable: "ffmpeg_branding".to_owned(),
            source_lists,
            default_source_list: "ffmpeg_c_sources".to_owned(),
            imports: vec![
                "//build/config/arm.gni".to_owned(),
                "ffmpeg_options.gni".to_owned(),
            ],
            prelude: vec!["use_linux_config = is_linux || is_chromeos || is_fuchsia".to_owned()],
        }
    }
}

impl StanzaTable {
    fn arch_clause(&self, arch: &str) -> String {
        let compare = |cpu: &str| format!("{} == \"{cpu}\"", self.cpu_variable);
        let Some(clause) = self.architectures.get(arch) else {
            return compare(arch);
        };

        let mut parts = Vec::with_capacity(1 + clause.flags.len());
        match clause.cpus.as_slice() {
            [] => {}
            [cpu] => parts.push(compare(cpu)),
            cpus => {
                let alternatives: Vec<_> = cpus.iter().map(|c| compare(c)).collect();
                parts.push(format!("({})", alternatives.join(" || ")));
            }
        }
        parts.extend(clause.flags.iter().cloned());
        parts.join(" && ")
    }

    fn platform_clause(&self, platform: &str) -> String {
        self.platforms
            .get(platform)
            .cloned()
            .unwrap_or_else(|| format!("is_{platform}"))
    }

    fn branding_clause(&self, branding: &str) -> String {
        format!("{} == \"{branding}\"", self.branding_variable)
    }

    /// Source list variable a file belongs to, by extension.
    #[must_use]
    pub fn source_list_for(&self, file: &Path) -> &str {
        file.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.source_lists.get(e))
            .unwrap_or(&self.default_source_list)
    }

    /// Every source list variable this table can emit, sorted.
    #[must_use]
    pub fn source_list_names(&self) -> BTreeSet<&str> {
        self.source_lists
            .values()
            .map(String::as_str)
            .chain(std::iter::once(self.default_source_list.as_str()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one condition as a conjunction: platform, architecture, branding.
///
/// Returns `None` for the universal condition.
#[must_use]
pub fn render_condition(condition: &Condition, table: &StanzaTable) -> Option<String> {
    let mut parts = Vec::with_capacity(3);
    if let AttrValue::Exact(platform) = &condition.platform {
        parts.push(table.platform_clause(platform));
    }
    if let AttrValue::Exact(arch) = &condition.architecture {
        parts.push(table.arch_clause(arch));
    }
    if let AttrValue::Exact(branding) = &condition.branding {
        parts.push(table.branding_clause(branding));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" && "))
    }
}

/// Render a set of conditions as a disjunction.
///
/// Returns `None` when the set contains the universal condition, meaning the
/// stanza needs no guard. An empty set matches nothing and renders as
/// `false`.
#[must_use]
pub fn render_guard<'a>(
    conditions: impl IntoIterator<Item = &'a Condition>,
    table: &StanzaTable,
) -> Option<String> {
    let mut conjunctions = Vec::new();
    for condition in conditions {
        conjunctions.push(render_condition(condition, table)?);
    }
    match conjunctions.len() {
        0 => Some("false".to_owned()),
        1 => conjunctions.pop(),
        _ => {
            let mut wrapped: Vec<_> = conjunctions.into_iter().map(|c| format!("({c})")).collect();
            wrapped.sort();
            Some(wrapped.join(" || "))
        }
    }
}

/// Render one source set as a GN stanza.
#[must_use]
pub fn render_stanza(source_set: &SourceSet, table: &StanzaTable) -> String {
    let mut lists: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for file in &source_set.files {
        lists
            .entry(table.source_list_for(file))
            .or_default()
            .push(gn_path(file));
    }

    let guard = render_guard(&source_set.conditions, table);
    let indent = if guard.is_some() { "  " } else { "" };

    let mut out = String::new();
    if let Some(guard) = &guard {
        let _ = writeln!(out, "if ({guard}) {{");
    }
    for (list, files) in &lists {
        let _ = writeln!(out, "{indent}{list} += [");
        for file in files {
            let _ = writeln!(out, "{indent}  \"{file}\",");
        }
        let _ = writeln!(out, "{indent}]");
    }
    if guard.is_some() {
        out.push_str("}\n");
    }
    out
}

/// Render a complete GN file for `groups`.
#[must_use]
pub fn render_gn_file(groups: &[Group], table: &StanzaTable) -> String {
    let mut out = String::from("# This file is generated. Do not edit.\n\n");

    for import in &table.imports {
        let _ = writeln!(out, "import(\"{import}\")");
    }
    if !table.imports.is_empty() {
        out.push('\n');
    }

    out.push_str("# Declare empty versions of each variable for easier +=ing later.\n");
    for list in table.source_list_names() {
        let _ = writeln!(out, "{list} = []");
    }
    out.push('\n');

    for line in &table.prelude {
        let _ = writeln!(out, "{line}");
    }
    if !table.prelude.is_empty() {
        out.push('\n');
    }

    for group in groups {
        let _ = writeln!(out, "# {}", group.name);
        out.push_str(&render_stanza(&group.sources, table));
        out.push('\n');
    }
    out
}

/// GN source paths always use `/`.
fn gn_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
