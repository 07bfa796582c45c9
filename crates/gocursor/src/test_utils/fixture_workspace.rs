//! Deterministic fixture workspace generator for benchmarks and tests.
//!
//! Generates synthetic Go packages with controlled characteristics:
//! file count, functions and methods per file, imports, and extra
//! top-level declarations.
//!
//! All output is deterministic (no randomness) so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Configuration for generating a fixture workspace.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub functions_per_file: usize,
    pub methods_per_file: usize,
    pub imports_per_file: usize,
    pub extra_decls_per_file: usize,
}

/// Standard library packages used deterministically in generated imports.
const IMPORTS: &[&str] = &[
    "fmt", "strings", "errors", "io", "os", "sort", "bytes", "strconv", "time", "sync",
];

impl FixtureConfig {
    /// Small workspace: 10 files, 5 functions and 2 methods each.
    pub fn small() -> Self {
        Self {
            file_count: 10,
            functions_per_file: 5,
            methods_per_file: 2,
            imports_per_file: 2,
            extra_decls_per_file: 5,
        }
    }

    /// Medium workspace: 50 files, 10 functions and 5 methods each.
    pub fn medium() -> Self {
        Self {
            file_count: 50,
            functions_per_file: 10,
            methods_per_file: 5,
            imports_per_file: 4,
            extra_decls_per_file: 10,
        }
    }

    /// Large workspace: 200 files, 20 functions and 10 methods each.
    pub fn large() -> Self {
        Self {
            file_count: 200,
            functions_per_file: 20,
            methods_per_file: 10,
            imports_per_file: 6,
            extra_decls_per_file: 20,
        }
    }
}

/// Generate the content of a single Go file deterministically.
///
/// Every file belongs to package `fixture`; `index` makes names unique.
pub fn generate_go_file_content(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();

    writeln!(content, "// Package fixture is generated.").unwrap();
    writeln!(content, "package fixture\n").unwrap();

    if config.imports_per_file > 0 {
        writeln!(content, "import (").unwrap();
        for i in 0..config.imports_per_file {
            let name = IMPORTS[(index * config.imports_per_file + i) % IMPORTS.len()];
            writeln!(content, "\t\"{}\"", name).unwrap();
        }
        writeln!(content, ")\n").unwrap();
        // Keep every import used.
        writeln!(content, "var (").unwrap();
        for i in 0..config.imports_per_file {
            let name = IMPORTS[(index * config.imports_per_file + i) % IMPORTS.len()];
            writeln!(content, "\t_ = {}.{}", name, imported_symbol(name)).unwrap();
        }
        writeln!(content, ")\n").unwrap();
    }

    if config.methods_per_file > 0 {
        writeln!(content, "// T{} holds state.", index).unwrap();
        writeln!(content, "type T{} struct {{\n\tn int\n}}\n", index).unwrap();
    }

    for f in 0..config.functions_per_file {
        writeln!(content, "// Func{}_{} adds.", index, f).unwrap();
        writeln!(content, "func Func{}_{}(x, y int) int {{", index, f).unwrap();
        writeln!(content, "\tresult := x + y*{}", f + 1).unwrap();
        writeln!(content, "\tif result < 0 {{").unwrap();
        writeln!(content, "\t\treturn 0").unwrap();
        writeln!(content, "\t}}").unwrap();
        writeln!(content, "\treturn result").unwrap();
        writeln!(content, "}}\n").unwrap();
    }

    for m in 0..config.methods_per_file {
        writeln!(content, "func (t *T{}) Method{}(s string) string {{", index, m).unwrap();
        writeln!(content, "\tdefer t.reset()").unwrap();
        writeln!(content, "\tswitch t.n {{").unwrap();
        writeln!(content, "\tcase {}:", m).unwrap();
        writeln!(content, "\t\treturn s").unwrap();
        writeln!(content, "\tdefault:").unwrap();
        writeln!(content, "\t\tt.n = len(s)").unwrap();
        writeln!(content, "\t}}").unwrap();
        writeln!(content, "\treturn \"method{}\"", m).unwrap();
        writeln!(content, "}}\n").unwrap();
    }
    if config.methods_per_file > 0 {
        writeln!(content, "func (t *T{}) reset() {{ t.n = 0 }}\n", index).unwrap();
    }

    for d in 0..config.extra_decls_per_file {
        writeln!(content, "const Const{}_{} = {}", index, d, d + 1).unwrap();
    }

    content
}

/// An exported identifier of each package in [`IMPORTS`].
fn imported_symbol(package: &str) -> &'static str {
    match package {
        "fmt" => "Sprint",
        "strings" => "ToUpper",
        "errors" => "New",
        "io" => "EOF",
        "os" => "Exit",
        "sort" => "Ints",
        "bytes" => "Equal",
        "strconv" => "Itoa",
        "time" => "Now",
        "sync" => "NewCond",
        _ => "Unknown",
    }
}

/// Create a temporary fixture workspace from the given configuration.
///
/// Returns a `TempDir` whose path contains the generated `.go` files.
/// The directory is cleaned up when the `TempDir` is dropped.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write fixture files into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    for i in 0..config.file_count {
        let content = generate_go_file_content(i, config);
        let filename = format!("file_{}.go", i);
        std::fs::write(dir.join(&filename), &content)
            .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filename, e));
    }
}
