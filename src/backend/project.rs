//! Project generator - creates the GPR project file that builds every testcase
//!
//! The project is assembled as a typed model (`ProjectDescriptor`) by
//! `ProjectBuilder` and serialized by `GprWriter`, so that the set logic
//! (unique source directories, one main per testcase) never depends on text
//! formatting. It is regenerated from scratch on every run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::TestCase;
use crate::error::{HarnessError, HarnessResult};
use crate::layout::Layout;
use crate::version::GOLDTEST_VERSION;

/// Name of the generated project.
pub const PROJECT_NAME: &str = "Tests";
/// Language declared by the generated project.
pub const LANGUAGE: &str = "Ada";

/// In-memory model of the generated project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Project name (`project Tests is`)
    pub name: String,
    /// Absolute path of the library project (`with "...";`)
    pub library_project: PathBuf,
    /// Package name of the library project, used for `Build_Mode` and `Compiler`
    pub library_name: String,
    /// Declared languages
    pub languages: Vec<String>,
    /// Distinct testcase source directories, in first-seen order
    pub source_dirs: Vec<PathBuf>,
    /// Testcase source file names, one per testcase
    pub mains: Vec<String>,
    /// Prefix of the object directory; the build mode is appended by gprbuild
    pub object_dir_prefix: String,
}

impl ProjectDescriptor {
    /// Render the project file text.
    pub fn render(&self) -> String {
        let mut writer = GprWriter::new();
        writer.write_descriptor(self);
        writer.finish()
    }
}

/// Typed builder for `ProjectDescriptor`.
#[derive(Debug, Clone)]
pub struct ProjectBuilder {
    descriptor: ProjectDescriptor,
}

impl ProjectBuilder {
    pub fn new(library_project: impl AsRef<Path>) -> Self {
        let library_project = library_project.as_ref().to_path_buf();
        let library_name = library_package_name(&library_project);
        Self {
            descriptor: ProjectDescriptor {
                name: PROJECT_NAME.to_string(),
                library_project,
                library_name,
                languages: vec![LANGUAGE.to_string()],
                source_dirs: Vec::new(),
                mains: Vec::new(),
                object_dir_prefix: "obj-".to_string(),
            },
        }
    }

    /// Add a source directory unless it is already listed.
    pub fn source_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        let dir = dir.as_ref();
        if !self.descriptor.source_dirs.iter().any(|d| d == dir) {
            self.descriptor.source_dirs.push(dir.to_path_buf());
        }
        self
    }

    /// Add a main (build entry point) unless it is already listed.
    pub fn main(&mut self, file_name: impl Into<String>) -> &mut Self {
        let file_name = file_name.into();
        if !self.descriptor.mains.contains(&file_name) {
            self.descriptor.mains.push(file_name);
        }
        self
    }

    /// Override the library package name (the file stem by default).
    pub fn library_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.descriptor.library_name = name.into();
        self
    }

    /// Register a testcase: its directory as a source dir, its file as a main.
    pub fn testcase(&mut self, testcase: &TestCase) -> &mut Self {
        self.source_dir(testcase.source_dir());
        self.main(testcase.file_name())
    }

    pub fn build(self) -> ProjectDescriptor {
        self.descriptor
    }
}

/// Fallback GPR package name of a library project: its file stem.
///
/// GPR identifiers are case-insensitive, so `libyaml_ada.gpr` can be referred
/// to as `libyaml_ada.Build_Mode` from the generated project.
fn library_package_name(library_project: &Path) -> String {
    library_project
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Library".to_string())
}

/// The name in a project file's `project <Name> is` declaration.
///
/// Qualifiers (`library`, `abstract`, `aggregate`) are skipped, as are
/// comments and string literals, so `with "project.gpr";` is not mistaken
/// for the declaration. Child projects keep their dotted name.
pub fn declared_project_name(text: &str) -> Option<String> {
    let mut words = text
        .lines()
        .map(|line| line.split("--").next().unwrap_or(""))
        .flat_map(|line| line.split(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '"'))))
        .filter(|word| !word.is_empty());

    while let Some(word) = words.next() {
        if word.eq_ignore_ascii_case("project") {
            return words
                .next()
                .filter(|name| is_gpr_name(name))
                .map(str::to_string);
        }
    }
    None
}

fn is_gpr_name(name: &str) -> bool {
    name.split('.').all(|part| {
        part.chars().next().is_some_and(|c| c.is_alphabetic())
            && part.chars().all(|c| c.is_alphanumeric() || c == '_')
    })
}

/// Output writer for GPR project files
pub struct GprWriter {
    output: String,
    indent_level: usize,
}

impl GprWriter {
    const INDENT_WIDTH: usize = 4;

    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn writeln(&mut self, s: &str) {
        if !s.is_empty() {
            self.output.push_str(&" ".repeat(self.indent_level * Self::INDENT_WIDTH));
            self.output.push_str(s);
        }
        self.output.push('\n');
    }

    fn blank_line(&mut self) {
        self.output.push('\n');
    }

    /// A GPR string literal: double-quoted, embedded quotes doubled.
    pub fn string_literal(s: &str) -> String {
        format!("\"{}\"", s.replace('"', "\"\""))
    }

    /// A parenthesized, comma-separated list of string literals.
    pub fn string_list<I, S>(items: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| Self::string_literal(s.as_ref()))
            .collect();
        format!("({})", items.join(", "))
    }

    fn attribute(&mut self, name: &str, value: &str) {
        self.writeln(&format!("for {} use {};", name, value));
    }

    pub fn write_descriptor(&mut self, descriptor: &ProjectDescriptor) {
        self.writeln(&format!("--  Generated by goldtest {}; do not edit.", GOLDTEST_VERSION));
        self.writeln(&format!(
            "with {};",
            Self::string_literal(&descriptor.library_project.to_string_lossy())
        ));
        self.blank_line();
        self.writeln(&format!("project {} is", descriptor.name));
        self.blank_line();

        self.indent_level += 1;
        self.attribute("Languages", &Self::string_list(&descriptor.languages));
        self.attribute(
            "Source_Dirs",
            &Self::string_list(descriptor.source_dirs.iter().map(|d| d.to_string_lossy())),
        );
        self.attribute("Main", &Self::string_list(&descriptor.mains));
        self.attribute(
            "Object_Dir",
            &format!(
                "{} & {}.Build_Mode",
                Self::string_literal(&descriptor.object_dir_prefix),
                descriptor.library_name
            ),
        );
        self.blank_line();
        self.writeln(&format!("package Compiler renames {}.Compiler;", descriptor.library_name));
        self.indent_level -= 1;

        self.blank_line();
        self.writeln(&format!("end {};", descriptor.name));
    }
}

impl Default for GprWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the generated project and prepares the scratch tree.
pub struct ProjectGenerator<'a> {
    layout: &'a Layout,
}

impl<'a> ProjectGenerator<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Describe the project for `testcases` (already in their final order).
    pub fn describe(&self, testcases: &[TestCase]) -> ProjectDescriptor {
        let library_project = self.layout.library_project();
        let mut builder = ProjectBuilder::new(library_project);
        match fs::read_to_string(library_project) {
            Ok(text) => match declared_project_name(&text) {
                Some(name) => {
                    builder.library_name(name);
                }
                None => tracing::warn!(
                    "no project declaration found in {}; using its file name",
                    library_project.display()
                ),
            },
            Err(e) => tracing::warn!("cannot read {}: {}", library_project.display(), e),
        }
        for testcase in testcases {
            builder.testcase(testcase);
        }
        builder.build()
    }

    /// Create the scratch root and one scratch directory per testcase, then
    /// write the project file. Returns the project file path.
    pub fn generate(&self, testcases: &[TestCase]) -> HarnessResult<PathBuf> {
        create_dir(self.layout.scratch_dir())?;
        for testcase in testcases {
            create_dir(&self.layout.testcase_scratch_dir(testcase.name()))?;
        }

        let descriptor = self.describe(testcases);
        let path = self.layout.descriptor_path();
        fs::write(&path, descriptor.render()).map_err(|e| HarnessError::io("cannot write", &path, e))?;

        tracing::debug!(
            "wrote {} ({} source dir(s), {} main(s))",
            path.display(),
            descriptor.source_dirs.len(),
            descriptor.mains.len()
        );
        Ok(path)
    }
}

/// Create a directory (and parents) if it does not exist yet.
pub fn create_dir(path: &Path) -> HarnessResult<()> {
    fs::create_dir_all(path).map_err(|e| HarnessError::io("cannot create directory", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn testcase(path: &str) -> TestCase {
        TestCase::from_source(path).unwrap()
    }

    #[test]
    fn test_shared_directory_listed_once() {
        let mut builder = ProjectBuilder::new("/suite/libyaml_ada.gpr");
        builder
            .testcase(&testcase("/suite/tests/a/one.adb"))
            .testcase(&testcase("/suite/tests/a/two.adb"))
            .testcase(&testcase("/suite/tests/b/three.adb"));
        let descriptor = builder.build();

        assert_eq!(
            descriptor.source_dirs,
            vec![PathBuf::from("/suite/tests/a"), PathBuf::from("/suite/tests/b")]
        );
        assert_eq!(descriptor.mains, vec!["one.adb", "two.adb", "three.adb"]);
        assert_eq!(descriptor.library_name, "libyaml_ada");
    }

    #[test]
    fn test_string_literal_escapes_quotes() {
        assert_eq!(GprWriter::string_literal("plain"), "\"plain\"");
        assert_eq!(GprWriter::string_literal("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_string_list() {
        assert_eq!(GprWriter::string_list(["a.adb", "b.adb"]), "(\"a.adb\", \"b.adb\")");
        assert_eq!(GprWriter::string_list(Vec::<String>::new()), "()");
    }

    #[test]
    fn test_render_mentions_every_part() {
        let mut builder = ProjectBuilder::new("/suite/lib.gpr");
        builder.testcase(&testcase("/suite/tests/x.adb"));
        let text = builder.build().render();

        assert!(text.contains("with \"/suite/lib.gpr\";"));
        assert!(text.contains("project Tests is"));
        assert!(text.contains("for Languages use (\"Ada\");"));
        assert!(text.contains("for Source_Dirs use (\"/suite/tests\");"));
        assert!(text.contains("for Main use (\"x.adb\");"));
        assert!(text.contains("for Object_Dir use \"obj-\" & lib.Build_Mode;"));
        assert!(text.contains("package Compiler renames lib.Compiler;"));
        assert!(text.trim_end().ends_with("end Tests;"));
    }

    #[test]
    fn test_generate_creates_scratch_tree_idempotently() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("lib.gpr")).unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        let layout = Layout::new(dir.path(), None).unwrap();
        let testcases = vec![testcase(&layout.tests_dir().join("x.adb").to_string_lossy())];

        let generator = ProjectGenerator::new(&layout);
        let first = generator.generate(&testcases).unwrap();
        let first_text = fs::read_to_string(&first).unwrap();
        let second = generator.generate(&testcases).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_text, fs::read_to_string(&second).unwrap());
        assert!(layout.testcase_scratch_dir("x").is_dir());
    }

    #[test]
    fn test_declared_project_name() {
        let text = "--  project Commented is\nwith \"project.gpr\";\n\nlibrary project Foo_Bar is\n   for Source_Dirs use (\"src\");\nend Foo_Bar;\n";
        assert_eq!(declared_project_name(text), Some("Foo_Bar".to_string()));
        assert_eq!(
            declared_project_name("project Parent.Child extends \"parent.gpr\" is end Parent.Child;"),
            Some("Parent.Child".to_string())
        );
        assert_eq!(declared_project_name("aggregate library Project Agg is"), Some("Agg".to_string()));
        assert_eq!(declared_project_name(""), None);
        assert_eq!(declared_project_name("project \"odd\" is"), None);
    }

    #[test]
    fn test_describe_uses_declared_library_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo-bar.gpr"), "project Foo_Bar is\nend Foo_Bar;\n").unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        let layout = Layout::new(dir.path(), None).unwrap();

        let text = ProjectGenerator::new(&layout).describe(&[]).render();
        assert!(text.contains("for Object_Dir use \"obj-\" & Foo_Bar.Build_Mode;"), "{}", text);
        assert!(text.contains("package Compiler renames Foo_Bar.Compiler;"), "{}", text);
    }

    #[test]
    fn test_describe_falls_back_to_file_stem() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("lib.gpr")).unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        let layout = Layout::new(dir.path(), None).unwrap();

        assert_eq!(ProjectGenerator::new(&layout).describe(&[]).library_name, "lib");
    }

    #[test]
    fn test_generate_fails_when_scratch_is_a_file() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("lib.gpr")).unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();
        File::create(dir.path().join("tests").join("tmp")).unwrap();
        let layout = Layout::new(dir.path(), None).unwrap();

        let err = ProjectGenerator::new(&layout).generate(&[]).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
